// Bounded history and derived records. Every collection here is either
// cap-limited (front eviction) or keyed for upsert, so the profiler cannot
// grow without bound while it watches for exactly that.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::bounded::BoundedVec;
use crate::config::ProfilerConfig;
use crate::models::{
    Alert, ComponentMemoryInfo, GcEvent, HookMemoryInfo, MemoryLeak, MemoryLeakPattern,
    MemoryMeasurement, MemoryOptimizationSuggestion, PerformanceMetrics, Snapshot, Timeline,
    TimelineEvent,
};

/// GC events copied into each snapshot.
pub const SNAPSHOT_GC_EVENTS: usize = 10;

/// Top-level keys of the export document.
pub mod sections {
    pub const CONFIG: &str = "config";
    pub const TIMELINE: &str = "timeline";
    pub const COMPONENTS: &str = "components";
    pub const HOOKS: &str = "hooks";
    pub const SNAPSHOTS: &str = "snapshots";
    pub const LEAKS: &str = "leaks";
    pub const LEAK_PATTERNS: &str = "leakPatterns";
    pub const PERFORMANCE: &str = "performance";
    pub const GC_EVENTS: &str = "gcEvents";
    pub const SUGGESTIONS: &str = "suggestions";
    pub const ALERTS: &str = "alerts";
    pub const EXPORTED_AT: &str = "exportedAt";
}

/// Self-describing export of the full profiler state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub config: ProfilerConfig,
    pub timeline: Timeline,
    pub components: Vec<ComponentMemoryInfo>,
    pub hooks: Vec<HookMemoryInfo>,
    pub snapshots: Vec<Snapshot>,
    pub leaks: Vec<MemoryLeak>,
    pub leak_patterns: Vec<MemoryLeakPattern>,
    pub performance: PerformanceMetrics,
    pub gc_events: Vec<GcEvent>,
    pub suggestions: Vec<MemoryOptimizationSuggestion>,
    pub alerts: Vec<Alert>,
    /// RFC 3339.
    pub exported_at: String,
}

/// Outcome of a best-effort import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub applied: Vec<String>,
    /// Section name and parse error; these sections were skipped.
    pub failed: Vec<(String, String)>,
    /// Keys this version does not know about.
    pub unrecognized: Vec<String>,
}

pub struct ProfilerStore {
    start_time: u64,
    measurements: BoundedVec<MemoryMeasurement>,
    events: BoundedVec<TimelineEvent>,
    gc_events: BoundedVec<GcEvent>,
    components: BTreeMap<String, ComponentMemoryInfo>,
    hooks: Vec<HookMemoryInfo>,
    leaks: BTreeMap<String, MemoryLeak>,
    leak_patterns: BTreeMap<String, MemoryLeakPattern>,
    suggestions: BTreeMap<String, MemoryOptimizationSuggestion>,
    dismissed_suggestions: HashSet<String>,
    snapshots: Vec<Snapshot>,
    performance: PerformanceMetrics,
    max_pattern_samples: usize,
    max_leak_patterns: usize,
    next_snapshot: u64,
}

impl ProfilerStore {
    pub fn new(config: &ProfilerConfig) -> Self {
        Self {
            start_time: 0,
            measurements: BoundedVec::new(config.max_measurements),
            events: BoundedVec::new(config.max_timeline_events),
            gc_events: BoundedVec::new(config.max_gc_events),
            components: BTreeMap::new(),
            hooks: Vec::new(),
            leaks: BTreeMap::new(),
            leak_patterns: BTreeMap::new(),
            suggestions: BTreeMap::new(),
            dismissed_suggestions: HashSet::new(),
            snapshots: Vec::new(),
            performance: PerformanceMetrics::default(),
            max_pattern_samples: config.max_pattern_samples,
            max_leak_patterns: config.max_leak_patterns,
            next_snapshot: 1,
        }
    }

    /// Re-apply history caps after a config change.
    pub fn apply_caps(&mut self, config: &ProfilerConfig) {
        self.measurements.set_capacity(config.max_measurements);
        self.events.set_capacity(config.max_timeline_events);
        self.gc_events.set_capacity(config.max_gc_events);
        self.max_pattern_samples = config.max_pattern_samples;
        for p in self.leak_patterns.values_mut() {
            trim_front(&mut p.samples, self.max_pattern_samples);
        }
        self.max_leak_patterns = config.max_leak_patterns;
        self.evict_weakest_patterns();
    }

    pub fn reset(&mut self, config: &ProfilerConfig) {
        *self = Self::new(config);
    }

    // --- timeline ---

    /// Append a measurement. Timestamps never go backwards: an older one is
    /// clamped to the previous timestamp.
    pub fn push_measurement(&mut self, mut m: MemoryMeasurement) -> MemoryMeasurement {
        if let Some(last) = self.measurements.last() {
            m.timestamp = m.timestamp.max(last.timestamp);
        }
        if self.start_time == 0 {
            self.start_time = m.timestamp;
        }
        self.measurements.push(m);
        m
    }

    pub fn push_event(&mut self, mut e: TimelineEvent) {
        if let Some(last) = self.events.last() {
            e.timestamp = e.timestamp.max(last.timestamp);
        }
        if self.start_time == 0 {
            self.start_time = e.timestamp;
        }
        self.events.push(e);
    }

    pub fn push_gc_event(&mut self, e: GcEvent) {
        self.gc_events.push(e);
    }

    pub fn measurements(&self) -> &BoundedVec<MemoryMeasurement> {
        &self.measurements
    }

    pub fn latest_measurement(&self) -> Option<&MemoryMeasurement> {
        self.measurements.last()
    }

    pub fn events(&self) -> &BoundedVec<TimelineEvent> {
        &self.events
    }

    pub fn gc_events(&self) -> &BoundedVec<GcEvent> {
        &self.gc_events
    }

    pub fn timeline(&self) -> Timeline {
        Timeline {
            start_time: self.start_time,
            end_time: self.measurements.last().map(|m| m.timestamp).unwrap_or(self.start_time),
            measurements: self.measurements.to_vec(),
            events: self.events.to_vec(),
        }
    }

    // --- attribution (written only by the analyzer) ---

    pub fn replace_components(
        &mut self,
        components: BTreeMap<String, ComponentMemoryInfo>,
        hooks: Vec<HookMemoryInfo>,
    ) {
        self.components = components;
        self.hooks = hooks;
    }

    pub fn components(&self) -> &BTreeMap<String, ComponentMemoryInfo> {
        &self.components
    }

    pub fn hooks(&self) -> &[HookMemoryInfo] {
        &self.hooks
    }

    // --- leaks and patterns ---

    /// Insert or update by id. Returns true when the id was new.
    pub fn upsert_leak(&mut self, leak: MemoryLeak) -> bool {
        self.leaks.insert(leak.id.clone(), leak).is_none()
    }

    pub fn leaks(&self) -> impl Iterator<Item = &MemoryLeak> {
        self.leaks.values()
    }

    /// Insert or update by id; an update keeps the original `detected_at`
    /// and appends the new samples (bounded).
    pub fn upsert_leak_pattern(&mut self, mut pattern: MemoryLeakPattern) -> bool {
        trim_front(&mut pattern.samples, self.max_pattern_samples);
        match self.leak_patterns.get_mut(&pattern.id) {
            Some(existing) => {
                existing.confidence = pattern.confidence;
                existing.memory_growth_rate = pattern.memory_growth_rate;
                existing.affected_components = pattern.affected_components;
                for s in pattern.samples {
                    if existing.samples.last().is_none_or(|l| l.timestamp < s.timestamp) {
                        existing.samples.push(s);
                    }
                }
                trim_front(&mut existing.samples, self.max_pattern_samples);
                false
            }
            None => {
                let id = pattern.id.clone();
                self.leak_patterns.insert(id.clone(), pattern);
                self.evict_weakest_patterns();
                self.leak_patterns.contains_key(&id)
            }
        }
    }

    /// Drop every pattern whose id is not in `active`. Patterns only stay
    /// while the pass that produced them keeps producing them.
    pub fn retain_leak_patterns(&mut self, active: &HashSet<String>) -> usize {
        let before = self.leak_patterns.len();
        self.leak_patterns.retain(|id, _| active.contains(id));
        before - self.leak_patterns.len()
    }

    /// Over the cap, the least confident pattern goes first; ties go to the oldest.
    fn evict_weakest_patterns(&mut self) {
        while self.leak_patterns.len() > self.max_leak_patterns {
            let weakest = self
                .leak_patterns
                .values()
                .min_by(|a, b| {
                    a.confidence
                        .total_cmp(&b.confidence)
                        .then(a.detected_at.cmp(&b.detected_at))
                })
                .map(|p| p.id.clone());
            let Some(id) = weakest else {
                break;
            };
            self.leak_patterns.remove(&id);
        }
    }

    pub fn leak_patterns(&self) -> impl Iterator<Item = &MemoryLeakPattern> {
        self.leak_patterns.values()
    }

    // --- suggestions ---

    /// Insert or update by id. Dismissed ids stay dismissed until reset.
    pub fn upsert_suggestion(&mut self, s: MemoryOptimizationSuggestion) -> bool {
        if self.dismissed_suggestions.contains(&s.id) {
            return false;
        }
        self.suggestions.insert(s.id.clone(), s);
        true
    }

    pub fn dismiss_suggestion(&mut self, id: &str) -> bool {
        let removed = self.suggestions.remove(id).is_some();
        if removed {
            self.dismissed_suggestions.insert(id.to_string());
        }
        removed
    }

    pub fn suggestions(&self) -> impl Iterator<Item = &MemoryOptimizationSuggestion> {
        self.suggestions.values()
    }

    // --- performance ---

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance
    }

    pub fn performance_mut(&mut self) -> &mut PerformanceMetrics {
        &mut self.performance
    }

    // --- snapshots ---

    /// Deep copy of the current state. Nothing in the snapshot aliases the store.
    pub fn create_snapshot(&mut self, name: &str, now: u64) -> Snapshot {
        let id = format!("snapshot-{}-{}", now, self.next_snapshot);
        self.next_snapshot += 1;
        let gc_events = self
            .gc_events
            .tail(SNAPSHOT_GC_EVENTS)
            .copied()
            .collect();
        let snapshot = Snapshot {
            id,
            timestamp: now,
            name: name.to_string(),
            memory: self.measurements.last().copied(),
            components: self.components.values().cloned().collect(),
            hooks: self.hooks.clone(),
            leaks: self.leaks.values().cloned().collect(),
            performance: self.performance.clone(),
            gc_events,
        };
        self.snapshots.push(snapshot.clone());
        snapshot
    }

    pub fn delete_snapshot(&mut self, id: &str) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.id != id);
        self.snapshots.len() != before
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn upsert_snapshot(&mut self, snapshot: Snapshot) {
        match self.snapshots.iter_mut().find(|s| s.id == snapshot.id) {
            Some(existing) => *existing = snapshot,
            None => self.snapshots.push(snapshot),
        }
    }

    // --- import helpers, same rules as live updates ---

    pub fn import_timeline(&mut self, timeline: Timeline) {
        let mut measurements = timeline.measurements;
        measurements.sort_by_key(|m| m.timestamp);
        for m in measurements {
            let dup = self
                .measurements
                .iter()
                .any(|existing| existing.timestamp == m.timestamp && *existing == m);
            if !dup {
                self.push_measurement(m);
            }
        }
        let mut events = timeline.events;
        events.sort_by_key(|e| e.timestamp);
        for e in events {
            if !self.events.iter().any(|existing| *existing == e) {
                self.push_event(e);
            }
        }
        if timeline.start_time > 0 && (self.start_time == 0 || timeline.start_time < self.start_time)
        {
            self.start_time = timeline.start_time;
        }
    }

    pub fn import_components(&mut self, components: Vec<ComponentMemoryInfo>) {
        for c in components {
            self.components.insert(c.name.clone(), c);
        }
    }

    pub fn import_hooks(&mut self, hooks: Vec<HookMemoryInfo>) {
        self.hooks = hooks;
    }

    pub fn import_gc_events(&mut self, mut events: Vec<GcEvent>) {
        events.sort_by_key(|e| e.timestamp);
        for e in events {
            if !self.gc_events.iter().any(|existing| *existing == e) {
                self.gc_events.push(e);
            }
        }
    }

    pub fn set_performance(&mut self, performance: PerformanceMetrics) {
        self.performance = performance;
    }
}

fn trim_front<T>(v: &mut Vec<T>, cap: usize) {
    let cap = cap.max(1);
    if v.len() > cap {
        v.drain(..v.len() - cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeakPatternKind, TimelineEventType};

    fn m(ts: u64, used: u64) -> MemoryMeasurement {
        MemoryMeasurement {
            timestamp: ts,
            heap_used: used,
            heap_size: used * 2,
            heap_limit: used * 4,
        }
    }

    #[test]
    fn measurement_timestamps_never_go_backwards() {
        let mut store = ProfilerStore::new(&ProfilerConfig::default());
        store.push_measurement(m(100, 1));
        let clamped = store.push_measurement(m(50, 2));
        assert_eq!(clamped.timestamp, 100);
        let tl = store.timeline();
        assert_eq!(tl.start_time, 100);
        assert_eq!(tl.end_time, 100);
    }

    #[test]
    fn events_are_clamped_in_order() {
        let mut store = ProfilerStore::new(&ProfilerConfig::default());
        for ts in [10, 5, 20] {
            store.push_event(TimelineEvent {
                timestamp: ts,
                type_: TimelineEventType::Navigation,
                description: "nav".into(),
                memory_impact: None,
            });
        }
        let ts: Vec<u64> = store.events().iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![10, 10, 20]);
    }

    #[test]
    fn pattern_samples_are_bounded_on_update() {
        let config = ProfilerConfig {
            max_pattern_samples: 3,
            ..Default::default()
        };
        let mut store = ProfilerStore::new(&config);
        let pattern = |samples: Vec<MemoryMeasurement>, confidence: f64| MemoryLeakPattern {
            id: "growing-array:List".into(),
            pattern: LeakPatternKind::GrowingArray,
            confidence,
            affected_components: ["List".to_string()].into(),
            memory_growth_rate: 10.0,
            detected_at: 1,
            samples,
        };
        assert!(store.upsert_leak_pattern(pattern(vec![m(1, 1), m(2, 2)], 0.4)));
        assert!(!store.upsert_leak_pattern(pattern(vec![m(2, 2), m(3, 3), m(4, 4)], 0.6)));
        let stored: Vec<_> = store.leak_patterns().collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].confidence, 0.6);
        let ts: Vec<u64> = stored[0].samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![2, 3, 4]);
    }

    fn timer_pattern(names: &[&str], confidence: f64, detected_at: u64) -> MemoryLeakPattern {
        let affected: std::collections::BTreeSet<String> =
            names.iter().map(|n| n.to_string()).collect();
        MemoryLeakPattern {
            id: format!("timers:{}", names.join(",")),
            pattern: LeakPatternKind::Timers,
            confidence,
            affected_components: affected,
            memory_growth_rate: 0.0,
            detected_at,
            samples: Vec::new(),
        }
    }

    #[test]
    fn inactive_patterns_are_dropped() {
        let mut store = ProfilerStore::new(&ProfilerConfig::default());
        store.upsert_leak_pattern(timer_pattern(&["A"], 0.5, 1));
        store.upsert_leak_pattern(timer_pattern(&["A", "B"], 0.5, 2));
        let active: HashSet<String> = ["timers:A,B".to_string()].into();
        assert_eq!(store.retain_leak_patterns(&active), 1);
        let ids: Vec<&str> = store.leak_patterns().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["timers:A,B"]);

        assert_eq!(store.retain_leak_patterns(&HashSet::new()), 1);
        assert_eq!(store.leak_patterns().count(), 0);
    }

    #[test]
    fn pattern_cap_evicts_least_confident() {
        let config = ProfilerConfig {
            max_leak_patterns: 2,
            ..Default::default()
        };
        let mut store = ProfilerStore::new(&config);
        assert!(store.upsert_leak_pattern(timer_pattern(&["A"], 0.3, 1)));
        assert!(store.upsert_leak_pattern(timer_pattern(&["B"], 0.9, 2)));
        assert!(store.upsert_leak_pattern(timer_pattern(&["C"], 0.6, 3)));
        let mut ids: Vec<&str> = store.leak_patterns().map(|p| p.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["timers:B", "timers:C"]);

        // weaker than everything kept: not stored
        assert!(!store.upsert_leak_pattern(timer_pattern(&["D"], 0.1, 4)));
        assert_eq!(store.leak_patterns().count(), 2);
    }
}
