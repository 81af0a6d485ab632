// Profiler engine: owns all profiler state, runs one sampling tick at a time
// and exposes the command surface used by hosts and UI panels.
//
// All state lives behind one mutex. A tick, a command or a host event runs to
// completion under it and the lock is never held across an await, so passes
// never interleave.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::alerts::{self, AlertManager};
use crate::analyzer::{AttributionResult, ComponentAnalyzer};
use crate::config::{ConfigPatch, ProfilerConfig};
use crate::detector::{self, LeakDetector};
use crate::error::{ProfilerError, Result};
use crate::heap_repo::HeapProvider;
use crate::introspection::{ComponentNode, ComponentTree, IntrospectionHook, ObserverGuard};
use crate::models::{
    Alert, AlertSeverity, AlertType, BudgetViolation, ComponentMemoryInfo, GcEvent, GcEventType,
    HookMemoryInfo, MemoryLeak, MemoryLeakPattern, MemoryMeasurement,
    MemoryOptimizationSuggestion, PerformanceEntry, PerformanceMetrics, Snapshot, Timeline,
    TimelineEvent, TimelineEventType, Trend,
};
use crate::sampler::{self, SamplerHandle};
use crate::store::{ExportDocument, ImportReport, ProfilerStore, sections};
use crate::suggestions;

/// Measurements buffered per /ws subscriber before it starts lagging.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;
/// Host events buffered while the engine is busy.
const MAX_PENDING_HOST_EVENTS: usize = 64;
/// A GC that frees at least this share of the previous heap is reported as major.
const MAJOR_GC_RATIO: f64 = 0.1;
/// New leak patterns at or above this confidence raise a leak-detected alert.
const PATTERN_ALERT_CONFIDENCE: f64 = 0.5;

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// Which host capabilities are available. Missing ones leave the profiler
/// running with empty/zero data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub heap_stats: bool,
    pub introspection: bool,
}

enum HostEvent {
    Commit(ComponentTree),
    Unmount(ComponentNode),
}

pub(crate) struct ProfilerState {
    config: ProfilerConfig,
    store: ProfilerStore,
    analyzer: ComponentAnalyzer,
    detector: LeakDetector,
    alerts: AlertManager,
    current_route: Option<String>,
    heap: Arc<dyn HeapProvider>,
    hook: Option<Arc<dyn IntrospectionHook>>,
    running: bool,
    /// Bumped on every start/stop/restart; a tick from an older run is ignored.
    generation: u64,
    sampler: Option<SamplerHandle>,
    observers: Option<ObserverGuard>,
}

pub(crate) struct Inner {
    state: Mutex<ProfilerState>,
    inbox: Mutex<VecDeque<HostEvent>>,
    measurements_tx: broadcast::Sender<MemoryMeasurement>,
}

/// Engine handle. Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Profiler {
    inner: Arc<Inner>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ProfilerState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("profiler state lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn push_host_event(&self, event: HostEvent) {
        let mut inbox = self.inbox.lock().unwrap_or_else(|p| p.into_inner());
        if inbox.len() >= MAX_PENDING_HOST_EVENTS {
            inbox.pop_front();
        }
        inbox.push_back(event);
    }

    fn take_host_events(&self) -> Vec<HostEvent> {
        let mut inbox = self.inbox.lock().unwrap_or_else(|p| p.into_inner());
        inbox.drain(..).collect()
    }

    /// Called from host callbacks: never blocks on the engine. If the engine
    /// is busy (including re-entrant calls from inside a tick) the event
    /// waits in the inbox for the next tick.
    fn on_host_event(&self, event: HostEvent) {
        self.push_host_event(event);
        if let Ok(mut state) = self.state.try_lock() {
            let events = self.take_host_events();
            state.process_host_events(events, now_ms());
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.measurements_tx.receiver_count()
    }

    /// One scheduled tick. Returns `None` when this run was stopped or
    /// replaced, which ends the sampler loop.
    pub(crate) fn run_scheduled_tick(&self, generation: u64) -> Option<MemoryMeasurement> {
        let measurement = {
            let mut state = self.lock_state();
            if !state.running || state.generation != generation {
                return None;
            }
            let events = self.take_host_events();
            let now = now_ms();
            state.process_host_events(events, now);
            state.sample(now)
        };
        let _ = self.measurements_tx.send(measurement);
        Some(measurement)
    }
}

impl Profiler {
    pub fn new(
        config: ProfilerConfig,
        heap: Arc<dyn HeapProvider>,
        hook: Option<Arc<dyn IntrospectionHook>>,
    ) -> Result<Self> {
        Self::with_capacity(config, heap, hook, DEFAULT_BROADCAST_CAPACITY)
    }

    pub fn with_capacity(
        config: ProfilerConfig,
        heap: Arc<dyn HeapProvider>,
        hook: Option<Arc<dyn IntrospectionHook>>,
        broadcast_capacity: usize,
    ) -> Result<Self> {
        config.validate()?;
        let (measurements_tx, _) = broadcast::channel(broadcast_capacity.max(1));
        let state = ProfilerState {
            store: ProfilerStore::new(&config),
            analyzer: ComponentAnalyzer::new(config.max_attribution_passes),
            detector: LeakDetector::new(),
            alerts: AlertManager::new(config.max_alerts),
            current_route: None,
            heap,
            hook,
            running: false,
            generation: 0,
            sampler: None,
            observers: None,
            config,
        };
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                inbox: Mutex::new(VecDeque::new()),
                measurements_tx,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, ProfilerState> {
        self.inner.lock_state()
    }

    // --- lifecycle ---

    /// Start sampling at the configured interval. Returns false if already running.
    pub fn start(&self) -> Result<bool> {
        let interval_ms = self.state().config.sample_interval_ms;
        self.start_with_interval(interval_ms)
    }

    /// Start sampling every `interval_ms`. No-op (false) if already running.
    pub fn start_with_interval(&self, interval_ms: u64) -> Result<bool> {
        if interval_ms == 0 {
            return Err(ProfilerError::InvalidConfig(
                "sample interval must be > 0".into(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ProfilerError::NoRuntime)?;
        let mut state = self.state();
        if state.running {
            return Ok(false);
        }
        state.config.sample_interval_ms = interval_ms;
        state.running = true;
        state.generation += 1;
        if let Some(hook) = state.hook.clone() {
            state.observers = Some(self.install_observers(hook));
        }
        state.sampler = Some(sampler::spawn(
            &runtime,
            Arc::downgrade(&self.inner),
            interval_ms,
            state.generation,
        ));
        tracing::info!(interval_ms, "profiler started");
        Ok(true)
    }

    /// Stop sampling and restore the host callbacks. No tick mutates state
    /// after this returns. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        let mut state = self.state();
        if !state.running {
            return false;
        }
        state.running = false;
        state.generation += 1;
        if let Some(sampler) = state.sampler.take() {
            sampler.cancel();
        }
        if let Some(observers) = state.observers.take() {
            observers.uninstall();
        }
        tracing::info!("profiler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    fn install_observers(&self, hook: Arc<dyn IntrospectionHook>) -> ObserverGuard {
        let on_commit = Arc::downgrade(&self.inner);
        let on_unmount = Arc::downgrade(&self.inner);
        ObserverGuard::install(
            hook,
            move |tree: &ComponentTree| {
                if let Some(inner) = Weak::upgrade(&on_commit) {
                    inner.on_host_event(HostEvent::Commit(tree.clone()));
                }
            },
            move |node: &ComponentNode| {
                if let Some(inner) = Weak::upgrade(&on_unmount) {
                    inner.on_host_event(HostEvent::Unmount(node.clone()));
                }
            },
        )
    }

    /// Run one tick now, outside the timer. Works whether or not sampling is running.
    pub fn sample_now(&self) -> MemoryMeasurement {
        let measurement = {
            let mut state = self.state();
            let events = self.inner.take_host_events();
            let now = now_ms();
            state.process_host_events(events, now);
            state.sample(now)
        };
        let _ = self.inner.measurements_tx.send(measurement);
        measurement
    }

    /// Feed a measurement from outside (replay, tests, hosts that push).
    /// Runs the same analysis passes as a tick.
    pub fn record_measurement(&self, measurement: MemoryMeasurement) -> MemoryMeasurement {
        let recorded = {
            let mut state = self.state();
            let now = measurement.timestamp;
            let events = self.inner.take_host_events();
            state.process_host_events(events, now);
            let recorded = state.record_measurement(measurement);
            state.run_analysis(now);
            recorded
        };
        let _ = self.inner.measurements_tx.send(recorded);
        recorded
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MemoryMeasurement> {
        self.inner.measurements_tx.subscribe()
    }

    /// Clear all history and derived records. Config and run state are kept.
    pub fn reset(&self) {
        let mut state = self.state();
        let config = state.config.clone();
        state.store.reset(&config);
        state.analyzer.reset();
        state.detector.reset();
        state.alerts.reset();
        state.current_route = None;
        drop(state);
        self.inner.take_host_events();
        tracing::info!("profiler reset");
    }

    // --- config ---

    pub fn config(&self) -> ProfilerConfig {
        self.state().config.clone()
    }

    /// Merge a partial update. A running sampler restarts if the interval changed.
    pub fn update_config(&self, patch: &ConfigPatch) -> Result<ProfilerConfig> {
        let mut state = self.state();
        let next = state.config.merge(patch)?;
        self.apply_config(&mut state, next);
        Ok(state.config.clone())
    }

    fn apply_config(&self, state: &mut ProfilerState, next: ProfilerConfig) {
        let interval_changed = next.sample_interval_ms != state.config.sample_interval_ms;
        state.store.apply_caps(&next);
        state.analyzer.set_max_passes(next.max_attribution_passes);
        state.alerts.set_max_alerts(next.max_alerts);
        state.config = next;
        if interval_changed && state.running {
            self.restart_sampler(state);
        }
    }

    fn restart_sampler(&self, state: &mut ProfilerState) {
        let runtime = match state.sampler.take() {
            Some(old) => {
                let runtime = old.runtime().clone();
                old.cancel();
                runtime
            }
            None => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => runtime,
                Err(_) => {
                    tracing::warn!("no runtime to restart the sampler; keeping the old interval");
                    return;
                }
            },
        };
        state.generation += 1;
        state.sampler = Some(sampler::spawn(
            &runtime,
            Arc::downgrade(&self.inner),
            state.config.sample_interval_ms,
            state.generation,
        ));
        tracing::info!(
            interval_ms = state.config.sample_interval_ms,
            "sampler restarted with new interval"
        );
    }

    // --- host input ---

    /// Manual registration for hosts without an introspection hook.
    pub fn commit_tree(&self, tree: ComponentTree) {
        let events = self.inner.take_host_events();
        let mut state = self.state();
        let now = now_ms();
        state.process_host_events(events, now);
        state.process_host_events(vec![HostEvent::Commit(tree)], now);
    }

    pub fn notify_unmount(&self, node: ComponentNode) {
        self.state()
            .process_host_events(vec![HostEvent::Unmount(node)], now_ms());
    }

    pub fn record_event(
        &self,
        type_: TimelineEventType,
        description: impl Into<String>,
        memory_impact: Option<i64>,
    ) {
        let description = description.into();
        let mut state = self.state();
        if type_ == TimelineEventType::Navigation {
            state.current_route = Some(description.clone());
        }
        state.store.push_event(TimelineEvent {
            timestamp: now_ms(),
            type_,
            description,
            memory_impact,
        });
    }

    pub fn record_performance_entry(&self, entry: &PerformanceEntry) {
        self.state().store.performance_mut().apply(entry);
    }

    /// Best effort. Returns false (and logs) when the host cannot collect.
    pub fn force_gc(&self) -> bool {
        let heap = self.state().heap.clone();
        let collected = heap.force_gc();
        if !collected {
            tracing::warn!(operation = "force_gc", "garbage collection not supported by host");
        }
        collected
    }

    // --- alerts and suggestions ---

    pub fn add_alert(
        &self,
        type_: AlertType,
        message: impl Into<String>,
        severity: AlertSeverity,
    ) -> Option<Alert> {
        self.state().alerts.add_alert(type_, message, severity, now_ms())
    }

    pub fn dismiss_alert(&self, id: &str) -> bool {
        self.state().alerts.dismiss(id)
    }

    pub fn clear_alerts(&self) {
        self.state().alerts.clear_all();
    }

    pub fn dismiss_suggestion(&self, id: &str) -> bool {
        self.state().store.dismiss_suggestion(id)
    }

    // --- snapshots ---

    pub fn create_snapshot(&self, name: &str) -> Snapshot {
        let snapshot = self.state().store.create_snapshot(name, now_ms());
        tracing::info!(id = %snapshot.id, name, "snapshot created");
        snapshot
    }

    pub fn delete_snapshot(&self, id: &str) -> Result<()> {
        if self.state().store.delete_snapshot(id) {
            Ok(())
        } else {
            Err(ProfilerError::SnapshotNotFound(id.to_string()))
        }
    }

    // --- export / import ---

    pub fn export_document(&self) -> ExportDocument {
        let state = self.state();
        ExportDocument {
            config: state.config.clone(),
            timeline: state.store.timeline(),
            components: state.store.components().values().cloned().collect(),
            hooks: state.store.hooks().to_vec(),
            snapshots: state.store.snapshots().to_vec(),
            leaks: state.store.leaks().cloned().collect(),
            leak_patterns: state.store.leak_patterns().cloned().collect(),
            performance: state.store.performance().clone(),
            gc_events: state.store.gc_events().to_vec(),
            suggestions: state.store.suggestions().cloned().collect(),
            alerts: state.alerts.alerts().to_vec(),
            exported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn export_data(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_document())?)
    }

    /// Best-effort merge. A document that is not a JSON object fails without
    /// touching state; otherwise each section succeeds or fails on its own.
    pub fn import_data(&self, document: &str) -> Result<ImportReport> {
        let value: serde_json::Value = serde_json::from_str(document)
            .map_err(|e| ProfilerError::Import(format!("not valid JSON: {}", e)))?;
        self.import_value(value)
    }

    pub fn import_value(&self, document: serde_json::Value) -> Result<ImportReport> {
        let serde_json::Value::Object(mut map) = document else {
            return Err(ProfilerError::Import(
                "document must be a JSON object".into(),
            ));
        };
        let mut report = ImportReport::default();
        let mut state = self.state();

        // config first so caps apply to everything imported after it
        if let Some(config) = map.remove(sections::CONFIG) {
            match serde_json::from_value::<ProfilerConfig>(config)
                .map_err(|e| e.to_string())
                .and_then(|c| c.validate().map(|_| c).map_err(|e| e.to_string()))
            {
                Ok(next) => {
                    self.apply_config(&mut state, next);
                    report.applied.push(sections::CONFIG.to_string());
                }
                Err(e) => report.failed.push((sections::CONFIG.to_string(), e)),
            }
        }

        for (key, value) in map {
            match state.import_section(&key, value) {
                Ok(true) => report.applied.push(key),
                Ok(false) => report.unrecognized.push(key),
                Err(e) => report.failed.push((key, e)),
            }
        }
        tracing::info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            unrecognized = report.unrecognized.len(),
            "import complete"
        );
        Ok(report)
    }

    // --- queries ---

    pub fn capability(&self) -> Capability {
        let state = self.state();
        Capability {
            heap_stats: state.heap.is_supported(),
            introspection: state.hook.is_some(),
        }
    }

    pub fn timeline(&self) -> Timeline {
        self.state().store.timeline()
    }

    pub fn latest_measurement(&self) -> Option<MemoryMeasurement> {
        self.state().store.latest_measurement().copied()
    }

    pub fn components(&self) -> Vec<ComponentMemoryInfo> {
        self.state().store.components().values().cloned().collect()
    }

    /// Largest components by total memory, descending.
    pub fn top_components(&self, n: usize) -> Vec<ComponentMemoryInfo> {
        let mut all = self.components();
        all.sort_by(|a, b| b.total_memory.cmp(&a.total_memory).then(a.name.cmp(&b.name)));
        all.truncate(n);
        all
    }

    pub fn hooks(&self) -> Vec<HookMemoryInfo> {
        self.state().store.hooks().to_vec()
    }

    pub fn leaks(&self) -> Vec<MemoryLeak> {
        self.state().store.leaks().cloned().collect()
    }

    pub fn leak_patterns(&self) -> Vec<MemoryLeakPattern> {
        self.state().store.leak_patterns().cloned().collect()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.state().alerts.alerts().to_vec()
    }

    pub fn suggestions(&self) -> Vec<MemoryOptimizationSuggestion> {
        self.state().store.suggestions().cloned().collect()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.state().store.snapshots().to_vec()
    }

    pub fn gc_events(&self) -> Vec<GcEvent> {
        self.state().store.gc_events().to_vec()
    }

    pub fn performance(&self) -> PerformanceMetrics {
        self.state().store.performance().clone()
    }

    pub fn memory_trend(&self) -> Trend {
        let state = self.state();
        detector::memory_trend(state.store.measurements(), &state.config)
    }

    /// Recomputed from current usage on every call.
    pub fn budget_violations(&self) -> Vec<BudgetViolation> {
        let state = self.state();
        alerts::budget_violations(
            &state.config.budgets,
            state.store.components(),
            state.store.latest_measurement(),
            state.current_route.as_deref(),
        )
    }
}

impl ProfilerState {
    /// Pull one heap reading and run every analysis pass.
    fn sample(&mut self, now: u64) -> MemoryMeasurement {
        let raw = self.heap.read().unwrap_or_default();
        let measurement = self.record_measurement(MemoryMeasurement {
            timestamp: now,
            heap_used: raw.heap_used.unwrap_or(0),
            heap_size: raw.heap_size.unwrap_or(0),
            heap_limit: raw.heap_limit.unwrap_or(0),
        });

        if self.config.enable_component_tracking
            && let Some(tree) = self.hook.as_ref().and_then(|h| h.current_tree())
        {
            self.attribute(&tree, now);
        }
        self.run_analysis(now);
        tracing::debug!(
            heap_used = measurement.heap_used,
            components = self.store.components().len(),
            "tick"
        );
        measurement
    }

    fn record_measurement(&mut self, measurement: MemoryMeasurement) -> MemoryMeasurement {
        let previous = self.store.latest_measurement().copied();
        let recorded = self.store.push_measurement(measurement);
        if self.config.enable_gc_observation
            && let Some(prev) = previous
        {
            self.observe_gc(&prev, &recorded);
        }
        recorded
    }

    /// Infer a collection from a drop in heap usage between two samples.
    fn observe_gc(&mut self, prev: &MemoryMeasurement, cur: &MemoryMeasurement) {
        let reclaimed = prev.heap_used.saturating_sub(cur.heap_used);
        if reclaimed == 0 || reclaimed < self.config.gc_min_reclaim_bytes {
            return;
        }
        let type_ = if reclaimed as f64 >= MAJOR_GC_RATIO * prev.heap_used as f64 {
            GcEventType::Major
        } else {
            GcEventType::Minor
        };
        self.store.push_gc_event(GcEvent {
            timestamp: cur.timestamp,
            type_,
            duration: cur.timestamp.saturating_sub(prev.timestamp),
            memory_before: prev.heap_used,
            memory_after: cur.heap_used,
            memory_reclaimed: reclaimed,
        });
        self.store.push_event(TimelineEvent {
            timestamp: cur.timestamp,
            type_: TimelineEventType::Gc,
            description: format!("{:?} GC reclaimed {} bytes", type_, reclaimed),
            memory_impact: Some(-(reclaimed as i64)),
        });
    }

    fn process_host_events(&mut self, events: Vec<HostEvent>, now: u64) {
        for event in events {
            match event {
                HostEvent::Commit(tree) => {
                    if self.config.enable_component_tracking {
                        self.attribute(&tree, now);
                    }
                }
                HostEvent::Unmount(node) => {
                    self.store.push_event(TimelineEvent {
                        timestamp: now,
                        type_: TimelineEventType::Unmount,
                        description: format!("{} unmounted", node.name),
                        memory_impact: None,
                    });
                    if self.config.enable_leak_detection {
                        self.detector.schedule_unmount_check(
                            &node,
                            self.config.unmount_recheck_delay_ms,
                            now,
                        );
                    }
                }
            }
        }
    }

    fn attribute(&mut self, tree: &ComponentTree, now: u64) {
        let had_previous = !self.analyzer.history().is_empty();
        let AttributionResult {
            components,
            hooks,
            node_count,
        } = self.analyzer.analyze(tree, &self.config, now);

        if had_previous {
            let mounted: Vec<String> = components
                .keys()
                .filter(|name| !self.store.components().contains_key(*name))
                .cloned()
                .collect();
            for name in mounted {
                let impact = components.get(&name).map(|c| c.total_memory as i64);
                self.store.push_event(TimelineEvent {
                    timestamp: now,
                    type_: TimelineEventType::Mount,
                    description: format!("{} mounted", name),
                    memory_impact: impact,
                });
            }
        }

        self.store.performance_mut().component_count = node_count;
        self.store.replace_components(components, hooks);
    }

    /// Leak detection, alert evaluation and suggestions for the current state.
    fn run_analysis(&mut self, now: u64) {
        if self.config.enable_leak_detection {
            let hook = self.hook.clone();
            let leaks = self.detector.run_due_checks(hook.as_deref(), now);
            for leak in leaks {
                let message = format!(
                    "{} leak: {}",
                    leak.type_.label(),
                    leak.description
                );
                if self.store.upsert_leak(leak) {
                    self.alerts
                        .add_alert(AlertType::LeakDetected, message, AlertSeverity::Warning, now);
                }
            }

            let patterns = self.detector.detect_patterns(
                self.analyzer.history(),
                self.store.components(),
                self.store.hooks(),
                self.store.measurements(),
                &self.config,
                now,
            );
            let active: HashSet<String> = patterns.iter().map(|p| p.id.clone()).collect();
            for pattern in patterns {
                let alert_message = (pattern.confidence >= PATTERN_ALERT_CONFIDENCE).then(|| {
                    let names: Vec<&str> = pattern
                        .affected_components
                        .iter()
                        .map(String::as_str)
                        .collect();
                    format!(
                        "Possible {} leak in {}",
                        pattern.pattern.as_str(),
                        names.join(", ")
                    )
                });
                if self.store.upsert_leak_pattern(pattern)
                    && let Some(message) = alert_message
                {
                    self.alerts
                        .add_alert(AlertType::LeakDetected, message, AlertSeverity::Warning, now);
                }
            }
            let resolved = self.store.retain_leak_patterns(&active);
            if resolved > 0 {
                tracing::debug!(resolved, "leak patterns no longer detected");
            }
        }

        let conditions = alerts::evaluate_conditions(
            &self.config,
            self.store.components(),
            self.store.latest_measurement(),
            self.store.performance(),
            self.current_route.as_deref(),
        );
        self.alerts.apply_conditions(&conditions, now);

        if self.config.enable_suggestions {
            for s in suggestions::generate(self.store.components(), self.store.hooks(), &self.config)
            {
                self.store.upsert_suggestion(s);
            }
        }
    }

    /// Ok(true) applied, Ok(false) unrecognized key, Err parse failure.
    fn import_section(
        &mut self,
        key: &str,
        value: serde_json::Value,
    ) -> std::result::Result<bool, String> {
        fn parse<T: serde::de::DeserializeOwned>(
            v: serde_json::Value,
        ) -> std::result::Result<T, String> {
            serde_json::from_value(v).map_err(|e| e.to_string())
        }
        match key {
            sections::TIMELINE => self.store.import_timeline(parse(value)?),
            sections::COMPONENTS => self.store.import_components(parse(value)?),
            sections::HOOKS => self.store.import_hooks(parse(value)?),
            sections::SNAPSHOTS => {
                for s in parse::<Vec<Snapshot>>(value)? {
                    self.store.upsert_snapshot(s);
                }
            }
            sections::LEAKS => {
                for l in parse::<Vec<MemoryLeak>>(value)? {
                    self.store.upsert_leak(l);
                }
            }
            sections::LEAK_PATTERNS => {
                for p in parse::<Vec<MemoryLeakPattern>>(value)? {
                    self.store.upsert_leak_pattern(p);
                }
            }
            sections::PERFORMANCE => self.store.set_performance(parse(value)?),
            sections::GC_EVENTS => self.store.import_gc_events(parse(value)?),
            sections::SUGGESTIONS => {
                for s in parse::<Vec<MemoryOptimizationSuggestion>>(value)? {
                    self.store.upsert_suggestion(s);
                }
            }
            sections::ALERTS => {
                for a in parse::<Vec<Alert>>(value)? {
                    self.alerts.import_alert(a);
                }
            }
            sections::EXPORTED_AT => {}
            _ => return Ok(false),
        }
        Ok(true)
    }
}
