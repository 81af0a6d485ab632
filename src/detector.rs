// Leak pattern detection over attribution history, hook records and the
// timeline, plus post-unmount re-checks that produce discrete leak records.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::analyzer::{AttributionPass, FLAG_EFFECT_NO_CLEANUP};
use crate::bounded::BoundedVec;
use crate::config::ProfilerConfig;
use crate::introspection::{ComponentNode, IntrospectionHook, ResourceKind};
use crate::models::{
    ComponentMemoryInfo, HookMemoryInfo, LeakPatternKind, LeakSeverity, MemoryLeak,
    MemoryLeakPattern, MemoryMeasurement, Trend,
};
use crate::trend;

/// Pending unmount re-checks beyond this are dropped oldest-first.
const MAX_PENDING_CHECKS: usize = 256;

const WEIGHT_CONSISTENCY: f64 = 0.4;
const WEIGHT_MAGNITUDE: f64 = 0.3;
const WEIGHT_CORROBORATION: f64 = 0.3;

#[derive(Debug, Clone)]
struct UnmountCheck {
    component: String,
    /// Resource and whether its owning hook declared a cleanup.
    resources: Vec<(ResourceKind, bool)>,
    estimated_bytes: u64,
    due_at: u64,
}

pub struct LeakDetector {
    pending: BoundedVec<UnmountCheck>,
    /// Components with a resource confirmed still held after unmount.
    confirmed: HashMap<LeakPatternKind, BTreeSet<String>>,
}

impl Default for LeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LeakDetector {
    pub fn new() -> Self {
        Self {
            pending: BoundedVec::new(MAX_PENDING_CHECKS),
            confirmed: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.confirmed.clear();
    }

    pub fn pending_checks(&self) -> usize {
        self.pending.len()
    }

    /// Queue a follow-up check for a component that just unmounted.
    /// Components that held no resources are not tracked.
    pub fn schedule_unmount_check(&mut self, node: &ComponentNode, delay_ms: u64, now: u64) {
        let resources: Vec<(ResourceKind, bool)> = node
            .hooks
            .iter()
            .flat_map(|h| h.resources.iter().map(move |r| (*r, h.has_cleanup)))
            .collect();
        if resources.is_empty() {
            return;
        }
        self.pending.push(UnmountCheck {
            component: node.name.clone(),
            resources,
            estimated_bytes: crate::analyzer::estimate_node_size(node),
            due_at: now.saturating_add(delay_ms),
        });
    }

    /// Run every check that is due. The host is asked which resources are
    /// still outstanding; when it cannot tell, resources owned by hooks
    /// without a cleanup are presumed retained.
    pub fn run_due_checks(
        &mut self,
        hook: Option<&dyn IntrospectionHook>,
        now: u64,
    ) -> Vec<MemoryLeak> {
        let mut due = Vec::new();
        self.pending.retain(|c| {
            if c.due_at <= now {
                due.push(c.clone());
                false
            } else {
                true
            }
        });

        let mut leaks = Vec::new();
        for check in due {
            let outstanding: Vec<ResourceKind> =
                match hook.and_then(|h| h.outstanding_resources(&check.component)) {
                    Some(still_held) => check
                        .resources
                        .iter()
                        .map(|(r, _)| *r)
                        .filter(|r| still_held.contains(r))
                        .collect(),
                    None => check
                        .resources
                        .iter()
                        .filter(|(_, has_cleanup)| !has_cleanup)
                        .map(|(r, _)| *r)
                        .collect(),
                };
            let mut seen = BTreeSet::new();
            for resource in outstanding {
                if !seen.insert(resource.tag()) {
                    continue;
                }
                self.confirmed
                    .entry(resource.pattern())
                    .or_default()
                    .insert(check.component.clone());
                leaks.push(unmount_leak(&check.component, resource, check.estimated_bytes, now));
            }
        }
        if !leaks.is_empty() {
            tracing::debug!(
                operation = "unmount_recheck",
                leaks = leaks.len(),
                "resources still held after unmount"
            );
        }
        leaks
    }

    /// Score every candidate pattern and keep the strongest per affected set.
    pub fn detect_patterns(
        &self,
        history: &BoundedVec<AttributionPass>,
        components: &BTreeMap<String, ComponentMemoryInfo>,
        hooks: &[HookMemoryInfo],
        measurements: &BoundedVec<MemoryMeasurement>,
        config: &ProfilerConfig,
        now: u64,
    ) -> Vec<MemoryLeakPattern> {
        let max_total = components
            .values()
            .map(|c| c.total_memory)
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        let all_total: u64 = components.values().map(|c| c.total_memory).sum();
        let samples: Vec<MemoryMeasurement> = measurements
            .tail(config.max_pattern_samples)
            .copied()
            .collect();

        let flagged: BTreeSet<&str> = hooks
            .iter()
            .filter(|h| h.suspicious_patterns.iter().any(|f| f == FLAG_EFFECT_NO_CLEANUP))
            .map(|h| h.component.as_str())
            .collect();

        let mut candidates: Vec<MemoryLeakPattern> = Vec::new();

        // growing-array: monotonic growth across the last N passes
        let window = config.growing_min_passes.max(2);
        for (name, info) in components {
            let Some(series) = component_series(history, name, window) else {
                continue;
            };
            let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
            if !trend::is_monotonic_non_decreasing(&values) || values.last() <= values.first() {
                continue;
            }
            let rate = series_rate(&series, config.sample_interval_ms);
            if rate < config.growing_min_rate_bytes_per_sec {
                continue;
            }
            let mut corroborating = 1.0;
            if flagged.contains(name.as_str()) {
                corroborating += 1.0;
            }
            if !info.retained_objects.is_empty() || info.suspicious_growth {
                corroborating += 1.0;
            }
            let confidence = score(
                trend::growth_consistency(&values),
                info.total_memory as f64 / max_total,
                corroborating / 3.0,
            );
            candidates.push(pattern(
                LeakPatternKind::GrowingArray,
                [name.clone()].into(),
                confidence,
                rate,
                now,
                samples.clone(),
            ));
        }

        // resource-backed patterns: listeners, timers, closures, DOM refs
        let mut by_kind: BTreeMap<LeakPatternKind, BTreeSet<String>> = BTreeMap::new();
        for hook in hooks {
            if !hook.suspicious_patterns.iter().any(|f| f == FLAG_EFFECT_NO_CLEANUP) {
                continue;
            }
            let Some(info) = components.get(&hook.component) else {
                continue;
            };
            for tag in &info.retained_objects {
                if let Some(kind) = pattern_for_tag(tag) {
                    by_kind.entry(kind).or_default().insert(hook.component.clone());
                }
            }
        }
        for (kind, names) in &self.confirmed {
            by_kind.entry(*kind).or_default().extend(names.iter().cloned());
        }

        for (kind, affected) in by_kind {
            let confirmed = self.confirmed.get(&kind);
            let mut consistency = 0.0;
            let mut rate = 0.0;
            let mut affected_total = 0u64;
            let mut corroboration = 0.0;
            for name in &affected {
                if let Some(series) = component_series(history, name, window) {
                    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
                    consistency += trend::growth_consistency(&values);
                    rate += series_rate(&series, config.sample_interval_ms).max(0.0);
                }
                affected_total += components.get(name).map(|c| c.total_memory).unwrap_or(0);
                let mut c = 0.0;
                if flagged.contains(name.as_str()) {
                    c += 1.0;
                }
                if components
                    .get(name)
                    .is_some_and(|i| i.retained_objects.iter().any(|t| pattern_for_tag(t) == Some(kind)))
                {
                    c += 1.0;
                }
                if confirmed.is_some_and(|s| s.contains(name)) {
                    c += 1.0;
                }
                corroboration += c / 3.0;
            }
            let n = affected.len().max(1) as f64;
            let magnitude = if all_total > 0 {
                affected_total as f64 / all_total as f64
            } else {
                0.0
            };
            let confidence = score(consistency / n, magnitude, corroboration / n);
            candidates.push(pattern(kind, affected, confidence, rate, now, samples.clone()));
        }

        // one pattern per affected-component set: the most confident wins
        let mut best: BTreeMap<BTreeSet<String>, MemoryLeakPattern> = BTreeMap::new();
        for c in candidates {
            match best.get(&c.affected_components) {
                Some(existing) if existing.confidence >= c.confidence => {}
                _ => {
                    best.insert(c.affected_components.clone(), c);
                }
            }
        }
        best.into_values().collect()
    }
}

/// Overall heap trend across the newest `trend_window` measurements.
pub fn memory_trend(measurements: &BoundedVec<MemoryMeasurement>, config: &ProfilerConfig) -> Trend {
    let recent: Vec<(f64, f64)> = measurements
        .tail(config.trend_window.max(2))
        .map(|m| (m.timestamp as f64 / 1000.0, m.heap_used as f64))
        .collect();
    if recent.len() < 2 {
        return Trend::Stable;
    }
    let rate = series_rate(&recent, config.sample_interval_ms);
    let values: Vec<f64> = recent.iter().map(|(_, v)| *v).collect();
    let reg = trend::linear_regression(&trend::indexed_points(&values));
    if rate.abs() < config.min_slope_bytes_per_sec || reg.r_squared < config.r_squared_floor {
        return Trend::Stable;
    }
    if rate > 0.0 { Trend::Up } else { Trend::Down }
}

pub fn pattern_id(kind: LeakPatternKind, affected: &BTreeSet<String>) -> String {
    let names: Vec<&str> = affected.iter().map(String::as_str).collect();
    format!("{}:{}", kind.as_str(), names.join(","))
}

fn pattern(
    kind: LeakPatternKind,
    affected: BTreeSet<String>,
    confidence: f64,
    rate: f64,
    now: u64,
    samples: Vec<MemoryMeasurement>,
) -> MemoryLeakPattern {
    MemoryLeakPattern {
        id: pattern_id(kind, &affected),
        pattern: kind,
        confidence,
        affected_components: affected,
        memory_growth_rate: rate,
        detected_at: now,
        samples,
    }
}

fn score(consistency: f64, magnitude: f64, corroboration: f64) -> f64 {
    (WEIGHT_CONSISTENCY * consistency
        + WEIGHT_MAGNITUDE * magnitude
        + WEIGHT_CORROBORATION * corroboration)
        .clamp(0.0, 1.0)
}

fn pattern_for_tag(tag: &str) -> Option<LeakPatternKind> {
    match tag {
        "event-listener" | "subscription" => Some(LeakPatternKind::EventListeners),
        "timer" => Some(LeakPatternKind::Timers),
        "closure" => Some(LeakPatternKind::Closures),
        "dom-ref" => Some(LeakPatternKind::DomRefs),
        _ => None,
    }
}

/// (seconds, total) for `name` over the newest `window` passes, only if the
/// component appears in every one of them.
fn component_series(
    history: &BoundedVec<AttributionPass>,
    name: &str,
    window: usize,
) -> Option<Vec<(f64, f64)>> {
    if history.len() < window {
        return None;
    }
    history
        .tail(window)
        .map(|p| p.totals.get(name).map(|t| (p.timestamp as f64 / 1000.0, *t as f64)))
        .collect()
}

/// Bytes per second. Uses real timestamps when they spread, otherwise
/// assumes one sample per interval.
fn series_rate(series: &[(f64, f64)], interval_ms: u64) -> f64 {
    let first = series.first().map(|p| p.0).unwrap_or(0.0);
    let last = series.last().map(|p| p.0).unwrap_or(0.0);
    if last > first {
        trend::linear_regression(series).slope
    } else {
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        trend::growth_rate_per_second(&values, interval_ms)
    }
}

fn unmount_leak(component: &str, resource: ResourceKind, estimated_bytes: u64, now: u64) -> MemoryLeak {
    let leak_type = resource.leak_type();
    let description = format!(
        "{} still held after {} unmounted",
        leak_type.label(),
        component
    );
    let recommendation = match resource {
        ResourceKind::EventListener => {
            "Remove the listener in the effect cleanup (removeEventListener with the same handler)"
        }
        ResourceKind::Timer => "Clear the timer in the effect cleanup (clearInterval/clearTimeout)",
        ResourceKind::Closure => {
            "Avoid capturing large values in long-lived callbacks; release references on unmount"
        }
        ResourceKind::DomRef => "Null out DOM references held outside the component on unmount",
        ResourceKind::Subscription => "Unsubscribe in the effect cleanup",
    };
    MemoryLeak {
        id: format!("{}:{}", component, description),
        type_: leak_type,
        component: Some(component.to_string()),
        description,
        severity: LeakSeverity::from_impact(estimated_bytes),
        detected_at: now,
        estimated_memory_impact: estimated_bytes,
        recommendation: recommendation.to_string(),
        auto_fix_available: matches!(
            resource,
            ResourceKind::EventListener | ResourceKind::Timer | ResourceKind::Subscription
        ),
    }
}
