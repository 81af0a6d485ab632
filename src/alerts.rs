// Budget evaluation and the alert log. `add_alert` is the only way in, so
// dedup and the history cap are enforced in one place.

use std::collections::{BTreeMap, HashSet};

use crate::bounded::BoundedVec;
use crate::config::ProfilerConfig;
use crate::models::{
    Alert, AlertSeverity, AlertType, BudgetViolation, ComponentMemoryInfo, MemoryBudget,
    MemoryMeasurement, PerformanceMetrics, bytes_to_mb,
};

/// Condition observed on one evaluation pass. Messages name the target and
/// threshold only, so a persisting condition keeps the same (type, message).
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCondition {
    pub type_: AlertType,
    pub message: String,
    pub severity: AlertSeverity,
}

/// Alert types whose conditions are re-evaluated on every measurement.
/// Their suppression lifts once the condition is absent from a pass.
const EVALUATED_TYPES: [AlertType; 3] = [
    AlertType::BudgetExceeded,
    AlertType::MemoryLimit,
    AlertType::PerformanceDegraded,
];

pub struct AlertManager {
    alerts: BoundedVec<Alert>,
    /// Dismissed (type, message) pairs; not re-raised while the condition persists.
    dismissed: HashSet<(AlertType, String)>,
    next_id: u64,
}

impl AlertManager {
    pub fn new(max_alerts: usize) -> Self {
        Self {
            alerts: BoundedVec::new(max_alerts),
            dismissed: HashSet::new(),
            next_id: 1,
        }
    }

    pub fn set_max_alerts(&mut self, max_alerts: usize) {
        self.alerts.set_capacity(max_alerts);
    }

    pub fn alerts(&self) -> &BoundedVec<Alert> {
        &self.alerts
    }

    pub fn reset(&mut self) {
        self.alerts.clear();
        self.dismissed.clear();
    }

    /// Record an alert unless an undismissed one with the same (type, message)
    /// exists or that pair was dismissed. Returns the new alert if recorded.
    pub fn add_alert(
        &mut self,
        type_: AlertType,
        message: impl Into<String>,
        severity: AlertSeverity,
        now: u64,
    ) -> Option<Alert> {
        let message = message.into();
        if self
            .alerts
            .iter()
            .any(|a| a.type_ == type_ && a.message == message)
        {
            return None;
        }
        if self.dismissed.contains(&(type_, message.clone())) {
            return None;
        }
        let alert = Alert {
            id: format!("alert-{}-{}", now, self.next_id),
            type_,
            message,
            severity,
            timestamp: now,
        };
        self.next_id += 1;
        if let Some(evicted) = self.alerts.push(alert.clone()) {
            tracing::debug!(operation = "add_alert", evicted = %evicted.id, "alert history full");
        }
        tracing::info!(
            alert_type = ?alert.type_,
            severity = ?alert.severity,
            message = %alert.message,
            "alert raised"
        );
        Some(alert)
    }

    /// Keep an imported alert as-is (id and timestamp preserved) unless it
    /// duplicates an active one.
    pub fn import_alert(&mut self, alert: Alert) -> bool {
        if self
            .alerts
            .iter()
            .any(|a| a.id == alert.id || (a.type_ == alert.type_ && a.message == alert.message))
        {
            return false;
        }
        self.alerts.push(alert);
        true
    }

    /// Terminal: the same (type, message) is not raised again until its
    /// condition resolves or its message changes.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let Some(alert) = self.alerts.iter().find(|a| a.id == id).cloned() else {
            return false;
        };
        self.alerts.retain(|a| a.id != id);
        self.dismissed.insert((alert.type_, alert.message));
        true
    }

    pub fn clear_all(&mut self) {
        for a in self.alerts.iter() {
            self.dismissed.insert((a.type_, a.message.clone()));
        }
        self.alerts.clear();
    }

    /// Apply one pass of evaluated conditions: lift suppression for resolved
    /// conditions, then raise whatever is new.
    pub fn apply_conditions(&mut self, conditions: &[AlertCondition], now: u64) -> Vec<Alert> {
        let active: HashSet<(AlertType, &str)> = conditions
            .iter()
            .map(|c| (c.type_, c.message.as_str()))
            .collect();
        self.dismissed.retain(|(t, m)| {
            !EVALUATED_TYPES.contains(t) || active.contains(&(*t, m.as_str()))
        });
        conditions
            .iter()
            .filter_map(|c| self.add_alert(c.type_, c.message.clone(), c.severity, now))
            .collect()
    }
}

/// Current usage in MB for a budget, or `None` when it does not apply now
/// (a route budget while another route is active).
fn budget_usage_mb(
    budget: &MemoryBudget,
    components: &BTreeMap<String, ComponentMemoryInfo>,
    latest: Option<&MemoryMeasurement>,
    current_route: Option<&str>,
) -> Option<f64> {
    match (&budget.component, &budget.route) {
        (Some(c), _) => Some(
            components
                .get(c)
                .map(|info| bytes_to_mb(info.total_memory))
                .unwrap_or(0.0),
        ),
        (None, Some(r)) => {
            if current_route == Some(r.as_str()) {
                Some(latest.map(|m| bytes_to_mb(m.heap_used)).unwrap_or(0.0))
            } else {
                None
            }
        }
        (None, None) => Some(latest.map(|m| bytes_to_mb(m.heap_used)).unwrap_or(0.0)),
    }
}

/// Recomputed from current usage on every call.
pub fn budget_violations(
    budgets: &[MemoryBudget],
    components: &BTreeMap<String, ComponentMemoryInfo>,
    latest: Option<&MemoryMeasurement>,
    current_route: Option<&str>,
) -> Vec<BudgetViolation> {
    budgets
        .iter()
        .filter_map(|b| {
            let usage = budget_usage_mb(b, components, latest, current_route)?;
            (usage > b.budget_mb).then(|| BudgetViolation {
                budget: b.clone(),
                current_usage_mb: usage,
                exceeded_by_mb: usage - b.budget_mb,
            })
        })
        .collect()
}

/// Every alert condition that holds right now.
pub fn evaluate_conditions(
    config: &ProfilerConfig,
    components: &BTreeMap<String, ComponentMemoryInfo>,
    latest: Option<&MemoryMeasurement>,
    performance: &PerformanceMetrics,
    current_route: Option<&str>,
) -> Vec<AlertCondition> {
    let mut out = Vec::new();
    for b in &config.budgets {
        let Some(usage) = budget_usage_mb(b, components, latest, current_route) else {
            continue;
        };
        if usage > b.budget_mb {
            out.push(AlertCondition {
                type_: AlertType::BudgetExceeded,
                message: format!("{} exceeds memory budget of {:.1}MB", b.target(), b.budget_mb),
                severity: AlertSeverity::Error,
            });
        } else if b.warning_threshold_mb > 0.0 && usage > b.warning_threshold_mb {
            out.push(AlertCondition {
                type_: AlertType::BudgetExceeded,
                message: format!(
                    "{} is above warning threshold {:.1}MB (budget {:.1}MB)",
                    b.target(),
                    b.warning_threshold_mb,
                    b.budget_mb
                ),
                severity: AlertSeverity::Warning,
            });
        }
    }

    if let Some(m) = latest
        && m.heap_limit > 0
        && m.heap_used as f64 >= config.memory_limit_ratio * m.heap_limit as f64
    {
        out.push(AlertCondition {
            type_: AlertType::MemoryLimit,
            message: format!(
                "Heap usage is above {:.0}% of the {:.1}MB limit",
                config.memory_limit_ratio * 100.0,
                bytes_to_mb(m.heap_limit)
            ),
            severity: AlertSeverity::Error,
        });
    }

    if performance.render_time > config.slow_render_ms {
        out.push(AlertCondition {
            type_: AlertType::PerformanceDegraded,
            message: format!("Render time exceeds {:.1}ms threshold", config.slow_render_ms),
            severity: AlertSeverity::Warning,
        });
    }
    out
}
