// Budgets, derived violations and alerts

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertType {
    BudgetExceeded,
    LeakDetected,
    PerformanceDegraded,
    MemoryLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: AlertType,
    pub message: String,
    pub severity: AlertSeverity,
    pub timestamp: u64,
}

/// Memory ceiling for a component, a route, or (neither set) the whole heap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(rename = "budgetMB")]
    pub budget_mb: f64,
    /// 0 means no warning level.
    #[serde(default, rename = "warningThresholdMB")]
    pub warning_threshold_mb: f64,
}

impl MemoryBudget {
    pub fn target(&self) -> String {
        match (&self.component, &self.route) {
            (Some(c), _) => format!("component {}", c),
            (None, Some(r)) => format!("route {}", r),
            (None, None) => "heap".to_string(),
        }
    }
}

/// Computed on demand; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetViolation {
    pub budget: MemoryBudget,
    #[serde(rename = "currentUsageMB")]
    pub current_usage_mb: f64,
    #[serde(rename = "exceededByMB")]
    pub exceeded_by_mb: f64,
}
