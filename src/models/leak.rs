// Leak records and classified leak patterns

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::MemoryMeasurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeakType {
    EventListener,
    Timer,
    ClosureRetention,
    DomReference,
    Subscription,
}

impl LeakType {
    pub fn label(self) -> &'static str {
        match self {
            LeakType::EventListener => "event listener",
            LeakType::Timer => "timer",
            LeakType::ClosureRetention => "closure",
            LeakType::DomReference => "DOM reference",
            LeakType::Subscription => "subscription",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LeakSeverity {
    /// Severity from an estimated retained size in bytes.
    pub fn from_impact(bytes: u64) -> Self {
        match bytes {
            b if b >= 10 * 1024 * 1024 => LeakSeverity::Critical,
            b if b >= 1024 * 1024 => LeakSeverity::High,
            b if b >= 100 * 1024 => LeakSeverity::Medium,
            _ => LeakSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLeak {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: LeakType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub description: String,
    pub severity: LeakSeverity,
    pub detected_at: u64,
    pub estimated_memory_impact: u64,
    pub recommendation: String,
    pub auto_fix_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeakPatternKind {
    GrowingArray,
    EventListeners,
    Timers,
    Closures,
    DomRefs,
}

impl LeakPatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LeakPatternKind::GrowingArray => "growing-array",
            LeakPatternKind::EventListeners => "event-listeners",
            LeakPatternKind::Timers => "timers",
            LeakPatternKind::Closures => "closures",
            LeakPatternKind::DomRefs => "dom-refs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLeakPattern {
    pub id: String,
    pub pattern: LeakPatternKind,
    /// Heuristic score in [0, 1].
    pub confidence: f64,
    pub affected_components: BTreeSet<String>,
    /// Bytes per second.
    pub memory_growth_rate: f64,
    pub detected_at: u64,
    pub samples: Vec<MemoryMeasurement>,
}
