// Heap measurements, timeline events and inferred GC events

use serde::{Deserialize, Serialize};

/// One raw heap reading. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMeasurement {
    pub timestamp: u64,
    pub heap_used: u64,
    pub heap_size: u64,
    pub heap_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineEventType {
    Navigation,
    Mount,
    Unmount,
    Gc,
    UserAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub type_: TimelineEventType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_impact: Option<i64>,
}

/// Wire/export form of the timeline. The store keeps the bounded originals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub start_time: u64,
    pub end_time: u64,
    pub measurements: Vec<MemoryMeasurement>,
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GcEventType {
    Minor,
    Major,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcEvent {
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub type_: GcEventType,
    /// Milliseconds; inferred events use the gap between the two samples.
    pub duration: u64,
    pub memory_before: u64,
    pub memory_after: u64,
    pub memory_reclaimed: u64,
}
