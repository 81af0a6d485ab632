// Performance metrics and frozen snapshots

use serde::{Deserialize, Serialize};

use super::{ComponentMemoryInfo, GcEvent, HookMemoryInfo, MemoryLeak, MemoryMeasurement};

/// Paint/render timings pushed by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_contentful_paint: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub largest_contentful_paint: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_input_delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_layout_shift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_first_byte: Option<f64>,
    /// Duration of the most recent render/commit in milliseconds.
    #[serde(default)]
    pub render_time: f64,
    #[serde(default)]
    pub component_count: u32,
    #[serde(default)]
    pub rerender_count: u64,
}

/// One performance-timing entry as reported by the host (e.g. "paint", "largest-contentful-paint").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    pub name: String,
    pub entry_type: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl PerformanceMetrics {
    /// Fold one entry into the metrics; unknown entry types are ignored.
    pub fn apply(&mut self, entry: &PerformanceEntry) {
        match (entry.entry_type.as_str(), entry.name.as_str()) {
            ("paint", "first-contentful-paint") => {
                self.first_contentful_paint = Some(entry.start_time)
            }
            ("largest-contentful-paint", _) => self.largest_contentful_paint = Some(entry.start_time),
            ("first-input", _) => self.first_input_delay = Some(entry.duration),
            ("layout-shift", _) => {
                let v = entry.value.unwrap_or(0.0);
                self.cumulative_layout_shift = Some(self.cumulative_layout_shift.unwrap_or(0.0) + v);
            }
            ("navigation", _) => self.time_to_first_byte = entry.value.or(Some(entry.start_time)),
            ("render", _) | ("commit", _) => {
                self.render_time = entry.duration;
                self.rerender_count += 1;
            }
            _ => {}
        }
    }
}

/// Frozen composite of engine state. Everything is owned, so later mutation
/// of the live store cannot reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub timestamp: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryMeasurement>,
    pub components: Vec<ComponentMemoryInfo>,
    pub hooks: Vec<HookMemoryInfo>,
    pub leaks: Vec<MemoryLeak>,
    pub performance: PerformanceMetrics,
    pub gc_events: Vec<GcEvent>,
}
