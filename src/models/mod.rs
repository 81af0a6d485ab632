// Domain models: measurements, attribution, leaks, alerts, suggestions, snapshots

mod alert;
mod component;
mod leak;
mod measurement;
mod snapshot;
mod suggestion;

pub use alert::{Alert, AlertSeverity, AlertType, BudgetViolation, MemoryBudget};
pub use component::{ComponentMemoryInfo, HookKind, HookMemoryInfo, Trend};
pub use leak::{LeakPatternKind, LeakSeverity, LeakType, MemoryLeak, MemoryLeakPattern};
pub use measurement::{
    GcEvent, GcEventType, MemoryMeasurement, Timeline, TimelineEvent, TimelineEventType,
};
pub use snapshot::{PerformanceEntry, PerformanceMetrics, Snapshot};
pub use suggestion::{Level, MemoryOptimizationSuggestion, SuggestionType};

/// Bytes per megabyte used for every MB figure the profiler reports.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
