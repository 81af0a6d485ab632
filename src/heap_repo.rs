// Heap statistics providers. The engine pulls one RawHeapSample per tick.

use std::sync::Mutex;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::instrument;

/// Raw reading from the host. Absent fields are recorded as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawHeapSample {
    pub heap_used: Option<u64>,
    pub heap_size: Option<u64>,
    pub heap_limit: Option<u64>,
}

pub trait HeapProvider: Send + Sync {
    /// False when the host exposes no heap statistics at all.
    fn is_supported(&self) -> bool;

    /// One reading, or `None` if the host had nothing this time.
    fn read(&self) -> Option<RawHeapSample>;

    /// Ask the host to collect garbage. Returns false when unsupported.
    fn force_gc(&self) -> bool {
        false
    }
}

/// Provider for hosts without heap statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHeapProvider;

impl HeapProvider for NullHeapProvider {
    fn is_supported(&self) -> bool {
        false
    }

    fn read(&self) -> Option<RawHeapSample> {
        None
    }
}

/// Samples the current process via sysinfo: resident set as "used",
/// virtual size as "size", cgroup or physical memory as "limit".
pub struct ProcessHeapProvider {
    sys: Mutex<System>,
    pid: Option<Pid>,
}

impl Default for ProcessHeapProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHeapProvider {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, operation = "get_current_pid", "process memory unavailable");
                None
            }
        };
        Self {
            sys: Mutex::new(System::new()),
            pid,
        }
    }
}

impl HeapProvider for ProcessHeapProvider {
    fn is_supported(&self) -> bool {
        self.pid.is_some()
    }

    #[instrument(skip(self), fields(repo = "heap", operation = "read"))]
    fn read(&self) -> Option<RawHeapSample> {
        let pid = self.pid?;
        let mut sys = match self.sys.lock() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "sysinfo lock poisoned");
                return None;
            }
        };
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = sys.process(pid)?;
        let limit = sys
            .cgroup_limits()
            .map(|c| c.total_memory)
            .filter(|t| *t > 0)
            .unwrap_or_else(|| sys.total_memory());
        Some(RawHeapSample {
            heap_used: Some(process.memory()),
            heap_size: Some(process.virtual_memory()),
            heap_limit: Some(limit),
        })
    }
}
