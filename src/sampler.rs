// Periodic sampling task. One per running profiler; a restart aborts it and
// spawns a new generation.

use std::sync::Weak;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval};

use crate::profiler::Inner;

/// Rate limit for the "no subscribers" debug line.
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) struct SamplerHandle {
    handle: JoinHandle<()>,
    runtime: Handle,
}

impl SamplerHandle {
    /// Runtime the task was spawned on; restarts reuse it so they work from
    /// threads outside any runtime.
    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Abort the task. Any tick already waiting on the state lock sees a
    /// stale generation and does nothing.
    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

pub(crate) fn spawn(
    runtime: &Handle,
    profiler: Weak<Inner>,
    interval_ms: u64,
    generation: u64,
) -> SamplerHandle {
    let handle = runtime.spawn(async move {
        let mut tick = interval(Duration::from_millis(interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_no_receivers_log: Option<Instant> = None;

        loop {
            tick.tick().await;
            // Profiler dropped without stop(): nothing left to sample for.
            let Some(inner) = profiler.upgrade() else {
                break;
            };
            let Some(measurement) = inner.run_scheduled_tick(generation) else {
                break;
            };
            if inner.subscriber_count() == 0 {
                let should_log =
                    last_no_receivers_log.is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL);
                if should_log {
                    tracing::debug!(
                        operation = "broadcast_measurement",
                        heap_used = measurement.heap_used,
                        "no active subscribers for measurements"
                    );
                    last_no_receivers_log = Some(Instant::now());
                }
            }
        }
        tracing::debug!(generation, "sampler exiting");
    });
    SamplerHandle {
        handle,
        runtime: runtime.clone(),
    }
}
