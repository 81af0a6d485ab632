use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, Result};
use crate::models::MemoryBudget;

/// Binary config: server section plus the profiler defaults it starts with.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub profiler: ProfilerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Max number of measurements kept in the broadcast channel for /ws/memory (slow clients may lag).
    pub broadcast_capacity: usize,
    /// Start sampling as soon as the server is up.
    #[serde(default = "default_true")]
    pub autostart: bool,
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.server.broadcast_capacity > 0,
            "server.broadcast_capacity must be > 0, got {}",
            self.server.broadcast_capacity
        );
        self.profiler
            .validate()
            .map_err(|e| anyhow::anyhow!("profiler: {}", e))?;
        Ok(())
    }
}

/// Runtime profiler settings. One value per engine; changed only through
/// [`ProfilerConfig::merge`] with a [`ConfigPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilerConfig {
    pub sample_interval_ms: u64,

    pub max_measurements: usize,
    pub max_timeline_events: usize,
    pub max_gc_events: usize,
    pub max_alerts: usize,
    /// Measurements kept on each leak pattern.
    pub max_pattern_samples: usize,
    /// Attribution passes kept for the leak detector.
    pub max_attribution_passes: usize,
    /// Active leak patterns kept; the least confident go first.
    pub max_leak_patterns: usize,

    pub enable_component_tracking: bool,
    pub enable_leak_detection: bool,
    pub enable_gc_observation: bool,
    pub enable_suggestions: bool,

    pub budgets: Vec<MemoryBudget>,
    /// Fraction of the heap limit that raises a memory-limit alert.
    pub memory_limit_ratio: f64,
    /// Render time (ms) above which performance-degraded is raised.
    pub slow_render_ms: f64,

    /// Relative change for up/down in delta trends.
    pub trend_threshold: f64,
    pub r_squared_floor: f64,
    pub min_slope_bytes_per_sec: f64,
    /// Measurements used by the overall memory trend.
    pub trend_window: usize,
    /// Growth over the previous pass that marks a component suspicious.
    pub growth_ratio: f64,
    pub growing_min_passes: usize,
    pub growing_min_rate_bytes_per_sec: f64,
    pub unmount_recheck_delay_ms: u64,
    pub gc_min_reclaim_bytes: u64,

    #[serde(rename = "virtualizationMinMemoryMB")]
    pub virtualization_min_memory_mb: f64,
    pub virtualization_min_instances: u32,
    #[serde(rename = "lazyLoadMinMemoryMB")]
    pub lazy_load_min_memory_mb: f64,
    /// Share of current usage a virtualization suggestion expects to save.
    pub savings_fraction: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            max_measurements: 1000,
            max_timeline_events: 500,
            max_gc_events: 100,
            max_alerts: 100,
            max_pattern_samples: 50,
            max_attribution_passes: 20,
            max_leak_patterns: 50,
            enable_component_tracking: true,
            enable_leak_detection: true,
            enable_gc_observation: true,
            enable_suggestions: true,
            budgets: Vec::new(),
            memory_limit_ratio: 0.9,
            slow_render_ms: 50.0,
            trend_threshold: 0.05,
            r_squared_floor: 0.5,
            min_slope_bytes_per_sec: 1024.0,
            trend_window: 20,
            growth_ratio: 1.5,
            growing_min_passes: 5,
            growing_min_rate_bytes_per_sec: 512.0,
            unmount_recheck_delay_ms: 1000,
            gc_min_reclaim_bytes: 1024 * 1024,
            virtualization_min_memory_mb: 5.0,
            virtualization_min_instances: 50,
            lazy_load_min_memory_mb: 2.0,
            savings_fraction: 0.8,
        }
    }
}

/// Growth must hold over at least this many consecutive passes.
pub const MIN_GROWING_PASSES: usize = 5;

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(ProfilerError::InvalidConfig(msg()))
    }
}

impl ProfilerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure(self.sample_interval_ms > 0, || {
            format!("sampleIntervalMs must be > 0, got {}", self.sample_interval_ms)
        })?;
        ensure(self.max_measurements > 0, || {
            format!("maxMeasurements must be > 0, got {}", self.max_measurements)
        })?;
        ensure(self.max_timeline_events > 0, || {
            format!("maxTimelineEvents must be > 0, got {}", self.max_timeline_events)
        })?;
        ensure(self.max_gc_events > 0, || {
            format!("maxGcEvents must be > 0, got {}", self.max_gc_events)
        })?;
        ensure(self.max_alerts > 0, || {
            format!("maxAlerts must be > 0, got {}", self.max_alerts)
        })?;
        ensure(self.max_attribution_passes >= 2, || {
            format!(
                "maxAttributionPasses must be >= 2, got {}",
                self.max_attribution_passes
            )
        })?;
        ensure(self.max_leak_patterns > 0, || {
            format!("maxLeakPatterns must be > 0, got {}", self.max_leak_patterns)
        })?;
        ensure(
            self.growing_min_passes >= MIN_GROWING_PASSES
                && self.growing_min_passes <= self.max_attribution_passes,
            || {
                format!(
                    "growingMinPasses must be in [{}, maxAttributionPasses = {}], got {}",
                    MIN_GROWING_PASSES, self.max_attribution_passes, self.growing_min_passes
                )
            },
        )?;
        ensure(
            self.memory_limit_ratio > 0.0 && self.memory_limit_ratio <= 1.0,
            || format!("memoryLimitRatio must be in (0, 1], got {}", self.memory_limit_ratio),
        )?;
        ensure(
            (0.0..=1.0).contains(&self.r_squared_floor),
            || format!("rSquaredFloor must be in [0, 1], got {}", self.r_squared_floor),
        )?;
        ensure(self.trend_threshold > 0.0, || {
            format!("trendThreshold must be > 0, got {}", self.trend_threshold)
        })?;
        ensure(self.growth_ratio >= 1.0, || {
            format!("growthRatio must be >= 1, got {}", self.growth_ratio)
        })?;
        ensure(
            (0.0..=1.0).contains(&self.savings_fraction),
            || format!("savingsFraction must be in [0, 1], got {}", self.savings_fraction),
        )?;
        for b in &self.budgets {
            ensure(b.budget_mb > 0.0, || {
                format!("budget for {} must be > 0 MB, got {}", b.target(), b.budget_mb)
            })?;
        }
        Ok(())
    }

    /// Apply a partial update, returning the merged config if it validates.
    /// `self` is left untouched on error.
    pub fn merge(&self, patch: &ConfigPatch) -> Result<Self> {
        let mut next = self.clone();
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &patch.$field { next.$field = v.clone(); })*
            };
        }
        apply!(
            sample_interval_ms,
            max_measurements,
            max_timeline_events,
            max_gc_events,
            max_alerts,
            max_pattern_samples,
            max_attribution_passes,
            max_leak_patterns,
            enable_component_tracking,
            enable_leak_detection,
            enable_gc_observation,
            enable_suggestions,
            budgets,
            memory_limit_ratio,
            slow_render_ms,
            trend_threshold,
            r_squared_floor,
            min_slope_bytes_per_sec,
            trend_window,
            growth_ratio,
            growing_min_passes,
            growing_min_rate_bytes_per_sec,
            unmount_recheck_delay_ms,
            gc_min_reclaim_bytes,
            virtualization_min_memory_mb,
            virtualization_min_instances,
            lazy_load_min_memory_mb,
            savings_fraction,
        );
        next.validate()?;
        Ok(next)
    }
}

/// Partial config update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    pub sample_interval_ms: Option<u64>,
    pub max_measurements: Option<usize>,
    pub max_timeline_events: Option<usize>,
    pub max_gc_events: Option<usize>,
    pub max_alerts: Option<usize>,
    pub max_pattern_samples: Option<usize>,
    pub max_attribution_passes: Option<usize>,
    pub max_leak_patterns: Option<usize>,
    pub enable_component_tracking: Option<bool>,
    pub enable_leak_detection: Option<bool>,
    pub enable_gc_observation: Option<bool>,
    pub enable_suggestions: Option<bool>,
    pub budgets: Option<Vec<MemoryBudget>>,
    pub memory_limit_ratio: Option<f64>,
    pub slow_render_ms: Option<f64>,
    pub trend_threshold: Option<f64>,
    pub r_squared_floor: Option<f64>,
    pub min_slope_bytes_per_sec: Option<f64>,
    pub trend_window: Option<usize>,
    pub growth_ratio: Option<f64>,
    pub growing_min_passes: Option<usize>,
    pub growing_min_rate_bytes_per_sec: Option<f64>,
    pub unmount_recheck_delay_ms: Option<u64>,
    pub gc_min_reclaim_bytes: Option<u64>,
    #[serde(rename = "virtualizationMinMemoryMB")]
    pub virtualization_min_memory_mb: Option<f64>,
    pub virtualization_min_instances: Option<u32>,
    #[serde(rename = "lazyLoadMinMemoryMB")]
    pub lazy_load_min_memory_mb: Option<f64>,
    pub savings_fraction: Option<f64>,
}
