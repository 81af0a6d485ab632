// Per-component attribution and hook-level records

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMemoryInfo {
    pub name: String,
    pub instance_count: u32,
    /// Estimated bytes across all live instances.
    pub total_memory: u64,
    pub average_memory_per_instance: u64,
    pub retained_objects: BTreeSet<String>,
    pub suspicious_growth: bool,
    pub trend: Trend,
    pub last_updated: u64,
}

/// Kind of hook record exposed by the host's introspection API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    State,
    Effect,
    LayoutEffect,
    Memo,
    Callback,
    Ref,
    Context,
    Other,
}

impl HookKind {
    /// Hooks that run side effects and may return a cleanup.
    pub fn is_side_effect(self) -> bool {
        matches!(self, HookKind::Effect | HookKind::LayoutEffect)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookMemoryInfo {
    pub component: String,
    pub hook_index: usize,
    pub hook_type: HookKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_count: Option<usize>,
    pub has_cleanup: bool,
    pub suspicious_patterns: Vec<String>,
}
