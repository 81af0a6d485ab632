// Component attribution: walk a tree snapshot, estimate per-node memory,
// aggregate by component name, classify trend against the previous pass and
// flag suspicious hooks.

use std::collections::{BTreeMap, BTreeSet};

use crate::bounded::BoundedVec;
use crate::config::ProfilerConfig;
use crate::introspection::{ComponentNode, ComponentTree, HookRecord, Payload};
use crate::models::{ComponentMemoryInfo, HookMemoryInfo, Trend};
use crate::trend::delta_trend;

/// Fixed cost of any component instance (fiber bookkeeping, closures).
pub const BASE_COMPONENT_BYTES: u64 = 1024;
/// Used when a payload cannot be serialized.
pub const FALLBACK_PAYLOAD_BYTES: u64 = 1024;
/// Payloads nested deeper than this are treated as unserializable.
pub const MAX_PAYLOAD_DEPTH: usize = 64;
/// Dependency arrays longer than this are flagged.
pub const MAX_HOOK_DEPENDENCIES: usize = 10;

pub const FLAG_EMPTY_DEPS_NO_CLEANUP: &str = "empty-deps-without-cleanup";
pub const FLAG_EXCESSIVE_DEPS: &str = "excessive-dependencies";
pub const FLAG_EFFECT_NO_CLEANUP: &str = "effect-without-cleanup";

/// Per-name totals of one attribution pass, kept for the leak detector.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionPass {
    pub timestamp: u64,
    pub totals: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default)]
pub struct AttributionResult {
    pub components: BTreeMap<String, ComponentMemoryInfo>,
    pub hooks: Vec<HookMemoryInfo>,
    pub node_count: u32,
}

pub struct ComponentAnalyzer {
    history: BoundedVec<AttributionPass>,
}

impl ComponentAnalyzer {
    pub fn new(max_passes: usize) -> Self {
        Self {
            history: BoundedVec::new(max_passes),
        }
    }

    pub fn set_max_passes(&mut self, max_passes: usize) {
        self.history.set_capacity(max_passes);
    }

    pub fn history(&self) -> &BoundedVec<AttributionPass> {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// One full attribution pass. The result replaces the previous one wholesale.
    pub fn analyze(
        &mut self,
        tree: &ComponentTree,
        config: &ProfilerConfig,
        now: u64,
    ) -> AttributionResult {
        let mut acc: BTreeMap<String, Accumulated> = BTreeMap::new();
        let mut hooks = Vec::new();
        let mut node_count = 0u32;

        // Iterative DFS: host trees can be deep enough to matter for the stack.
        let mut stack: Vec<&ComponentNode> = tree.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            node_count += 1;
            let entry = acc.entry(node.name.clone()).or_default();
            entry.instances += 1;
            entry.total += estimate_node_size(node);
            for (index, hook) in node.hooks.iter().enumerate() {
                for r in &hook.resources {
                    entry.tags.insert(r.tag().to_string());
                }
                hooks.push(HookMemoryInfo {
                    component: node.name.clone(),
                    hook_index: index,
                    hook_type: hook.kind,
                    dependency_count: hook.dependency_count,
                    has_cleanup: hook.has_cleanup,
                    suspicious_patterns: hook_flags(hook),
                });
            }
            stack.extend(node.children.iter().rev());
        }

        let previous = self.history.last().map(|p| &p.totals);
        let mut components = BTreeMap::new();
        for (name, a) in acc {
            let prev_total = previous.and_then(|p| p.get(&name)).copied();
            let trend = match prev_total {
                Some(prev) => delta_trend(prev as f64, a.total as f64, config.trend_threshold),
                None => Trend::Stable,
            };
            let suspicious_growth = trend == Trend::Up
                && prev_total.is_some_and(|prev| a.total as f64 > config.growth_ratio * prev as f64);
            components.insert(
                name.clone(),
                ComponentMemoryInfo {
                    name,
                    instance_count: a.instances,
                    total_memory: a.total,
                    average_memory_per_instance: a.total / u64::from(a.instances.max(1)),
                    retained_objects: a.tags,
                    suspicious_growth,
                    trend,
                    last_updated: now,
                },
            );
        }

        self.history.push(AttributionPass {
            timestamp: now,
            totals: components
                .iter()
                .map(|(k, v)| (k.clone(), v.total_memory))
                .collect(),
        });

        AttributionResult {
            components,
            hooks,
            node_count,
        }
    }
}

#[derive(Default)]
struct Accumulated {
    instances: u32,
    total: u64,
    tags: BTreeSet<String>,
}

pub fn estimate_node_size(node: &ComponentNode) -> u64 {
    BASE_COMPONENT_BYTES + estimate_payload_size(&node.props) + estimate_payload_size(&node.state)
}

/// Two bytes per character of the serialized payload. Unserializable or
/// over-deep payloads get the fixed fallback; this never fails.
pub fn estimate_payload_size(payload: &Payload) -> u64 {
    match payload {
        Payload::Opaque => FALLBACK_PAYLOAD_BYTES,
        Payload::Json(serde_json::Value::Null) => 0,
        Payload::Json(value) => {
            if json_depth(value) > MAX_PAYLOAD_DEPTH {
                return FALLBACK_PAYLOAD_BYTES;
            }
            match serde_json::to_string(value) {
                Ok(s) => s.chars().count() as u64 * 2,
                Err(_) => FALLBACK_PAYLOAD_BYTES,
            }
        }
    }
}

fn json_depth(value: &serde_json::Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(value, 1usize)];
    while let Some((v, depth)) = stack.pop() {
        max = max.max(depth);
        if depth > MAX_PAYLOAD_DEPTH {
            break;
        }
        match v {
            serde_json::Value::Array(items) => stack.extend(items.iter().map(|i| (i, depth + 1))),
            serde_json::Value::Object(map) => stack.extend(map.values().map(|i| (i, depth + 1))),
            _ => {}
        }
    }
    max
}

/// Heuristic shape checks on a single hook record.
pub fn hook_flags(hook: &HookRecord) -> Vec<String> {
    let mut flags = Vec::new();
    let side_effect = hook.kind.is_side_effect();
    if side_effect && hook.dependency_count == Some(0) && !hook.has_cleanup {
        flags.push(FLAG_EMPTY_DEPS_NO_CLEANUP.to_string());
    }
    if hook.dependency_count.is_some_and(|n| n > MAX_HOOK_DEPENDENCIES) {
        flags.push(FLAG_EXCESSIVE_DEPS.to_string());
    }
    if side_effect && !hook.has_cleanup {
        flags.push(FLAG_EFFECT_NO_CLEANUP.to_string());
    }
    flags
}
