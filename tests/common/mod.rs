// Shared test helpers: scripted heap provider, fake introspection host, tree builders
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use memscope::config::ProfilerConfig;
use memscope::heap_repo::{HeapProvider, RawHeapSample};
use memscope::introspection::{
    CommitCallback, ComponentNode, ComponentTree, HookRecord, IntrospectionHook, ResourceKind,
    UnmountCallback,
};
use memscope::models::{HookKind, MemoryMeasurement};

pub const MB: u64 = 1024 * 1024;

/// Heap provider returning whatever the test last set.
pub struct FakeHeap {
    current: Mutex<Option<RawHeapSample>>,
    reads: AtomicUsize,
    pub supports_gc: bool,
}

impl FakeHeap {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Some(RawHeapSample {
                heap_used: Some(10 * MB),
                heap_size: Some(20 * MB),
                heap_limit: Some(100 * MB),
            })),
            reads: AtomicUsize::new(0),
            supports_gc: false,
        }
    }

    pub fn with_gc() -> Self {
        Self {
            supports_gc: true,
            ..Self::new()
        }
    }

    pub fn set_used(&self, used: u64) {
        let mut cur = self.current.lock().unwrap();
        let mut sample = cur.unwrap_or_default();
        sample.heap_used = Some(used);
        *cur = Some(sample);
    }

    pub fn set(&self, sample: Option<RawHeapSample>) {
        *self.current.lock().unwrap() = sample;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl HeapProvider for FakeHeap {
    fn is_supported(&self) -> bool {
        true
    }

    fn read(&self) -> Option<RawHeapSample> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap()
    }

    fn force_gc(&self) -> bool {
        self.supports_gc
    }
}

/// Introspection host with replaceable callbacks, like a devtools global hook.
#[derive(Default)]
pub struct FakeHook {
    commit: Mutex<Option<CommitCallback>>,
    unmount: Mutex<Option<UnmountCallback>>,
    pub tree: Mutex<Option<ComponentTree>>,
    pub outstanding: Mutex<HashMap<String, Vec<ResourceKind>>>,
}

impl FakeHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the installed commit callback the way the host would.
    pub fn fire_commit(&self, tree: &ComponentTree) {
        let cb = self.commit.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb(tree);
        }
    }

    pub fn fire_unmount(&self, node: &ComponentNode) {
        let cb = self.unmount.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb(node);
        }
    }
}

impl IntrospectionHook for FakeHook {
    fn commit_callback(&self) -> Option<CommitCallback> {
        self.commit.lock().unwrap().clone()
    }

    fn set_commit_callback(&self, callback: Option<CommitCallback>) {
        *self.commit.lock().unwrap() = callback;
    }

    fn unmount_callback(&self) -> Option<UnmountCallback> {
        self.unmount.lock().unwrap().clone()
    }

    fn set_unmount_callback(&self, callback: Option<UnmountCallback>) {
        *self.unmount.lock().unwrap() = callback;
    }

    fn current_tree(&self) -> Option<ComponentTree> {
        self.tree.lock().unwrap().clone()
    }

    fn outstanding_resources(&self, component: &str) -> Option<Vec<ResourceKind>> {
        self.outstanding.lock().unwrap().get(component).cloned()
    }
}

pub fn measurement(timestamp: u64, heap_used: u64) -> MemoryMeasurement {
    MemoryMeasurement {
        timestamp,
        heap_used,
        heap_size: heap_used * 2,
        heap_limit: 1024 * MB,
    }
}

/// A node whose props serialize to roughly `bytes` estimated bytes.
pub fn sized_node(name: &str, bytes: u64) -> ComponentNode {
    // two bytes per char; the quotes add 2 chars
    let chars = (bytes / 2).saturating_sub(2) as usize;
    ComponentNode::new(name).with_props(serde_json::Value::String("x".repeat(chars)))
}

pub fn effect(resources: Vec<ResourceKind>, has_cleanup: bool) -> HookRecord {
    HookRecord {
        kind: HookKind::Effect,
        dependency_count: Some(0),
        has_cleanup,
        resources,
    }
}

pub fn tree(roots: Vec<ComponentNode>) -> ComponentTree {
    ComponentTree::new(roots)
}

/// Config with short delays so unmount checks are due on the next tick.
pub fn fast_config() -> ProfilerConfig {
    ProfilerConfig {
        unmount_recheck_delay_ms: 0,
        ..ProfilerConfig::default()
    }
}
