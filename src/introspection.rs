// Host component-tree introspection: tree types, the hook trait the host
// implements, and observer install/uninstall with save-and-restore.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{HookKind, LeakPatternKind, LeakType};

/// Props/state payload as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Payload {
    Json(serde_json::Value),
    /// Host value that cannot be serialized (functions, native handles, cycles).
    Opaque,
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Json(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Json(v)
    }
}

/// Resource a hook acquired and is expected to release in its cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    EventListener,
    Timer,
    Closure,
    DomRef,
    Subscription,
}

impl ResourceKind {
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::EventListener => "event-listener",
            ResourceKind::Timer => "timer",
            ResourceKind::Closure => "closure",
            ResourceKind::DomRef => "dom-ref",
            ResourceKind::Subscription => "subscription",
        }
    }

    pub fn leak_type(self) -> LeakType {
        match self {
            ResourceKind::EventListener => LeakType::EventListener,
            ResourceKind::Timer => LeakType::Timer,
            ResourceKind::Closure => LeakType::ClosureRetention,
            ResourceKind::DomRef => LeakType::DomReference,
            ResourceKind::Subscription => LeakType::Subscription,
        }
    }

    /// Subscriptions are reported with listeners: both are callbacks registered on something that outlives the component.
    pub fn pattern(self) -> LeakPatternKind {
        match self {
            ResourceKind::EventListener | ResourceKind::Subscription => {
                LeakPatternKind::EventListeners
            }
            ResourceKind::Timer => LeakPatternKind::Timers,
            ResourceKind::Closure => LeakPatternKind::Closures,
            ResourceKind::DomRef => LeakPatternKind::DomRefs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookRecord {
    pub kind: HookKind,
    /// Length of the dependency array; `None` when the hook has none (runs every render).
    #[serde(default)]
    pub dependency_count: Option<usize>,
    #[serde(default)]
    pub has_cleanup: bool,
    #[serde(default)]
    pub resources: Vec<ResourceKind>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub name: String,
    #[serde(default)]
    pub props: Payload,
    #[serde(default)]
    pub state: Payload,
    #[serde(default)]
    pub hooks: Vec<HookRecord>,
    #[serde(default)]
    pub children: Vec<ComponentNode>,
}

impl ComponentNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_props(mut self, props: impl Into<Payload>) -> Self {
        self.props = props.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<Payload>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_hook(mut self, hook: HookRecord) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Opaque snapshot of the host's live component tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTree {
    pub roots: Vec<ComponentNode>,
}

impl ComponentTree {
    pub fn new(roots: Vec<ComponentNode>) -> Self {
        Self { roots }
    }
}

pub type CommitCallback = Arc<dyn Fn(&ComponentTree) + Send + Sync>;
pub type UnmountCallback = Arc<dyn Fn(&ComponentNode) + Send + Sync>;

/// Host instrumentation point. Other consumers may share the same callbacks,
/// so anything installed here must chain to what was there before.
pub trait IntrospectionHook: Send + Sync {
    fn commit_callback(&self) -> Option<CommitCallback>;
    fn set_commit_callback(&self, callback: Option<CommitCallback>);
    fn unmount_callback(&self) -> Option<UnmountCallback>;
    fn set_unmount_callback(&self, callback: Option<UnmountCallback>);

    /// Pull the current tree. `None` when the host has nothing to report.
    fn current_tree(&self) -> Option<ComponentTree> {
        None
    }

    /// Resources an unmounted component still holds, or `None` if the host cannot tell.
    fn outstanding_resources(&self, _component: &str) -> Option<Vec<ResourceKind>> {
        None
    }
}

/// Installed commit/unmount wrappers. Dropping the guard restores the
/// callbacks that were in place before installation, exactly.
pub struct ObserverGuard {
    hook: Arc<dyn IntrospectionHook>,
    previous_commit: Option<CommitCallback>,
    previous_unmount: Option<UnmountCallback>,
    installed: bool,
}

impl ObserverGuard {
    /// Wrap the host callbacks. `on_commit`/`on_unmount` run first; a panic
    /// in them is caught and logged, and the previous callback still runs.
    pub fn install<C, U>(hook: Arc<dyn IntrospectionHook>, on_commit: C, on_unmount: U) -> Self
    where
        C: Fn(&ComponentTree) + Send + Sync + 'static,
        U: Fn(&ComponentNode) + Send + Sync + 'static,
    {
        let previous_commit = hook.commit_callback();
        let previous_unmount = hook.unmount_callback();

        let chained_commit = previous_commit.clone();
        let commit: CommitCallback = Arc::new(move |tree: &ComponentTree| {
            if catch_unwind(AssertUnwindSafe(|| on_commit(tree))).is_err() {
                tracing::warn!(
                    operation = "commit_observer",
                    "profiler analysis panicked; commit ignored"
                );
            }
            if let Some(prev) = &chained_commit {
                prev(tree);
            }
        });

        let chained_unmount = previous_unmount.clone();
        let unmount: UnmountCallback = Arc::new(move |node: &ComponentNode| {
            if catch_unwind(AssertUnwindSafe(|| on_unmount(node))).is_err() {
                tracing::warn!(
                    operation = "unmount_observer",
                    component = %node.name,
                    "profiler analysis panicked; unmount ignored"
                );
            }
            if let Some(prev) = &chained_unmount {
                prev(node);
            }
        });

        hook.set_commit_callback(Some(commit));
        hook.set_unmount_callback(Some(unmount));
        tracing::debug!("introspection observers installed");

        Self {
            hook,
            previous_commit,
            previous_unmount,
            installed: true,
        }
    }

    pub fn uninstall(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if !self.installed {
            return;
        }
        self.hook.set_commit_callback(self.previous_commit.take());
        self.hook.set_unmount_callback(self.previous_unmount.take());
        self.installed = false;
        tracing::debug!("introspection observers restored");
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
