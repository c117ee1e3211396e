//! # Reconciler
//!
//! Patches a live host tree so that the children of a container match a
//! list of [`VNode`]s, reusing host nodes wherever identity allows.
//!
//! ## Identity
//!
//! Children are matched by `key` regardless of position; unkeyed children
//! match the first remaining unkeyed host child of the same tag (or the next
//! text fragment). Reordered keys move existing host nodes with
//! `insert_before` rather than recreating them, which keeps focus, scroll
//! position and other host-side state attached to the right element.
//!
//! ## Ownership
//!
//! The reconciler remembers every host node it created, together with the
//! attributes it last wrote. That table is the previous tree projected onto
//! the host:
//!
//! - attribute diffs only ever remove attributes the previous pass wrote, so
//!   host-injected attributes survive;
//! - host children it did not create are skipped entirely, which is how
//!   overlay nodes owned by another surface (flagged
//!   `data-skip-reconcile`) survive content updates.
//!
//! ## Idempotence
//!
//! Attributes and text are written only when they changed, and nodes are
//! moved only when out of place, so reconciling the same tree twice performs
//! no host mutation the second time.
//!
//! ## Lifecycle
//!
//! Elements naming a registered component get `mount` once when their key
//! appears and `unmount` once when it disappears. Component state lives in
//! a side table keyed by the same key and is dropped on unmount.

use crate::host::{is_skip_reconcile, HostTree};
use crate::registry::{ComponentRegistry, ComponentState};
use crate::vdom::VNode;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
struct Mounted {
    key: Option<String>,
    /// `None` for text fragments
    tag: Option<String>,
    attributes: BTreeMap<String, String>,
    component: Option<String>,
}

/// What one reconcile pass did to the host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub moved: usize,
    pub removed: usize,
    pub mounted: usize,
    pub unmounted: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.moved == 0 && self.removed == 0
    }

    pub fn merge(&mut self, other: &ReconcileReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.moved += other.moved;
        self.removed += other.removed;
        self.mounted += other.mounted;
        self.unmounted += other.unmounted;
    }
}

#[derive(Default)]
struct Pass {
    report: ReconcileReport,
    /// (key, component) pairs to mount once the pass has placed every node
    mounts: Vec<(String, String)>,
}

pub struct Reconciler<N> {
    mounted: HashMap<N, Mounted>,
    states: HashMap<String, ComponentState>,
    components: Arc<ComponentRegistry>,
}

impl<N: Copy + Eq + Hash + Debug> Default for Reconciler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + Hash + Debug> Reconciler<N> {
    pub fn new() -> Self {
        Self::with_components(Arc::new(ComponentRegistry::new()))
    }

    pub fn with_components(components: Arc<ComponentRegistry>) -> Self {
        Self {
            mounted: HashMap::new(),
            states: HashMap::new(),
            components,
        }
    }

    /// Makes the children of `container` match `next`.
    #[instrument(skip_all, fields(children = next.len()))]
    pub fn reconcile<H: HostTree<Node = N>>(
        &mut self,
        host: &mut H,
        container: N,
        next: &[VNode],
    ) -> ReconcileReport {
        let mut pass = Pass::default();
        self.reconcile_children(host, container, next, &mut pass);

        for (key, component) in std::mem::take(&mut pass.mounts) {
            self.fire_mount(&key, &component);
            pass.report.mounted += 1;
        }

        debug!(
            created = pass.report.created,
            updated = pass.report.updated,
            moved = pass.report.moved,
            removed = pass.report.removed,
            "Reconcile pass complete"
        );
        pass.report
    }

    /// Removes everything this reconciler mounted under `container`.
    pub fn clear<H: HostTree<Node = N>>(&mut self, host: &mut H, container: N) -> ReconcileReport {
        self.reconcile(host, container, &[])
    }

    pub fn owns(&self, node: N) -> bool {
        self.mounted.contains_key(&node)
    }

    pub fn owned_count(&self) -> usize {
        self.mounted.len()
    }

    pub fn component_state(&self, key: &str) -> Option<&ComponentState> {
        self.states.get(key)
    }

    pub fn component_state_mut(&mut self, key: &str) -> Option<&mut ComponentState> {
        self.states.get_mut(key)
    }

    fn reconcile_children<H: HostTree<Node = N>>(
        &mut self,
        host: &mut H,
        parent: N,
        next: &[VNode],
        pass: &mut Pass,
    ) {
        let mut owned = Vec::new();
        let mut keyed: HashMap<String, VecDeque<N>> = HashMap::new();
        let mut unkeyed: Vec<N> = Vec::new();
        for child in host.children(parent) {
            let Some(mounted) = self.mounted.get(&child) else {
                if !is_skip_reconcile(host, child) {
                    debug!(node = ?child, "Leaving unowned host node in place");
                }
                continue;
            };
            owned.push(child);
            match &mounted.key {
                Some(key) => keyed.entry(key.clone()).or_default().push_back(child),
                None => unkeyed.push(child),
            }
        }

        // Duplicated keys: the last occurrence claims the last host node
        // carrying that key, earlier ones take the remaining nodes in order.
        let mut remaining: HashMap<&str, usize> = HashMap::new();
        for key in next.iter().filter_map(VNode::key) {
            *remaining.entry(key).or_default() += 1;
        }

        let mut used: HashSet<N> = HashSet::new();
        let mut desired: Vec<(N, bool)> = Vec::with_capacity(next.len());
        for vnode in next {
            let candidate = match vnode.key() {
                Some(key) => {
                    let left = remaining.get_mut(key).map_or(0, |count| {
                        *count -= 1;
                        *count
                    });
                    keyed.get_mut(key).and_then(|nodes| {
                        if left == 0 {
                            nodes.pop_back()
                        } else {
                            nodes.pop_front()
                        }
                    })
                }
                None => unkeyed
                    .iter()
                    .position(|&node| self.same_kind(node, vnode))
                    .map(|index| unkeyed.remove(index)),
            };

            match candidate {
                Some(node) if self.same_kind(node, vnode) => {
                    used.insert(node);
                    self.patch(host, node, vnode, pass);
                    desired.push((node, false));
                }
                _ => {
                    let node = self.create(host, vnode, pass);
                    desired.push((node, true));
                }
            }
        }

        for stale in owned.into_iter().filter(|node| !used.contains(node)) {
            self.remove(host, parent, stale, pass);
        }

        let mut previous: Option<N> = None;
        for (node, fresh) in desired {
            let start = match previous {
                Some(previous) => host.next_sibling(previous),
                None => host.children(parent).first().copied(),
            };
            let expected = self.next_owned(host, start);
            if expected != Some(node) {
                host.insert_before(parent, node, expected);
                if !fresh {
                    pass.report.moved += 1;
                }
            }
            previous = Some(node);
        }
    }

    fn next_owned<H: HostTree<Node = N>>(&self, host: &H, mut cursor: Option<N>) -> Option<N> {
        while let Some(node) = cursor {
            if self.mounted.contains_key(&node) {
                return Some(node);
            }
            cursor = host.next_sibling(node);
        }
        None
    }

    fn same_kind(&self, node: N, vnode: &VNode) -> bool {
        let Some(mounted) = self.mounted.get(&node) else {
            return false;
        };
        match vnode {
            VNode::Text { .. } => mounted.tag.is_none(),
            VNode::Element { tag, component, .. } => {
                mounted.tag.as_deref() == Some(tag.as_str()) && mounted.component == *component
            }
        }
    }

    fn create<H: HostTree<Node = N>>(&mut self, host: &mut H, vnode: &VNode, pass: &mut Pass) -> N {
        pass.report.created += 1;
        match vnode {
            VNode::Text { content } => {
                let node = host.create_text(content);
                self.mounted.insert(
                    node,
                    Mounted {
                        key: None,
                        tag: None,
                        attributes: BTreeMap::new(),
                        component: None,
                    },
                );
                node
            }
            VNode::Element {
                tag,
                attributes,
                children,
                key,
                component,
            } => {
                let node = host.create_element(tag);
                for (name, value) in attributes {
                    host.set_attribute(node, name, value);
                }
                self.mounted.insert(
                    node,
                    Mounted {
                        key: key.clone(),
                        tag: Some(tag.clone()),
                        attributes: attributes.clone(),
                        component: component.clone(),
                    },
                );

                match (key, component) {
                    (Some(key), Some(component)) => {
                        pass.mounts.push((key.clone(), component.clone()));
                    }
                    (None, Some(component)) => {
                        warn!(component = %component, "Unkeyed component element gets no lifecycle");
                    }
                    _ => {}
                }

                for child in children {
                    let child_node = self.create(host, child, pass);
                    host.append_child(node, child_node);
                }
                node
            }
        }
    }

    fn patch<H: HostTree<Node = N>>(&mut self, host: &mut H, node: N, vnode: &VNode, pass: &mut Pass) {
        match vnode {
            VNode::Text { content } => {
                if host.text(node).as_deref() != Some(content.as_str()) {
                    host.set_text(node, content);
                    pass.report.updated += 1;
                }
            }
            VNode::Element {
                attributes,
                children,
                ..
            } => {
                let mut changed = false;
                if let Some(mounted) = self.mounted.get_mut(&node) {
                    for name in mounted.attributes.keys() {
                        if !attributes.contains_key(name) {
                            host.remove_attribute(node, name);
                            changed = true;
                        }
                    }
                    for (name, value) in attributes {
                        if mounted.attributes.get(name) != Some(value) {
                            host.set_attribute(node, name, value);
                            changed = true;
                        }
                    }
                    if changed {
                        mounted.attributes = attributes.clone();
                    }
                }
                if changed {
                    pass.report.updated += 1;
                }
                self.reconcile_children(host, node, children, pass);
            }
        }
    }

    fn remove<H: HostTree<Node = N>>(&mut self, host: &mut H, parent: N, node: N, pass: &mut Pass) {
        self.forget_subtree(host, node, pass);
        host.remove_child(parent, node);
        pass.report.removed += 1;
    }

    fn forget_subtree<H: HostTree<Node = N>>(&mut self, host: &H, node: N, pass: &mut Pass) {
        if let Some(mounted) = self.mounted.remove(&node) {
            if let (Some(key), Some(component)) = (mounted.key, mounted.component) {
                self.fire_unmount(&key, &component);
                pass.report.unmounted += 1;
            }
        }
        for child in host.children(node) {
            if self.mounted.contains_key(&child) {
                self.forget_subtree(host, child, pass);
            }
        }
    }

    fn fire_mount(&mut self, key: &str, component: &str) {
        let lifecycle = self.components.get(component).cloned();
        let state = self.states.entry(key.to_string()).or_default();
        match lifecycle {
            Some(lifecycle) => lifecycle.mount(key, state),
            None => debug!(component = %component, "No lifecycle registered for component"),
        }
    }

    fn fire_unmount(&mut self, key: &str, component: &str) {
        let mut state = self.states.remove(key).unwrap_or_default();
        if let Some(lifecycle) = self.components.get(component).cloned() {
            lifecycle.unmount(key, &mut state);
        }
    }
}
