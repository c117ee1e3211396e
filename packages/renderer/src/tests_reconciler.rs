/// Tests for keyed reconciliation against the in-memory host
use crate::attrs;
use crate::host::HostTree;
use crate::memory_host::{MemoryHost, NodeId};
use crate::reconciler::Reconciler;
use crate::registry::{ComponentLifecycle, ComponentRegistry, ComponentState};
use crate::vdom::VNode;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn item(key: &str, label: &str) -> VNode {
    VNode::element("li")
        .with_key(key)
        .with_attr("data-label", label)
        .with_child(VNode::text(label))
}

fn setup() -> (MemoryHost, NodeId, Reconciler<NodeId>) {
    let mut host = MemoryHost::new();
    let root = host.create_element("ul");
    (host, root, Reconciler::new())
}

#[test]
fn test_initial_mount() {
    let (mut host, root, mut reconciler) = setup();
    let report = reconciler.reconcile(&mut host, root, &[item("a", "A"), item("b", "B")]);

    assert_eq!(report.created, 4);
    assert_eq!(
        host.inner_html(root),
        r#"<li data-label="A">A</li><li data-label="B">B</li>"#
    );
    assert_eq!(reconciler.owned_count(), 4);
}

#[test]
fn test_same_tree_twice_is_noop() {
    let (mut host, root, mut reconciler) = setup();
    let tree = vec![item("a", "A"), item("b", "B"), VNode::text("tail")];
    reconciler.reconcile(&mut host, root, &tree);

    host.reset_mutations();
    let report = reconciler.reconcile(&mut host, root, &tree);

    assert!(report.is_noop());
    assert_eq!(host.mutation_count(), 0);
}

#[test]
fn test_reorder_preserves_host_nodes() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[item("a", "A"), item("b", "B"), item("c", "C")]);
    let before = host.children(root);

    let report = reconciler.reconcile(&mut host, root, &[item("c", "C"), item("a", "A"), item("b", "B")]);

    let after = host.children(root);
    assert_eq!(after, vec![before[2], before[0], before[1]]);
    assert_eq!(report.created, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.moved, 1);
}

#[test]
fn test_reverse_keeps_every_node() {
    let (mut host, root, mut reconciler) = setup();
    let keys = ["a", "b", "c", "d", "e"];
    let forward: Vec<_> = keys.iter().map(|k| item(k, k)).collect();
    let backward: Vec<_> = keys.iter().rev().map(|k| item(k, k)).collect();

    reconciler.reconcile(&mut host, root, &forward);
    let mut before = host.children(root);
    reconciler.reconcile(&mut host, root, &backward);

    before.reverse();
    assert_eq!(host.children(root), before);
}

#[test]
fn test_attribute_diff_leaves_foreign_attributes() {
    let (mut host, root, mut reconciler) = setup();
    let first = VNode::element("li")
        .with_key("a")
        .with_attr("class", "old")
        .with_attr("title", "gone soon");
    reconciler.reconcile(&mut host, root, &[first]);
    let node = host.children(root)[0];
    host.set_attribute(node, "aria-selected", "true");

    let second = VNode::element("li").with_key("a").with_attr("class", "new");
    let report = reconciler.reconcile(&mut host, root, &[second]);

    assert_eq!(report.updated, 1);
    assert_eq!(host.children(root)[0], node);
    assert_eq!(host.attribute(node, "class").as_deref(), Some("new"));
    assert_eq!(host.attribute(node, "title"), None);
    assert_eq!(host.attribute(node, "aria-selected").as_deref(), Some("true"));
}

#[test]
fn test_text_updates_in_place() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[VNode::text("before")]);
    let fragment = host.children(root)[0];

    reconciler.reconcile(&mut host, root, &[VNode::text("after")]);

    assert_eq!(host.children(root), vec![fragment]);
    assert_eq!(host.text(fragment).as_deref(), Some("after"));
}

#[test]
fn test_removed_key_drops_subtree() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[item("a", "A"), item("b", "B")]);
    let b = host.children(root)[1];
    let owned = reconciler.owned_count();

    let report = reconciler.reconcile(&mut host, root, &[item("a", "A")]);

    assert_eq!(report.removed, 1);
    assert!(!host.is_attached(b));
    assert!(!reconciler.owns(b));
    assert_eq!(reconciler.owned_count(), owned - 2);
}

#[test]
fn test_tag_change_replaces_node() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[VNode::element("p").with_key("x")]);
    let old = host.children(root)[0];

    let report = reconciler.reconcile(&mut host, root, &[VNode::element("h1").with_key("x")]);

    let new = host.children(root)[0];
    assert_ne!(old, new);
    assert_eq!(host.tag(new).as_deref(), Some("h1"));
    assert_eq!((report.created, report.removed), (1, 1));
}

#[test]
fn test_unkeyed_children_match_by_tag_in_order() {
    let (mut host, root, mut reconciler) = setup();
    let first = vec![
        VNode::element("b").with_child(VNode::text("1")),
        VNode::text("plain"),
        VNode::element("i").with_child(VNode::text("2")),
    ];
    reconciler.reconcile(&mut host, root, &first);
    let before = host.children(root);

    let second = vec![
        VNode::element("b").with_child(VNode::text("one")),
        VNode::text("plain text"),
        VNode::element("i").with_child(VNode::text("two")),
    ];
    let report = reconciler.reconcile(&mut host, root, &second);

    assert_eq!(host.children(root), before);
    assert_eq!(report.created, 0);
    assert_eq!(host.inner_html(root), "<b>one</b>plain text<i>two</i>");
}

#[test]
fn test_skip_reconcile_nodes_survive_content_updates() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[item("a", "A")]);

    let overlay = host.create_element("span");
    host.set_attribute(overlay, attrs::SKIP_RECONCILE, "true");
    host.append_child(root, overlay);

    reconciler.reconcile(&mut host, root, &[item("b", "B"), item("a", "A")]);

    let children = host.children(root);
    assert!(children.contains(&overlay));
    assert_eq!(host.attribute(overlay, attrs::SKIP_RECONCILE).as_deref(), Some("true"));
    let labels: Vec<_> = children
        .iter()
        .filter_map(|&c| host.attribute(c, "data-label"))
        .collect();
    assert_eq!(labels, vec!["B", "A"]);
}

#[test]
fn test_duplicate_keys_are_tolerated() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[item("dup", "first"), item("dup", "second")]);

    assert_eq!(host.children(root).len(), 2);

    reconciler.reconcile(&mut host, root, &[item("dup", "only")]);
    assert_eq!(host.inner_html(root), r#"<li data-label="only">only</li>"#);
}

#[test]
fn test_duplicate_keys_rerender_without_churn() {
    let (mut host, root, mut reconciler) = setup();
    let next = [item("dup", "first"), item("dup", "second")];
    reconciler.reconcile(&mut host, root, &next);
    let before = host.children(root);
    host.reset_mutations();

    let report = reconciler.reconcile(&mut host, root, &next);

    assert!(report.is_noop(), "{report:?}");
    assert_eq!(host.mutation_count(), 0);
    assert_eq!(host.children(root), before);
}

#[test]
fn test_last_duplicate_keeps_the_host_slot() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[item("dup", "first"), item("dup", "second")]);
    let last = host.children(root)[1];

    let report = reconciler.reconcile(&mut host, root, &[item("dup", "only")]);

    assert_eq!(report.created, 0);
    assert_eq!(report.removed, 1);
    assert_eq!(host.children(root), vec![last]);
}

#[test]
fn test_clear_removes_everything_owned() {
    let (mut host, root, mut reconciler) = setup();
    reconciler.reconcile(&mut host, root, &[item("a", "A"), item("b", "B")]);

    let report = reconciler.clear(&mut host, root);

    assert_eq!(report.removed, 2);
    assert!(host.children(root).is_empty());
    assert_eq!(reconciler.owned_count(), 0);
}

#[derive(Default)]
struct Counting {
    mounts: AtomicUsize,
    unmounts: AtomicUsize,
}

impl ComponentLifecycle for Counting {
    fn mount(&self, key: &str, state: &mut ComponentState) {
        self.mounts.fetch_add(1, Ordering::SeqCst);
        state.insert("key".to_string(), json!(key));
    }

    fn unmount(&self, _key: &str, _state: &mut ComponentState) {
        self.unmounts.fetch_add(1, Ordering::SeqCst);
    }
}

fn widget(key: &str, label: &str) -> VNode {
    VNode::element("div")
        .with_key(key)
        .with_component("widget")
        .with_attr("data-label", label)
}

#[test]
fn test_lifecycle_fires_once_per_appearance() {
    let counting = Arc::new(Counting::default());
    let mut components = ComponentRegistry::new();
    components.define("widget", counting.clone());

    let mut host = MemoryHost::new();
    let root = host.create_element("div");
    let mut reconciler = Reconciler::with_components(Arc::new(components));

    let report = reconciler.reconcile(&mut host, root, &[widget("w1", "a")]);
    assert_eq!(report.mounted, 1);
    assert_eq!(
        reconciler.component_state("w1").and_then(|s| s.get("key")),
        Some(&json!("w1"))
    );

    // Same key, new attributes: no hooks.
    reconciler.reconcile(&mut host, root, &[widget("w1", "b")]);
    assert_eq!(counting.mounts.load(Ordering::SeqCst), 1);
    assert_eq!(counting.unmounts.load(Ordering::SeqCst), 0);

    let report = reconciler.reconcile(&mut host, root, &[]);
    assert_eq!(report.unmounted, 1);
    assert_eq!(counting.unmounts.load(Ordering::SeqCst), 1);
    assert!(reconciler.component_state("w1").is_none());

    reconciler.reconcile(&mut host, root, &[widget("w1", "c")]);
    assert_eq!(counting.mounts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_nested_components_unmount_with_parent() {
    let counting = Arc::new(Counting::default());
    let mut components = ComponentRegistry::new();
    components.define("widget", counting.clone());

    let mut host = MemoryHost::new();
    let root = host.create_element("div");
    let mut reconciler = Reconciler::with_components(Arc::new(components));

    let outer = VNode::element("section")
        .with_key("outer")
        .with_child(widget("inner1", "x"))
        .with_child(widget("inner2", "y"));
    reconciler.reconcile(&mut host, root, &[outer]);
    assert_eq!(counting.mounts.load(Ordering::SeqCst), 2);

    reconciler.reconcile(&mut host, root, &[]);
    assert_eq!(counting.unmounts.load(Ordering::SeqCst), 2);
    assert_eq!(reconciler.owned_count(), 0);
}
