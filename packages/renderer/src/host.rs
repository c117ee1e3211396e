//! # Host Tree
//!
//! The capability surface the engine drives. Anything that can create
//! elements and text fragments, edit attributes, rearrange children and
//! measure boxes can host a rendering: a browser DOM binding, a headless
//! tree, or a native toolkit.
//!
//! Node handles are small copyable values; the host owns the nodes.

use crate::attrs;
use quire_model::Geometry;
use std::fmt::Debug;
use std::hash::Hash;

pub trait HostTree {
    type Node: Copy + Eq + Hash + Debug;

    fn create_element(&mut self, tag: &str) -> Self::Node;

    fn create_text(&mut self, text: &str) -> Self::Node;

    fn set_text(&mut self, node: Self::Node, text: &str);

    /// Text of a fragment, `None` for elements.
    fn text(&self, node: Self::Node) -> Option<String>;

    /// Tag of an element, `None` for text fragments.
    fn tag(&self, node: Self::Node) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: Self::Node, name: &str);

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node);

    /// Inserts (or moves) `child` before `reference`; appends when
    /// `reference` is `None`.
    fn insert_before(&mut self, parent: Self::Node, child: Self::Node, reference: Option<Self::Node>);

    fn remove_child(&mut self, parent: Self::Node, child: Self::Node);

    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Bounding box of a node in host coordinates, if laid out.
    fn bounding_rect(&self, node: Self::Node) -> Option<Geometry>;

    /// Bounding box of a char range inside one text fragment.
    fn text_range_rect(&self, fragment: Self::Node, _start: usize, _end: usize) -> Option<Geometry> {
        self.bounding_rect(fragment)
    }
}

/// Depth-first search below (and including) `root` for an element whose
/// attribute `name` equals `value`.
pub fn find_by_attribute<H: HostTree>(
    host: &H,
    root: H::Node,
    name: &str,
    value: &str,
) -> Option<H::Node> {
    if host.attribute(root, name).as_deref() == Some(value) {
        return Some(root);
    }
    host.children(root)
        .into_iter()
        .find_map(|child| find_by_attribute(host, child, name, value))
}

/// Host element rendering the model node `sid`.
pub fn find_by_sid<H: HostTree>(host: &H, root: H::Node, sid: &str) -> Option<H::Node> {
    find_by_attribute(host, root, attrs::SID, sid)
}

/// Whether content reconciliation must skip this node.
pub fn is_skip_reconcile<H: HostTree>(host: &H, node: H::Node) -> bool {
    host.attribute(node, attrs::SKIP_RECONCILE).as_deref() == Some("true")
}
