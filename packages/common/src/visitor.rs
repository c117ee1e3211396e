use quire_model::{Mark, ModelNode};
use std::collections::HashSet;

/// Visitor pattern for traversing model snapshots immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor<'a>: Sized {
    fn visit_node(&mut self, node: &'a ModelNode) {
        walk_node(self, node);
    }

    fn visit_text_node(&mut self, node: &'a ModelNode, _text: &'a str) {
        walk_marks(self, node);
    }

    fn visit_mark(&mut self, _node: &'a ModelNode, _mark: &'a Mark) {
        // Leaf node, no children to walk
    }
}

pub fn walk_node<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a ModelNode) {
    if let Some(text) = node.text.as_deref() {
        visitor.visit_text_node(node, text);
    }
    for child in &node.children {
        visitor.visit_node(child);
    }
}

pub fn walk_marks<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a ModelNode) {
    for mark in &node.marks {
        visitor.visit_mark(node, mark);
    }
}

/// Collects every text-bearing node in document order
pub fn text_nodes(root: &ModelNode) -> Vec<&ModelNode> {
    struct Collector<'a> {
        nodes: Vec<&'a ModelNode>,
    }

    impl<'a> Visitor<'a> for Collector<'a> {
        fn visit_text_node(&mut self, node: &'a ModelNode, _text: &'a str) {
            self.nodes.push(node);
        }
    }

    let mut collector = Collector { nodes: Vec::new() };
    collector.visit_node(root);
    collector.nodes
}

/// Ids that occur more than once in a snapshot, in first-repeat order
pub fn duplicate_ids(root: &ModelNode) -> Vec<&str> {
    struct Ids<'a> {
        seen: HashSet<&'a str>,
        duplicates: Vec<&'a str>,
    }

    impl<'a> Visitor<'a> for Ids<'a> {
        fn visit_node(&mut self, node: &'a ModelNode) {
            if !self.seen.insert(node.id.as_str()) && !self.duplicates.contains(&node.id.as_str()) {
                self.duplicates.push(node.id.as_str());
            }
            walk_node(self, node);
        }
    }

    let mut ids = Ids {
        seen: HashSet::new(),
        duplicates: Vec::new(),
    };
    ids.visit_node(root);
    ids.duplicates
}
