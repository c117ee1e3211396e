//! In-memory [`HostTree`] used by tests, benchmarks and the CLI.
//!
//! Nodes live in an append-only arena; removed nodes are detached but their
//! handles stay valid, so tests can keep comparing handles across passes.
//! Every mutating call bumps a counter, which is how idempotence is checked.

use crate::host::HostTree;
use quire_model::Geometry;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Option<Geometry>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    nodes: Vec<Slot>,
    mutations: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls since creation or the last reset.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    /// Assigns a layout box, standing in for a real layout engine.
    pub fn set_rect(&mut self, node: NodeId, rect: Geometry) {
        self.nodes[node.0].rect = Some(rect);
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.nodes[node.0].parent.is_some()
    }

    /// Serializes `node` and its subtree.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serializes the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in &self.nodes[node.0].children {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let slot = &self.nodes[node.0];
        match &slot.data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for &child in &slot.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.mutations += 1;
        self.nodes.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
            rect: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != child);
        }
    }
}

impl HostTree for MemoryHost {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let NodeData::Text(content) = &mut self.nodes[node.0].data {
            self.mutations += 1;
            *content = text.to_string();
        }
    }

    fn text(&self, node: NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => Some(text.clone()),
            NodeData::Element { .. } => None,
        }
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data {
            self.mutations += 1;
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data {
            self.mutations += 1;
            attributes.remove(name);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.mutations += 1;
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes[child.0].parent == Some(parent) {
            self.mutations += 1;
            self.detach(child);
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Geometry> {
        self.nodes[node.0].rect
    }

    /// Splits a fragment's box proportionally by char count.
    fn text_range_rect(&self, fragment: NodeId, start: usize, end: usize) -> Option<Geometry> {
        let rect = self.nodes[fragment.0].rect?;
        let len = self.text(fragment)?.chars().count();
        if len == 0 {
            return Some(rect);
        }
        let per_char = rect.width / len as f64;
        let start = start.min(len);
        let end = end.min(len).max(start);
        Some(Geometry::new(
            rect.top,
            rect.left + per_char * start as f64,
            per_char * (end - start) as f64,
            rect.height,
        ))
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
