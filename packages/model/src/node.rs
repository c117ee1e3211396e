use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node of the semantic document tree.
///
/// `id` is stable within one snapshot and becomes the reconciliation key of
/// the visual node built from it. A node is either a container (`children`)
/// or text-bearing (`text` plus optional `marks`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ModelNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl ModelNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            attributes: Map::new(),
            children: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    /// Shorthand for a text-bearing node.
    pub fn text_node(
        id: impl Into<String>,
        node_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(id, node_type).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<ModelNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_text_bearing(&self) -> bool {
        self.text.is_some()
    }

    /// Logical text length in chars (0 for containers).
    pub fn text_len(&self) -> usize {
        self.text.as_deref().map(char_len).unwrap_or(0)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Depth-first lookup by id, including `self`.
    pub fn find(&self, id: &str) -> Option<&ModelNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Checks structural invariants the engine relies on.
    ///
    /// Only inverted mark ranges are rejected; out-of-bounds ranges are
    /// clamped by the builder.
    pub fn validate(&self) -> ModelResult<()> {
        for mark in &self.marks {
            if mark.start() > mark.end() {
                return Err(ModelError::InvertedMarkRange {
                    node_id: self.id.clone(),
                    mark_type: mark.mark_type.clone(),
                    start: mark.start(),
                    end: mark.end(),
                });
            }
        }
        self.children.iter().try_for_each(ModelNode::validate)
    }
}

/// Formatting span over a node's text, e.g. bold or link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    pub range: [usize; 2],
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            mark_type: mark_type.into(),
            range: [start, end],
            attributes: Map::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn start(&self) -> usize {
        self.range[0]
    }

    pub fn end(&self) -> usize {
        self.range[1]
    }

    /// Range clamped to `[0, len]`, `None` when it collapses to nothing.
    pub fn clamped(&self, len: usize) -> Option<(usize, usize)> {
        let start = self.start().min(len);
        let end = self.end().min(len);
        (start < end).then_some((start, end))
    }
}

/// Length of `text` in chars.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Substring of `text` between two char offsets (clamped).
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    if end <= start {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}
