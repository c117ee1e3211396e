use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visual node produced by the builder and consumed by the reconciler.
///
/// Trees are rebuilt on every pass; identity across passes comes only from
/// `key` (the model node or decorator id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// Host element
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<VNode>,
        /// Reconciliation key
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        /// Registered component whose lifecycle hooks follow this node
        #[serde(skip_serializing_if = "Option::is_none")]
        component: Option<String>,
    },

    /// Text fragment
    Text { content: String },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            key: None,
            component: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        if let VNode::Element {
            key: ref mut node_key,
            ..
        } = self
        {
            *node_key = Some(key.into());
        }
        self
    }

    pub fn with_component(mut self, name: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut component, ..
        } = self
        {
            *component = Some(name.into());
        }
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(name.into(), value.into());
        }
    }

    pub fn set_key(&mut self, new_key: impl Into<String>) {
        if let VNode::Element { ref mut key, .. } = self {
            *key = Some(new_key.into());
        }
    }

    pub fn push_child(&mut self, child: VNode) {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element { key, .. } => key.as_deref(),
            VNode::Text { .. } => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text { .. } => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            VNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            VNode::Text { .. } => &[],
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, VNode::Element { .. })
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            VNode::Element { children, .. } => {
                children.iter().map(VNode::text_content).collect()
            }
        }
    }

    /// Depth-first search for the first element with the given key.
    pub fn find_by_key(&self, key: &str) -> Option<&VNode> {
        if self.key() == Some(key) {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_by_key(key))
    }
}
