use crate::node::char_slice;
use serde::{Deserialize, Serialize};

/// Raw observation from the input pipeline: text before and after a host
/// edit, plus the caret/selection the host reported.
///
/// The coordinate frame of `selection_offset` is unknown; it may refer to the
/// old or the new text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub old_text: String,
    pub new_text: String,
    #[serde(default)]
    pub selection_offset: usize,
    #[serde(default)]
    pub selection_length: usize,
}

impl TextChange {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
            selection_offset: 0,
            selection_length: 0,
        }
    }

    pub fn with_selection(mut self, offset: usize, length: usize) -> Self {
        self.selection_offset = offset;
        self.selection_length = length;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Replace,
}

/// Structured edit in old-text char coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOperation {
    pub kind: EditKind,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub confidence: f64,
}

impl EditOperation {
    pub fn insert(at: usize, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind: EditKind::Insert,
            start: at,
            end: at,
            text: text.into(),
            confidence,
        }
    }

    pub fn delete(start: usize, end: usize, confidence: f64) -> Self {
        Self {
            kind: EditKind::Delete,
            start,
            end,
            text: String::new(),
            confidence,
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind: EditKind::Replace,
            start,
            end,
            text: text.into(),
            confidence,
        }
    }

    /// Applies the operation to `old`, yielding the edited text.
    pub fn apply(&self, old: &str) -> String {
        let len = old.chars().count();
        let mut out = char_slice(old, 0, self.start.min(len));
        out.push_str(&self.text);
        out.push_str(&char_slice(old, self.end.min(len), len));
        out
    }
}
