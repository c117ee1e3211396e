//! # Edit Change Analyzer
//!
//! Turns a before/after text observation into structured edit operations.
//!
//! The common prefix and suffix are trimmed; what remains is an insertion,
//! a deletion or a replacement. Repeated characters can make a pure
//! insertion or deletion fit at several offsets (`"ab"` → `"abb"`). The
//! caret hint then picks one, tried first as an old-text offset and then as
//! a new-text offset. Without a usable hint the longest-prefix placement
//! wins.
//!
//! Offsets are chars in old-text coordinates. Identical texts yield no
//! operations; the analyzer never fails.

use quire_model::{EditOperation, TextChange};
use tracing::debug;

const CONFIDENT: f64 = 1.0;
const FALLBACK_FRAME: f64 = 0.8;
const GUESSED: f64 = 0.5;

pub fn analyze_text_changes(change: &TextChange) -> Vec<EditOperation> {
    let old: Vec<char> = change.old_text.chars().collect();
    let new: Vec<char> = change.new_text.chars().collect();
    if old == new {
        return vec![];
    }

    let prefix = common_prefix(&old, &new);
    let suffix = common_suffix(&old, &new);

    let operation = if new.len() > old.len() {
        analyze_insert(change, &old, &new, prefix, suffix)
    } else if new.len() < old.len() {
        analyze_delete(change, &old, &new, prefix, suffix)
    } else {
        None
    }
    .unwrap_or_else(|| replace(&old, &new, prefix, suffix));

    debug!(
        kind = ?operation.kind,
        start = operation.start,
        end = operation.end,
        confidence = operation.confidence,
        "Analyzed text change"
    );
    vec![operation]
}

fn analyze_insert(
    change: &TextChange,
    old: &[char],
    new: &[char],
    prefix: usize,
    suffix: usize,
) -> Option<EditOperation> {
    let inserted = new.len() - old.len();
    // Every insertion point in lo..=hi reproduces `new`.
    let lo = old.len().saturating_sub(suffix);
    let hi = prefix.min(old.len());
    if lo > hi {
        return None;
    }

    let caret = change.selection_offset;
    let (at, confidence) = if lo == hi {
        (lo, CONFIDENT)
    } else if (lo..=hi).contains(&caret) {
        (caret, CONFIDENT)
    } else if let Some(at) = caret.checked_sub(inserted).filter(|at| (lo..=hi).contains(at)) {
        (at, FALLBACK_FRAME)
    } else {
        (hi, GUESSED)
    };

    let text: String = new[at..at + inserted].iter().collect();
    Some(EditOperation::insert(at, text, confidence))
}

fn analyze_delete(
    change: &TextChange,
    old: &[char],
    new: &[char],
    prefix: usize,
    suffix: usize,
) -> Option<EditOperation> {
    let deleted = old.len() - new.len();
    let lo = new.len().saturating_sub(suffix);
    let hi = prefix.min(new.len());
    if lo > hi {
        return None;
    }

    let caret = change.selection_offset;
    let selection_end = caret.saturating_add(change.selection_length);
    let (start, confidence) = if lo == hi {
        (lo, CONFIDENT)
    } else if (lo..=hi).contains(&caret) {
        (caret, CONFIDENT)
    } else if let Some(start) = selection_end.checked_sub(deleted).filter(|s| (lo..=hi).contains(s)) {
        (start, FALLBACK_FRAME)
    } else {
        (hi, GUESSED)
    };

    Some(EditOperation::delete(start, start + deleted, confidence))
}

fn replace(old: &[char], new: &[char], prefix: usize, suffix: usize) -> EditOperation {
    let prefix = prefix.min(old.len()).min(new.len());
    let suffix = suffix.min(old.len() - prefix).min(new.len() - prefix);
    let text: String = new[prefix..new.len() - suffix].iter().collect();
    EditOperation::replace(prefix, old.len() - suffix, text, CONFIDENT)
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}
