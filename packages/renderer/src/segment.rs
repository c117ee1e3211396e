//! Text partitioning at mark and decoration boundaries.

use quire_model::char_slice;
use std::collections::BTreeSet;

/// Maximal run of text over which the set of covering ranges is constant.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextSegment {
    /// Whether `[start, end)` covers this whole segment.
    pub fn is_covered_by(&self, start: usize, end: usize) -> bool {
        start <= self.start && self.end <= end
    }
}

/// Splits `text` at every range boundary. Ranges are char offsets and are
/// clamped to the text; empty text yields no segments.
pub fn segment_text(text: &str, cuts: &[(usize, usize)]) -> Vec<TextSegment> {
    let len = text.chars().count();
    if len == 0 {
        return Vec::new();
    }

    let mut boundaries = BTreeSet::from([0, len]);
    for &(start, end) in cuts {
        boundaries.insert(start.min(len));
        boundaries.insert(end.min(len));
    }

    let boundaries: Vec<usize> = boundaries.into_iter().collect();
    boundaries
        .windows(2)
        .map(|pair| TextSegment {
            start: pair[0],
            end: pair[1],
            text: char_slice(text, pair[0], pair[1]),
        })
        .collect()
}
