//! # Text Run Index
//!
//! Maps logical char offsets of one text-bearing model node to the host text
//! fragments that render it, and back.
//!
//! Mark wrappers are transparent: text at any nesting depth feeds one
//! continuous logical stream. A wrapping decoration contributes only its last
//! child, the document segment it wraps; text its own template emits is not
//! document content. Spliced decorations (`data-decorator-position`) are
//! skipped entirely, and so are nested content nodes (another `data-sid`).
//!
//! Offsets follow logical (storage) order, so right-to-left text indexes
//! the same way as left-to-right text.

use crate::attrs;
use crate::host::HostTree;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun<N> {
    pub start: usize,
    pub end: usize,
    pub fragment: N,
}

impl<N> TextRun<N> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone)]
pub struct TextRunIndex<N> {
    pub total: usize,
    pub runs: Vec<TextRun<N>>,
    pub by_fragment: HashMap<N, (usize, usize)>,
}

impl<N: Copy + Eq + std::hash::Hash> TextRunIndex<N> {
    /// Indexes the subtree rooted at the host element of a text-bearing
    /// model node.
    pub fn build<H: HostTree<Node = N>>(host: &H, root: N) -> Self {
        let mut index = Self {
            total: 0,
            runs: Vec::new(),
            by_fragment: HashMap::new(),
        };
        for child in host.children(root) {
            index.walk(host, child);
        }
        index
    }

    fn walk<H: HostTree<Node = N>>(&mut self, host: &H, node: N) {
        if let Some(text) = host.text(node) {
            let len = text.chars().count();
            if len == 0 {
                return;
            }
            let start = self.total;
            self.total += len;
            self.runs.push(TextRun {
                start,
                end: self.total,
                fragment: node,
            });
            self.by_fragment.insert(node, (start, self.total));
            return;
        }

        if host.attribute(node, attrs::DECORATOR_POSITION).is_some()
            || host.attribute(node, attrs::SID).is_some()
        {
            return;
        }
        let children = host.children(node);
        if host.attribute(node, attrs::DECORATOR).is_some() {
            if let Some(&segment) = children.last() {
                self.walk(host, segment);
            }
            return;
        }
        for child in children {
            self.walk(host, child);
        }
    }

    /// Run containing `offset`, in O(log n).
    ///
    /// A boundary offset resolves to the run starting there; `total`
    /// resolves to the last run so a caret at the end still has a home.
    pub fn binary_search_run(&self, offset: usize) -> Option<&TextRun<N>> {
        if offset == self.total {
            return self.runs.last();
        }
        let index = self.runs.partition_point(|run| run.end <= offset);
        self.runs.get(index).filter(|run| run.start <= offset)
    }

    /// Host fragment and local char offset for a logical offset.
    pub fn locate(&self, offset: usize) -> Option<(N, usize)> {
        self.binary_search_run(offset)
            .map(|run| (run.fragment, offset - run.start))
    }

    /// Logical offset of a host-reported caret `(fragment, local)`.
    pub fn offset_of(&self, fragment: N, local: usize) -> Option<usize> {
        let &(start, end) = self.by_fragment.get(&fragment)?;
        Some((start + local).min(end))
    }

    /// Runs intersecting `[start, end)`, with the local sub-range of each.
    pub fn runs_in(&self, start: usize, end: usize) -> Vec<(N, usize, usize)> {
        self.runs
            .iter()
            .filter(|run| run.start < end && start < run.end)
            .map(|run| {
                let local_start = start.max(run.start) - run.start;
                let local_end = end.min(run.end) - run.start;
                (run.fragment, local_start, local_end)
            })
            .collect()
    }
}
