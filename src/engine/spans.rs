//! Styled-span iteration over a document's style cells.

use std::ops::Range;

use crate::pattern::{PLAIN, Pass};
use crate::pattern_set::{PatternId, PatternSet};

/// A maximal run of bytes styled by one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan<'a> {
    pub range: Range<usize>,
    pub pattern: PatternId,
    pub style: &'a str,
}

/// Iterator over the styled spans of a region, merging adjacent cells that
/// carry the same pattern. Deferred-pass cells at or past the pass 2 mark
/// read as plain. Cloning restarts from the clone's position.
#[derive(Debug, Clone)]
pub struct StyledSpans<'a> {
    set: Option<&'a PatternSet>,
    cells: &'a [PatternId],
    mark: usize,
    pos: usize,
    end: usize,
}

impl<'a> StyledSpans<'a> {
    pub(crate) fn new(set: Option<&'a PatternSet>, cells: &'a [PatternId], mark: usize, range: Range<usize>) -> Self {
        Self {
            set,
            cells,
            mark,
            pos: range.start,
            end: range.end,
        }
    }

    fn effective(&self, set: &PatternSet, at: usize) -> PatternId {
        let id = self.cells[at];
        if at >= self.mark && set.pattern(id).pass() == Pass::Pass2 {
            PatternId::ROOT
        } else {
            id
        }
    }
}

impl<'a> Iterator for StyledSpans<'a> {
    type Item = StyledSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let start = self.pos;
        let Some(set) = self.set else {
            self.pos = self.end;
            return Some(StyledSpan {
                range: start..self.end,
                pattern: PatternId::ROOT,
                style: PLAIN,
            });
        };
        let id = self.effective(set, start);
        self.pos += 1;
        while self.pos < self.end && self.effective(set, self.pos) == id {
            self.pos += 1;
        }
        Some(StyledSpan {
            range: start..self.pos,
            pattern: id,
            style: set.style_of(id),
        })
    }
}

impl std::iter::FusedIterator for StyledSpans<'_> {}
