//! Buffer edits as the engine receives them.

use std::ops::Range;

use thiserror::Error;

/// Replacement of `removed` bytes at `offset` by `inserted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub removed: usize,
    pub inserted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit range {start}..{end} is outside the buffer (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("edit boundary {0} is inside a character")]
    NotCharBoundary(usize),
}

impl Edit {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            removed: 0,
            inserted: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self {
            offset: range.start,
            removed: range.end.saturating_sub(range.start),
            inserted: String::new(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            inserted: text.into(),
            ..Self::delete(range)
        }
    }

    /// The single edit turning `old` into `new`: everything between their
    /// common prefix and common suffix. `None` when they are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let (a, b) = (old.as_bytes(), new.as_bytes());
        let mut prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
        while !(old.is_char_boundary(prefix) && new.is_char_boundary(prefix)) {
            prefix -= 1;
        }
        let max_suffix = a.len().min(b.len()) - prefix;
        let mut suffix = a
            .iter()
            .rev()
            .zip(b.iter().rev())
            .take(max_suffix)
            .take_while(|(x, y)| x == y)
            .count();
        while !(old.is_char_boundary(a.len() - suffix) && new.is_char_boundary(b.len() - suffix)) {
            suffix -= 1;
        }
        Some(Self {
            offset: prefix,
            removed: a.len() - suffix - prefix,
            inserted: new[prefix..b.len() - suffix].to_string(),
        })
    }

    /// End of the removed text, in pre-edit offsets.
    pub fn old_end(&self) -> usize {
        self.offset + self.removed
    }

    /// End of the inserted text, in post-edit offsets.
    pub fn new_end(&self) -> usize {
        self.offset + self.inserted.len()
    }

    pub(crate) fn delta(&self) -> isize {
        self.inserted.len() as isize - self.removed as isize
    }

    pub(crate) fn validate(&self, text: &str) -> Result<(), EditError> {
        let end = self.offset.checked_add(self.removed);
        match end {
            Some(end) if end <= text.len() => {
                for at in [self.offset, end] {
                    if !text.is_char_boundary(at) {
                        return Err(EditError::NotCharBoundary(at));
                    }
                }
                Ok(())
            }
            _ => Err(EditError::OutOfBounds {
                start: self.offset,
                end: self.offset.saturating_add(self.removed),
                len: text.len(),
            }),
        }
    }

    pub(crate) fn apply(&self, text: &mut String) {
        text.replace_range(self.offset..self.old_end(), &self.inserted);
    }
}
