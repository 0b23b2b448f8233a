//! Compiled, read-only pattern hierarchy for one language mode.
//!
//! Patterns live in an arena indexed by [`PatternId`]. Index 0 is always the
//! `Plain` root; the remaining patterns keep their declaration order, so
//! comparing ids is the same as comparing declaration positions. A set is
//! immutable once built and is shared between documents behind an `Arc`.

use fancy_regex::Regex;

use crate::context::ReparseContext;
use crate::pattern::Pass;

/// Arena index of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(u16);

impl PatternId {
    /// The `Plain` root; text no pattern claims is styled with it.
    pub const ROOT: Self = Self(0);

    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u16::MAX as usize);
        Self(index as u16)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compiled matching behavior of a pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// The `Plain` root. Never matched.
    Root,
    ColorOnly { regex: Regex },
    Delimited {
        start: Regex,
        end: Regex,
        error: Option<Regex>,
    },
    /// Capture group indices of the parent's start and end matches.
    SubExpressions { start: Vec<usize>, end: Vec<usize> },
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub(crate) name: String,
    pub(crate) style: String,
    pub(crate) parent: Option<PatternId>,
    pub(crate) children: Vec<PatternId>,
    pub(crate) matcher: Matcher,
    pub(crate) pass: Pass,
    pub(crate) from_start: bool,
}

impl CompiledPattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    /// `None` only for the root.
    pub fn parent(&self) -> Option<PatternId> {
        self.parent
    }

    /// Direct sub-patterns, colorers included, in declaration order.
    pub fn children(&self) -> &[PatternId] {
        &self.children
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Resolved pass: `Pass1` or `Pass2`, inherited from the top-level
    /// ancestor for sub-patterns.
    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn parses_from_start(&self) -> bool {
        self.from_start
    }

    pub fn is_colorer(&self) -> bool {
        matches!(self.matcher, Matcher::SubExpressions { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PatternSet {
    pub(crate) language: String,
    pub(crate) patterns: Vec<CompiledPattern>,
    pub(crate) context: ReparseContext,
    pub(crate) pass1_roots: Vec<PatternId>,
    pub(crate) pass2_roots: Vec<PatternId>,
}

impl PatternSet {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Never true for a compiled set; the root is always present.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn pattern(&self, id: PatternId) -> &CompiledPattern {
        &self.patterns[id.index()]
    }

    pub fn find(&self, name: &str) -> Option<PatternId> {
        self.patterns
            .iter()
            .position(|p| p.name == name)
            .map(PatternId::from_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &CompiledPattern)> {
        self.patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (PatternId::from_index(i), p))
    }

    /// Effective reparse context: the maximum over the set and its patterns.
    pub fn context(&self) -> ReparseContext {
        self.context
    }

    /// Top-level matching patterns evaluated in `pass`, in declaration order.
    pub fn roots(&self, pass: Pass) -> &[PatternId] {
        match pass {
            Pass::Pass1 => &self.pass1_roots,
            Pass::Pass2 => &self.pass2_roots,
            Pass::SubPattern => &[],
        }
    }

    pub fn has_deferred(&self) -> bool {
        !self.pass2_roots.is_empty()
    }

    pub fn style_of(&self, id: PatternId) -> &str {
        &self.pattern(id).style
    }
}
