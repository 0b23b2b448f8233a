//! Authored pattern descriptions.
//!
//! A [`PatternSpec`] is plain data: it is what a configuration file or a
//! caller writes down, before any validation. [`crate::compiler`] turns a
//! list of them into a [`crate::PatternSet`].

use serde::Deserialize;

/// Name of the mandatory root pattern.
pub const PLAIN: &str = "Plain";

/// How a pattern matches text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// A single regex; its match is colored and nothing nests inside it.
    #[default]
    ColorOnly,
    /// A start/end pair; the text between may contain sub-patterns.
    DelimitedRange,
}

/// When a pattern is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Eagerly, over the whole buffer.
    #[default]
    Pass1,
    /// Lazily, only as text becomes visible, in the gaps pass 1 leaves.
    Pass2,
    /// Only inside the parent's range.
    SubPattern,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PatternSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub style: String,
    #[serde(default)]
    pub kind: PatternKind,
    #[serde(default)]
    pub start_regex: String,
    #[serde(default)]
    pub end_regex: Option<String>,
    #[serde(default)]
    pub error_regex: Option<String>,
    #[serde(default)]
    pub pass: Pass,
    /// Colors sub-expressions of the parent's start (and end) match instead
    /// of matching on its own. `start_regex`/`end_regex` then hold
    /// references such as `&` or `\1 \3`.
    #[serde(default)]
    pub sub_expression_coloring: bool,
    /// Scan the body starting at the start match rather than after it.
    #[serde(default)]
    pub parse_subpatterns_from_start: bool,
    #[serde(default)]
    pub context_lines: u32,
    #[serde(default)]
    pub context_chars: u32,
}

impl PatternSpec {
    /// The root pattern, styled with the style of the same name.
    pub fn plain() -> Self {
        Self {
            name: PLAIN.to_string(),
            style: PLAIN.to_string(),
            ..Self::default()
        }
    }

    pub fn color_only(name: impl Into<String>, style: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: style.into(),
            start_regex: regex.into(),
            ..Self::default()
        }
    }

    pub fn delimited(
        name: impl Into<String>,
        style: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            style: style.into(),
            kind: PatternKind::DelimitedRange,
            start_regex: start.into(),
            end_regex: Some(end.into()),
            ..Self::default()
        }
    }

    /// A colorer for sub-expressions of `parent`'s start match.
    pub fn sub_expressions(
        name: impl Into<String>,
        style: impl Into<String>,
        parent: impl Into<String>,
        start_refs: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            style: style.into(),
            parent: Some(parent.into()),
            start_regex: start_refs.into(),
            pass: Pass::SubPattern,
            sub_expression_coloring: true,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self.pass = Pass::SubPattern;
        self
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end_regex = Some(end.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error_regex = Some(error.into());
        self
    }

    pub fn with_context(mut self, lines: u32, chars: u32) -> Self {
        self.context_lines = lines;
        self.context_chars = chars;
        self
    }

    /// Evaluate in pass 2.
    pub fn deferred(mut self) -> Self {
        self.pass = Pass::Pass2;
        self
    }

    pub fn from_start(mut self) -> Self {
        self.parse_subpatterns_from_start = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        self.name == PLAIN
    }
}
