//! Incremental, two-pass, pattern-hierarchy syntax highlighting.
//!
//! Pipeline: authored [`PatternSpec`]s are validated and compiled against a
//! [`StyleTable`] snapshot into a read-only [`PatternSet`]; a per-document
//! [`HighlightEngine`] applies that set to a text buffer, eagerly for pass 1
//! patterns and on exposure for deferred (pass 2) patterns, and keeps the
//! result current across edits by re-parsing only the affected region.

pub mod compiler;
pub mod config;
pub mod context;
pub mod engine;
pub mod pattern;
pub mod pattern_set;
pub mod style;

pub use compiler::{CompileError, PatternCompiler, RegexError, RegexField, ValidationError, compile};
pub use config::{Config, ConfigError, ModeConfig};
pub use context::ReparseContext;
pub use engine::{Edit, EditError, HighlightEngine, MatchRuntimeError, Phase, StyledSpan, StyledSpans};
pub use pattern::{Pass, PatternKind, PatternSpec, PLAIN};
pub use pattern_set::{CompiledPattern, Matcher, PatternId, PatternSet};
pub use style::{FontVariant, Style, StyleTable};
