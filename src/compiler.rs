//! Validation and compilation of pattern lists.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. pattern names are unique
//! 2. a `Plain` pattern exists and is top-level
//! 3. parent references resolve, sub-patterns have a parent, no cycles
//! 4. style references resolve
//! 5. color-only patterns and colorers have no children
//! 6. required regexes are present and compile
//!
//! Nothing is built until every check has passed, so a failed compile never
//! yields a partial set.

use std::collections::HashMap;
use std::fmt;

use fancy_regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::info;

use crate::context::ReparseContext;
use crate::pattern::{PLAIN, Pass, PatternKind, PatternSpec};
use crate::pattern_set::{CompiledPattern, Matcher, PatternId, PatternSet};
use crate::style::StyleTable;

/// Backtracking budget per regex search before it is reported as a runtime error.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// A structural problem in a pattern list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pattern name \"{0}\" is used more than once")]
    DuplicateName(String),
    #[error("pattern set has no \"Plain\" pattern")]
    MissingPlain,
    #[error("the \"Plain\" pattern cannot have a parent")]
    PlainHasParent,
    #[error("parent \"{parent}\" of pattern \"{pattern}\" does not match any pattern in the set")]
    UnknownParent { pattern: String, parent: String },
    #[error("pattern \"{0}\" needs a parent pattern")]
    MissingParent(String),
    #[error("pattern \"{0}\" is its own ancestor")]
    ParentCycle(String),
    #[error("style \"{style}\" of pattern \"{pattern}\" is not in the style table")]
    UnknownStyle { pattern: String, style: String },
    #[error("pattern \"{0}\" cannot have sub-patterns")]
    ColorOnlyWithChildren(String),
    #[error("pattern \"{pattern}\" requires a {field} expression")]
    MissingRegex { pattern: String, field: RegexField },
    #[error("pattern set has {0} patterns, more than can be highlighted")]
    TooManyPatterns(usize),
}

/// Which expression of a pattern a [`RegexError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexField {
    Start,
    End,
    Error,
}

impl fmt::Display for RegexField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Error => "error",
        })
    }
}

/// The first expression that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error in {field} expression of pattern \"{pattern}\": {message}")]
pub struct RegexError {
    pub pattern: String,
    pub field: RegexField,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Regex(#[from] RegexError),
}

/// Compile `patterns` with default settings.
pub fn compile(patterns: &[PatternSpec], styles: &StyleTable) -> Result<PatternSet, CompileError> {
    PatternCompiler::new(styles).compile(patterns)
}

/// Builds [`PatternSet`]s against one style table snapshot.
#[derive(Debug, Clone)]
pub struct PatternCompiler<'s> {
    styles: &'s StyleTable,
    language: String,
    context: ReparseContext,
    backtrack_limit: usize,
}

impl<'s> PatternCompiler<'s> {
    pub fn new(styles: &'s StyleTable) -> Self {
        Self {
            styles,
            language: String::new(),
            context: ReparseContext::default(),
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
        }
    }

    pub fn language(mut self, name: impl Into<String>) -> Self {
        self.language = name.into();
        self
    }

    /// Set-level reparse context, combined with each pattern's own.
    pub fn context(mut self, lines: u32, chars: u32) -> Self {
        self.context = ReparseContext::new(lines, chars);
        self
    }

    pub fn backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = limit;
        self
    }

    pub fn compile(&self, patterns: &[PatternSpec]) -> Result<PatternSet, CompileError> {
        if patterns.len() > u16::MAX as usize {
            return Err(ValidationError::TooManyPatterns(patterns.len()).into());
        }

        let mut index = HashMap::with_capacity(patterns.len());
        for (i, spec) in patterns.iter().enumerate() {
            if index.insert(spec.name.as_str(), i).is_some() {
                return Err(ValidationError::DuplicateName(spec.name.clone()).into());
            }
        }

        let Some(&plain) = index.get(PLAIN) else {
            return Err(ValidationError::MissingPlain.into());
        };
        if patterns[plain].parent.is_some() {
            return Err(ValidationError::PlainHasParent.into());
        }

        let parents = resolve_parents(patterns, &index)?;
        check_cycles(patterns, &parents)?;

        for spec in patterns {
            if !self.styles.contains(&spec.style) {
                return Err(ValidationError::UnknownStyle {
                    pattern: spec.name.clone(),
                    style: spec.style.clone(),
                }
                .into());
            }
        }

        // A single-regex pattern may only be recolored by sub-expression.
        for (child, parent) in parents.iter().enumerate() {
            let Some(parent) = parent else {
                continue;
            };
            let spec = &patterns[*parent];
            let colorer = patterns[child].sub_expression_coloring;
            if spec.sub_expression_coloring || (spec.kind == PatternKind::ColorOnly && !colorer) {
                return Err(ValidationError::ColorOnlyWithChildren(spec.name.clone()).into());
            }
        }

        // Arena order: root first, then declaration order.
        let order: Vec<usize> = std::iter::once(plain)
            .chain((0..patterns.len()).filter(|&i| i != plain))
            .collect();
        let mut slot = vec![0; patterns.len()];
        for (arena, &decl) in order.iter().enumerate() {
            slot[decl] = arena;
        }

        let mut compiled = Vec::with_capacity(patterns.len());
        for &decl in &order {
            let spec = &patterns[decl];
            let matcher = if decl == plain {
                Matcher::Root
            } else {
                self.build_matcher(spec)?
            };
            compiled.push(CompiledPattern {
                name: spec.name.clone(),
                style: spec.style.clone(),
                parent: (decl != plain)
                    .then(|| PatternId::from_index(parents[decl].map_or(0, |p| slot[p]))),
                children: Vec::new(),
                matcher,
                pass: Pass::Pass1,
                from_start: spec.parse_subpatterns_from_start,
            });
        }

        for arena in 1..compiled.len() {
            if let Some(parent) = compiled[arena].parent {
                compiled[parent.index()].children.push(PatternId::from_index(arena));
            }
        }
        for arena in 1..compiled.len() {
            let mut top = arena;
            while let Some(parent) = compiled[top].parent.filter(|p| *p != PatternId::ROOT) {
                top = parent.index();
            }
            compiled[arena].pass = match patterns[order[top]].pass {
                Pass::Pass2 => Pass::Pass2,
                Pass::Pass1 | Pass::SubPattern => Pass::Pass1,
            };
        }

        let roots = |pass: Pass| -> Vec<PatternId> {
            compiled[0]
                .children
                .iter()
                .copied()
                .filter(|id| {
                    let p = &compiled[id.index()];
                    !p.is_colorer() && p.pass == pass
                })
                .collect()
        };
        let pass1_roots = roots(Pass::Pass1);
        let pass2_roots = roots(Pass::Pass2);

        let context = patterns.iter().fold(self.context, |ctx, spec| {
            ctx.max(ReparseContext::new(spec.context_lines, spec.context_chars))
        });

        info!(
            language = %self.language,
            patterns = compiled.len(),
            deferred = pass2_roots.len(),
            context_lines = context.lines,
            context_chars = context.chars,
            "compiled pattern set"
        );

        Ok(PatternSet {
            language: self.language.clone(),
            patterns: compiled,
            context,
            pass1_roots,
            pass2_roots,
        })
    }

    fn build_matcher(&self, spec: &PatternSpec) -> Result<Matcher, CompileError> {
        let start = spec.start_regex.trim();
        if start.is_empty() {
            return Err(missing(spec, RegexField::Start));
        }

        if spec.sub_expression_coloring {
            let start = parse_references(spec, RegexField::Start, start)?;
            let end = match spec.end_regex.as_deref().map(str::trim) {
                Some(end) if !end.is_empty() => parse_references(spec, RegexField::End, end)?,
                _ => Vec::new(),
            };
            return Ok(Matcher::SubExpressions { start, end });
        }

        match spec.kind {
            PatternKind::ColorOnly => Ok(Matcher::ColorOnly {
                regex: self.build_regex(spec, RegexField::Start, &spec.start_regex)?,
            }),
            PatternKind::DelimitedRange => {
                let end = match spec.end_regex.as_deref() {
                    Some(end) if !end.trim().is_empty() => end,
                    _ => return Err(missing(spec, RegexField::End)),
                };
                let error = match spec.error_regex.as_deref() {
                    Some(error) if !error.trim().is_empty() => {
                        Some(self.build_regex(spec, RegexField::Error, error)?)
                    }
                    _ => None,
                };
                Ok(Matcher::Delimited {
                    start: self.build_regex(spec, RegexField::Start, &spec.start_regex)?,
                    end: self.build_regex(spec, RegexField::End, end)?,
                    error,
                })
            }
        }
    }

    /// `^` and `$` match at line boundaries.
    fn build_regex(&self, spec: &PatternSpec, field: RegexField, source: &str) -> Result<Regex, RegexError> {
        RegexBuilder::new(&format!("(?m){source}"))
            .backtrack_limit(self.backtrack_limit)
            .build()
            .map_err(|err| RegexError {
                pattern: spec.name.clone(),
                field,
                message: err.to_string(),
            })
    }
}

fn missing(spec: &PatternSpec, field: RegexField) -> CompileError {
    ValidationError::MissingRegex {
        pattern: spec.name.clone(),
        field,
    }
    .into()
}

/// Declaration index of each pattern's parent; `None` for top-level patterns
/// and for patterns whose parent is `Plain`.
fn resolve_parents(
    patterns: &[PatternSpec],
    index: &HashMap<&str, usize>,
) -> Result<Vec<Option<usize>>, ValidationError> {
    let mut parents = Vec::with_capacity(patterns.len());
    for spec in patterns {
        let needs_parent = spec.pass == Pass::SubPattern || spec.sub_expression_coloring;
        let parent = match spec.parent.as_deref() {
            _ if spec.is_plain() => None,
            None | Some(PLAIN) if needs_parent => {
                return Err(ValidationError::MissingParent(spec.name.clone()));
            }
            None | Some(PLAIN) => None,
            Some(parent) => match index.get(parent) {
                Some(&i) => Some(i),
                None => {
                    return Err(ValidationError::UnknownParent {
                        pattern: spec.name.clone(),
                        parent: parent.to_string(),
                    });
                }
            },
        };
        parents.push(parent);
    }
    Ok(parents)
}

fn check_cycles(patterns: &[PatternSpec], parents: &[Option<usize>]) -> Result<(), ValidationError> {
    for (i, spec) in patterns.iter().enumerate() {
        let mut current = i;
        let mut steps = 0;
        while let Some(parent) = parents[current] {
            steps += 1;
            if steps > patterns.len() {
                return Err(ValidationError::ParentCycle(spec.name.clone()));
            }
            current = parent;
        }
    }
    Ok(())
}

/// Parse a sub-expression reference list such as `"& \2"` into group indices.
fn parse_references(spec: &PatternSpec, field: RegexField, text: &str) -> Result<Vec<usize>, RegexError> {
    let fail = |message: String| RegexError {
        pattern: spec.name.clone(),
        field,
        message,
    };
    let mut refs = Vec::new();
    let mut chars = text.chars().filter(|c| !matches!(c, ' ' | '\t')).peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => refs.push(0),
            '\\' => {
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                let group = digits
                    .parse()
                    .map_err(|_| fail("expected a sub-expression number after '\\'".to_string()))?;
                refs.push(group);
            }
            other => {
                return Err(fail(format!(
                    "unexpected '{other}'; only sub-expression references (&, \\1, \\2, ...) are allowed"
                )));
            }
        }
    }
    Ok(refs)
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
