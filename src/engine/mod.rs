//! Per-document highlighting state machine.
//!
//! [`HighlightEngine`] owns a text buffer and one style cell per byte. Each
//! cell holds the [`PatternId`] whose style applies there.
//!
//! - **Pass 1** runs over the whole buffer on load.
//! - **Pass 2** runs lazily: [`HighlightEngine::on_expose`] advances a
//!   high-water mark through the buffer as text becomes visible.
//! - **Edits** re-parse from the latest root-level position before the edit
//!   (widened by the set's reparse context) until parsing lines up with the
//!   pre-edit results again.
//!
//! Every root-level match is recorded as a span reaching as far as the text
//! was read to decide it, so a range dropped on its error regex covers the
//! error match too. A position not strictly inside any span is a safe place
//! to start or stop parsing, because no pattern is open there and nothing
//! decided earlier depends on the text after it.

mod edit;
mod parse;
mod spans;

use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

pub use edit::{Edit, EditError};
pub use spans::{StyledSpan, StyledSpans};

use crate::context::{backward_one_context, ceil_boundary, floor_boundary, forward_one_context};
use crate::pattern_set::{PatternId, PatternSet};
use parse::{Faults, Parser, Resync, Stop, push_span};

/// Highlighting progress of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unhighlighted,
    Pass1Complete,
    Pass2InProgress,
    FullyHighlighted,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unhighlighted => "unhighlighted",
            Self::Pass1Complete => "pass 1",
            Self::Pass2InProgress => "pass 2",
            Self::FullyHighlighted => "highlighted",
        }
    }
}

/// A regex failed while searching; its pattern no longer matches in this
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern \"{pattern}\" disabled: {message}")]
pub struct MatchRuntimeError {
    pub pattern: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
struct HighlightState {
    cells: Vec<PatternId>,
    pass1_spans: Vec<Range<usize>>,
    /// Only spans starting before `mark`.
    pass2_spans: Vec<Range<usize>>,
    mark: usize,
    faults: Faults,
}

impl HighlightState {
    fn new(set: &PatternSet, len: usize) -> Self {
        Self {
            cells: vec![PatternId::ROOT; len],
            pass1_spans: Vec::new(),
            pass2_spans: Vec::new(),
            mark: 0,
            faults: Faults::new(set.len()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HighlightEngine {
    text: String,
    set: Option<Arc<PatternSet>>,
    state: HighlightState,
    phase: Phase,
}

impl HighlightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pattern_set(&self) -> Option<&Arc<PatternSet>> {
        self.set.as_ref()
    }

    /// Offset up to which pass 2 results are current.
    pub fn high_water_mark(&self) -> usize {
        self.state.mark
    }

    /// Patterns disabled by regex runtime errors, oldest first.
    pub fn runtime_errors(&self) -> &[MatchRuntimeError] {
        self.state.faults.errors()
    }

    /// Replace the buffer and highlight it with `set` (pass 1 only).
    pub fn on_load(&mut self, text: impl Into<String>, set: Arc<PatternSet>) {
        let text = text.into();
        let mut state = HighlightState::new(&set, text.len());
        let run = Parser::new(&set, &text, &mut state.cells, &mut state.faults, 0).pass1(0, &Stop::Never);
        state.pass1_spans = run.spans;
        debug!(
            language = set.language(),
            bytes = text.len(),
            spans = state.pass1_spans.len(),
            "pass 1 complete"
        );
        self.text = text;
        self.set = Some(set);
        self.state = state;
        self.phase = Phase::Pass1Complete;
    }

    /// Drop the pattern set and all results; the text stays.
    pub fn unload(&mut self) {
        self.set = None;
        self.state = HighlightState::default();
        self.phase = Phase::Unhighlighted;
    }

    /// Make sure pass 2 results cover `visible`.
    pub fn on_expose(&mut self, visible: Range<usize>) {
        let Some(set) = self.set.as_deref() else {
            return;
        };
        let len = self.text.len();
        let state = &mut self.state;
        let target = ceil_boundary(&self.text, visible.end);
        if target > state.mark {
            let from = state.mark;
            if set.has_deferred() {
                let run = Parser::new(set, &self.text, &mut state.cells, &mut state.faults, from)
                    .pass2(from, &Stop::At(target));
                for span in run.spans {
                    push_span(&mut state.pass2_spans, span);
                }
                state.mark = run.end;
            } else {
                state.mark = target;
            }
            debug!(from, to = state.mark, "pass 2 advanced");
        }
        if state.mark >= len {
            self.phase = Phase::FullyHighlighted;
        } else if state.mark > 0 {
            self.phase = Phase::Pass2InProgress;
        }
    }

    /// Apply `edit` to the buffer and bring highlighting up to date.
    ///
    /// Returns the range, in post-edit offsets, whose styles may have changed.
    pub fn on_edit(&mut self, edit: &Edit) -> Result<Range<usize>, EditError> {
        edit.validate(&self.text)?;
        edit.apply(&mut self.text);
        let Some(set) = self.set.as_deref() else {
            return Ok(edit.offset..edit.new_end());
        };
        let delta = edit.delta();
        let state = &mut self.state;
        state.cells.splice(
            edit.offset..edit.old_end(),
            std::iter::repeat_n(PatternId::ROOT, edit.inserted.len()),
        );

        let context = set.context();
        let begin = backward_one_context(&self.text, context, edit.offset);
        let restart = root_state_at_or_before(&state.pass1_spans, begin);
        let target = forward_one_context(&self.text, context, edit.new_end());

        let old_pass1 = std::mem::take(&mut state.pass1_spans);
        let run = Parser::new(set, &self.text, &mut state.cells, &mut state.faults, restart).pass1(
            restart,
            &Stop::Resync(Resync {
                target,
                delta,
                old_spans: &old_pass1,
                ceiling: None,
            }),
        );
        let resync = run.rejoined.then_some(run.end);
        state.pass1_spans = splice_spans(&old_pass1, restart, run.spans, resync, delta);
        let mut restyled = restart..run.end;
        debug!(
            offset = edit.offset,
            removed = edit.removed,
            inserted = edit.inserted.len(),
            restart,
            resync = run.end,
            rejoined = run.rejoined,
            "pass 1 reparsed"
        );

        let old_mark = state.mark;
        let ceiling = if old_mark >= edit.old_end() {
            old_mark.wrapping_add_signed(delta)
        } else {
            old_mark.min(edit.offset)
        };
        if !set.has_deferred() {
            state.mark = ceiling;
        } else {
            let resume = root_state_at_or_before(&state.pass2_spans, restart);
            if old_mark > resume {
                let old_pass2 = std::mem::take(&mut state.pass2_spans);
                let run2 = Parser::new(set, &self.text, &mut state.cells, &mut state.faults, resume).pass2(
                    resume,
                    &Stop::Resync(Resync {
                        target: run.end,
                        delta,
                        old_spans: &old_pass2,
                        ceiling: Some(ceiling),
                    }),
                );
                let resync = run2.rejoined.then_some(run2.end);
                state.pass2_spans = splice_spans(&old_pass2, resume, run2.spans, resync, delta);
                state.mark = if run2.rejoined { ceiling } else { run2.end };
                restyled = restyled.start.min(resume)..restyled.end.max(run2.end);
                debug!(resume, stop = run2.end, mark = state.mark, "pass 2 reparsed");
            }
        }

        let len = self.text.len();
        self.phase = if state.mark >= len && self.phase != Phase::Pass1Complete {
            Phase::FullyHighlighted
        } else if state.mark == 0 {
            Phase::Pass1Complete
        } else {
            Phase::Pass2InProgress
        };
        Ok(restyled)
    }

    /// Styled spans covering `range`, clamped to the buffer.
    pub fn styled_spans(&self, range: Range<usize>) -> StyledSpans<'_> {
        let end = ceil_boundary(&self.text, range.end);
        let start = floor_boundary(&self.text, range.start.min(end));
        StyledSpans::new(self.set.as_deref(), &self.state.cells, self.state.mark, start..end)
    }
}

/// `pos`, or the start of the span strictly containing it.
fn root_state_at_or_before(spans: &[Range<usize>], pos: usize) -> usize {
    let idx = spans.partition_point(|s| s.end <= pos);
    match spans.get(idx) {
        Some(span) if span.start < pos => span.start,
        _ => pos,
    }
}

/// Old spans before `restart`, then `fresh`, then (when the run re-joined at
/// `resync`) old spans from there on, shifted by `delta`.
fn splice_spans(
    old: &[Range<usize>],
    restart: usize,
    fresh: Vec<Range<usize>>,
    resync: Option<usize>,
    delta: isize,
) -> Vec<Range<usize>> {
    let keep = old.partition_point(|s| s.end <= restart);
    let mut spans = old[..keep].to_vec();
    for span in fresh {
        push_span(&mut spans, span);
    }
    if let Some(at) = resync {
        let old_at = at.wrapping_add_signed(-delta);
        let tail = old.partition_point(|s| s.start < old_at);
        for s in &old[tail..] {
            push_span(&mut spans, s.start.wrapping_add_signed(delta)..s.end.wrapping_add_signed(delta));
        }
    }
    spans
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
