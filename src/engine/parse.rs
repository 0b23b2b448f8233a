//! Regex scanning over a buffer, writing pattern ids into style cells.
//!
//! A [`Parser`] is built for one run of one pass. Pass 1 scans the whole
//! buffer from a root-level position; pass 2 scans only the gaps pass 1
//! left plain, one gap at a time, with the gap end as matching limit.
//! Both stop early when told to by a [`Stop`].

use std::ops::Range;

use fancy_regex::{Captures, Regex};
use tracing::warn;

use super::MatchRuntimeError;
use crate::context::next_boundary;
use crate::pattern::Pass;
use crate::pattern_set::{Matcher, PatternId, PatternSet};

/// Patterns disabled by regex runtime errors, for one document.
#[derive(Debug, Clone, Default)]
pub(crate) struct Faults {
    disabled: Vec<bool>,
    errors: Vec<MatchRuntimeError>,
}

impl Faults {
    pub(crate) fn new(patterns: usize) -> Self {
        Self {
            disabled: vec![false; patterns],
            errors: Vec::new(),
        }
    }

    pub(crate) fn errors(&self) -> &[MatchRuntimeError] {
        &self.errors
    }

    fn is_disabled(&self, id: PatternId) -> bool {
        self.disabled.get(id.index()).copied().unwrap_or(false)
    }

    fn disable(&mut self, set: &PatternSet, id: PatternId, err: &fancy_regex::Error) {
        let Some(flag) = self.disabled.get_mut(id.index()) else {
            return;
        };
        if *flag {
            return;
        }
        *flag = true;
        let error = MatchRuntimeError {
            pattern: set.pattern(id).name().to_string(),
            message: err.to_string(),
        };
        warn!(pattern = %error.pattern, "{error}");
        self.errors.push(error);
    }
}

/// Where a run ends before the end of the buffer.
pub(crate) enum Stop<'s> {
    Never,
    /// At the first root-level position at or past the offset.
    At(usize),
    /// Where the run re-joins results computed before an edit.
    Resync(Resync<'s>),
}

pub(crate) struct Resync<'s> {
    /// Earliest position at which the run may re-join.
    pub target: usize,
    /// Bytes inserted minus bytes removed by the edit.
    pub delta: isize,
    /// Root-level spans of the same pass, in pre-edit offsets.
    pub old_spans: &'s [Range<usize>],
    /// Position at which to stop even without re-joining.
    pub ceiling: Option<usize>,
}

impl Resync<'_> {
    /// First stop position in `from..=up_to`, and whether it re-joins.
    fn stop_point(&self, from: usize, up_to: usize) -> Option<(usize, bool)> {
        let ceiling = self.ceiling.map(|c| c.max(from)).filter(|&c| c <= up_to);
        let rejoin = self.rejoin_point(from, up_to);
        match (ceiling, rejoin) {
            (Some(c), Some(r)) if r < c => Some((r, true)),
            (Some(c), _) => Some((c, false)),
            (None, r) => r.map(|r| (r, true)),
        }
    }

    /// First position at or after `from` that was root-level before the edit.
    fn rejoin_point(&self, from: usize, up_to: usize) -> Option<usize> {
        let at = from.max(self.target);
        if at > up_to {
            return None;
        }
        let old = at.wrapping_add_signed(-self.delta);
        let idx = self.old_spans.partition_point(|s| s.end <= old);
        let at = match self.old_spans.get(idx) {
            Some(span) if span.start < old => span.end.wrapping_add_signed(self.delta),
            _ => at,
        };
        (at <= up_to).then_some(at)
    }
}

/// Result of one run.
pub(crate) struct Run {
    /// Root-level spans, in order. Each runs to the furthest offset read to
    /// decide its match; overlapping spans are merged.
    pub spans: Vec<Range<usize>>,
    /// Root-level position where the run stopped.
    pub end: usize,
    /// The run stopped by re-joining pre-edit results.
    pub rejoined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Start,
    End,
    Error,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    pattern: PatternId,
    role: Role,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    candidate: Candidate,
    start: usize,
    end: usize,
}

enum Outcome {
    Closed { end: usize, horizon: usize },
    Unterminated(usize),
    Errored { horizon: usize },
}

/// Where a match's styling ends, and how far the text was read to decide it.
#[derive(Debug, Clone, Copy)]
struct Extent {
    end: usize,
    horizon: usize,
}

/// Append `span`, merging it into the last one when they overlap.
pub(crate) fn push_span(spans: &mut Vec<Range<usize>>, span: Range<usize>) {
    match spans.last_mut() {
        Some(last) if last.end > span.start => last.end = last.end.max(span.end),
        _ => spans.push(span),
    }
}

/// Alternatives searched at one nesting level, in priority order, with the
/// last search result of each.
struct Scanner {
    candidates: Vec<Candidate>,
    cached: Vec<Option<Option<(usize, usize)>>>,
}

impl Scanner {
    fn new(candidates: Vec<Candidate>) -> Self {
        let cached = vec![None; candidates.len()];
        Self { candidates, cached }
    }

    fn starts(ids: &[PatternId]) -> Self {
        Self::new(
            ids.iter()
                .map(|&pattern| Candidate {
                    pattern,
                    role: Role::Start,
                })
                .collect(),
        )
    }

    /// End, error, then child starts in declaration order.
    fn body(set: &PatternSet, id: PatternId) -> Self {
        let pattern = set.pattern(id);
        let mut candidates = vec![Candidate {
            pattern: id,
            role: Role::End,
        }];
        if let Matcher::Delimited { error: Some(_), .. } = pattern.matcher() {
            candidates.push(Candidate {
                pattern: id,
                role: Role::Error,
            });
        }
        candidates.extend(
            pattern
                .children()
                .iter()
                .filter(|child| !set.pattern(**child).is_colorer())
                .map(|&child| Candidate {
                    pattern: child,
                    role: Role::Start,
                }),
        );
        Self::new(candidates)
    }

    fn reset(&mut self) {
        self.cached.fill(None);
    }
}

fn regex_of(set: &PatternSet, candidate: Candidate) -> Option<&Regex> {
    match (set.pattern(candidate.pattern).matcher(), candidate.role) {
        (Matcher::ColorOnly { regex }, Role::Start) => Some(regex),
        (Matcher::Delimited { start, .. }, Role::Start) => Some(start),
        (Matcher::Delimited { end, .. }, Role::End) => Some(end),
        (Matcher::Delimited { error, .. }, Role::Error) => error.as_ref(),
        _ => None,
    }
}

pub(crate) struct Parser<'a> {
    set: &'a PatternSet,
    text: &'a str,
    cells: &'a mut [PatternId],
    faults: &'a mut Faults,
    /// Cells before this offset may have been written by this run.
    written_end: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        set: &'a PatternSet,
        text: &'a str,
        cells: &'a mut [PatternId],
        faults: &'a mut Faults,
        from: usize,
    ) -> Self {
        Self {
            set,
            text,
            cells,
            faults,
            written_end: from,
        }
    }

    /// Run pass 1 from a root-level position.
    pub(crate) fn pass1(&mut self, from: usize, stop: &Stop<'_>) -> Run {
        let len = self.text.len();
        let mut scanner = Scanner::starts(self.set.roots(Pass::Pass1));
        let mut spans = Vec::new();
        let mut pos = from;
        loop {
            let hit = self.next_hit(&mut scanner, pos, len);
            let next = hit.map_or(len, |h| h.start);
            if let Some((end, rejoined)) = self.stop_point(stop, pos, next, false) {
                self.fill(pos, end, PatternId::ROOT);
                return Run { spans, end, rejoined };
            }
            self.fill(pos, next, PatternId::ROOT);
            let Some(hit) = hit else {
                return Run {
                    spans,
                    end: len,
                    rejoined: false,
                };
            };
            match self.root_step(hit, len, &mut spans) {
                Some(after) => pos = after,
                None => {
                    return Run {
                        spans,
                        end: len,
                        rejoined: false,
                    };
                }
            }
        }
    }

    /// Run pass 2 from a root-level position through the gaps pass 1 left.
    pub(crate) fn pass2(&mut self, from: usize, stop: &Stop<'_>) -> Run {
        let len = self.text.len();
        let mut scanner = Scanner::starts(self.set.roots(Pass::Pass2));
        let mut spans = Vec::new();
        let mut pos = from;
        let mut gap_end: Option<usize> = None;
        while pos < len {
            if self.is_pass1(pos) {
                let region_end = self.pass1_region_end(pos);
                if let Some((end, rejoined)) = self.stop_point(stop, pos, region_end, false) {
                    return Run { spans, end, rejoined };
                }
                pos = region_end;
                continue;
            }

            let limit = match gap_end {
                Some(end) if pos < end => end,
                _ => {
                    let end = self.gap_end(pos);
                    scanner.reset();
                    gap_end = Some(end);
                    end
                }
            };
            let hit = self.next_hit(&mut scanner, pos, limit);
            let next = hit.map_or(limit, |h| h.start);
            if let Some((end, rejoined)) = self.stop_point(stop, pos, next, true) {
                self.fill(pos, end, PatternId::ROOT);
                return Run { spans, end, rejoined };
            }
            self.fill(pos, next, PatternId::ROOT);
            pos = match hit {
                Some(hit) => self.root_step(hit, limit, &mut spans).unwrap_or(limit),
                None => limit,
            };
        }
        Run {
            spans,
            end: len,
            rejoined: false,
        }
    }

    /// Stop position within `pos..=up_to`, if any. Positions in that range are
    /// all root-level. `extend` lets a `Stop::At` run on to `up_to`, since
    /// the text up to there has already been searched.
    fn stop_point(&self, stop: &Stop<'_>, pos: usize, up_to: usize, extend: bool) -> Option<(usize, bool)> {
        let from = pos.max(self.written_end);
        match stop {
            Stop::Never => None,
            Stop::At(target) => {
                let at = from.max(*target);
                (at <= up_to).then_some((if extend { up_to } else { at }, false))
            }
            Stop::Resync(resync) => resync.stop_point(from, up_to),
        }
    }

    /// Consume a root-level match. Returns the next scan position, or `None`
    /// when an empty match sits at the limit.
    fn root_step(&mut self, hit: Hit, limit: usize, spans: &mut Vec<Range<usize>>) -> Option<usize> {
        let extent = self.match_child(hit, limit, PatternId::ROOT);
        if extent.horizon > hit.start {
            push_span(spans, hit.start..extent.horizon);
        }
        if extent.end > hit.start {
            return Some(extent.end);
        }
        if hit.start >= limit {
            return None;
        }
        let next = next_boundary(self.text, hit.start);
        self.fill(hit.start, next, PatternId::ROOT);
        Some(next)
    }

    /// Parse a matched start of a child of `enclosing`.
    fn match_child(&mut self, hit: Hit, limit: usize, enclosing: PatternId) -> Extent {
        let id = hit.candidate.pattern;
        match self.set.pattern(id).matcher() {
            Matcher::Delimited { .. } => match self.parse_range(id, hit.start..hit.end, limit) {
                Outcome::Closed { end, horizon } => Extent { end, horizon },
                Outcome::Unterminated(end) => Extent { end, horizon: end },
                Outcome::Errored { horizon } => {
                    self.fill(hit.start, hit.end, enclosing);
                    Extent {
                        end: hit.end,
                        horizon,
                    }
                }
            },
            _ => {
                self.fill(hit.start, hit.end, id);
                self.color_sub_expressions(id, hit.start, None, limit);
                Extent {
                    end: hit.end,
                    horizon: hit.end,
                }
            }
        }
    }

    fn parse_range(&mut self, id: PatternId, start: Range<usize>, limit: usize) -> Outcome {
        let mut pos = if self.set.pattern(id).parses_from_start() {
            start.start
        } else {
            self.fill(start.start, start.end, id);
            start.end
        };
        let mut horizon = start.end;
        let mut scanner = Scanner::body(self.set, id);
        loop {
            let Some(hit) = self.next_hit(&mut scanner, pos, limit) else {
                self.fill(pos, limit, id);
                self.color_sub_expressions(id, start.start, None, limit);
                return Outcome::Unterminated(limit);
            };
            self.fill(pos, hit.start, id);
            match hit.candidate.role {
                Role::End => {
                    self.fill(hit.start, hit.end, id);
                    self.color_sub_expressions(id, start.start, Some(hit.start), limit);
                    return Outcome::Closed {
                        end: hit.end,
                        horizon: horizon.max(hit.end),
                    };
                }
                Role::Error => {
                    return Outcome::Errored {
                        horizon: horizon.max(hit.end),
                    };
                }
                Role::Start => {
                    let child = self.match_child(hit, limit, id);
                    horizon = horizon.max(child.horizon);
                    pos = if child.end > hit.start {
                        child.end
                    } else if hit.start >= limit {
                        self.color_sub_expressions(id, start.start, None, limit);
                        return Outcome::Unterminated(limit);
                    } else {
                        let next = next_boundary(self.text, hit.start);
                        self.fill(hit.start, next, id);
                        next
                    };
                }
            }
        }
    }

    /// Apply the colorers of `id` to its start match at `start_at` and, if it
    /// is a range that closed, its end match at `end_at`.
    fn color_sub_expressions(&mut self, id: PatternId, start_at: usize, end_at: Option<usize>, limit: usize) {
        let set = self.set;
        let pattern = set.pattern(id);
        let (start, end) = match pattern.matcher() {
            Matcher::Delimited { start, end, .. } => (start, Some(end)),
            Matcher::ColorOnly { regex } => (regex, None),
            _ => return,
        };
        let mut start_groups = None;
        let mut end_groups = None;
        for &child in pattern.children() {
            let Matcher::SubExpressions {
                start: start_refs,
                end: end_refs,
            } = set.pattern(child).matcher()
            else {
                continue;
            };
            if !start_refs.is_empty() {
                let groups = start_groups.get_or_insert_with(|| self.groups(start, id, start_at, limit));
                self.recolor(groups, start_refs, child);
            }
            if let (Some(end), Some(at)) = (end, end_at.filter(|_| !end_refs.is_empty())) {
                let groups = end_groups.get_or_insert_with(|| self.groups(end, id, at, limit));
                self.recolor(groups, end_refs, child);
            }
        }
    }

    /// Capture group ranges of `regex` matched at exactly `at`.
    fn groups(&mut self, regex: &Regex, owner: PatternId, at: usize, limit: usize) -> Vec<Option<Range<usize>>> {
        match regex.captures_from_pos(&self.text[..limit], at) {
            Ok(Some(captures)) if captures.get(0).is_some_and(|m| m.start() == at) => group_ranges(&captures),
            Ok(_) => Vec::new(),
            Err(err) => {
                self.faults.disable(self.set, owner, &err);
                Vec::new()
            }
        }
    }

    fn recolor(&mut self, groups: &[Option<Range<usize>>], refs: &[usize], colorer: PatternId) {
        for group in refs.iter().filter_map(|&r| groups.get(r).cloned().flatten()) {
            self.fill(group.start, group.end, colorer);
        }
    }

    /// Leftmost match among the scanner's candidates; ties go to the earlier
    /// candidate.
    fn next_hit(&mut self, scanner: &mut Scanner, pos: usize, limit: usize) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for i in 0..scanner.candidates.len() {
            let candidate = scanner.candidates[i];
            let found = match scanner.cached[i] {
                Some(None) => None,
                Some(Some((start, end))) if start >= pos => Some((start, end)),
                _ => {
                    let found = self.search(candidate, pos, limit);
                    scanner.cached[i] = Some(found);
                    found
                }
            };
            if let Some((start, end)) = found {
                if best.is_none_or(|b| start < b.start) {
                    best = Some(Hit { candidate, start, end });
                }
            }
        }
        best
    }

    fn search(&mut self, candidate: Candidate, pos: usize, limit: usize) -> Option<(usize, usize)> {
        if self.faults.is_disabled(candidate.pattern) {
            return None;
        }
        let regex = regex_of(self.set, candidate)?;
        match regex.find_from_pos(&self.text[..limit], pos) {
            Ok(found) => found.map(|m| (m.start(), m.end())),
            Err(err) => {
                self.faults.disable(self.set, candidate.pattern, &err);
                None
            }
        }
    }

    fn fill(&mut self, from: usize, to: usize, id: PatternId) {
        if from >= to {
            return;
        }
        self.cells[from..to].fill(id);
        self.written_end = self.written_end.max(to);
    }

    fn is_pass1(&self, pos: usize) -> bool {
        let id = self.cells[pos];
        id != PatternId::ROOT && self.set.pattern(id).pass() == Pass::Pass1
    }

    fn pass1_region_end(&self, from: usize) -> usize {
        (from..self.cells.len())
            .find(|&i| !self.is_pass1(i))
            .unwrap_or(self.cells.len())
    }

    fn gap_end(&self, from: usize) -> usize {
        (from..self.cells.len())
            .find(|&i| self.is_pass1(i))
            .unwrap_or(self.cells.len())
    }
}

fn group_ranges(captures: &Captures<'_>) -> Vec<Option<Range<usize>>> {
    (0..captures.len())
        .map(|i| captures.get(i).map(|m| m.start()..m.end()))
        .collect()
}
