//! Reparse context distances and byte-offset helpers.
//!
//! After an edit the engine must re-evaluate a little text on either side
//! of the change, because a regex may look behind or ahead of its match.
//! How much is described by a [`ReparseContext`] (lines and characters) and
//! converted to byte offsets here.
//!
//! All offsets are byte offsets into a `&str` and all results lie on
//! character boundaries.

/// Lookaround distance needed to re-evaluate patterns after an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReparseContext {
    pub lines: u32,
    pub chars: u32,
}

impl ReparseContext {
    pub const fn new(lines: u32, chars: u32) -> Self {
        Self { lines, chars }
    }

    /// The larger distance of each kind.
    pub fn max(self, other: Self) -> Self {
        Self {
            lines: self.lines.max(other.lines),
            chars: self.chars.max(other.chars),
        }
    }
}

/// Start of the position one context distance before `from`.
///
/// With a line context of `n` the result is the newline that precedes the
/// line `n - 1` lines above the one containing `from`. With a character
/// context it is `n` characters back. With both, the farther one wins.
pub fn backward_one_context(text: &str, context: ReparseContext, from: usize) -> usize {
    let by_lines = || {
        let line_start = count_backward_lines(text, from, context.lines as usize - 1);
        line_start.saturating_sub(1)
    };
    match (context.lines, context.chars) {
        (0, 0) => from,
        (0, chars) => retreat_chars(text, from, chars as usize),
        (_, 0) => by_lines(),
        (_, chars) => by_lines().min(retreat_chars(text, from, chars as usize)),
    }
}

/// End of the position one context distance after `from`.
///
/// With a line context of `n` the result is the start of the `n`th line
/// after the one containing `from`. With a character context it is `n`
/// characters forward. With both, the farther one wins.
pub fn forward_one_context(text: &str, context: ReparseContext, from: usize) -> usize {
    let by_lines = || count_forward_lines(text, from, context.lines as usize);
    match (context.lines, context.chars) {
        (0, 0) => from,
        (0, chars) => advance_chars(text, from, chars as usize),
        (_, 0) => by_lines(),
        (_, chars) => by_lines().max(advance_chars(text, from, chars as usize)),
    }
}

/// Start of the line `lines` lines above the line containing `from`.
fn count_backward_lines(text: &str, from: usize, lines: usize) -> usize {
    let mut seen = 0;
    for (i, byte) in text.as_bytes()[..from].iter().enumerate().rev() {
        if *byte == b'\n' {
            if seen == lines {
                return i + 1;
            }
            seen += 1;
        }
    }
    0
}

/// Position just after the `lines`th newline at or after `from`.
fn count_forward_lines(text: &str, from: usize, lines: usize) -> usize {
    if lines == 0 {
        return from;
    }
    let mut seen = 0;
    for (i, byte) in text.as_bytes()[from..].iter().enumerate() {
        if *byte == b'\n' {
            seen += 1;
            if seen == lines {
                return from + i + 1;
            }
        }
    }
    text.len()
}

fn retreat_chars(text: &str, from: usize, chars: usize) -> usize {
    if chars == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(i, _)| i)
}

fn advance_chars(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| from + i)
}

/// Offset of the character after the one starting at `at`.
pub(crate) fn next_boundary(text: &str, at: usize) -> usize {
    text[at..].chars().next().map_or(text.len(), |c| at + c.len_utf8())
}

/// Smallest character boundary at or after `at`, clamped to the text.
pub(crate) fn ceil_boundary(text: &str, at: usize) -> usize {
    let mut at = at.min(text.len());
    while !text.is_char_boundary(at) {
        at += 1;
    }
    at
}

/// Largest character boundary at or before `at`, clamped to the text.
pub(crate) fn floor_boundary(text: &str, at: usize) -> usize {
    let mut at = at.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
