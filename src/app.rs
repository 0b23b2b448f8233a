//! Application state: the highlighted document, scroll position, viewport
//! dimensions, quit and reload flags.
//!
//! `App` is a pure state container: it never imports `ratatui::Frame` or
//! performs any rendering. The renderer reads from `&App` to determine
//! what to draw.

use std::ops::Range;

use patlight::{Edit, EditError, HighlightEngine, StyleTable};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

/// Application state for the TUI viewer.
///
/// Holds the highlight engine (which owns the text), a line index into it,
/// the style table, scroll position, viewport size and session metadata.
/// Methods handle keyboard input, scroll arithmetic, exposure and reloads.
pub struct App {
    /// Engine holding the buffer and its highlighting.
    pub engine: HighlightEngine,
    /// Styles used to paint pattern styles.
    pub styles: StyleTable,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    /// Current vertical scroll offset (0 = top of document).
    pub scroll_offset: usize,
    /// Number of visible lines in the content area (excludes status bar).
    pub viewport_height: usize,
    /// Name of the file being displayed (shown in the status bar).
    pub filename: String,
    /// Language mode name (shown in the status bar).
    pub mode: String,
    /// When true, the event loop should exit.
    pub quit: bool,
    /// When true, the event loop should re-read the file.
    pub reload_requested: bool,
}

impl App {
    /// Creates a new `App` around a loaded engine.
    ///
    /// Scroll starts at the top; viewport height is set to 0 and must
    /// be updated by `main.rs` before each draw call.
    pub fn new(engine: HighlightEngine, styles: StyleTable, filename: String, mode: String) -> Self {
        let line_starts = line_starts(engine.text());
        Self {
            engine,
            styles,
            line_starts,
            scroll_offset: 0,
            viewport_height: 0,
            filename,
            mode,
            quit: false,
            reload_requested: false,
        }
    }

    /// Dispatches a key event to the appropriate scroll, reload or quit action.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(1),
            KeyCode::Char('d') | KeyCode::PageDown => {
                let half = self.viewport_height / 2;
                self.scroll_down(half.max(1));
            }
            KeyCode::Char('u') | KeyCode::PageUp => {
                let half = self.viewport_height / 2;
                self.scroll_up(half.max(1));
            }
            KeyCode::Char('g') | KeyCode::Home => self.scroll_to_top(),
            KeyCode::Char('G') | KeyCode::End => self.scroll_to_bottom(),
            KeyCode::Char('r') => self.reload_requested = true,
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
            }
            _ => {}
        }
    }

    /// Number of lines in the document. A trailing newline does not start
    /// a new line.
    pub fn total_lines(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of line `index`, without its line terminator.
    pub fn line_range(&self, index: usize) -> Range<usize> {
        let text = self.engine.text();
        let start = self.line_starts[index];
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(text.len(), |next| next - 1);
        let end = if text[start..end].ends_with('\r') { end - 1 } else { end };
        start..end
    }

    /// Returns the range of line indices visible in the current viewport.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll_offset + self.viewport_height).min(self.total_lines());
        self.scroll_offset..end
    }

    /// Byte range of the visible lines, terminators included.
    pub fn visible_bytes(&self) -> Range<usize> {
        let lines = self.visible_range();
        if lines.is_empty() {
            return 0..0;
        }
        let start = self.line_starts[lines.start];
        let end = self
            .line_starts
            .get(lines.end)
            .copied()
            .unwrap_or(self.engine.text().len());
        start..end
    }

    /// Lets deferred highlighting catch up with the viewport.
    pub fn expose_visible(&mut self) {
        let visible = self.visible_bytes();
        self.engine.on_expose(visible);
    }

    /// Replaces the buffer with `text`, passing the difference to the
    /// engine as one edit. Returns the restyled range, or `None` when
    /// nothing changed.
    pub fn reload(&mut self, text: &str) -> Result<Option<Range<usize>>, EditError> {
        let Some(edit) = Edit::between(self.engine.text(), text) else {
            return Ok(None);
        };
        let restyled = self.engine.on_edit(&edit)?;
        debug!(
            offset = edit.offset,
            removed = edit.removed,
            inserted = edit.inserted.len(),
            ?restyled,
            "reloaded"
        );
        self.line_starts = line_starts(self.engine.text());
        self.clamp_scroll();
        Ok(Some(restyled))
    }

    /// Scrolls down by `n` lines, clamped to the maximum scroll position.
    pub fn scroll_down(&mut self, n: usize) {
        let max = self.max_scroll();
        self.scroll_offset = self.scroll_offset.saturating_add(n).min(max);
    }

    /// Scrolls up by `n` lines, clamped to 0.
    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    /// Scrolls to the top of the document.
    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    /// Scrolls to the bottom of the document.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    /// Pulls the scroll offset back inside the document, e.g. after a
    /// resize or a reload that removed lines.
    pub fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    /// Returns the maximum valid scroll offset.
    ///
    /// When the document is shorter than the viewport, returns 0 (no scrolling).
    pub fn max_scroll(&self) -> usize {
        self.total_lines().saturating_sub(self.viewport_height)
    }

    /// Returns the current scroll position as a percentage (0–100).
    ///
    /// Returns 100 when the document fits within the viewport or when
    /// scrolled to the bottom.
    pub fn scroll_percent(&self) -> u16 {
        let max = self.max_scroll();
        if max == 0 {
            return 100;
        }
        ((self.scroll_offset as f64 / max as f64) * 100.0) as u16
    }
}

/// Offsets at which lines start.
fn line_starts(text: &str) -> Vec<usize> {
    let mut starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    if starts.last() == Some(&text.len()) {
        starts.pop();
    }
    starts
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
