//! Renderer: paints styled spans from the highlight engine to a Ratatui frame.
//!
//! Reads from `&App` to determine which lines are visible, then draws them
//! along with a status bar. The engine is never mutated here; `main.rs`
//! exposes the viewport before each draw.

use std::str::FromStr;

use patlight::StyleTable;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthChar;

use crate::app::App;

const TAB_WIDTH: usize = 8;

/// Draws the current view of the document and status bar to the frame.
///
/// The content area occupies all rows except the last, which is reserved
/// for the status bar. For extremely small terminals (height < 2), only
/// the status bar is rendered.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let content_height = area.height.saturating_sub(1) as usize;
    if content_height > 0 {
        for (i, line_idx) in app.visible_range().enumerate().take(content_height) {
            // saturating_add prevents u16 overflow if area.y is non-zero and i is large.
            let line_area = Rect {
                x: area.x,
                y: area.y.saturating_add(i as u16),
                width: area.width,
                height: 1,
            };
            let line = styled_line(app, line_idx);
            frame.render_widget(Paragraph::new(line), line_area);
        }
    }

    draw_status_bar(frame, app, area);
}

/// Builds the Ratatui line for document line `line_idx`.
fn styled_line(app: &App, line_idx: usize) -> Line<'static> {
    let text = app.engine.text();
    let range = app.line_range(line_idx);
    let mut column = 0;
    let spans: Vec<Span<'static>> = app
        .engine
        .styled_spans(range)
        .map(|span| {
            let content = expand_tabs(&text[span.range], &mut column);
            Span::styled(content, to_ratatui(&app.styles, span.style))
        })
        .collect();
    Line::from(spans)
}

/// Replaces tabs with spaces up to the next tab stop, tracking the display
/// column across spans of one line.
fn expand_tabs(text: &str, column: &mut usize) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\t' => {
                let pad = TAB_WIDTH - *column % TAB_WIDTH;
                out.extend(std::iter::repeat_n(' ', pad));
                *column += pad;
            }
            '\r' => {}
            _ => {
                out.push(ch);
                *column += ch.width().unwrap_or(0);
            }
        }
    }
    out
}

/// Converts a named highlight style to a terminal style. Unknown styles and
/// unparsable colors fall back to the terminal defaults.
fn to_ratatui(styles: &StyleTable, name: &str) -> Style {
    let Some(style) = styles.get(name) else {
        return Style::default();
    };
    let mut out = Style::default().fg(parse_color(&style.foreground));
    if let Some(bg) = &style.background {
        out = out.bg(parse_color(bg));
    }
    if style.font.is_bold() {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font.is_italic() {
        out = out.add_modifier(Modifier::ITALIC);
    }
    out
}

fn parse_color(spec: &str) -> Color {
    Color::from_str(spec).unwrap_or(Color::Reset)
}

/// Renders the status bar at the bottom row of the given area.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let percent = app.scroll_percent();
    let total_lines = app.total_lines();
    let current_line = if total_lines == 0 {
        0
    } else {
        app.scroll_offset + 1
    };

    let mut status_text = format!(
        " {} | {} | {}% | {}/{} | {} ",
        app.filename,
        app.mode,
        percent,
        current_line,
        total_lines,
        app.engine.phase().label()
    );
    let disabled = app.engine.runtime_errors().len();
    if disabled > 0 {
        status_text.push_str(&format!("| {disabled} disabled "));
    }

    let status_style = Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD);

    // Pad the status text to fill the entire width.
    let padded = format!("{:<width$}", status_text, width = area.width as usize);
    let status_line = Line::from(Span::styled(padded, status_style));
    frame.render_widget(Paragraph::new(status_line), status_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use patlight::{FontVariant, Style as HighlightStyle};

    #[test]
    fn test_expand_tabs_tracks_column() {
        let mut column = 0;
        assert_eq!(expand_tabs("ab\tc", &mut column), "ab      c");
        assert_eq!(column, 9);
        assert_eq!(expand_tabs("\t", &mut column), "       ");
        assert_eq!(column, 16);
    }

    #[test]
    fn test_expand_tabs_strips_carriage_return() {
        let mut column = 0;
        assert_eq!(expand_tabs("x\r", &mut column), "x");
        assert_eq!(column, 1);
    }

    #[test]
    fn test_to_ratatui_maps_colors_and_font() {
        let styles: StyleTable = [
            HighlightStyle::new("Keyword", "#ff0000").with_font(FontVariant::BoldItalic),
            HighlightStyle::new("Flag", "black").with_background("yellow"),
            HighlightStyle::new("Odd", "not a color"),
        ]
        .into_iter()
        .collect();

        let keyword = to_ratatui(&styles, "Keyword");
        assert_eq!(keyword.fg, Some(Color::Rgb(255, 0, 0)));
        assert!(keyword.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));

        let flag = to_ratatui(&styles, "Flag");
        assert_eq!(flag.fg, Some(Color::Black));
        assert_eq!(flag.bg, Some(Color::Yellow));

        assert_eq!(to_ratatui(&styles, "Odd").fg, Some(Color::Reset));
        assert_eq!(to_ratatui(&styles, "Missing"), Style::default());
    }
}
