    use super::*;
    use std::sync::Arc;

    use patlight::{PatternCompiler, PatternSpec, Phase, Style};

    fn styles() -> StyleTable {
        [
            Style::new("Plain", "white"),
            Style::new("Comment", "gray"),
            Style::new("Number", "yellow"),
        ]
        .into_iter()
        .collect()
    }

    fn make_text_app(text: &str, viewport: usize) -> App {
        let styles = styles();
        let set = PatternCompiler::new(&styles)
            .context(1, 0)
            .compile(&[
                PatternSpec::plain(),
                PatternSpec::delimited("comment", "Comment", r"/\*", r"\*/"),
                PatternSpec::color_only("number", "Number", "[0-9]+").deferred(),
            ])
            .unwrap();
        let mut engine = HighlightEngine::new();
        engine.on_load(text, Arc::new(set));
        let mut app = App::new(engine, styles, "test.c".to_string(), "C".to_string());
        app.viewport_height = viewport;
        app
    }

    fn make_app(doc_lines: usize, viewport: usize) -> App {
        let text: String = (0..doc_lines).map(|i| format!("line {i}\n")).collect();
        make_text_app(&text, viewport)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_app_scroll_down_clamped() {
        let mut app = make_app(10, 5);
        app.scroll_down(100);
        // max_scroll = 10 - 5 = 5
        assert_eq!(app.scroll_offset, 5);
    }

    #[test]
    fn test_app_scroll_up_floor_at_zero() {
        let mut app = make_app(10, 5);
        app.scroll_offset = 2;
        app.scroll_up(100);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_app_max_scroll_short_document() {
        let app = make_app(3, 10);
        assert_eq!(app.max_scroll(), 0);
        assert_eq!(app.scroll_percent(), 100);
    }

    #[test]
    fn test_app_visible_range_at_bottom() {
        let mut app = make_app(20, 5);
        assert_eq!(app.visible_range(), 0..5);
        app.scroll_to_bottom();
        assert_eq!(app.visible_range(), 15..20);
        assert_eq!(app.scroll_percent(), 100);
    }

    #[test]
    fn test_app_half_page_keys() {
        let mut app = make_app(40, 10);
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.scroll_offset, 5);
        app.handle_key(key(KeyCode::Char('G')));
        assert_eq!(app.scroll_offset, 30);
        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.scroll_offset, 25);
        app.handle_key(key(KeyCode::Char('g')));
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_app_quit_and_reload_keys() {
        let mut app = make_app(3, 5);
        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.reload_requested);
        assert!(!app.quit);

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.quit);
    }

    #[test]
    fn test_app_line_index() {
        let app = make_text_app("ab\r\n\ncd", 10);
        assert_eq!(app.total_lines(), 3);
        assert_eq!(app.line_range(0), 0..2);
        assert_eq!(app.line_range(1), 4..4);
        assert_eq!(app.line_range(2), 5..7);
    }

    #[test]
    fn test_app_trailing_newline_adds_no_line() {
        let app = make_text_app("one\ntwo\n", 10);
        assert_eq!(app.total_lines(), 2);
        assert_eq!(app.visible_bytes(), 0..8);
        assert_eq!(make_text_app("", 10).total_lines(), 0);
    }

    #[test]
    fn test_app_expose_visible_advances_deferred_pass() {
        let mut app = make_app(20, 5);
        app.expose_visible();
        assert_eq!(app.engine.phase(), Phase::Pass2InProgress);
        assert!(app.engine.high_water_mark() >= app.visible_bytes().end);

        let number = app.engine.text().find('3').unwrap();
        let style = app.engine.styled_spans(number..number + 1).next().unwrap().style;
        assert_eq!(style, "Number");

        app.scroll_to_bottom();
        app.expose_visible();
        assert_eq!(app.engine.phase(), Phase::FullyHighlighted);
    }

    #[test]
    fn test_app_reload_applies_difference() {
        let mut app = make_text_app("a\nb\nc\n", 10);
        assert_eq!(app.reload("a\nb\nc\n").unwrap(), None);

        let restyled = app.reload("a\n/* b */\nc\n").unwrap().unwrap();
        assert!(restyled.start <= 2 && restyled.end >= 8);
        assert_eq!(app.total_lines(), 3);
        let spans: Vec<_> = app.engine.styled_spans(app.line_range(1)).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].style, "Comment");
    }

    #[test]
    fn test_app_reload_clamps_scroll() {
        let mut app = make_app(20, 5);
        app.scroll_to_bottom();
        app.reload("short\n").unwrap();
        assert_eq!(app.total_lines(), 1);
        assert_eq!(app.scroll_offset, 0);
    }
