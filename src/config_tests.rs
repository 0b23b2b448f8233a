    use super::*;
    use std::sync::Arc;

    use crate::engine::HighlightEngine;
    use crate::pattern_set::PatternId;

    #[test]
    fn test_config_builtin_modes_compile() {
        let config = Config::builtin().unwrap();
        assert!(!config.modes.is_empty());
        for mode in &config.modes {
            let set = config.compile_mode(&mode.name).unwrap();
            assert_eq!(set.language(), mode.name);
            assert!(set.context().lines >= 1);
        }
    }

    #[test]
    fn test_config_mode_lookup_ignores_case() {
        let config = Config::builtin().unwrap();
        assert_eq!(config.mode("c").map(|m| m.name.as_str()), Some("C"));
        assert!(config.mode("cobol").is_none());
    }

    #[test]
    fn test_config_mode_for_path_uses_suffix() {
        let config = Config::builtin().unwrap();
        let name = |path: &str| config.mode_for_path(Path::new(path)).map(|m| m.name.clone());
        assert_eq!(name("src/main.c").as_deref(), Some("C"));
        assert_eq!(name("include/list.h").as_deref(), Some("C"));
        assert_eq!(name("lib.rs").as_deref(), Some("Rust"));
        assert_eq!(name("build.sh").as_deref(), Some("Shell"));
        assert_eq!(name("notes.txt"), None);
    }

    #[test]
    fn test_config_unknown_mode() {
        let config = Config::builtin().unwrap();
        assert!(matches!(
            config.compile_mode("Fortran"),
            Err(ConfigError::UnknownMode(name)) if name == "Fortran"
        ));
    }

    #[test]
    fn test_config_defaults_and_compile_error() {
        let config = Config::from_json(
            r#"{
                "styles": [{"name": "Plain", "foreground": "white"}],
                "modes": [{"name": "Broken", "patterns": [
                    {"name": "Plain", "style": "Plain"},
                    {"name": "word", "style": "Missing", "start_regex": "\\w+"}
                ]}]
            }"#,
        )
        .unwrap();
        let mode = config.mode("Broken").unwrap();
        assert_eq!(mode.line_context, 1);
        assert_eq!(mode.char_context, 0);
        match config.compile_mode("Broken") {
            Err(ConfigError::Compile { mode, source }) => {
                assert_eq!(mode, "Broken");
                assert!(matches!(
                    source,
                    CompileError::Validation(crate::compiler::ValidationError::UnknownStyle { .. })
                ));
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        assert!(matches!(Config::from_json("{ \"modes\": 3 }"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::load(Path::new("/nonexistent/patterns.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/patterns.json"));
    }

    #[test]
    fn test_config_plain_mode_highlights_nothing() {
        let set = ModeConfig::plain().compile(&Config::builtin().unwrap().style_table()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.has_deferred());
    }

    #[test]
    fn test_config_fallback_mode_uses_an_existing_style() {
        let config = Config::builtin().unwrap();
        let set = config.fallback_mode().unwrap().compile(&config.style_table()).unwrap();
        assert_eq!(set.style_of(PatternId::ROOT), "Plain");

        let config = Config::from_json(
            r#"{"styles": [{"name": "Text", "foreground": "white"}, {"name": "Comment", "foreground": "gray"}]}"#,
        )
        .unwrap();
        let set = config.fallback_mode().unwrap().compile(&config.style_table()).unwrap();
        assert_eq!(set.style_of(PatternId::ROOT), "Text");
    }

    #[test]
    fn test_config_fallback_mode_without_styles() {
        let config = Config::from_json(r#"{"modes": []}"#).unwrap();
        assert!(matches!(config.fallback_mode(), Err(ConfigError::NoStyles)));
    }

    #[test]
    fn test_config_c_mode_highlights_sample() {
        let config = Config::builtin().unwrap();
        let set = Arc::new(config.compile_mode("C").unwrap());
        let text = "#include <stdio.h>\nint main(void) { /* hi */ return 0; }\n";
        let mut engine = HighlightEngine::new();
        engine.on_load(text, set);
        engine.on_expose(0..text.len());

        let style_at = |needle: &str| {
            let at = text.find(needle).unwrap();
            engine
                .styled_spans(at..at + 1)
                .next()
                .map(|span| span.style.to_string())
                .unwrap()
        };
        assert_eq!(style_at("#include"), "Keyword");
        assert_eq!(style_at("<stdio.h>"), "String");
        assert_eq!(style_at("int"), "Storage Type");
        assert_eq!(style_at("/* hi"), "Comment");
        assert_eq!(style_at("return"), "Keyword");
        assert_eq!(style_at("0;"), "Numeric Const");
        assert_eq!(style_at("{"), "Braces");
        assert_eq!(style_at("main"), "Plain");
    }
