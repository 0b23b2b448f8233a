//! Entry point: wires CLI → config → pattern compiler → engine → TUI loop.
//!
//! This is the thin orchestrator that connects the library to the
//! terminal. It handles argument parsing, file I/O, logging setup,
//! terminal initialization, the event loop and graceful shutdown.

mod app;
mod cli;
mod renderer;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use patlight::{Config, ConfigError, HighlightEngine, ModeConfig, PatternId, PatternSet};
use ratatui::crossterm::event::{self, Event};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::app::App;
use crate::cli::Cli;

fn main() -> color_eyre::Result<()> {
    // Install color_eyre error/panic hooks for pretty backtraces.
    color_eyre::install()?;

    // Chain our panic hook to restore the terminal before printing the backtrace.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        original_hook(info);
    }));

    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = match &cli.patterns {
        Some(path) => Config::load(path)?,
        None => Config::builtin()?,
    };
    let mode = select_mode(&config, &cli)?;
    let set = Arc::new(mode.compile(&config.style_table())?);
    info!(mode = %mode.name, patterns = set.len(), "pattern set ready");

    let source = fs::read_to_string(&cli.file)
        .wrap_err_with(|| format!("cannot read {}", cli.file.display()))?;

    if cli.check {
        return check(&cli.file, source, set);
    }

    let mut engine = HighlightEngine::new();
    engine.on_load(source, set);
    let filename = cli
        .file
        .file_name()
        .map_or_else(|| cli.file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut app = App::new(engine, config.style_table(), filename, mode.name.clone());

    // Initialize the terminal (enters raw mode + alternate screen).
    let mut terminal = ratatui::init();

    let result = run_event_loop(&mut terminal, &mut app, &cli.file);

    // Always restore the terminal, even if the loop returned an error.
    ratatui::restore();

    result
}

/// Sends logs to `--log` or `$PATLIGHT_LOG` when either names a file.
/// Without one, logging stays off so the TUI owns the terminal.
fn init_tracing(cli: &Cli) -> color_eyre::Result<()> {
    let Some(path) = cli
        .log
        .clone()
        .or_else(|| std::env::var_os("PATLIGHT_LOG").map(Into::into))
    else {
        return Ok(());
    };
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("patlight=debug"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true);
    tracing_subscriber::registry().with(filter).with(file_layer).init();
    Ok(())
}

/// `--mode` wins; otherwise the file name picks a mode, falling back to
/// one that highlights nothing.
fn select_mode(config: &Config, cli: &Cli) -> Result<ModeConfig, ConfigError> {
    if let Some(name) = &cli.mode {
        return config
            .mode(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownMode(name.clone()));
    }
    match config.mode_for_path(&cli.file) {
        Some(mode) => Ok(mode.clone()),
        None => config.fallback_mode(),
    }
}

/// Highlights the whole file without a terminal and reports what happened.
fn check(path: &Path, source: String, set: Arc<PatternSet>) -> color_eyre::Result<()> {
    let len = source.len();
    println!(
        "{}: mode {}, {} patterns, context {} lines / {} chars",
        path.display(),
        set.language(),
        set.len(),
        set.context().lines,
        set.context().chars
    );

    let mut engine = HighlightEngine::new();
    engine.on_load(source, set);
    engine.on_expose(0..len);

    let styled = engine
        .styled_spans(0..len)
        .filter(|span| span.pattern != PatternId::ROOT)
        .count();
    println!("{styled} styled spans, {}", engine.phase().label());

    for err in engine.runtime_errors() {
        println!("warning: {err}");
    }
    Ok(())
}

/// Runs the TUI event loop until the user quits or an error occurs.
///
/// Separated from `main()` so that `ratatui::restore()` always runs
/// regardless of how this function exits.
fn run_event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    path: &Path,
) -> color_eyre::Result<()> {
    loop {
        // Update viewport height from current terminal size.
        app.viewport_height = terminal.size()?.height.saturating_sub(1) as usize;
        app.clamp_scroll();

        // Deferred patterns must cover what is about to be drawn.
        app.expose_visible();
        terminal.draw(|frame| renderer::draw(frame, app))?;

        match event::read()? {
            Event::Key(key) => app.handle_key(key),
            Event::Resize(..) => app.clamp_scroll(),
            // Ignore mouse, focus, and paste events.
            _ => {}
        }

        if app.reload_requested {
            app.reload_requested = false;
            match fs::read_to_string(path) {
                Ok(text) => {
                    app.reload(&text)?;
                }
                Err(err) => warn!(path = %path.display(), %err, "reload failed"),
            }
        }

        if app.quit {
            break;
        }
    }

    Ok(())
}
