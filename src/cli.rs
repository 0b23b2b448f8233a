//! CLI argument definition for patlight.
//!
//! Kept free of non-clap dependencies.

use std::path::PathBuf;

use clap::Parser;

/// Terminal viewer for the regex pattern syntax highlighter.
#[derive(Parser)]
#[command(name = "patlight", version, about = "Incremental regex pattern syntax highlighter")]
pub struct Cli {
    /// File to display.
    pub file: PathBuf,

    /// Pattern configuration (JSON). The built-in patterns are used when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub patterns: Option<PathBuf>,

    /// Language mode to use instead of picking one by file extension.
    #[arg(short, long, value_name = "NAME")]
    pub mode: Option<String>,

    /// Compile the selected patterns, highlight the file once, report and exit.
    #[arg(long)]
    pub check: bool,

    /// Append diagnostic logs to this file (also settable with PATLIGHT_LOG).
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}
