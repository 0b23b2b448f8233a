//! Language modes and styles loaded from JSON.
//!
//! A configuration holds the style table and a list of language modes, each
//! a named pattern list with the file extensions it applies to. A default
//! configuration is compiled into the crate.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::compiler::{CompileError, PatternCompiler};
use crate::pattern::{PLAIN, PatternSpec};
use crate::pattern_set::PatternSet;
use crate::style::{Style, StyleTable};

const BUILTIN: &str = include_str!("../assets/default_patterns.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pattern configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no language mode named \"{0}\"")]
    UnknownMode(String),
    #[error("pattern configuration defines no styles")]
    NoStyles,
    #[error("language mode \"{mode}\": {source}")]
    Compile {
        mode: String,
        #[source]
        source: CompileError,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub styles: Vec<Style>,
    #[serde(default)]
    pub modes: Vec<ModeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
    pub name: String,
    /// File name suffixes, e.g. `".c"` or `"Makefile"`.
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default = "default_line_context")]
    pub line_context: u32,
    #[serde(default)]
    pub char_context: u32,
    pub patterns: Vec<PatternSpec>,
}

fn default_line_context() -> u32 {
    1
}

impl Config {
    /// The configuration shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn style_table(&self) -> StyleTable {
        self.styles.iter().cloned().collect()
    }

    pub fn mode(&self, name: &str) -> Option<&ModeConfig> {
        self.modes.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// First mode listing a suffix of `path`'s file name.
    pub fn mode_for_path(&self, path: &Path) -> Option<&ModeConfig> {
        let file_name = path.file_name()?.to_str()?;
        self.modes
            .iter()
            .find(|m| m.extensions.iter().any(|ext| file_name.ends_with(ext.as_str())))
    }

    /// A mode that highlights nothing, drawn in the `Plain` style or, when the
    /// table lacks one, in the first style defined.
    pub fn fallback_mode(&self) -> Result<ModeConfig, ConfigError> {
        let style = match self.styles.iter().find(|s| s.name == PLAIN) {
            Some(plain) => plain,
            None => self.styles.first().ok_or(ConfigError::NoStyles)?,
        };
        Ok(ModeConfig::plain_styled(&style.name))
    }

    /// Compile the mode called `name` against this configuration's styles.
    pub fn compile_mode(&self, name: &str) -> Result<PatternSet, ConfigError> {
        let mode = self
            .mode(name)
            .ok_or_else(|| ConfigError::UnknownMode(name.to_string()))?;
        mode.compile(&self.style_table())
    }
}

impl ModeConfig {
    /// A mode that highlights nothing.
    pub fn plain() -> Self {
        Self::plain_styled(PLAIN)
    }

    pub fn plain_styled(style: &str) -> Self {
        let mut root = PatternSpec::plain();
        root.style = style.to_string();
        Self {
            name: PLAIN.to_string(),
            extensions: Vec::new(),
            line_context: default_line_context(),
            char_context: 0,
            patterns: vec![root],
        }
    }

    pub fn compile(&self, styles: &StyleTable) -> Result<PatternSet, ConfigError> {
        PatternCompiler::new(styles)
            .language(self.name.as_str())
            .context(self.line_context, self.char_context)
            .compile(&self.patterns)
            .map_err(|source| ConfigError::Compile {
                mode: self.name.clone(),
                source,
            })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
