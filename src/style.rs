//! Style table: the named colors and font variants patterns refer to.
//!
//! This is a **leaf module**. Colors are kept as the strings the user wrote
//! (`"#a0a0a0"`, `"red"`); turning them into terminal colors is the
//! renderer's job.

use serde::Deserialize;

/// Font variant applied on top of a style's colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontVariant {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// One named entry of the style table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Style {
    pub name: String,
    pub foreground: String,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub font: FontVariant,
}

impl Style {
    pub fn new(name: impl Into<String>, foreground: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreground: foreground.into(),
            background: None,
            font: FontVariant::Plain,
        }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_font(mut self, font: FontVariant) -> Self {
        self.font = font;
        self
    }
}

/// Snapshot of the named styles available when a pattern set is compiled.
///
/// Insertion order is preserved; inserting a style whose name already
/// exists replaces the earlier definition in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTable {
    styles: Vec<Style>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, style: Style) {
        match self.styles.iter_mut().find(|s| s.name == style.name) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl FromIterator<Style> for StyleTable {
    fn from_iter<I: IntoIterator<Item = Style>>(iter: I) -> Self {
        let mut table = Self::new();
        for style in iter {
            table.insert(style);
        }
        table
    }
}

#[cfg(test)]
#[path = "style_tests.rs"]
mod tests;
