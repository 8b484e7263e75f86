//! Build configuration.
//!
//! Every key is optional:
//!
//! ```toml
//! [model]
//! id = 1607392319
//! name = "AnkiPro Imported Model"
//! css = ".card { font-family: serif; }"
//!
//! [deck]
//! default_name = "Imported AnkiPro Deck"
//!
//! [archive]
//! compression = "stored"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::NoteType;

/// Root of a build configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Note type settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Deck settings.
    #[serde(default)]
    pub deck: DeckConfig,

    /// Archive settings.
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl BuildConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The front/back note type described by this configuration.
    pub fn note_type(&self) -> NoteType {
        let model = NoteType::front_back(self.model.id, &self.model.name);
        match &self.model.css {
            Some(css) => model.with_css(css),
            None => model,
        }
    }
}

/// Note type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fixed note type id; random when absent.
    #[serde(default)]
    pub id: Option<i64>,

    /// Note type name.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Card styling override.
    #[serde(default)]
    pub css: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: default_model_name(),
            css: None,
        }
    }
}

fn default_model_name() -> String {
    "AnkiPro Imported Model".to_string()
}

/// Deck settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckConfig {
    /// Name used for source decks that have none.
    #[serde(default = "default_deck_name")]
    pub default_name: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            default_name: default_deck_name(),
        }
    }
}

fn default_deck_name() -> String {
    "Imported AnkiPro Deck".to_string()
}

/// Archive settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// How archive entries are compressed.
    #[serde(default)]
    pub compression: Compression,
}

/// Archive entry compression. Both methods are readable by the importer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Standard deflate.
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

impl From<Compression> for zip::CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}
