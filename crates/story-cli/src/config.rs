//! Application configuration
//!
//! Loaded from a TOML file. Every section is optional:
//!
//! ```toml
//! store_path = "data/story.json"
//! state_dir = ".chain-story"
//!
//! [story]
//! min_chars = 10
//! max_chars = 200
//! cooldown_secs = 3600
//! validator_timeout_secs = 30
//!
//! [gemini]
//! model = "gemini-1.5-flash-latest"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use story_core::StoryConfig;
use story_gemini::GeminiConfig;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "chain-story.toml";

/// Environment variable overriding the store path
pub const STORE_PATH_ENV: &str = "CHAIN_STORY_STORE";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON story document
    pub store_path: PathBuf,
    /// Directory for the installation id
    pub state_dir: PathBuf,
    /// Submission rules
    pub story: StoryConfig,
    /// Validation backend
    pub gemini: GeminiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("chain-story.json"),
            state_dir: PathBuf::from(".chain-story"),
            story: StoryConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse configuration text
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used if present, defaults otherwise.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text)
                .with_context(|| format!("loading {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };

        if let Ok(store) = std::env::var(STORE_PATH_ENV) {
            if !store.is_empty() {
                config.store_path = PathBuf::from(store);
            }
        }
        Ok(config)
    }
}
