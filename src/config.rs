//! Configuration persistence
//!
//! Stores defaults in `~/.config/exrange/config.yaml`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ex::options::{OptionName, Options, DEFAULT_PARAGRAPHS, DEFAULT_SECTIONS};

/// Option values a new document starts with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionDefaults {
    pub autoindent: bool,
    pub ignorecase: bool,
    pub wrapscan: bool,
    pub magic: bool,
    pub global: bool,
    pub multiline: bool,
    pub tabsize: i64,
    pub shiftwidth: i64,
    pub paragraphs: String,
    pub sections: String,
}

impl Default for OptionDefaults {
    fn default() -> Self {
        Self {
            autoindent: false,
            ignorecase: false,
            wrapscan: true,
            magic: true,
            global: false,
            multiline: false,
            tabsize: 4,
            shiftwidth: 4,
            paragraphs: DEFAULT_PARAGRAPHS.to_string(),
            sections: DEFAULT_SECTIONS.to_string(),
        }
    }
}

/// Configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: OptionDefaults,
    /// Undo entries kept per document
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    /// How long after a pointer press a focus event keeps the native caret
    #[serde(default = "default_focus_suppress_ms")]
    pub focus_suppress_ms: u64,
    #[serde(default = "default_line_height")]
    pub line_height: usize,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: usize,
}

fn default_history_depth() -> usize {
    100
}

fn default_focus_suppress_ms() -> u64 {
    100
}

fn default_line_height() -> usize {
    16
}

fn default_viewport_height() -> usize {
    480
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: OptionDefaults::default(),
            history_depth: default_history_depth(),
            focus_suppress_ms: default_focus_suppress_ms(),
            line_height: default_line_height(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Seed a document's options. Values the options reject (a bad regex)
    /// are logged and left at their defaults.
    pub fn apply(&self, options: &mut Options) {
        let o = &self.options;
        let results = [
            options.set_flag(OptionName::Autoindent, o.autoindent),
            options.set_flag(OptionName::Ignorecase, o.ignorecase),
            options.set_flag(OptionName::Wrapscan, o.wrapscan),
            options.set_flag(OptionName::Magic, o.magic),
            options.set_flag(OptionName::Global, o.global),
            options.set_flag(OptionName::Multiline, o.multiline),
            options.set_number(OptionName::Tabsize, o.tabsize),
            options.set_number(OptionName::Shiftwidth, o.shiftwidth),
            options.set_text(OptionName::Paragraphs, o.paragraphs.clone()),
            options.set_text(OptionName::Sections, o.sections.clone()),
        ];
        for e in results.into_iter().filter_map(Result::err) {
            tracing::warn!("Ignoring configured option: {}", e);
        }
    }
}
