//! Layered configuration for midisheet.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sheetconf::SheetConfig;
//!
//! let config = SheetConfig::load().expect("Failed to load config");
//! println!("Chord interval: {} ms", config.notation.combine_interval_ms);
//! println!("Tempo: {}%", config.playback.tempo_percent);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/midisheet/config.toml` (system)
//! 2. `~/.config/midisheet/config.toml` (user)
//! 3. `./midisheet.toml` (local override), or the path given on the command line
//! 4. Environment variables (`MIDISHEET_*`)
//!
//! # Example Config
//!
//! ```toml
//! [notation]
//! combine_interval_ms = 40
//! two_staffs = "auto"   # auto | always | never
//!
//! [playback]
//! use_default_instruments = true
//! tempo_percent = 100
//!
//! [logging]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{LoggingConfig, NotationConfig, PlaybackConfig, StaffMode};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete midisheet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SheetConfig {
    #[serde(default)]
    pub notation: NotationConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SheetConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` replacing `./midisheet.toml`.
    ///
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and report where values came from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = SheetConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# midisheet configuration\n\n");

        output.push_str("[notation]\n");
        output.push_str(&format!(
            "combine_interval_ms = {}\n",
            self.notation.combine_interval_ms
        ));
        output.push_str(&format!("two_staffs = \"{}\"\n", self.notation.two_staffs));

        output.push_str("\n[playback]\n");
        output.push_str(&format!(
            "use_default_instruments = {}\n",
            self.playback.use_default_instruments
        ));
        output.push_str(&format!(
            "tempo_percent = {}\n",
            self.playback.tempo_percent
        ));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.logging.log_level));

        output
    }
}
