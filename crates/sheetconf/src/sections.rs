//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When to merge all tracks into a treble and bass staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffMode {
    /// Two staves only for files with a single note track.
    #[default]
    Auto,
    Always,
    Never,
}

impl StaffMode {
    /// Resolve the mode for a file with `tracks` note tracks.
    pub fn two_staffs(self, tracks: usize) -> bool {
        match self {
            StaffMode::Auto => tracks == 1,
            StaffMode::Always => true,
            StaffMode::Never => false,
        }
    }
}

impl FromStr for StaffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(StaffMode::Auto),
            "always" => Ok(StaffMode::Always),
            "never" => Ok(StaffMode::Never),
            other => Err(format!(
                "unknown two_staffs value {other:?}, expected auto, always or never"
            )),
        }
    }
}

impl fmt::Display for StaffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StaffMode::Auto => "auto",
            StaffMode::Always => "always",
            StaffMode::Never => "never",
        };
        f.write_str(s)
    }
}

/// How notes are laid out for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationConfig {
    /// Notes starting within this many milliseconds are drawn as one chord.
    /// Default: 40
    #[serde(default = "NotationConfig::default_combine_interval_ms")]
    pub combine_interval_ms: u32,

    /// Default: auto
    #[serde(default)]
    pub two_staffs: StaffMode,
}

impl NotationConfig {
    fn default_combine_interval_ms() -> u32 {
        40
    }
}

impl Default for NotationConfig {
    fn default() -> Self {
        Self {
            combine_interval_ms: Self::default_combine_interval_ms(),
            two_staffs: StaffMode::default(),
        }
    }
}

/// Settings applied when rewriting a file for playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Keep the file's own program changes.
    /// Default: true
    #[serde(default = "PlaybackConfig::default_use_default_instruments")]
    pub use_default_instruments: bool,

    /// Playback speed relative to the file's tempo, in percent.
    /// Default: 100
    #[serde(default = "PlaybackConfig::default_tempo_percent")]
    pub tempo_percent: u32,
}

impl PlaybackConfig {
    fn default_use_default_instruments() -> bool {
        true
    }

    fn default_tempo_percent() -> u32 {
        100
    }

    /// Scale a tempo in microseconds per quarter by `tempo_percent`.
    ///
    /// A higher percentage plays faster, so the tempo value shrinks.
    pub fn scale_tempo(&self, tempo: u32) -> u32 {
        if self.tempo_percent == 0 {
            return tempo;
        }
        (tempo as u64 * 100 / self.tempo_percent as u64).min(0xFF_FFFF) as u32
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            use_default_instruments: Self::default_use_default_instruments(),
            tempo_percent: Self::default_tempo_percent(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset.
    /// Default: "info"
    #[serde(default = "LoggingConfig::default_log_level")]
    pub log_level: String,
}

impl LoggingConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
