//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, LoggingConfig, NotationConfig, PlaybackConfig, SheetConfig, StaffMode};
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override. A CLI path is
/// returned even when missing so that loading it reports the error.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/midisheet/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("midisheet/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("midisheet.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<SheetConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string. Missing keys keep their defaults.
pub fn parse_toml(contents: &str, path: &Path) -> Result<SheetConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let invalid = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut config = SheetConfig::default();

    if let Some(notation) = table.get("notation").and_then(|v| v.as_table()) {
        if let Some(v) = notation.get("combine_interval_ms").and_then(|v| v.as_integer()) {
            config.notation.combine_interval_ms = u32::try_from(v)
                .map_err(|_| invalid(format!("combine_interval_ms out of range: {v}")))?;
        }
        if let Some(v) = notation.get("two_staffs") {
            config.notation.two_staffs = match (v.as_str(), v.as_bool()) {
                (Some(s), _) => s.parse().map_err(invalid)?,
                (None, Some(true)) => StaffMode::Always,
                (None, Some(false)) => StaffMode::Never,
                _ => return Err(invalid("two_staffs must be a string or boolean".to_string())),
            };
        }
    }

    if let Some(playback) = table.get("playback").and_then(|v| v.as_table()) {
        if let Some(v) = playback.get("use_default_instruments").and_then(|v| v.as_bool()) {
            config.playback.use_default_instruments = v;
        }
        if let Some(v) = playback.get("tempo_percent").and_then(|v| v.as_integer()) {
            config.playback.tempo_percent = u32::try_from(v)
                .ok()
                .filter(|&p| p > 0)
                .ok_or_else(|| invalid(format!("tempo_percent must be positive, got {v}")))?;
        }
    }

    if let Some(logging) = table.get("logging").and_then(|v| v.as_table()) {
        if let Some(v) = logging.get("log_level").and_then(|v| v.as_str()) {
            config.logging.log_level = v.to_string();
        }
    }

    Ok(config)
}

fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configs. Values in `overlay` that differ from the defaults win.
pub fn merge_configs(base: SheetConfig, overlay: SheetConfig) -> SheetConfig {
    let notation = NotationConfig::default();
    let playback = PlaybackConfig::default();
    let logging = LoggingConfig::default();

    SheetConfig {
        notation: NotationConfig {
            combine_interval_ms: pick(
                base.notation.combine_interval_ms,
                overlay.notation.combine_interval_ms,
                notation.combine_interval_ms,
            ),
            two_staffs: pick(
                base.notation.two_staffs,
                overlay.notation.two_staffs,
                notation.two_staffs,
            ),
        },
        playback: PlaybackConfig {
            use_default_instruments: pick(
                base.playback.use_default_instruments,
                overlay.playback.use_default_instruments,
                playback.use_default_instruments,
            ),
            tempo_percent: pick(
                base.playback.tempo_percent,
                overlay.playback.tempo_percent,
                playback.tempo_percent,
            ),
        },
        logging: LoggingConfig {
            log_level: pick(
                base.logging.log_level,
                overlay.logging.log_level,
                logging.log_level,
            ),
        },
    }
}

/// Apply `MIDISHEET_*` environment variable overrides to config.
pub fn apply_env_overrides(config: &mut SheetConfig, sources: &mut ConfigSources) {
    apply_overrides(config, sources, |name| std::env::var(name).ok());
}

/// Apply overrides looked up by variable name. Unparsable values are skipped.
pub fn apply_overrides<F>(config: &mut SheetConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("MIDISHEET_COMBINE_INTERVAL_MS") {
        if let Ok(ms) = v.parse() {
            config.notation.combine_interval_ms = ms;
            sources
                .env_overrides
                .push("MIDISHEET_COMBINE_INTERVAL_MS".to_string());
        }
    }
    if let Some(v) = lookup("MIDISHEET_TWO_STAFFS") {
        if let Ok(mode) = v.parse() {
            config.notation.two_staffs = mode;
            sources.env_overrides.push("MIDISHEET_TWO_STAFFS".to_string());
        }
    }
    if let Some(v) = lookup("MIDISHEET_USE_DEFAULT_INSTRUMENTS") {
        if let Ok(flag) = v.parse() {
            config.playback.use_default_instruments = flag;
            sources
                .env_overrides
                .push("MIDISHEET_USE_DEFAULT_INSTRUMENTS".to_string());
        }
    }
    if let Some(v) = lookup("MIDISHEET_TEMPO_PERCENT") {
        if let Ok(percent) = v.parse::<u32>() {
            if percent > 0 {
                config.playback.tempo_percent = percent;
                sources.env_overrides.push("MIDISHEET_TEMPO_PERCENT".to_string());
            }
        }
    }
    if let Some(v) = lookup("MIDISHEET_LOG_LEVEL") {
        config.logging.log_level = v;
        sources.env_overrides.push("MIDISHEET_LOG_LEVEL".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_cli_path_is_always_listed() {
        let files = discover_config_files_with_override(Some(Path::new("/nonexistent/x.toml")));
        assert_eq!(files.last(), Some(&PathBuf::from("/nonexistent/x.toml")));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[notation]
combine_interval_ms = 25
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.notation.combine_interval_ms, 25);
        // Other values should be defaults
        assert_eq!(config.notation.two_staffs, StaffMode::Auto);
        assert_eq!(config.playback.tempo_percent, 100);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[notation]
combine_interval_ms = 0
two_staffs = "always"

[playback]
use_default_instruments = false
tempo_percent = 75

[logging]
log_level = "midisheet=debug"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.notation.combine_interval_ms, 0);
        assert_eq!(config.notation.two_staffs, StaffMode::Always);
        assert!(!config.playback.use_default_instruments);
        assert_eq!(config.playback.tempo_percent, 75);
        assert_eq!(config.logging.log_level, "midisheet=debug");
    }

    #[test]
    fn test_parse_boolean_two_staffs() {
        let config = parse_toml("[notation]\ntwo_staffs = false\n", Path::new("t.toml")).unwrap();
        assert_eq!(config.notation.two_staffs, StaffMode::Never);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        for toml in [
            "[notation]\ntwo_staffs = \"sometimes\"\n",
            "[notation]\ntwo_staffs = 2\n",
            "[notation]\ncombine_interval_ms = -5\n",
            "[playback]\ntempo_percent = 0\n",
        ] {
            assert!(
                matches!(
                    parse_toml(toml, Path::new("bad.toml")),
                    Err(ConfigError::Parse { .. })
                ),
                "accepted {toml:?}"
            );
        }
    }

    #[test]
    fn test_merge_prefers_non_default_overlay() {
        let mut base = SheetConfig::default();
        base.notation.combine_interval_ms = 60;
        base.playback.tempo_percent = 90;

        let mut overlay = SheetConfig::default();
        overlay.playback.tempo_percent = 120;
        overlay.logging.log_level = "warn".to_string();

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.notation.combine_interval_ms, 60);
        assert_eq!(merged.playback.tempo_percent, 120);
        assert_eq!(merged.logging.log_level, "warn");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MIDISHEET_TWO_STAFFS", "never"),
            ("MIDISHEET_TEMPO_PERCENT", "abc"),
            ("MIDISHEET_COMBINE_INTERVAL_MS", "10"),
            ("MIDISHEET_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = SheetConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides(&mut config, &mut sources, |name| {
            vars.get(name).map(|v| v.to_string())
        });

        assert_eq!(config.notation.two_staffs, StaffMode::Never);
        assert_eq!(config.notation.combine_interval_ms, 10);
        assert_eq!(config.playback.tempo_percent, 100);
        assert_eq!(config.logging.log_level, "trace");
        assert_eq!(sources.env_overrides.len(), 3);
    }
}
