//! Shared configuration for groundlink tools.
//!
//! A TOML file under the platform config directory, overridable through
//! `GROUNDLINK_*` environment variables, translated into an
//! [`EngineConfig`] plus the location of the persisted device settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use groundlink_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const OUTPUT_FORMATS: [&str; 2] = ["plain", "json"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Device settings file. Defaults to `settings.json` in the data dir.
    pub settings_path: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Defaults {
    /// Output format: "plain" or "json".
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "plain".into()
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct EngineSection {
    /// Keep the last known location and piloting settings of a known
    /// device published while it is disconnected.
    #[serde(default = "default_offline_settings")]
    pub offline_settings: bool,

    /// Forced landings closer than this many seconds are critical.
    #[serde(default = "default_critical_delay")]
    pub auto_landing_critical_delay_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            offline_settings: default_offline_settings(),
            auto_landing_critical_delay_secs: default_critical_delay(),
        }
    }
}

fn default_offline_settings() -> bool {
    true
}
fn default_critical_delay() -> u64 {
    3
}

impl Config {
    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "'{}' is not one of {}",
                    self.defaults.output,
                    OUTPUT_FORMATS.join(", ")
                ),
            });
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            offline_settings: self.engine.offline_settings,
            auto_landing_critical_delay: Duration::from_secs(
                self.engine.auto_landing_critical_delay_secs,
            ),
        }
    }

    /// Where device settings are persisted.
    pub fn settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(default_settings_path)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "groundlink", "groundlink")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default device settings file.
pub fn default_settings_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("settings.json"),
        |dirs| dirs.data_dir().join("settings.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("groundlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then `path`, then `GROUNDLINK_*` variables. Nested keys use a
/// double underscore: `GROUNDLINK_ENGINE__OFFLINE_SETTINGS=false`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GROUNDLINK_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.defaults.output, "plain");
        assert_eq!(config.engine_config(), EngineConfig::default());
        assert_eq!(config.settings_path(), default_settings_path());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "settings_path = \"/tmp/gl.json\"\n\n[engine]\nauto_landing_critical_delay_secs = 10\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();

        assert!(config.engine.offline_settings);
        assert_eq!(
            config.engine_config().auto_landing_critical_delay,
            Duration::from_secs(10)
        );
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/gl.json"));
    }

    #[test]
    fn unknown_output_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\noutput = \"yaml\"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "defaults.output"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.defaults.output = "json".into();
        config.engine.offline_settings = false;

        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), config);
    }
}
