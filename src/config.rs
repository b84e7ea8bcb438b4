//! Configuration file support for kilnlog
//!
//! Reads from .kilnlog/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Defaults used when starting a new firing
    #[serde(default)]
    pub session: SessionConfig,

    /// Stoke timer settings
    #[serde(default)]
    pub timer: TimerConfig,

    /// Historical comparison settings
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Session defaults
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Kiln name used by `kilnlog init` when none is given
    /// Default: "Ana"
    #[serde(default = "default_kiln")]
    pub default_kiln: String,

    /// Person logged as the author of entries when no user is active
    #[serde(default)]
    pub default_user: Option<String>,
}

fn default_kiln() -> String {
    "Ana".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_kiln: default_kiln(),
            default_user: None,
        }
    }
}

/// Stoke timer settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimerConfig {
    /// Minutes between stokes
    /// Default: 7
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
}

fn default_interval() -> u32 {
    7
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval(),
        }
    }
}

/// Historical comparison settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MatchingConfig {
    /// Front temperature difference (°F) below which a past reading counts as similar
    /// Default: 50
    #[serde(default = "default_tolerance")]
    pub tolerance_f: i32,
}

fn default_tolerance() -> i32 {
    crate::matcher::DEFAULT_TOLERANCE_F
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance_f: default_tolerance(),
        }
    }
}

/// Weather lookup settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeatherConfig {
    /// Whether to call the weather API at all
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    /// Request timeout in seconds
    /// Default: 5
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_true() -> bool {
    true
}

fn default_latitude() -> f64 {
    35.6
}

fn default_longitude() -> f64 {
    -82.5
}

fn default_timeout() -> u64 {
    5
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: default_latitude(),
            longitude: default_longitude(),
            timeout_secs: default_timeout(),
            base_url: default_base_url(),
        }
    }
}

impl Config {
    /// Load config from .kilnlog/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                    }
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".kilnlog").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.default_kiln, "Ana");
        assert!(config.session.default_user.is_none());
        assert_eq!(config.timer.interval_minutes, 7);
        assert_eq!(config.matching.tolerance_f, 50);
        assert!(config.weather.enabled);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[session]
default_kiln = "Noborigama"
default_user = "mara"

[timer]
interval_minutes = 5

[weather]
enabled = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.session.default_kiln, "Noborigama");
        assert_eq!(config.session.default_user.as_deref(), Some("mara"));
        assert_eq!(config.timer.interval_minutes, 5);
        assert_eq!(config.matching.tolerance_f, 50);
        assert!(!config.weather.enabled);
        assert_eq!(config.weather.timeout_secs, 5);
    }
}
