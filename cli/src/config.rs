use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "battwise";
const DATABASE_NAME: &str = "store.db";
/// Polling faster than this only burns battery.
pub const MIN_REFRESH_MS: u64 = 250;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" | "none" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    /// `None` means logging is disabled entirely.
    pub fn as_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Trace => Some(tracing::Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Oldest samples are evicted past this count.
    pub max_samples: usize,
    /// Unchanged levels closer together than this are not stored.
    pub min_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_samples: 500,
            min_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub refresh_ms: u64,
    pub log_level: LogLevel,
    pub history: HistoryConfig,
    pub advisor: AdvisorConfig,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 5000,
            log_level: LogLevel::Info,
            history: HistoryConfig::default(),
            advisor: AdvisorConfig::default(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join(APP_DIR)
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join(APP_DIR)
}

pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_DIR)
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn database_path() -> PathBuf {
    data_dir().join(DATABASE_NAME)
}

pub fn ensure_dirs() -> std::io::Result<()> {
    fs::create_dir_all(config_dir())?;
    fs::create_dir_all(data_dir())?;
    Ok(())
}

impl UserConfig {
    /// Load the config file, falling back to defaults when missing or invalid.
    ///
    /// Runs before logging is up, so problems go to stderr.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: ignoring {}: {}", config_path().display(), e);
                Self::default()
            }
        }
    }

    pub fn try_load() -> Result<Self, ConfigError> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::parse(&fs::read_to_string(&path)?)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        ensure_dirs()?;
        fs::write(config_path(), self.to_toml()?)?;
        Ok(())
    }

    /// Polling interval, never below [`MIN_REFRESH_MS`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(MIN_REFRESH_MS))
    }

    /// Apply command-line overrides. Returns true when the refresh came from the CLI.
    pub fn merge_with_args(&mut self, refresh_ms: Option<u64>) -> bool {
        match refresh_ms {
            Some(ms) => {
                self.refresh_ms = ms;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UserConfig::default();
        assert_eq!(config.refresh_ms, 5000);
        assert_eq!(config.history.max_samples, 500);
        assert_eq!(config.history.min_interval_secs, 30);
        assert_eq!(config.advisor.model, "llama-3.3-70b-versatile");
        assert_eq!(config.advisor.max_tokens, 500);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = UserConfig::parse(
            r#"
            log_level = "debug"

            [advisor]
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.refresh_ms, 5000);
        assert_eq!(config.advisor.timeout_secs, 10);
        assert_eq!(config.advisor.temperature, 0.7);
        assert_eq!(config.history, HistoryConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = UserConfig::default();
        config.history.max_samples = 42;
        let parsed = UserConfig::parse(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(matches!(
            UserConfig::parse("refresh_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::from_str("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("off"), LogLevel::Off);
        assert_eq!(LogLevel::from_str("bogus"), LogLevel::Info);
        assert_eq!(LogLevel::Off.as_tracing_level(), None);
    }

    #[test]
    fn test_refresh_override() {
        let mut config = UserConfig::default();
        assert!(!config.merge_with_args(None));
        assert!(config.merge_with_args(Some(1000)));
        assert_eq!(config.refresh_ms, 1000);
        assert_eq!(config.refresh_interval(), Duration::from_millis(1000));

        config.merge_with_args(Some(0));
        assert_eq!(config.refresh_interval(), Duration::from_millis(MIN_REFRESH_MS));
    }
}
