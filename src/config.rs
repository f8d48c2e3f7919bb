//! Configuration file parser for ~/.config/chanview/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for each one
//! since they are usually typos.
use crate::channel::ReadyPolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server or channel page URL used when none is given on the command line.
    pub server_url: Option<String>,

    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// Quiet interval after the last filter keystroke before refreshing.
    pub filter_debounce_ms: u64,

    /// Delay between connection attempts while the server is not reachable.
    pub connect_retry_ms: u64,

    /// Give up connecting after this many seconds. 0 = keep trying forever.
    pub connect_timeout_secs: u64,

    /// Abandon a fetch that got no reply after this many seconds. 0 = never.
    pub response_timeout_secs: u64,

    /// Timeout for page and delete requests over HTTP.
    pub page_timeout_secs: u64,

    /// Lines before the end of the content that already count as the bottom.
    pub scroll_threshold_lines: usize,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            theme: "dark".to_string(),
            filter_debounce_ms: 100,
            connect_retry_ms: 250,
            connect_timeout_secs: 30,
            response_timeout_secs: 15,
            page_timeout_secs: 10,
            scroll_threshold_lines: 1,
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "server_url",
        "theme",
        "filter_debounce_ms",
        "connect_retry_ms",
        "connect_timeout_secs",
        "response_timeout_secs",
        "page_timeout_secs",
        "scroll_threshold_lines",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file never lands in memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            server = ?config.server_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn filter_quiet(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    /// Connection gate policy. A zero timeout waits forever.
    pub fn ready_policy(&self) -> ReadyPolicy {
        let timeout = (self.connect_timeout_secs > 0)
            .then(|| Duration::from_secs(self.connect_timeout_secs));
        // A zero retry interval would spin; keep at least one millisecond.
        ReadyPolicy::new(Duration::from_millis(self.connect_retry_ms.max(1)), timeout)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_secs > 0).then(|| Duration::from_secs(self.response_timeout_secs))
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.server_url.is_none());
        assert_eq!(config.theme, "dark");
        assert_eq!(config.filter_debounce_ms, 100);
        assert_eq!(config.connect_retry_ms, 250);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.response_timeout_secs, 15);
        assert_eq!(config.scroll_threshold_lines, 1);
        assert!(config.keybindings.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/chanview_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.filter_debounce_ms, 100);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("chanview_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.connect_retry_ms, 250);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("chanview_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "filter_debounce_ms = 250\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.filter_debounce_ms, 250);
        assert_eq!(config.connect_timeout_secs, 30); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("chanview_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
server_url = "http://localhost:8080/channels/3"
theme = "light"
filter_debounce_ms = 150
connect_retry_ms = 50
connect_timeout_secs = 0
response_timeout_secs = 5
page_timeout_secs = 20
scroll_threshold_lines = 3

[keybindings]
quit = "Ctrl+q"
reload = "F5"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.server_url.as_deref(),
            Some("http://localhost:8080/channels/3")
        );
        assert_eq!(config.theme, "light");
        assert_eq!(config.filter_quiet(), Duration::from_millis(150));
        assert_eq!(
            config.ready_policy(),
            ReadyPolicy::new(Duration::from_millis(50), None)
        );
        assert_eq!(config.response_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.page_timeout(), Duration::from_secs(20));
        assert_eq!(config.scroll_threshold_lines, 3);
        assert_eq!(
            config.keybindings.get("reload").map(String::as_str),
            Some("F5")
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_values_disable_timeouts() {
        let config = Config {
            connect_timeout_secs: 0,
            response_timeout_secs: 0,
            connect_retry_ms: 0,
            ..Config::default()
        };
        let policy = config.ready_policy();
        assert_eq!(policy.timeout, None);
        assert_eq!(policy.poll_interval, Duration::from_millis(1));
        assert_eq!(config.response_timeout(), None);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("chanview_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("chanview_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
filter_debounce_ms = 100
totally_fake_key = "should not fail"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.filter_debounce_ms, 100);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("chanview_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "filter_debounce_ms = \"fast\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("chanview_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
