use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the catalog lives and how requests are made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Unset means the HTTP client's own default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Minimum time the home screen shows its loading state.
    #[serde(default = "default_loading_delay_ms")]
    pub loading_delay_ms: u64,
    /// Carousel rotation period.
    #[serde(default = "default_rotation_interval_ms")]
    pub rotation_interval_ms: u64,
    /// A carousel refetch inside this window is suppressed.
    #[serde(default = "default_refetch_guard_ms")]
    pub refetch_guard_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_show_keys_bar")]
    pub show_keys_bar: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: default_loading_delay_ms(),
            rotation_interval_ms: default_rotation_interval_ms(),
            refetch_guard_ms: default_refetch_guard_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_keys_bar: default_show_keys_bar(),
        }
    }
}

impl TimingConfig {
    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }

    pub fn rotation_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.rotation_interval_ms.max(1))
    }

    pub fn refetch_guard(&self) -> Duration {
        Duration::from_millis(self.refetch_guard_ms)
    }
}

fn default_base_url() -> String {
    "https://api.jikan.moe".to_string()
}

fn default_loading_delay_ms() -> u64 {
    2500
}

fn default_rotation_interval_ms() -> u64 {
    3000
}

fn default_refetch_guard_ms() -> u64 {
    5000
}

fn default_show_keys_bar() -> bool {
    true
}

impl Config {
    /// Load the user's config file. A missing file yields defaults; the file
    /// is never created or rewritten.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.jikan.moe");
        assert_eq!(config.api.request_timeout_secs, None);
        assert_eq!(config.timing.loading_delay(), Duration::from_millis(2500));
        assert_eq!(config.timing.rotation_interval(), Duration::from_millis(3000));
        assert_eq!(config.timing.refetch_guard(), Duration::from_millis(5000));
        assert!(config.ui.show_keys_bar);
        assert!(Config::config_path().ends_with("anime-schedule/config.toml"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timing.rotation_interval_ms, 3000);
        // load must not create the file
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://127.0.0.1:9000\"\n\n[timing]\nloading_delay_ms = 0\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timing.loading_delay_ms, 0);
        assert_eq!(config.timing.refetch_guard_ms, 5000);
        assert!(config.ui.show_keys_bar);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timing\nloading_delay_ms = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_zero_rotation_interval_is_clamped() {
        let timing = TimingConfig {
            rotation_interval_ms: 0,
            ..TimingConfig::default()
        };
        assert_eq!(timing.rotation_interval(), Duration::from_millis(1));
    }
}
