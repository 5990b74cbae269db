//! Provisio settings
//!
//! A YAML settings file plus `PROVISIO_*` environment overrides. Every
//! field has a default, so running without any file is fine.

pub mod error;

pub use error::*;

use provisio_core::{PollInterval, PollerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_PATH_ENV: &str = "PROVISIO_CONFIG_PATH";

/// Tunables for the poller and the API connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the provisioning API
    pub api_url: Option<String>,

    /// Name of the environment variable holding the API token
    pub token_env: String,

    pub poll_interval_secs: u64,

    /// Upper bound for the interval when backing off
    pub max_interval_secs: u64,

    /// `1.0` polls at a fixed interval
    pub backoff_multiplier: f64,

    pub not_found_grace: u32,

    pub default_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            token_env: "PROVISIO_TOKEN".to_string(),
            poll_interval_secs: 5,
            max_interval_secs: 5,
            backoff_multiplier: 1.0,
            not_found_grace: 6,
            default_timeout_secs: 3600,
        }
    }
}

impl Settings {
    /// 設定ファイルを探して読み込み、環境変数で上書きする
    ///
    /// 設定ファイルが無い場合はデフォルト値を使う
    pub fn load() -> Result<Self> {
        let mut settings = match find_config_file()? {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("No settings file found, using defaults");
                Self::default()
            }
        };
        settings.apply_env()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // an empty file deserializes to null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// 環境変数による上書き
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env_value("PROVISIO_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(secs) = env_parse("PROVISIO_POLL_INTERVAL")? {
            self.poll_interval_secs = secs;
            self.max_interval_secs = self.max_interval_secs.max(secs);
        }
        if let Some(grace) = env_parse("PROVISIO_NOT_FOUND_GRACE")? {
            self.not_found_grace = grace;
        }
        if let Some(secs) = env_parse("PROVISIO_TIMEOUT")? {
            self.default_timeout_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs は 1 以上にしてください".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "backoff_multiplier は 1.0 以上にしてください: {}",
                self.backoff_multiplier
            )));
        }
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "default_timeout_secs は 1 以上にしてください".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poller_config(&self) -> PollerConfig {
        let initial = Duration::from_secs(self.poll_interval_secs);
        let interval = if self.backoff_multiplier > 1.0 {
            PollInterval::backoff(
                initial,
                Duration::from_secs(self.max_interval_secs),
                self.backoff_multiplier,
            )
        } else {
            PollInterval::fixed(initial)
        };

        PollerConfig {
            interval,
            not_found_grace: self.not_found_grace,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// API token read from the variable named by `token_env`
    pub fn token(&self) -> Option<String> {
        env_value(&self.token_env)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_value(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 PROVISIO_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: provisio.yaml
/// 3. ./.provisio/config.yaml
/// 4. ~/.config/provisio/config.yaml (グローバル設定)
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Some(config_path) = env_value(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(path = %path.display(), "PROVISIO_CONFIG_PATH does not exist, ignoring");
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリ
    let local = current_dir.join("provisio.yaml");
    if local.exists() {
        return Ok(Some(local));
    }

    // 3. ./.provisio/ ディレクトリ
    let project = current_dir.join(".provisio").join("config.yaml");
    if project.exists() {
        return Ok(Some(project));
    }

    // 4. グローバル設定
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("provisio").join("config.yaml");
        if global.exists() {
            return Ok(Some(global));
        }
    }

    Ok(None)
}
