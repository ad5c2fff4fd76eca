use std::{collections::HashMap, fs, path::Path, time::Duration};

use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";
pub const SETTINGS_FILE: &str = "frontdesk.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{key} must be greater than zero")]
    ZeroValue { key: &'static str },
}

/// Process-wide client configuration, read once at startup and passed into
/// constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub queue_refresh_interval: Duration,
    pub clock_interval: Duration,
    pub queue_display_limit: usize,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            queue_refresh_interval: Duration::from_secs(5),
            clock_interval: Duration::from_secs(1),
            queue_display_limit: 10,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(&url.into())?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_base_url(&self.api_base_url)?;
        if self.queue_refresh_interval.is_zero() {
            return Err(ConfigError::ZeroValue {
                key: "queue_refresh_interval",
            });
        }
        if self.clock_interval.is_zero() {
            return Err(ConfigError::ZeroValue {
                key: "clock_interval",
            });
        }
        if self.queue_display_limit == 0 {
            return Err(ConfigError::ZeroValue {
                key: "queue_display_limit",
            });
        }
        Ok(())
    }
}

/// Defaults, then `frontdesk.toml` in the working directory, then the environment.
pub fn load_settings() -> Result<ClientSettings, ConfigError> {
    let file_values = read_settings_file(Path::new(SETTINGS_FILE));
    apply_overrides(ClientSettings::default(), &file_values, |key| {
        std::env::var(key).ok()
    })
}

fn read_settings_file(path: &Path) -> HashMap<String, String> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(table) => table
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    toml::Value::String(text) => text,
                    toml::Value::Integer(number) => number.to_string(),
                    _ => return None,
                };
                Some((key, text))
            })
            .collect(),
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable settings file");
            HashMap::new()
        }
    }
}

pub(crate) fn apply_overrides(
    mut settings: ClientSettings,
    file_values: &HashMap<String, String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    if let Some(v) = file_values.get("api_base_url") {
        settings.api_base_url = v.clone();
    }
    if let Some(ms) = file_values.get("queue_refresh_ms").and_then(|v| v.parse().ok()) {
        settings.queue_refresh_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = file_values.get("clock_ms").and_then(|v| v.parse().ok()) {
        settings.clock_interval = Duration::from_millis(ms);
    }
    if let Some(limit) = file_values
        .get("queue_display_limit")
        .and_then(|v| v.parse().ok())
    {
        settings.queue_display_limit = limit;
    }
    if let Some(secs) = file_values
        .get("request_timeout_secs")
        .and_then(|v| v.parse().ok())
    {
        settings.request_timeout = Duration::from_secs(secs);
    }

    if let Some(v) = env("API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__QUEUE_REFRESH_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            settings.queue_refresh_interval = Duration::from_millis(ms);
        }
    }
    if let Some(v) = env("APP__CLOCK_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            settings.clock_interval = Duration::from_millis(ms);
        }
    }
    if let Some(v) = env("APP__QUEUE_DISPLAY_LIMIT") {
        if let Ok(limit) = v.parse::<usize>() {
            settings.queue_display_limit = limit;
        }
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(secs) = v.parse::<u64>() {
            settings.request_timeout = Duration::from_secs(secs);
        }
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    settings.validate()?;
    Ok(settings)
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_API_BASE_URL.to_string());
    }

    let parsed = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
