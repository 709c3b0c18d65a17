//! Startup configuration.
//!
//! The API key and base URL are both required. They are resolved once at
//! startup; a missing value is a terminal `ConfigError`.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "TODO_API_KEY";
pub const API_URL_ENV: &str = "TODO_API_URL";

pub const DEFAULT_NOTIFICATION_MS: u64 = 5000;
pub const DEFAULT_FADE_MS: u64 = 300;

/// Credentials and endpoint for the hosted CRUD API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub api_url: String,
}

impl ClientConfig {
    /// Build from optional values. Blank values count as missing.
    pub fn from_values(api_key: Option<String>, api_url: Option<String>) -> Result<Self, ConfigError> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let (Some(api_key), Some(api_url)) = (present(api_key), present(api_url)) else {
            tracing::error!("API Key or URL not found");
            return Err(ConfigError::MissingCredentials);
        };

        let api_url = api_url.trim().to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(api_url));
        }
        Ok(Self { api_key, api_url })
    }

    /// Read `TODO_API_KEY` and `TODO_API_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(env::var(API_KEY_ENV).ok(), env::var(API_URL_ENV).ok())
    }
}

/// Notification display timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSettings {
    /// How long a notification stays up before it clears itself.
    pub duration: Duration,
    /// Delay between a manual dismissal and the notification disappearing.
    pub fade: Duration,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(DEFAULT_NOTIFICATION_MS),
            fade: Duration::from_millis(DEFAULT_FADE_MS),
        }
    }
}
