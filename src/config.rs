use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::{BackoffConfig, LiveSettings, RetryPolicy};
use crate::state::Credentials;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";

pub const ENV_API_URL: &str = "VEMEET_API_URL";
pub const ENV_WS_URL: &str = "VEMEET_WS_URL";
pub const ENV_ACCESS_TOKEN: &str = "VEMEET_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "VEMEET_REFRESH_TOKEN";
pub const ENV_COGNITO_ID: &str = "VEMEET_COGNITO_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub limit: u32,
    pub status_codes: Vec<u16>,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            limit: 2,
            status_codes: vec![500],
            base_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub growth: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 10_000,
            growth: 1.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub websocket_url: String,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
    pub reconnect: ReconnectConfig,
    pub toast_ttl_ms: u64,
    pub notification_refresh_secs: u64,
    /// Tokens are only ever taken from the environment.
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://core.vemeet.me/v1".to_string(),
            websocket_url: "wss://core.vemeet.me".to_string(),
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
            reconnect: ReconnectConfig::default(),
            toast_ttl_ms: 3_000,
            notification_refresh_secs: 40,
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn notification_refresh(&self) -> Duration {
        Duration::from_secs(self.notification_refresh_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            limit: self.retry.limit,
            status_codes: self.retry.status_codes.clone(),
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
        }
    }

    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            min_delay: Duration::from_millis(self.reconnect.min_delay_ms),
            max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
            growth: self.reconnect.growth,
        }
    }

    pub fn live_settings(&self) -> LiveSettings {
        LiveSettings {
            ws_base: self.websocket_url.clone(),
            backoff: self.backoff(),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies every non-empty value `lookup` returns for the `VEMEET_*` keys.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL) {
            self.websocket_url = url;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.credentials.access_token = Some(token);
        }
        if let Some(token) = lookup(ENV_REFRESH_TOKEN) {
            self.credentials.refresh_token = Some(token);
        }
        if let Some(id) = lookup(ENV_COGNITO_ID) {
            self.credentials.cognito_id = Some(id);
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
