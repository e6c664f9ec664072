use log::info;
use serde::Deserialize;
use std::{fs, time::Duration};

use crate::error::{ClientError, Result};

pub const CONFIG_ENV_VAR: &str = "QUIZ_CLIENT_CONFIG";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub storage_path: String,
    pub log_dir: String,
    pub reveal_window_ms: u64,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
    pub reconnect_jitter_ms: u64,
    pub handshake_timeout_ms: u64,
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: "ws://127.0.0.1:9001".to_string(),
            storage_path: "quiz-client.db".to_string(),
            log_dir: "log".to_string(),
            reveal_window_ms: 2000,
            max_reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
            reconnect_jitter_ms: 250,
            handshake_timeout_ms: 10_000,
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    /// Loads the config file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let data = fs::read_to_string(path)?;
                let config: ClientConfig = serde_json::from_str(&data)?;
                info!("Loaded config from {}", path);
                config
            }
            None => ClientConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR).ok();
        Self::load(path.as_deref())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(ClientError::Config(format!(
                "server_url must use ws:// or wss://, got {}",
                self.server_url
            )));
        }
        if self.reveal_window_ms == 0 {
            return Err(ClientError::Config(
                "reveal_window_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reveal_window(&self) -> Duration {
        Duration::from_millis(self.reveal_window_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"server_url": "wss://quiz.example.com/ws"}"#).unwrap();
        assert_eq!(config.server_url, "wss://quiz.example.com/ws");
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reveal_window(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_http_urls() {
        let config = ClientConfig {
            server_url: "http://127.0.0.1:9001".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn rejects_zero_reveal_window() {
        let config = ClientConfig {
            reveal_window_ms: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_without_path_uses_defaults() {
        assert_eq!(ClientConfig::load(None).unwrap(), ClientConfig::default());
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            ClientConfig::load(Some("/definitely/not/here.json")),
            Err(ClientError::Io(_))
        ));
    }
}
