use crate::error::{JimboError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JimboConfig {
    pub server: ServerConfig,
    pub connection: ConnectionOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub log_level: String,
}

/// Where the transport connects. The URL scheme picks the transport:
/// `memory://`, `http://host:port` or `stdio://`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    pub url: String,
    pub channel: String,
    // Transport-specific settings passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConnectionOptions {
    pub fn new(url: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            channel: channel.into(),
            extra: Map::new(),
        }
    }
}

impl Default for JimboConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "jimbo".to_string(),
                log_level: "info".to_string(),
            },
            connection: ConnectionOptions::new("memory://local", "jimbo"),
        }
    }
}

impl JimboConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(url) = std::env::var("JIMBO_URL") {
            if url.trim().is_empty() {
                return Err(JimboError::config_error("JIMBO_URL cannot be empty"));
            }
            config.connection.url = url;
        }

        if let Ok(channel) = std::env::var("JIMBO_CHANNEL") {
            if channel.trim().is_empty() {
                return Err(JimboError::config_error("JIMBO_CHANNEL cannot be empty"));
            }
            config.connection.channel = channel;
        }

        if let Ok(log_level) = std::env::var("JIMBO_LOG_LEVEL") {
            config.server.log_level = log_level;
        }

        if let Ok(name) = std::env::var("JIMBO_SERVER_NAME") {
            if !name.trim().is_empty() {
                config.server.name = name;
            }
        }

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JimboError::config_error(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| JimboError::config_error(format!("Failed to parse config file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_connection_keeps_extra_settings() {
        let config = JimboConfig::from_toml(
            r#"
            [server]
            name = "billing"
            log_level = "debug"

            [connection]
            url = "http://127.0.0.1:9000"
            channel = "rpc"
            prefetch = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.server.name, "billing");
        assert_eq!(config.connection.url, "http://127.0.0.1:9000");
        assert_eq!(config.connection.channel, "rpc");
        assert_eq!(config.connection.extra.get("prefetch"), Some(&Value::from(10)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = JimboConfig::from_toml("[server");
        assert!(matches!(result, Err(JimboError::ConfigError(_))));
    }
}
