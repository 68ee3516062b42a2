use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JimboError>;

/// One rejected constraint reported by the schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetail {
    pub message: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub details: Vec<ValidationDetail>,
}

impl ValidationFailure {
    pub fn summary(&self) -> String {
        self.details
            .iter()
            .map(|d| d.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

#[derive(Error, Debug)]
pub enum JimboError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Plugin '{plugin}' failed to register: {reason}")]
    PluginRegistration { plugin: String, reason: String },

    #[error("Extension not installed: {0}")]
    ExtensionNotInstalled(&'static str),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JimboError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        JimboError::InvalidArgument(msg.into())
    }

    pub fn handler(msg: impl Into<String>) -> Self {
        JimboError::Handler(msg.into())
    }

    pub fn plugin_registration(plugin: impl Into<String>, reason: impl ToString) -> Self {
        JimboError::PluginRegistration {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        JimboError::Transport(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        JimboError::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        JimboError::Internal(msg.into())
    }

    /// Validation details, when this error came from a rejected schema.
    pub fn details(&self) -> Option<&[ValidationDetail]> {
        match self {
            JimboError::Validation(failure) => Some(&failure.details),
            _ => None,
        }
    }

    pub fn rpc_code(&self) -> i32 {
        match self {
            JimboError::MethodNotFound(_) => -32601,
            JimboError::Validation(_) | JimboError::InvalidArgument(_) => -32602,
            _ => -32603,
        }
    }
}
