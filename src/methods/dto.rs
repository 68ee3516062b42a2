use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::completion::Completion;
use crate::error::{JimboError, Result};

pub type CallbackFn = dyn Fn(Value, Completion) + Send + Sync;
pub type ReturningFn = dyn Fn(Value) -> Result<Value> + Send + Sync;
pub type AsyncFn = dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// A method handler, tagged with its calling convention when it is built.
#[derive(Clone)]
pub enum Handler {
    /// Receives the completion and fires it itself.
    Callback(Arc<CallbackFn>),
    /// Returns the result (or error) directly.
    Returning(Arc<ReturningFn>),
    /// Returns a future that resolves or rejects later.
    Async(Arc<AsyncFn>),
}

impl Handler {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Value, Completion) + Send + Sync + 'static,
    {
        Handler::Callback(Arc::new(f))
    }

    pub fn returning<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Handler::Returning(Arc::new(f))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Handler::Async(Arc::new(move |params| f(params).boxed()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Handler::Callback(_) => "callback",
            Handler::Returning(_) => "returning",
            Handler::Async(_) => "async",
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler::{}", self.kind())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodConfig {
    #[serde(default)]
    pub validate: Option<Value>,
}

/// Loose registration input for `method()`; missing fields are rejected there.
#[derive(Debug, Clone, Default)]
pub struct MethodOptions {
    pub name: Option<String>,
    pub handler: Option<Handler>,
    pub config: Option<MethodConfig>,
}

impl MethodOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_validation(mut self, rule: Value) -> Self {
        self.config = Some(MethodConfig {
            validate: Some(rule),
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodDefinition {
    pub name: String,
    pub handler: Handler,
    pub validation_rule: Option<Value>,
}

impl TryFrom<MethodOptions> for MethodDefinition {
    type Error = JimboError;

    fn try_from(options: MethodOptions) -> Result<Self> {
        let name = match options.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(JimboError::invalid_argument("name is required")),
        };
        let handler = options
            .handler
            .ok_or_else(|| JimboError::invalid_argument("handler is required"))?;

        Ok(Self {
            name,
            handler,
            validation_rule: options.config.and_then(|config| config.validate),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectOptions {
    pub method_name: String,
    #[serde(default)]
    pub params: Value,
}

impl InjectOptions {
    pub fn new(method_name: impl Into<String>, params: Value) -> Self {
        Self {
            method_name: method_name.into(),
            params,
        }
    }
}
