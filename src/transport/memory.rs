use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{JimboError, Result};
use crate::methods::{MethodInvoker, MethodRegistry};
use crate::rpc::{handle_request, RpcError, RpcRequest, RpcResponse};

use super::Transport;

/// In-process broker: callers in the same process deliver requests directly.
#[derive(Debug)]
pub struct MemoryBroker {
    channel: String,
    methods: MethodRegistry,
    started: AtomicBool,
}

impl MemoryBroker {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            methods: MethodRegistry::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn method_names(&self) -> Result<Vec<String>> {
        self.methods.names()
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_started()?;
        let invoker = self.methods.get(method)?;
        invoker.call(params).await
    }

    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        if let Err(err) = self.ensure_started() {
            return RpcResponse::failure(request.id, RpcError::from(&err));
        }
        handle_request(&self.methods, request).await
    }

    fn ensure_started(&self) -> Result<()> {
        if self.is_started() {
            Ok(())
        } else {
            Err(JimboError::transport(format!(
                "broker channel {} is not started",
                self.channel
            )))
        }
    }
}

#[async_trait]
impl Transport for MemoryBroker {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn add_method(&self, method: Arc<MethodInvoker>) -> Result<()> {
        self.methods.insert_shared(method)
    }

    async fn start(&self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        tracing::info!(
            "Memory broker listening on channel {} with {} methods",
            self.channel,
            self.methods.len()
        );
        Ok(())
    }
}
