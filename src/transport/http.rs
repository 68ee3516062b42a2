use crate::error::{JimboError, Result};
use crate::methods::{MethodInvoker, MethodRegistry};
use crate::rpc::handle_line;
use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use super::Transport;

#[derive(Clone)]
struct AppState {
    methods: Arc<MethodRegistry>,
}

async fn handle_rpc(State(state): State<AppState>, body: String) -> Response {
    tracing::debug!("Received: {}", body);
    match handle_line(&state.methods, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// JSON-RPC over HTTP: `POST /<channel>` on the configured address.
pub struct HttpTransport {
    address: String,
    route: String,
    methods: Arc<MethodRegistry>,
    local_addr: Mutex<Option<SocketAddr>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HttpTransport {
    pub fn new(address: impl Into<String>, channel: &str) -> Self {
        Self {
            address: address.into(),
            route: format!("/{}", channel.trim_start_matches('/')),
            methods: Arc::new(MethodRegistry::new()),
            local_addr: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Bound address, known once `start` has returned.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.lock().ok().and_then(|guard| *guard)
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            methods: Arc::clone(&self.methods),
        };
        Router::new()
            .route(&self.route, post(handle_rpc))
            .with_state(state)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn add_method(&self, method: Arc<MethodInvoker>) -> Result<()> {
        self.methods.insert_shared(method)
    }

    async fn start(&self) -> Result<()> {
        if self.local_addr().is_some() {
            return Err(JimboError::transport("HTTP transport already started"));
        }

        let listener = tokio::net::TcpListener::bind(self.address.as_str())
            .await
            .map_err(|e| JimboError::transport(format!("Failed to bind {}: {}", self.address, e)))?;
        let addr = listener.local_addr()?;
        tracing::info!("Starting HTTP RPC server on {}{}", addr, self.route);

        let app = self.router();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("HTTP RPC server stopped: {}", e);
            }
        });

        *self
            .local_addr
            .lock()
            .map_err(|_| JimboError::internal("HTTP transport lock poisoned"))? = Some(addr);
        *self
            .task
            .lock()
            .map_err(|_| JimboError::internal("HTTP transport lock poisoned"))? = Some(task);
        Ok(())
    }

    async fn stopped(&self) {
        let task = self.task.lock().ok().and_then(|mut guard| guard.take());
        match task {
            Some(task) => {
                let _ = task.await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
