use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::completion::spawn_with_callback;
use crate::config::{ConnectionOptions, JimboConfig};
use crate::error::{JimboError, Result};
use crate::methods::{InjectOptions, MethodOptions, MethodRegistry};
use crate::plugins::{Pipeline, PluginDescriptor, RootTarget};
use crate::transport::{self, Transport};

/// The server facade. Clones share the same methods, plugins and transport.
#[derive(Clone)]
pub struct JimboServer {
    inner: Arc<ServerInner>,
}

struct ServerInner {
    root: RootTarget,
    pipeline: Arc<Pipeline>,
    connection: RwLock<Option<ConnectionOptions>>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl Default for JimboServer {
    fn default() -> Self {
        Self::new()
    }
}

impl JimboServer {
    pub fn new() -> Self {
        Self::with_pipeline(Pipeline::new())
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        let methods = Arc::new(MethodRegistry::new());
        Self {
            inner: Arc::new(ServerInner {
                root: RootTarget::new(methods),
                pipeline: Arc::new(pipeline),
                connection: RwLock::new(None),
                transport: RwLock::new(None),
            }),
        }
    }

    pub fn with_config(config: &JimboConfig) -> Self {
        let server = Self::new();
        server.connection(config.connection.clone());
        server
    }

    pub fn connection(&self, options: ConnectionOptions) {
        match self.inner.connection.write() {
            Ok(mut guard) => *guard = Some(options),
            Err(poisoned) => *poisoned.into_inner() = Some(options),
        }
    }

    pub fn connection_options(&self) -> Option<ConnectionOptions> {
        self.inner
            .connection
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn root(&self) -> &RootTarget {
        &self.inner.root
    }

    pub fn methods(&self) -> &Arc<MethodRegistry> {
        self.inner.root.methods()
    }

    pub async fn register(&self, plugins: Vec<PluginDescriptor>) -> Result<()> {
        self.register_with_options(plugins, Value::Object(Map::new()))
            .await
    }

    /// Registers plugins with run-wide options merged under each plugin's own.
    pub async fn register_with_options(
        &self,
        plugins: Vec<PluginDescriptor>,
        options: Value,
    ) -> Result<()> {
        self.inner
            .pipeline
            .compose(&self.inner.root, plugins, &options)
            .await
    }

    pub fn register_with<F>(&self, plugins: Vec<PluginDescriptor>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        Arc::clone(&self.inner.pipeline).compose_with(
            self.inner.root.clone(),
            plugins,
            Value::Object(Map::new()),
            callback,
        )
    }

    /// Registers a method. Fails before touching the registry when `name` or
    /// `handler` is missing or the validation rule does not compile.
    pub fn method(&self, options: MethodOptions) -> Result<()> {
        self.inner.root.method(options).map(|_| ())
    }

    pub async fn start(&self) -> Result<()> {
        let options = self
            .connection_options()
            .ok_or_else(|| JimboError::config_error("connection options are not set"))?;
        let transport = transport::connect(&options)?;
        self.start_on(transport).await
    }

    pub fn start_with<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let server = self.clone();
        spawn_with_callback(async move { server.start().await }, callback)
    }

    /// Attaches every registered method to `transport` and starts it.
    pub async fn start_on(&self, transport: Arc<dyn Transport>) -> Result<()> {
        let methods = self.methods().snapshot()?;
        let count = methods.len();
        for invoker in methods {
            transport.add_method(invoker)?;
        }
        transport.start().await?;

        tracing::info!(
            "Server started on {} transport with {} methods",
            transport.name(),
            count
        );

        let mut guard = self
            .inner
            .transport
            .write()
            .map_err(|_| JimboError::internal("Transport lock poisoned"))?;
        *guard = Some(transport);
        Ok(())
    }

    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner
            .transport
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Resolves when the started transport stops; never, if none was started.
    pub async fn stopped(&self) {
        match self.transport() {
            Some(transport) => transport.stopped().await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Calls a registered method directly, bypassing the transport.
    pub async fn inject(&self, options: InjectOptions) -> Result<Value> {
        let invoker = self.methods().get(&options.method_name)?;
        invoker.call(options.params).await
    }

    pub fn inject_with<F>(&self, options: InjectOptions, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        match self.methods().get(&options.method_name) {
            Ok(invoker) => invoker.call_with(options.params, callback),
            Err(err) => callback(Err(err)),
        }
    }
}
