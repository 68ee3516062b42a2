use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::completion::Done;
use crate::error::Result;

use super::target::ServerTarget;

/// A shared, type-erased value attached to a server or a plugin namespace.
#[derive(Clone)]
pub struct Capability(Arc<dyn Any + Send + Sync>);

impl Capability {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Capability(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Capability(value)
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast::<T>().ok()
    }

    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn ptr_eq(&self, other: &Capability) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Capability(..)")
    }
}

/// Values one plugin exposed.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: HashMap<String, Capability>,
}

impl Namespace {
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key).and_then(|cap| cap.downcast::<T>())
    }

    pub fn capability(&self, key: &str) -> Option<&Capability> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, key: String, value: Capability) {
        self.entries.insert(key, value);
    }
}

pub type PluginNamespaces = HashMap<String, Namespace>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> Option<&str> {
        None
    }

    async fn register(&self, target: ServerTarget, options: Value) -> Result<()>;
}

/// A plugin written as `|target, options, done|`, reporting through `done`.
pub struct FnPlugin<F> {
    name: String,
    register: F,
}

#[async_trait]
impl<F> Plugin for FnPlugin<F>
where
    F: Fn(ServerTarget, Value, Done) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn register(&self, target: ServerTarget, options: Value) -> Result<()> {
        let (done, pending) = Done::channel();
        (self.register)(target, options, done);
        pending.await
    }
}

#[derive(Clone)]
pub struct PluginDescriptor {
    pub plugin: Arc<dyn Plugin>,
    pub options: Option<Value>,
}

impl PluginDescriptor {
    pub fn new<P: Plugin + 'static>(plugin: P) -> Self {
        Self {
            plugin: Arc::new(plugin),
            options: None,
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, register: F) -> Self
    where
        F: Fn(ServerTarget, Value, Done) + Send + Sync + 'static,
    {
        Self::new(FnPlugin {
            name: name.into(),
            register,
        })
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn meta(&self) -> PluginMeta {
        PluginMeta {
            name: self.plugin.name().to_string(),
            version: self.plugin.version().map(str::to_string),
        }
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name())
            .field("options", &self.options)
            .finish()
    }
}
