use std::any::Any;
use std::sync::Arc;

use crate::error::{JimboError, Result};
use crate::methods::{build_invocation, MethodDefinition, MethodInvoker, MethodOptions, MethodRegistry};

use super::dto::{Capability, Namespace, PluginMeta, PluginNamespaces};
use super::extensions::{Decorator, Exposer, DECORATE, EXPOSE};
use super::state::ExtensionState;

/// The server as every plugin sees it: one identity for its whole lifetime.
#[derive(Clone)]
pub struct RootTarget {
    state: Arc<ExtensionState>,
    methods: Arc<MethodRegistry>,
}

impl RootTarget {
    pub fn new(methods: Arc<MethodRegistry>) -> Self {
        Self {
            state: Arc::new(ExtensionState::new()),
            methods,
        }
    }

    pub fn state(&self) -> &Arc<ExtensionState> {
        &self.state
    }

    pub fn methods(&self) -> &Arc<MethodRegistry> {
        &self.methods
    }

    pub fn capability<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.state.decoration(name).and_then(|cap| cap.downcast::<T>())
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.state.decoration(name).is_some()
    }

    pub fn plugins(&self) -> PluginNamespaces {
        self.state.namespaces()
    }

    pub fn plugin(&self, name: &str) -> Option<Namespace> {
        self.state.namespace(name)
    }

    /// Compiles and registers a method, replacing any method of the same name.
    pub fn method(&self, options: MethodOptions) -> Result<Arc<MethodInvoker>> {
        let definition = MethodDefinition::try_from(options)?;
        let invoker = build_invocation(definition)?;
        tracing::debug!(
            "Registered method {} ({} handler{})",
            invoker.name(),
            invoker.handler_kind(),
            if invoker.is_validated() { ", validated" } else { "" }
        );
        self.methods.insert(invoker)
    }

    pub fn same_root(&self, other: &RootTarget) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for RootTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootTarget")
            .field("decorations", &self.state.decoration_names())
            .field("methods", &self.methods.len())
            .finish()
    }
}

#[derive(Clone)]
struct Layer {
    name: String,
    capability: Capability,
}

/// The view handed to one plugin: layers added by extensions over the root.
///
/// Each extension returns a new view with one more layer; earlier views are
/// never modified. Lookups go from the newest layer down, then to the root.
#[derive(Clone)]
pub struct ServerTarget {
    root: RootTarget,
    plugin: PluginMeta,
    layers: Vec<Arc<Layer>>,
}

impl ServerTarget {
    pub fn new(root: RootTarget, plugin: PluginMeta) -> Self {
        Self {
            root,
            plugin,
            layers: Vec::new(),
        }
    }

    pub fn root(&self) -> &RootTarget {
        &self.root
    }

    pub fn current_plugin(&self) -> &PluginMeta {
        &self.plugin
    }

    pub fn with_layer(&self, name: impl Into<String>, capability: Capability) -> ServerTarget {
        let mut layers = self.layers.clone();
        layers.push(Arc::new(Layer {
            name: name.into(),
            capability,
        }));
        ServerTarget {
            root: self.root.clone(),
            plugin: self.plugin.clone(),
            layers,
        }
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }

    /// A layer only shadows the root when it holds a `T`; a decoration that
    /// shares its name with a hook layer stays reachable.
    pub fn capability<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.layers
            .iter()
            .rev()
            .filter(|layer| layer.name == name)
            .find_map(|layer| layer.capability.downcast::<T>())
            .or_else(|| self.root.capability::<T>(name))
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.name == name) || self.root.has_capability(name)
    }

    pub fn decorate<T: Any + Send + Sync>(&self, scope: &str, name: &str, value: T) -> Result<()> {
        self.setter::<Decorator>(DECORATE)?
            .apply(scope, vec![(name.to_string(), Capability::new(value))])
    }

    pub fn decorate_all<I, K>(&self, scope: &str, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Capability)>,
        K: Into<String>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.setter::<Decorator>(DECORATE)?.apply(scope, entries)
    }

    pub fn expose<T: Any + Send + Sync>(&self, key: &str, value: T) -> Result<()> {
        self.setter::<Exposer>(EXPOSE)?
            .apply(vec![(key.to_string(), Capability::new(value))])
    }

    pub fn expose_all<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Capability)>,
        K: Into<String>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.setter::<Exposer>(EXPOSE)?.apply(entries)
    }

    pub fn plugins(&self) -> PluginNamespaces {
        self.root.plugins()
    }

    pub fn namespace(&self, plugin: &str) -> Option<Namespace> {
        self.root.plugin(plugin)
    }

    pub fn method(&self, options: MethodOptions) -> Result<Arc<MethodInvoker>> {
        self.root.method(options)
    }

    fn setter<S: Any + Send + Sync>(&self, name: &'static str) -> Result<Arc<S>> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.name == name)
            .and_then(|layer| layer.capability.downcast::<S>())
            .ok_or(JimboError::ExtensionNotInstalled(name))
    }
}

impl std::fmt::Debug for ServerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTarget")
            .field("plugin", &self.plugin.name)
            .field("layers", &self.layer_names())
            .finish()
    }
}
