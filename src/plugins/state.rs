use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::{JimboError, Result};

use super::dto::{Capability, Namespace, PluginNamespaces};

/// Decorations, plugin namespaces and registered plugin names of one server.
///
/// Created with the server and only written by the decorate/expose setters and
/// the pipeline. Nothing here is reset between composition runs.
#[derive(Debug, Default)]
pub struct ExtensionState {
    decorations: RwLock<HashMap<String, Capability>>,
    namespaces: RwLock<PluginNamespaces>,
    registered: RwLock<HashSet<String>>,
}

impl ExtensionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decorate(&self, entries: Vec<(String, Capability)>) -> Result<()> {
        let mut guard = self
            .decorations
            .write()
            .map_err(|_| JimboError::internal("Decoration lock poisoned"))?;
        for (name, capability) in entries {
            tracing::debug!("Decorating server with {}", name);
            guard.insert(name, capability);
        }
        Ok(())
    }

    pub fn decoration(&self, name: &str) -> Option<Capability> {
        self.decorations
            .read()
            .ok()
            .and_then(|guard| guard.get(name).cloned())
    }

    pub fn decoration_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .decorations
            .read()
            .map(|guard| guard.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn ensure_namespace(&self, plugin: &str) -> Result<()> {
        let mut guard = self
            .namespaces
            .write()
            .map_err(|_| JimboError::internal("Plugin namespace lock poisoned"))?;
        guard.entry(plugin.to_string()).or_default();
        Ok(())
    }

    pub fn expose(&self, plugin: &str, entries: Vec<(String, Capability)>) -> Result<()> {
        let mut guard = self
            .namespaces
            .write()
            .map_err(|_| JimboError::internal("Plugin namespace lock poisoned"))?;
        let namespace = guard.entry(plugin.to_string()).or_default();
        for (key, value) in entries {
            namespace.insert(key, value);
        }
        Ok(())
    }

    pub fn namespace(&self, plugin: &str) -> Option<Namespace> {
        self.namespaces
            .read()
            .ok()
            .and_then(|guard| guard.get(plugin).cloned())
    }

    pub fn namespaces(&self) -> PluginNamespaces {
        self.namespaces
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Whether `plugin` finished registering against this server.
    ///
    /// A plugin is only marked once its `register` succeeds, so two composition
    /// runs started concurrently on one server can both run a plugin of the
    /// same name. Runs are expected to be sequential.
    pub fn is_registered(&self, plugin: &str) -> bool {
        self.registered
            .read()
            .map(|guard| guard.contains(plugin))
            .unwrap_or(false)
    }

    pub fn mark_registered(&self, plugin: &str) -> Result<()> {
        let mut guard = self
            .registered
            .write()
            .map_err(|_| JimboError::internal("Registration lock poisoned"))?;
        guard.insert(plugin.to_string());
        Ok(())
    }
}
