use std::sync::Arc;

use crate::error::{JimboError, Result};

use super::dto::{Capability, PluginMeta};
use super::state::ExtensionState;
use super::target::ServerTarget;

/// The only scope `decorate` accepts.
pub const SERVER_SCOPE: &str = "server";

pub(crate) const DECORATE: &str = "decorate";
pub(crate) const EXPOSE: &str = "expose";

/// A pre-create hook, run for every plugin before its `register`.
pub trait Extension: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the view the next hook (and finally the plugin) receives.
    fn pre_create(&self, target: ServerTarget, plugin: &PluginMeta) -> Result<ServerTarget>;
}

pub fn builtin_extensions() -> Vec<Arc<dyn Extension>> {
    vec![Arc::new(Decorate), Arc::new(Expose)]
}

/// Installs `decorate` on every plugin target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decorate;

impl Extension for Decorate {
    fn name(&self) -> &'static str {
        DECORATE
    }

    fn pre_create(&self, target: ServerTarget, _plugin: &PluginMeta) -> Result<ServerTarget> {
        let decorator = Decorator {
            state: Arc::clone(target.root().state()),
        };
        Ok(target.with_layer(DECORATE, Capability::new(decorator)))
    }
}

pub(crate) struct Decorator {
    state: Arc<ExtensionState>,
}

impl Decorator {
    pub(crate) fn apply(&self, scope: &str, entries: Vec<(String, Capability)>) -> Result<()> {
        if scope != SERVER_SCOPE {
            return Err(JimboError::invalid_argument(format!(
                "Only \"{}\" scope is supported, got \"{}\"",
                SERVER_SCOPE, scope
            )));
        }
        if entries.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err(JimboError::invalid_argument(
                "invalid arguments passed to decorate",
            ));
        }
        self.state.decorate(entries)
    }
}

/// Gives each plugin a namespace under `plugins` and installs `expose`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expose;

impl Extension for Expose {
    fn name(&self) -> &'static str {
        EXPOSE
    }

    fn pre_create(&self, target: ServerTarget, plugin: &PluginMeta) -> Result<ServerTarget> {
        let state = Arc::clone(target.root().state());
        state.ensure_namespace(&plugin.name)?;
        let exposer = Exposer {
            state,
            plugin: plugin.name.clone(),
        };
        Ok(target.with_layer(EXPOSE, Capability::new(exposer)))
    }
}

pub(crate) struct Exposer {
    state: Arc<ExtensionState>,
    plugin: String,
}

impl Exposer {
    pub(crate) fn apply(&self, entries: Vec<(String, Capability)>) -> Result<()> {
        if entries.iter().any(|(key, _)| key.trim().is_empty()) {
            return Err(JimboError::invalid_argument("invalid arguments passed to expose"));
        }
        self.state.expose(&self.plugin, entries)
    }
}
