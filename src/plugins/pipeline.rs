use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::completion::{panic_message, spawn_with_callback};
use crate::error::{JimboError, Result};

use super::dto::{PluginDescriptor, PluginMeta};
use super::extensions::{builtin_extensions, Extension};
use super::helpers::{merge_options, validate_plugin_name};
use super::target::{RootTarget, ServerTarget};

/// Runs plugins in order against a root, each behind the installed hooks.
pub struct Pipeline {
    extensions: Vec<Arc<dyn Extension>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            extensions: builtin_extensions(),
        }
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline with no hooks installed.
    pub fn bare() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Installs a hook after the ones already present.
    pub fn with_extension<E: Extension + 'static>(mut self, extension: E) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    /// Registers `plugins` one after another. Runs against the same root must
    /// not overlap; see [`ExtensionState::is_registered`].
    ///
    /// [`ExtensionState::is_registered`]: super::state::ExtensionState::is_registered
    pub async fn compose(
        &self,
        root: &RootTarget,
        plugins: Vec<PluginDescriptor>,
        global_options: &Value,
    ) -> Result<()> {
        tracing::debug!("Composing {} plugins", plugins.len());

        for descriptor in plugins {
            let meta = descriptor.meta();
            validate_plugin_name(&meta.name)?;

            if root.state().is_registered(&meta.name) {
                tracing::debug!("Plugin {} already registered; skipping", meta.name);
                continue;
            }

            let target = self.create_target(root, &meta)?;
            let options = merge_options(global_options, descriptor.options.as_ref());

            let outcome = AssertUnwindSafe(descriptor.plugin.register(target, options))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!("Plugin {} failed to register: {}", meta.name, err);
                    return Err(JimboError::plugin_registration(&meta.name, err));
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    tracing::warn!("Plugin {} panicked during registration: {}", meta.name, reason);
                    return Err(JimboError::plugin_registration(&meta.name, reason));
                }
            }

            root.state().mark_registered(&meta.name)?;
            tracing::info!(
                "Plugin {} registered{}",
                meta.name,
                meta.version
                    .as_deref()
                    .map(|v| format!(" (v{})", v))
                    .unwrap_or_default()
            );
        }

        Ok(())
    }

    /// Callback form of [`Pipeline::compose`]; runs on the tokio runtime.
    pub fn compose_with<F>(
        self: Arc<Self>,
        root: RootTarget,
        plugins: Vec<PluginDescriptor>,
        global_options: Value,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        spawn_with_callback(
            async move { self.compose(&root, plugins, &global_options).await },
            callback,
        )
    }

    fn create_target(&self, root: &RootTarget, meta: &PluginMeta) -> Result<ServerTarget> {
        self.extensions
            .iter()
            .try_fold(ServerTarget::new(root.clone(), meta.clone()), |target, ext| {
                ext.pre_create(target, meta)
            })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("extensions", &self.extension_names())
            .finish()
    }
}
