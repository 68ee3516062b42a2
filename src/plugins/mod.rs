pub mod dto;
pub mod extensions;
mod helpers;
pub mod pipeline;
pub mod state;
pub mod system;
pub mod target;

pub use dto::{Capability, FnPlugin, Namespace, Plugin, PluginDescriptor, PluginMeta, PluginNamespaces};
pub use extensions::{builtin_extensions, Decorate, Expose, Extension, SERVER_SCOPE};
pub use pipeline::Pipeline;
pub use state::ExtensionState;
pub use system::SystemPlugin;
pub use target::{RootTarget, ServerTarget};
