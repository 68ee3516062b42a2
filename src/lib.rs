pub mod completion;
pub mod config;
pub mod error;
pub mod methods;
pub mod plugins;
pub mod rpc;
pub mod server;
pub mod transport;

pub use completion::{Completion, Done};
pub use config::{ConnectionOptions, JimboConfig};
pub use error::{JimboError, Result};
pub use server::JimboServer;
