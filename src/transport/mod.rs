pub mod http;
pub mod memory;
pub mod stdio;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConnectionOptions;
use crate::error::{JimboError, Result};
use crate::methods::MethodInvoker;

pub use http::HttpTransport;
pub use memory::MemoryBroker;
pub use stdio::StdioTransport;

/// Delivers incoming calls to registered methods.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    fn add_method(&self, method: Arc<MethodInvoker>) -> Result<()>;

    async fn start(&self) -> Result<()>;

    /// Resolves once the transport stops taking calls.
    async fn stopped(&self) {
        std::future::pending::<()>().await
    }
}

/// Builds the transport named by the URL scheme of `options`.
pub fn connect(options: &ConnectionOptions) -> Result<Arc<dyn Transport>> {
    let url = options.url.trim();

    if url.starts_with("memory://") {
        Ok(Arc::new(MemoryBroker::new(&options.channel)))
    } else if let Some(address) = url.strip_prefix("http://") {
        Ok(Arc::new(HttpTransport::new(
            address.trim_end_matches('/'),
            &options.channel,
        )))
    } else if url.starts_with("stdio://") {
        Ok(Arc::new(StdioTransport::new()))
    } else {
        Err(JimboError::config_error(format!(
            "Unsupported connection url: {}",
            options.url
        )))
    }
}
