use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::Result;
use crate::methods::{Handler, MethodOptions};

use super::dto::Plugin;
use super::extensions::SERVER_SCOPE;
use super::target::ServerTarget;

/// Built-in plugin: start time decoration, version exposure, health methods.
pub struct SystemPlugin {
    server_name: String,
}

impl SystemPlugin {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }
}

#[async_trait]
impl Plugin for SystemPlugin {
    fn name(&self) -> &str {
        "system"
    }

    fn version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    async fn register(&self, target: ServerTarget, _options: Value) -> Result<()> {
        let started_at: DateTime<Utc> = Utc::now();
        target.decorate(SERVER_SCOPE, "started_at", started_at)?;
        target.expose("version", env!("CARGO_PKG_VERSION").to_string())?;

        let server_name = self.server_name.clone();
        target.method(MethodOptions::new("system.ping").with_handler(Handler::returning(
            move |_params| {
                Ok(json!({
                    "ok": true,
                    "server": server_name.as_str(),
                    "started_at": started_at.to_rfc3339(),
                }))
            },
        )))?;

        target.method(
            MethodOptions::new("system.echo")
                .with_validation(json!({
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                }))
                .with_handler(Handler::future(|params| async move { Ok(params) })),
        )?;

        Ok(())
    }
}
