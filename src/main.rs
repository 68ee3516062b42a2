use anyhow::{Context, Result};
use jimbo::plugins::{PluginDescriptor, SystemPlugin};
use jimbo::{JimboConfig, JimboServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env for local dev (if present)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let config = match std::env::var("JIMBO_CONFIG") {
        Ok(path) => JimboConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        Err(_) => JimboConfig::from_env()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("jimbo={}", config.server.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if dotenv_loaded {
        tracing::info!("Loaded .env");
    }

    tracing::info!("Starting Jimbo RPC server {}", config.server.name);
    tracing::info!(
        "Configuration loaded: url={}, channel={}",
        config.connection.url,
        config.connection.channel
    );

    let server = JimboServer::with_config(&config);
    server
        .register(vec![PluginDescriptor::new(SystemPlugin::new(
            config.server.name.clone(),
        ))])
        .await
        .context("failed to register builtin plugins")?;

    let methods = server.methods().names()?;
    tracing::info!("Available methods: {}", methods.len());
    for name in methods {
        tracing::info!("  - {}", name);
    }

    server.start().await.context("failed to start transport")?;

    tokio::select! {
        _ = server.stopped() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C");
        }
    }

    tracing::info!("Jimbo RPC server shutting down");
    Ok(())
}
