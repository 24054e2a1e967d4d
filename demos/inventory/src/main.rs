//! Runs the inventory service over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use inventory_demo::Inventory;
use rigging_server::middleware;
use rigging_server::{shutdown_signal, ApiServer, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rigging-inventory")]
#[command(about = "Serve the inventory service as HTTP actions", long_about = None)]
#[command(version)]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(short, long, env = "RIGGING_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, env = "RIGGING_ADDR")]
    addr: Option<SocketAddr>,

    /// Path prefix for every route
    #[arg(long, env = "RIGGING_URL_PREFIX")]
    url_prefix: Option<String>,

    /// Per-request deadline in milliseconds
    #[arg(long, env = "RIGGING_REQUEST_TIMEOUT_MS")]
    request_timeout_ms: Option<u64>,

    /// Allowed CORS origins ("*" for any)
    #[arg(long, value_delimiter = ',')]
    cors: Vec<String>,
}

impl Args {
    fn server_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                ServerConfig::from_json(&raw)?
            }
            None => ServerConfig::default(),
        };

        config = config.with_name("inventory");
        if let Some(addr) = self.addr {
            config = config.with_addr(addr);
        }
        if let Some(prefix) = &self.url_prefix {
            config = config.with_url_prefix(prefix.clone());
        }
        if let Some(ms) = self.request_timeout_ms {
            config = config.with_request_timeout(Duration::from_millis(ms));
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.server_config()?;

    let mut server = ApiServer::new(config)
        .with_pre_interceptor(middleware::catch_panic())
        .with_post_interceptor(middleware::compression())
        .with_post_interceptor(middleware::trace());
    if !args.cors.is_empty() {
        server = server.with_post_interceptor(middleware::cors(&args.cors));
    }

    server
        .bind(Arc::new(Inventory::new()))
        .context("failed to bind inventory service")?;

    for path in server.exports() {
        tracing::info!(%path, "Action available");
    }

    server.serve(shutdown_signal()).await?;
    Ok(())
}
