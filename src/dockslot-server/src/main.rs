//! DockSlot — multi-tenant dock-scheduling service.
//!
//! Main entry point: wires storage, the tenant resolver, and the API server.

use clap::Parser;
use dockslot_api::{ApiServer, AppState};
use dockslot_core::AppConfig;
use dockslot_platform::{InMemoryEntitlementStore, InMemoryTenantDirectory};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "dockslot-server")]
#[command(about = "Multi-tenant dock scheduling and appointment booking service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "DOCKSLOT__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "DOCKSLOT__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "DOCKSLOT__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Seed demo tenants on startup (local development)
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dockslot=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("DockSlot starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Explicitly constructed storage handles, shared through app state.
    let directory = Arc::new(InMemoryTenantDirectory::new());
    let entitlement_store = Arc::new(InMemoryEntitlementStore::new());

    if cli.seed_demo {
        directory.seed_demo_tenants();
    }

    let state = AppState::new(
        config.node_id.clone(),
        config.tenancy.reserved_subdomains.clone(),
        directory,
        entitlement_store,
    );

    let api_server = ApiServer::new(config, state);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("DockSlot is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
