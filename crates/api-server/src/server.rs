//! API server assembly: router construction and HTTP/metrics startup.

use crate::middleware::{require_tenant, resolve_tenant};
use crate::rest::{self, AppState};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use dockslot_core::AppConfig;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP API server.
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

/// Build the application router. The resolver middleware runs on every
/// route; the tenant gate wraps only the tenant-facing subtree.
pub fn build_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/v1/tenant", get(rest::tenant_profile))
        .route("/v1/entitlements", get(rest::list_entitlements))
        .route("/v1/entitlements/:module", get(rest::get_entitlement))
        .route_layer(from_fn(require_tenant));

    let admin = Router::new()
        .route(
            "/v1/admin/tenants",
            post(rest::admin_register_tenant).get(rest::admin_list_tenants),
        )
        .route("/v1/admin/tenants/:id", get(rest::admin_get_tenant))
        .route(
            "/v1/admin/tenants/:id/modules",
            get(rest::admin_tenant_modules),
        )
        .route(
            "/v1/admin/tenants/:id/modules/:module",
            put(rest::admin_set_module),
        );

    Router::new()
        .merge(gated)
        .merge(admin)
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(from_fn_with_state(state.clone(), resolve_tenant))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP server (blocks until shutdown).
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = build_router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus metrics exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
