//! REST API handlers: tenant-facing profile/entitlement reads, the
//! administrative provisioning flow, and operational endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use dockslot_core::DockslotError;
use dockslot_platform::{
    EntitlementStore, InMemoryTenantDirectory, Module, ModuleEntitlement, ModuleEntitlements,
    NewTenant, Tenant, TenantContext, TenantDirectory, TenantId, TenantResolver,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// Shared application state for REST handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TenantResolver>,
    pub directory: Arc<InMemoryTenantDirectory>,
    pub entitlements: ModuleEntitlements,
    pub entitlement_store: Arc<dyn EntitlementStore>,
    pub node_id: String,
    pub start_time: Instant,
}

impl AppState {
    /// Wire up application state over explicit storage handles. The
    /// resolver consumes the directory through its trait seam.
    pub fn new(
        node_id: String,
        reserved_subdomains: Vec<String>,
        directory: Arc<InMemoryTenantDirectory>,
        entitlement_store: Arc<dyn EntitlementStore>,
    ) -> Self {
        let lookup: Arc<dyn TenantDirectory> = directory.clone();
        Self {
            resolver: Arc::new(TenantResolver::new(lookup, reserved_subdomains)),
            directory,
            entitlements: ModuleEntitlements::new(entitlement_store.clone()),
            entitlement_store,
            node_id,
            start_time: Instant::now(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

/// Public view of a tenant, safe to return to the tenant's own users.
#[derive(Serialize)]
pub struct TenantProfile {
    pub id: TenantId,
    pub subdomain: String,
    pub name: String,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
}

impl From<&Tenant> for TenantProfile {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            subdomain: tenant.subdomain.clone(),
            name: tenant.name.clone(),
            primary_color: tenant.primary_color.clone(),
            secondary_color: tenant.secondary_color.clone(),
            logo_url: tenant.logo_url.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ModuleStatus {
    pub module: String,
    pub enabled: bool,
    pub description: String,
}

#[derive(Serialize)]
pub struct EntitlementsResponse {
    pub tenant_id: TenantId,
    pub modules: Vec<ModuleStatus>,
}

#[derive(Deserialize)]
pub struct SetModuleRequest {
    pub enabled: Option<bool>,
}

// ─── Operational endpoints ──────────────────────────────────────────────

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

// ─── Tenant-facing endpoints (behind the tenant gate) ───────────────────

/// GET /v1/tenant — the resolved tenant's public profile.
pub async fn tenant_profile(Extension(ctx): Extension<TenantContext>) -> Json<TenantProfile> {
    Json(TenantProfile::from(ctx.tenant()))
}

/// GET /v1/entitlements — effective enablement of every module for the
/// resolved tenant.
pub async fn list_entitlements(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Json<EntitlementsResponse> {
    Json(entitlements_response(&state, ctx.tenant_id()).await)
}

/// GET /v1/entitlements/{module} — effective enablement of one module.
pub async fn get_entitlement(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(module): Path<String>,
) -> Result<Json<ModuleStatus>, (StatusCode, Json<ErrorResponse>)> {
    let module: Module = module.parse().map_err(unknown_module)?;
    let enabled = state
        .entitlements
        .is_enabled(ctx.tenant_id(), module.as_str())
        .await;
    Ok(Json(module_status(module, enabled)))
}

// ─── Administrative endpoints (operator-facing, not tenant-gated) ───────

/// POST /v1/admin/tenants — provision a new tenant.
pub async fn admin_register_tenant(
    State(state): State<AppState>,
    Json(new): Json<NewTenant>,
) -> Result<(StatusCode, Json<Tenant>), (StatusCode, Json<ErrorResponse>)> {
    match state.directory.register(new) {
        Ok(tenant) => Ok((StatusCode::CREATED, Json(tenant))),
        Err(DockslotError::DuplicateSubdomain(subdomain)) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "duplicate_subdomain".to_string(),
                message: format!("subdomain `{subdomain}` is already registered"),
            }),
        )),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_tenant".to_string(),
                message: e.to_string(),
            }),
        )),
    }
}

/// GET /v1/admin/tenants — list all tenants.
pub async fn admin_list_tenants(State(state): State<AppState>) -> Json<Vec<Tenant>> {
    Json(state.directory.list())
}

/// GET /v1/admin/tenants/{id} — one tenant by id.
pub async fn admin_get_tenant(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> Result<Json<Tenant>, (StatusCode, Json<ErrorResponse>)> {
    state
        .directory
        .get(id)
        .map(Json)
        .ok_or_else(|| tenant_not_found(id))
}

/// GET /v1/admin/tenants/{id}/modules — effective module enablement for a
/// tenant, by id.
pub async fn admin_tenant_modules(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> Result<Json<EntitlementsResponse>, (StatusCode, Json<ErrorResponse>)> {
    if state.directory.get(id).is_none() {
        return Err(tenant_not_found(id));
    }
    Ok(Json(entitlements_response(&state, id).await))
}

/// PUT /v1/admin/tenants/{id}/modules/{module} — enable or disable a
/// module for a tenant.
pub async fn admin_set_module(
    State(state): State<AppState>,
    Path((id, module)): Path<(TenantId, String)>,
    Json(request): Json<SetModuleRequest>,
) -> Result<Json<ModuleEntitlement>, (StatusCode, Json<ErrorResponse>)> {
    if state.directory.get(id).is_none() {
        return Err(tenant_not_found(id));
    }
    let module: Module = module.parse().map_err(unknown_module)?;

    match state
        .entitlement_store
        .upsert(id, module.as_str(), request.enabled)
        .await
    {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            error!(error = %e, tenant_id = id, module = %module, "Entitlement upsert failed");
            metrics::counter!("api.errors").increment(1);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "entitlement_update_failed".to_string(),
                    message: "Internal storage error".to_string(),
                }),
            ))
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

async fn entitlements_response(state: &AppState, tenant_id: TenantId) -> EntitlementsResponse {
    let modules = state
        .entitlements
        .effective_modules(tenant_id)
        .await
        .into_iter()
        .map(|(module, enabled)| module_status(module, enabled))
        .collect();
    EntitlementsResponse { tenant_id, modules }
}

fn module_status(module: Module, enabled: bool) -> ModuleStatus {
    ModuleStatus {
        module: module.as_str().to_string(),
        enabled,
        description: module.description().to_string(),
    }
}

fn tenant_not_found(id: TenantId) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "tenant_not_found".to_string(),
            message: format!("no tenant with id {id}"),
        }),
    )
}

fn unknown_module(e: DockslotError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "unknown_module".to_string(),
            message: e.to_string(),
        }),
    )
}
