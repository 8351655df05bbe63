//! Tenancy middleware: the resolver that attaches tenant context to each
//! request, and the gate that rejects untenanted requests on routes where
//! a tenant is mandatory.

use crate::rest::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use dockslot_platform::{TenantContext, TENANT_ID_HEADER, TENANT_SUBDOMAIN_HEADER};
use serde::Serialize;

/// Body returned by the tenant gate. An absent tenant is deliberately
/// indistinguishable from an absent resource, so the gate answers 404
/// rather than 401/403.
#[derive(Debug, Serialize)]
pub struct TenantNotFoundResponse {
    pub message: &'static str,
}

impl TenantNotFoundResponse {
    pub fn new() -> Self {
        Self {
            message: "Tenant not found",
        }
    }
}

impl Default for TenantNotFoundResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the tenant for every inbound request and attach it as a
/// request extension. Resolution never fails the request; an untenanted
/// request proceeds unchanged.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let host = header_str(&request, header::HOST.as_str());
    let tenant_id = header_str(&request, TENANT_ID_HEADER);
    let subdomain = header_str(&request, TENANT_SUBDOMAIN_HEADER);

    match state
        .resolver
        .resolve(host.as_deref(), tenant_id.as_deref(), subdomain.as_deref())
        .await
    {
        Some(ctx) => {
            metrics::counter!("tenancy.resolved").increment(1);
            request.extensions_mut().insert(ctx);
        }
        None => {
            metrics::counter!("tenancy.unresolved").increment(1);
        }
    }

    next.run(request).await
}

/// Pure guard over the resolved tenant context. Performs no lookups.
pub async fn require_tenant(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<TenantNotFoundResponse>)> {
    if request.extensions().get::<TenantContext>().is_none() {
        metrics::counter!("tenancy.gate_rejections").increment(1);
        return Err((StatusCode::NOT_FOUND, Json(TenantNotFoundResponse::new())));
    }
    Ok(next.run(request).await)
}

fn header_str(request: &Request<Body>, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_response_body() {
        let response = TenantNotFoundResponse::new();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Tenant not found" }));
    }
}
