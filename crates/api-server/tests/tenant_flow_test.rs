//! HTTP-level tests for tenant resolution, the tenant gate, and the
//! entitlement endpoints, driving the router directly with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use dockslot_api::rest::AppState;
use dockslot_api::server::build_router;
use dockslot_platform::{
    EntitlementStore, InMemoryEntitlementStore, InMemoryTenantDirectory, NewTenant, Tenant,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    directory: Arc<InMemoryTenantDirectory>,
    store: Arc<InMemoryEntitlementStore>,
}

fn test_app() -> TestApp {
    let directory = Arc::new(InMemoryTenantDirectory::new());
    let store = Arc::new(InMemoryEntitlementStore::new());
    let state = AppState::new(
        "test-node".to_string(),
        vec!["www".to_string()],
        directory.clone(),
        store.clone(),
    );
    TestApp {
        router: build_router(state),
        directory,
        store,
    }
}

impl TestApp {
    fn register(&self, name: &str) -> Tenant {
        self.directory
            .register(NewTenant {
                name: name.to_string(),
                ..NewTenant::default()
            })
            .unwrap()
    }

    async fn get(&self, uri: &str, host: &str, extra: &[(&str, &str)]) -> Response<Body> {
        let mut builder = Request::builder().uri(uri).header("host", host);
        for (name, value) in extra {
            builder = builder.header(*name, *value);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "localhost")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_gate_rejects_untenanted_request_with_404() {
    let app = test_app();

    let response = app.get("/v1/tenant", "localhost", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "message": "Tenant not found" }));
}

#[tokio::test]
async fn test_resolves_tenant_from_hostname() {
    let app = test_app();
    let tenant = app.register("acme");

    let response = app.get("/v1/tenant", "acme.booking.app", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], tenant.id);
    assert_eq!(body["subdomain"], "acme");
}

#[tokio::test]
async fn test_id_header_takes_priority() {
    let app = test_app();
    let acme = app.register("acme");
    app.register("other");

    // Hostname and subdomain header both point at "other"; the id header wins.
    let response = app
        .get(
            "/v1/tenant",
            "other.booking.app",
            &[
                ("x-tenant-id", &acme.id.to_string()),
                ("x-tenant-subdomain", "other"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], acme.id);
}

#[tokio::test]
async fn test_subdomain_header_resolves_without_id() {
    let app = test_app();
    let acme = app.register("acme");

    let response = app
        .get(
            "/v1/tenant",
            "localhost",
            &[("x-tenant-id", "not-a-number"), ("x-tenant-subdomain", "acme")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], acme.id);
}

#[tokio::test]
async fn test_reserved_and_ip_hosts_stay_untenanted() {
    let app = test_app();
    app.register("www");

    for host in ["www.example.com", "127.0.0.1", "127.0.0.1:8080", "localhost"] {
        let response = app.get("/v1/tenant", host, &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "host {host}");
    }
}

#[tokio::test]
async fn test_entitlements_default_to_disabled() {
    let app = test_app();
    app.register("acme");

    let response = app.get("/v1/entitlements", "acme.booking.app", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let modules = body["modules"].as_array().unwrap();
    assert!(!modules.is_empty());
    for module in modules {
        assert_eq!(module["enabled"], false, "module {}", module["module"]);
    }

    let response = app
        .get("/v1/entitlements/calendar", "acme.booking.app", &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["enabled"], false);
}

#[tokio::test]
async fn test_enabled_module_is_visible_through_the_api() {
    let app = test_app();
    let tenant = app.register("acme");
    app.store
        .upsert(tenant.id, "calendar", Some(true))
        .await
        .unwrap();

    let response = app
        .get("/v1/entitlements/calendar", "acme.booking.app", &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["enabled"], true);

    // Null flag reads as disabled.
    app.store
        .upsert(tenant.id, "calendar", None)
        .await
        .unwrap();
    let response = app
        .get("/v1/entitlements/calendar", "acme.booking.app", &[])
        .await;
    assert_eq!(body_json(response).await["enabled"], false);
}

#[tokio::test]
async fn test_unknown_module_name_is_rejected() {
    let app = test_app();
    app.register("acme");

    let response = app.get("/v1/entitlements/ocr", "acme.booking.app", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unknown_module");
}

#[tokio::test]
async fn test_admin_provisioning_flow() {
    let app = test_app();

    let response = app
        .send_json("POST", "/v1/admin/tenants", json!({ "name": "Acme Freight" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tenant = body_json(response).await;
    assert_eq!(tenant["subdomain"], "acme-freight");
    let id = tenant["id"].as_i64().unwrap();

    // Same subdomain again conflicts.
    let response = app
        .send_json("POST", "/v1/admin/tenants", json!({ "name": "Acme Freight" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Enable a module through the admin flow.
    let response = app
        .send_json(
            "PUT",
            &format!("/v1/admin/tenants/{id}/modules/calendar"),
            json!({ "enabled": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["enabled"], true);

    // The tenant-facing read reflects it.
    let response = app
        .get("/v1/entitlements/calendar", "acme-freight.booking.app", &[])
        .await;
    assert_eq!(body_json(response).await["enabled"], true);
}

#[tokio::test]
async fn test_admin_errors() {
    let app = test_app();
    let tenant = app.register("acme");

    let response = app
        .send_json(
            "PUT",
            "/v1/admin/tenants/9999/modules/calendar",
            json!({ "enabled": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send_json(
            "PUT",
            &format!("/v1/admin/tenants/{}/modules/ocr", tenant.id),
            json!({ "enabled": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/v1/admin/tenants/9999", "localhost", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "tenant_not_found");
}

#[tokio::test]
async fn test_admin_routes_are_not_tenant_gated() {
    let app = test_app();
    app.register("acme");

    let response = app.get("/v1/admin/tenants", "localhost", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = app.get("/health", "localhost", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}
