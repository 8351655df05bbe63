//! Request-time tenant resolution.
//!
//! A fixed, exclusive strategy chain identifies the tenant for an inbound
//! request: explicit id header, then explicit subdomain header, then the
//! leading label of the request hostname. The first strategy that lands on
//! a tenant wins; later strategies are never consulted. Storage failures
//! fail open: the request proceeds without tenant context.

use crate::tenancy::{Tenant, TenantDirectory, TenantId};
use dockslot_core::DockslotResult;
use std::sync::Arc;
use tracing::{debug, error};

/// Header carrying an explicit numeric tenant id (set by trusted proxies).
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Header carrying an explicit tenant subdomain.
pub const TENANT_SUBDOMAIN_HEADER: &str = "x-tenant-subdomain";

/// Request-scoped tenant context, set at most once per request.
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant: Arc<Tenant>,
}

impl TenantContext {
    pub fn new(tenant: Tenant) -> Self {
        Self {
            tenant: Arc::new(tenant),
        }
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant.id
    }
}

/// Resolves the tenant for an inbound request from its hostname and headers.
pub struct TenantResolver {
    directory: Arc<dyn TenantDirectory>,
    reserved_subdomains: Vec<String>,
}

impl TenantResolver {
    pub fn new(directory: Arc<dyn TenantDirectory>, reserved_subdomains: Vec<String>) -> Self {
        Self {
            directory,
            reserved_subdomains,
        }
    }

    /// Run the strategy chain. Returns `None` when no strategy matched or
    /// when a lookup failed; a lookup failure is logged and never aborts
    /// the request.
    pub async fn resolve(
        &self,
        host: Option<&str>,
        tenant_id_header: Option<&str>,
        subdomain_header: Option<&str>,
    ) -> Option<TenantContext> {
        match self
            .resolve_tenant(host, tenant_id_header, subdomain_header)
            .await
        {
            Ok(Some(tenant)) => {
                debug!(tenant_id = tenant.id, subdomain = %tenant.subdomain, "Tenant resolved");
                Some(TenantContext::new(tenant))
            }
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Tenant resolution failed; proceeding without tenant");
                None
            }
        }
    }

    async fn resolve_tenant(
        &self,
        host: Option<&str>,
        tenant_id_header: Option<&str>,
        subdomain_header: Option<&str>,
    ) -> DockslotResult<Option<Tenant>> {
        // Strategy 1: explicit numeric id header. A non-numeric value is
        // not an error; it simply skips this strategy.
        if let Some(raw) = tenant_id_header {
            if let Ok(id) = raw.trim().parse::<TenantId>() {
                if let Some(tenant) = self.directory.tenant_by_id(id).await? {
                    return Ok(Some(tenant));
                }
            }
        }

        // Strategy 2: explicit subdomain header. Stored subdomains are
        // lowercase, so the header value is folded to match.
        if let Some(subdomain) = subdomain_header {
            let subdomain = subdomain.trim().to_ascii_lowercase();
            if let Some(tenant) = self.directory.tenant_by_subdomain(&subdomain).await? {
                return Ok(Some(tenant));
            }
        }

        // Strategy 3: leading hostname label.
        if let Some(candidate) = self.host_candidate(host) {
            if let Some(tenant) = self.directory.tenant_by_subdomain(&candidate).await? {
                return Ok(Some(tenant));
            }
        }

        Ok(None)
    }

    /// Derive a candidate subdomain from the request host, or `None` when
    /// the host cannot name a tenant: loopback, dotted-quad IP literals,
    /// and reserved labels such as `www`.
    fn host_candidate(&self, host: Option<&str>) -> Option<String> {
        let hostname = strip_port(host?);
        if hostname.is_empty() || hostname.eq_ignore_ascii_case("localhost") {
            return None;
        }
        if hostname.parse::<std::net::Ipv4Addr>().is_ok() {
            return None;
        }

        let candidate = hostname.split('.').next().unwrap_or("");
        if candidate.is_empty() {
            return None;
        }
        if self
            .reserved_subdomains
            .iter()
            .any(|r| r.eq_ignore_ascii_case(candidate))
        {
            return None;
        }
        Some(candidate.to_ascii_lowercase())
    }
}

/// Strip an optional `:port` suffix from a Host header value.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
