//! Multi-tenancy: tenant records, the lookup seam used by the resolver,
//! and the in-memory directory backing the administrative flow.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dockslot_core::{DockslotError, DockslotResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

/// Numeric tenant identifier.
pub type TenantId = i64;

/// An organization using the platform under its own subdomain.
///
/// Display and branding metadata never participates in resolution; only
/// `id` and `subdomain` are consulted by lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub subdomain: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for registering a new tenant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTenant {
    pub name: String,
    /// Explicit subdomain; derived from `name` when absent.
    pub subdomain: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
}

/// Read-side lookup seam consumed by the tenant resolver.
///
/// Implementations are expected to answer from shared storage; both methods
/// surface storage failures as `Err` so the caller can decide the failure
/// posture (the resolver fails open).
#[async_trait::async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn tenant_by_id(&self, id: TenantId) -> DockslotResult<Option<Tenant>>;
    async fn tenant_by_subdomain(&self, subdomain: &str) -> DockslotResult<Option<Tenant>>;
}

/// In-memory tenant directory backed by DashMap.
///
/// Serves both the resolver's read path (via [`TenantDirectory`]) and the
/// administrative provisioning flow.
pub struct InMemoryTenantDirectory {
    by_id: DashMap<TenantId, Tenant>,
    by_subdomain: DashMap<String, TenantId>,
    next_id: AtomicI64,
}

impl Default for InMemoryTenantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTenantDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_subdomain: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Register a new tenant, deriving and normalizing its subdomain.
    ///
    /// Fails with [`DockslotError::DuplicateSubdomain`] when the subdomain is
    /// already taken; at most one tenant per subdomain.
    pub fn register(&self, new: NewTenant) -> DockslotResult<Tenant> {
        let subdomain = normalize_subdomain(new.subdomain.as_deref().unwrap_or(&new.name));
        if subdomain.is_empty() {
            return Err(DockslotError::Config(
                "tenant subdomain must contain at least one alphanumeric character".into(),
            ));
        }
        // Claim the subdomain atomically: the vacant entry holds the shard
        // lock until the tenant is fully visible in `by_id`, so two racing
        // registrations can never both win, and a subdomain lookup never
        // observes an id mapping without its tenant record.
        match self.by_subdomain.entry(subdomain) {
            Entry::Occupied(occupied) => {
                Err(DockslotError::DuplicateSubdomain(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                let now = Utc::now();
                let tenant = Tenant {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    subdomain: vacant.key().clone(),
                    name: new.name,
                    contact_email: new.contact_email,
                    address: new.address,
                    primary_color: new.primary_color,
                    secondary_color: new.secondary_color,
                    logo_url: new.logo_url,
                    created_at: now,
                    updated_at: now,
                };

                info!(tenant_id = tenant.id, subdomain = %tenant.subdomain, "Tenant registered");
                self.by_id.insert(tenant.id, tenant.clone());
                vacant.insert(tenant.id);
                Ok(tenant)
            }
        }
    }

    /// Look up a tenant by id without going through the async seam.
    pub fn get(&self, id: TenantId) -> Option<Tenant> {
        self.by_id.get(&id).map(|e| e.value().clone())
    }

    /// List all tenants, ordered by id.
    pub fn list(&self) -> Vec<Tenant> {
        let mut tenants: Vec<Tenant> = self.by_id.iter().map(|e| e.value().clone()).collect();
        tenants.sort_by_key(|t| t.id);
        tenants
    }

    /// Seed a handful of demo tenants for local development.
    pub fn seed_demo_tenants(&self) {
        for name in ["Acme Freight", "Harbor Logistics", "Blue Crane Shipping"] {
            if let Err(e) = self.register(NewTenant {
                name: name.into(),
                ..NewTenant::default()
            }) {
                info!(error = %e, "Skipping demo tenant");
            }
        }
        info!("Demo tenants seeded");
    }
}

#[async_trait::async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn tenant_by_id(&self, id: TenantId) -> DockslotResult<Option<Tenant>> {
        Ok(self.get(id))
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> DockslotResult<Option<Tenant>> {
        Ok(self
            .by_subdomain
            .get(subdomain)
            .and_then(|id| self.by_id.get(id.value()))
            .map(|e| e.value().clone()))
    }
}

/// Normalize a display name or requested subdomain into a subdomain label:
/// lowercase, alphanumerics kept, everything else collapsed to `-`.
pub fn normalize_subdomain(raw: &str) -> String {
    let slug: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slug.trim_matches('-').to_string()
}
