//! Per-tenant module entitlements.
//!
//! Optional product feature areas (modules) are enabled tenant by tenant.
//! The effective answer is always a boolean and defaults to disabled: no
//! record, a null flag, or a storage failure all read as "not enabled".

use crate::tenancy::TenantId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dockslot_core::{DockslotError, DockslotResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// Every optional feature area that can be enabled per tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Calendar,
    AssetManager,
    BolDocuments,
    Notifications,
    Reporting,
}

impl Module {
    /// All gateable modules.
    pub const ALL: &'static [Module] = &[
        Self::Calendar,
        Self::AssetManager,
        Self::BolDocuments,
        Self::Notifications,
        Self::Reporting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::AssetManager => "asset_manager",
            Self::BolDocuments => "bol_documents",
            Self::Notifications => "notifications",
            Self::Reporting => "reporting",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Calendar => "Dock appointment calendar views",
            Self::AssetManager => "Yard asset inventory manager",
            Self::BolDocuments => "Bill-of-lading document intake",
            Self::Notifications => "Email and QR appointment notifications",
            Self::Reporting => "Facility utilization reporting",
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = DockslotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DockslotError::UnknownModule(s.to_string()))
    }
}

/// The persisted fact that a module is (or is not) enabled for a tenant.
/// At most one record exists per (tenant, module) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntitlement {
    pub tenant_id: TenantId,
    pub module: String,
    /// `None` carries the same meaning as `Some(false)` at read time.
    pub enabled: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence seam for entitlement records.
#[async_trait::async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Fetch the unique record for (tenant, module), if any.
    async fn entitlement(
        &self,
        tenant_id: TenantId,
        module: &str,
    ) -> DockslotResult<Option<ModuleEntitlement>>;

    /// Create or update the record for (tenant, module). Updates preserve
    /// `created_at` and refresh `updated_at`.
    async fn upsert(
        &self,
        tenant_id: TenantId,
        module: &str,
        enabled: Option<bool>,
    ) -> DockslotResult<ModuleEntitlement>;
}

/// In-memory entitlement store backed by DashMap. Keying by
/// (tenant, module) enforces the one-record-per-pair invariant.
#[derive(Default)]
pub struct InMemoryEntitlementStore {
    records: DashMap<(TenantId, String), ModuleEntitlement>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn entitlement(
        &self,
        tenant_id: TenantId,
        module: &str,
    ) -> DockslotResult<Option<ModuleEntitlement>> {
        Ok(self
            .records
            .get(&(tenant_id, module.to_string()))
            .map(|e| e.value().clone()))
    }

    async fn upsert(
        &self,
        tenant_id: TenantId,
        module: &str,
        enabled: Option<bool>,
    ) -> DockslotResult<ModuleEntitlement> {
        let now = Utc::now();
        let mut record = self
            .records
            .entry((tenant_id, module.to_string()))
            .or_insert_with(|| ModuleEntitlement {
                tenant_id,
                module: module.to_string(),
                enabled: None,
                created_at: now,
                updated_at: now,
            });
        record.enabled = enabled;
        record.updated_at = now;
        info!(tenant_id, module, enabled = ?enabled, "Entitlement upserted");
        Ok(record.clone())
    }
}

/// Read-side facade answering "is module M enabled for tenant T?".
///
/// Every call re-queries the store; there is deliberately no cache.
#[derive(Clone)]
pub struct ModuleEntitlements {
    store: Arc<dyn EntitlementStore>,
}

impl ModuleEntitlements {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Effective enablement for one module. Fails closed: absence of an
    /// explicit enabled record never grants a feature, and neither does a
    /// storage failure.
    pub async fn is_enabled(&self, tenant_id: TenantId, module: &str) -> bool {
        match self.store.entitlement(tenant_id, module).await {
            Ok(Some(record)) => record.enabled.unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                error!(error = %e, tenant_id, module, "Entitlement lookup failed; treating as disabled");
                false
            }
        }
    }

    /// Effective enablement for every known module.
    pub async fn effective_modules(&self, tenant_id: TenantId) -> Vec<(Module, bool)> {
        let mut out = Vec::with_capacity(Module::ALL.len());
        for module in Module::ALL {
            out.push((*module, self.is_enabled(tenant_id, module.as_str()).await));
        }
        out
    }
}
