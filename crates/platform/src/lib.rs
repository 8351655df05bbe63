//! DockSlot platform services: tenant directory, request-time tenant
//! resolution, and per-tenant module entitlements.

pub mod entitlements;
pub mod resolver;
pub mod tenancy;

pub use entitlements::{
    EntitlementStore, InMemoryEntitlementStore, Module, ModuleEntitlement, ModuleEntitlements,
};
pub use resolver::{TenantContext, TenantResolver, TENANT_ID_HEADER, TENANT_SUBDOMAIN_HEADER};
pub use tenancy::{InMemoryTenantDirectory, NewTenant, Tenant, TenantDirectory, TenantId};
