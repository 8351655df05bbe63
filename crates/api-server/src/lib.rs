//! DockSlot HTTP surface: tenant-resolution middleware, the tenant gate,
//! REST handlers, and server assembly.

pub mod middleware;
pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::ApiServer;
