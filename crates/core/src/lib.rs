//! DockSlot core — shared configuration and error types.

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{DockslotError, DockslotResult};
