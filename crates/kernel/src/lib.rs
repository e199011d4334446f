//! Core traits, settings, and module registry shared by every bookshelf crate.

pub mod health;
pub mod module;
pub mod registry;
pub mod settings;

pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
