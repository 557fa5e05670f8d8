//! Quyca Common Library
//!
//! Shared code for the Quyca services including:
//! - Affiliation hierarchy aggregation (resolver, aggregator, assembler, search)
//! - Database models and repository patterns
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod hierarchy;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use hierarchy::AffiliationService;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
