//! Configuration management for Quyca services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! The configuration is built once at process start and handed down
//! explicitly; nothing in the hierarchy core reads ambient settings.

use config::{Config, ConfigError, Environment, File};
use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Public API paths and domain
    #[serde(default)]
    pub api: ApiConfig,

    /// Paging limits
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Upper bound for a single collaborator query in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Public domain used when building absolute links
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Prefix for application (frontend-facing) routes
    #[serde(default = "default_app_v1_prefix")]
    pub app_v1_prefix: String,

    /// Prefix for the public data API
    #[serde(default = "default_api_v1_prefix")]
    pub api_v1_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    /// Page size when the client sends none
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Largest page a client may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (debug, info, warn, error or full EnvFilter syntax)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8010 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_query_timeout() -> u64 { 15 }
fn default_domain() -> String { "http://localhost:8010".to_string() }
fn default_app_v1_prefix() -> String { "/app/v1".to_string() }
fn default_api_v1_prefix() -> String { "/api/v1".to_string() }
fn default_page_size() -> u64 { 10 }
fn default_max_page_size() -> u64 { 250 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "quyca".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            app_v1_prefix: default_app_v1_prefix(),
            api_v1_prefix: default_api_v1_prefix(),
        }
    }
}

impl ApiConfig {
    /// Absolute URL for a path under the public data API
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.domain.trim_end_matches('/'),
            self.api_v1_prefix,
            path
        )
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Offset and length of one requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
}

impl PaginationConfig {
    /// Resolve a 1-based `page` and optional `max` into a store window.
    ///
    /// `max` is capped by `max_page_size`; the resulting offset must fit a
    /// signed 64-bit SQL `OFFSET`.
    pub fn window(&self, page: u64, max: Option<u64>) -> Result<PageWindow, AppError> {
        let limit = max.unwrap_or(self.default_page_size);
        if limit > self.max_page_size {
            return Err(AppError::Validation {
                message: format!("max must not exceed {}", self.max_page_size),
                field: Some("max".to_string()),
            });
        }

        let skip = page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(limit))
            .filter(|&skip| i64::try_from(skip).is_ok())
            .ok_or_else(|| AppError::Validation {
                message: format!("page {} is out of range", page),
                field: Some("page".to_string()),
            })?;

        Ok(PageWindow { skip, limit })
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/quyca".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
                query_timeout_secs: default_query_timeout(),
            },
            api: ApiConfig::default(),
            pagination: PaginationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8010);
        assert_eq!(config.pagination.default_page_size, 10);
        assert_eq!(config.pagination.max_page_size, 250);
    }

    #[test]
    fn test_window_offsets() {
        let pagination = PaginationConfig::default();
        assert_eq!(pagination.window(1, None).unwrap(), PageWindow { skip: 0, limit: 10 });
        assert_eq!(pagination.window(3, Some(25)).unwrap(), PageWindow { skip: 50, limit: 25 });
    }

    #[test]
    fn test_window_rejects_oversized_page_size() {
        let err = PaginationConfig::default().window(1, Some(251)).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "max"));
    }

    #[test]
    fn test_window_rejects_offset_beyond_i64() {
        let pagination = PaginationConfig::default();
        for page in [0, 1_000_000_000_000_000_000, u64::MAX] {
            let err = pagination.window(page, Some(10)).unwrap_err();
            assert!(
                matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "page"),
                "{}",
                page
            );
        }

        let last = i64::MAX as u64 / 10;
        assert!(pagination.window(last, Some(10)).is_ok());
    }

    #[test]
    fn test_api_url_joins_without_double_slash() {
        let api = ApiConfig {
            domain: "https://impactu.colav.co/".to_string(),
            ..ApiConfig::default()
        };
        assert_eq!(
            api.api_url("/affiliation/faculty/F1/research/products"),
            "https://impactu.colav.co/api/v1/affiliation/faculty/F1/research/products"
        );
    }
}
