//! Configuration management for Meridian.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Meridian uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`MERIDIAN_*` prefix)
//! - Default values for optional settings
//! - Comprehensive validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use meridian::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("meridian.toml")?;
//!
//! println!("Integrator URL: {}", config.integrator.base_url);
//! println!("Cache TTL: {}s", config.cache.ttl_seconds);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [integrator]
//! base_url = "https://integrator.example.org/ws"
//! username = "facility-main"
//! password = "${MERIDIAN_INTEGRATOR_PASSWORD}"
//! integrated_referrals_enabled = true
//!
//! [cache]
//! capacity = 100
//! shards = 4
//! ttl_seconds = 3600
//!
//! [fallback]
//! enabled = true
//!
//! [fallback.postgresql]
//! connection_string = "${MERIDIAN_FALLBACK_DB_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CacheConfig, Environment, FallbackConfig, IntegratorConfig, LoggingConfig,
    MeridianConfig, PostgreSQLConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
