//! Validate-config command implementation
//!
//! Loads the configuration file, runs validation, and reports what the
//! process would use without contacting the integrator.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path, "Validating configuration");

        println!("🔍 Validating Meridian configuration");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {}", e);
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid: {}", config_path);
        println!();
        println!("  Environment:           {:?}", config.environment);
        println!("  Integrator enabled:    {}", config.integrator.enabled);
        if config.integrator.enabled {
            println!("  Integrator endpoint:   {}", config.integrator.base_url);
            println!("  Facility account:      {}", config.integrator.username);
            println!(
                "  Integrated referrals:  {}",
                config.integrator.integrated_referrals_enabled
            );
            println!("  TLS verification:      {}", config.integrator.tls_verify);
        }
        println!(
            "  Cache:                 {} entries, {} shards, {}s TTL",
            config.cache.capacity, config.cache.shards, config.cache.ttl_seconds
        );
        println!("  Fallback store:        {}", config.fallback.enabled);
        println!();

        Ok(0)
    }
}
