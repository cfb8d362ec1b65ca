//! Status command implementation
//!
//! Checks integrator connectivity and the fallback store, and lists the
//! remote facilities with their last data push.

use crate::adapters::integrator::RemoteServiceFactory;
use crate::adapters::storage::{FallbackStorage, PostgresFallbackStorage};
use crate::config::load_config;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Skip the fallback store connectivity check
    #[arg(long)]
    pub skip_fallback: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking integrator status");

        println!("📊 Meridian Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2); // Configuration error exit code
            }
        };

        let factory = match RemoteServiceFactory::new(&config.integrator) {
            Ok(f) => f,
            Err(e) => {
                println!("❌ Integrator client could not be built");
                println!("   Error: {}", e);
                return Ok(2);
            }
        };

        let facilities = match factory.facility_service().all_facilities().await {
            Ok(facilities) => {
                println!("✅ Integrator reachable: {}", config.integrator.base_url);
                facilities
            }
            Err(e) => {
                println!("❌ Integrator unreachable");
                println!("   Error: {}", e);
                return Ok(4); // Connection error exit code
            }
        };

        println!();
        println!("Found {} facilit(ies):", facilities.len());
        println!();
        println!("{:<8} {:<40} {:<25}", "ID", "Name", "Last Data Push");
        println!("{}", "-".repeat(75));
        for facility in &facilities {
            let last_push = match facility.last_data_update {
                Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => "Never".to_string(),
            };
            println!(
                "{:<8} {:<40} {:<25}",
                facility.integrator_facility_id, facility.name, last_push
            );
        }
        println!();

        if self.skip_fallback || !config.fallback.enabled {
            println!("Fallback store: disabled");
            return Ok(0);
        }

        let postgresql = match config.fallback.postgresql {
            Some(ref pg) => pg,
            None => {
                println!("❌ Fallback store enabled but [fallback.postgresql] is missing");
                return Ok(2);
            }
        };

        match PostgresFallbackStorage::new(postgresql) {
            Ok(storage) => match storage.test_connection().await {
                Ok(()) => {
                    println!("✅ Fallback store reachable");
                    Ok(0)
                }
                Err(e) => {
                    println!("❌ Fallback store unreachable");
                    println!("   Error: {}", e);
                    Ok(4)
                }
            },
            Err(e) => {
                println!("❌ Fallback store configuration invalid");
                println!("   Error: {}", e);
                Ok(2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_missing_config() {
        let args = StatusArgs {
            skip_fallback: true,
        };
        let code = args.execute("/nonexistent/meridian.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
