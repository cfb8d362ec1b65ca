//! Sync command implementation
//!
//! Two modes:
//! - default: snapshot one patient's remote data into the local
//!   fallback store, scoped to the requesting provider
//! - `--transfer <file>`: validate and apply a transfer file produced
//!   by another facility

use crate::adapters::integrator::RemoteServiceFactory;
use crate::adapters::storage::PostgresFallbackStorage;
use crate::config::{load_config, MeridianConfig};
use crate::core::fallback::{FallbackSynchronizer, LocalFallbackStore};
use crate::core::transfer::apply_transfer;
use crate::domain::ids::{FacilityId, PatientId, ProviderId};
use crate::domain::keys::AccessScope;
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Remote facility to pull from
    #[arg(long, required_unless_present = "transfer")]
    pub facility: Option<i32>,

    /// Local patient to snapshot
    #[arg(long, required_unless_present = "transfer")]
    pub patient: Option<i32>,

    /// Provider whose access rights scope the snapshot
    #[arg(long, required_unless_present = "transfer")]
    pub provider: Option<String>,

    /// Apply a transfer file instead of snapshotting
    #[arg(long)]
    pub transfer: Option<PathBuf>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2); // Configuration error exit code
            }
        };

        let store = match build_store(&config) {
            Ok(store) => Arc::new(store),
            Err(code) => return Ok(code),
        };

        // Schema migrations are idempotent; apply them before writing
        if let Some(storage) = store.storage() {
            if let Err(e) = storage.initialize().await {
                println!("❌ Fallback store unreachable");
                println!("   Error: {}", e);
                return Ok(4); // Connection error exit code
            }
        }

        if let Some(ref path) = self.transfer {
            return self.apply_transfer_file(&store, path).await;
        }

        self.snapshot_patient(&config, &store).await
    }

    async fn apply_transfer_file(
        &self,
        store: &LocalFallbackStore,
        path: &PathBuf,
    ) -> anyhow::Result<i32> {
        println!("📦 Applying transfer: {}", path.display());
        println!();

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                println!("❌ Cannot open transfer file");
                println!("   Error: {}", e);
                return Ok(5); // Fatal error exit code
            }
        };

        match apply_transfer(store, BufReader::new(file)).await {
            Ok(applied) => {
                println!(
                    "✅ Applied {} record(s) from facility {} ({:?})",
                    applied.records_applied, applied.facility_id, applied.disposition
                );
                Ok(0)
            }
            Err(e) => {
                println!("❌ Transfer rejected");
                println!("   Error: {}", e);
                println!("   Out-of-sequence transfers require a full resync from the sender.");
                Ok(5)
            }
        }
    }

    async fn snapshot_patient(
        &self,
        config: &MeridianConfig,
        store: &Arc<LocalFallbackStore>,
    ) -> anyhow::Result<i32> {
        // clap guarantees these are present when --transfer is absent
        let facility = FacilityId(self.facility.unwrap_or_default());
        let patient = PatientId(self.patient.unwrap_or_default());
        let provider = match ProviderId::new(self.provider.as_deref().unwrap_or_default()) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Invalid provider: {}", e);
                return Ok(2);
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

        let scope = AccessScope::new(facility, provider, patient);
        println!(
            "🔄 Snapshotting patient {} from facility {}",
            patient, facility
        );
        println!();

        let synchronizer =
            FallbackSynchronizer::new(factory.demographic_service(), Arc::clone(store));
        synchronizer.save_all(&scope).await;

        println!("✅ Snapshot complete (failed fetches are logged and skipped)");
        Ok(0)
    }
}

fn build_store(config: &MeridianConfig) -> std::result::Result<LocalFallbackStore, i32> {
    if !config.fallback.enabled {
        println!("❌ The fallback store is disabled; enable [fallback] to sync");
        return Err(2);
    }

    let postgresql = match config.fallback.postgresql {
        Some(ref pg) => pg,
        None => {
            println!("❌ Fallback store enabled but [fallback.postgresql] is missing");
            return Err(2);
        }
    };

    match PostgresFallbackStorage::new(postgresql) {
        Ok(storage) => Ok(LocalFallbackStore::new(Arc::new(storage))),
        Err(e) => {
            println!("❌ Fallback store configuration invalid");
            println!("   Error: {}", e);
            Err(2)
        }
    }
}
