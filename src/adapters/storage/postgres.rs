//! PostgreSQL backend for the local fallback store

use crate::adapters::storage::traits::{FallbackRecord, FallbackStorage};
use crate::config::PostgreSQLConfig;
use crate::domain::errors::{MeridianError, StorageError};
use crate::domain::ids::{FacilityId, PatientId};
use crate::domain::result::Result;
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::{NoTls, Row};

/// PostgreSQL fallback store
///
/// Rows live in `remote_data_copy`, keyed by (facility, patient, kind),
/// with the payload as JSONB and a capture timestamp for last-writer-wins
/// conflict resolution.
pub struct PostgresFallbackStorage {
    pool: Pool,
}

impl PostgresFallbackStorage {
    /// Creates the connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the
    /// pool cannot be created.
    pub fn new(config: &PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                MeridianError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| {
                StorageError::ConnectionFailed(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StorageError::ConnectionFailed(format!("Failed to get connection from pool: {}", e))
                .into()
        })
    }

    fn record_from_row(row: &Row) -> FallbackRecord {
        FallbackRecord {
            facility_id: FacilityId(row.get("facility_id")),
            patient_id: PatientId(row.get("patient_id")),
            type_key: row.get("type_key"),
            payload: row.get("payload"),
            recorded_by: row.get("recorded_by"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl FallbackStorage for PostgresFallbackStorage {
    async fn test_connection(&self) -> Result<()> {
        let client = self.connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("Connection test failed: {}", e)))?;

        tracing::debug!("Fallback storage connection test successful");
        Ok(())
    }

    async fn initialize(&self) -> Result<()> {
        let client = self.connection().await?;

        let migration_sql = include_str!("../../../migrations/001_initial_schema.sql");

        client
            .batch_execute(migration_sql)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("Failed to execute migration: {}", e)))?;

        tracing::info!("Fallback storage schema initialized");
        Ok(())
    }

    async fn save(&self, record: &FallbackRecord) -> Result<()> {
        let client = self.connection().await?;

        // Last writer wins: an older copy never overwrites a newer one
        client
            .execute(
                "INSERT INTO remote_data_copy (facility_id, patient_id, type_key, payload, recorded_by, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (facility_id, patient_id, type_key) \
                 DO UPDATE SET payload = EXCLUDED.payload, \
                               recorded_by = EXCLUDED.recorded_by, \
                               updated_at = EXCLUDED.updated_at \
                 WHERE remote_data_copy.updated_at <= EXCLUDED.updated_at",
                &[
                    &record.facility_id.as_i32(),
                    &record.patient_id.as_i32(),
                    &record.type_key,
                    &record.payload,
                    &record.recorded_by,
                    &record.updated_at,
                ],
            )
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to save record: {}", e)))?;

        Ok(())
    }

    async fn find(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        type_key: &str,
    ) -> Result<Option<FallbackRecord>> {
        let client = self.connection().await?;

        let row = client
            .query_opt(
                "SELECT facility_id, patient_id, type_key, payload, recorded_by, updated_at \
                 FROM remote_data_copy \
                 WHERE facility_id = $1 AND patient_id = $2 AND type_key = $3",
                &[&facility_id.as_i32(), &patient_id.as_i32(), &type_key],
            )
            .await
            .map_err(|e| StorageError::QueryFailed(format!("Lookup failed: {}", e)))?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    async fn find_by_type(&self, type_key: &str) -> Result<Vec<FallbackRecord>> {
        let client = self.connection().await?;

        let rows = client
            .query(
                "SELECT facility_id, patient_id, type_key, payload, recorded_by, updated_at \
                 FROM remote_data_copy \
                 WHERE type_key = $1 \
                 ORDER BY facility_id, patient_id",
                &[&type_key],
            )
            .await
            .map_err(|e| StorageError::QueryFailed(format!("Type lookup failed: {}", e)))?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    async fn delete_for_patient(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
    ) -> Result<u64> {
        let client = self.connection().await?;

        let deleted = client
            .execute(
                "DELETE FROM remote_data_copy WHERE facility_id = $1 AND patient_id = $2",
                &[&facility_id.as_i32(), &patient_id.as_i32()],
            )
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Delete failed: {}", e)))?;

        Ok(deleted)
    }

    async fn transfer_checksum(&self, facility_id: FacilityId) -> Result<Option<String>> {
        let client = self.connection().await?;

        let row = client
            .query_opt(
                "SELECT last_checksum FROM transfer_state WHERE facility_id = $1",
                &[&facility_id.as_i32()],
            )
            .await
            .map_err(|e| StorageError::QueryFailed(format!("Checksum lookup failed: {}", e)))?;

        Ok(row.map(|row| row.get("last_checksum")))
    }

    async fn set_transfer_checksum(&self, facility_id: FacilityId, checksum: &str) -> Result<()> {
        let client = self.connection().await?;

        client
            .execute(
                "INSERT INTO transfer_state (facility_id, last_checksum, applied_at) \
                 VALUES ($1, $2, now()) \
                 ON CONFLICT (facility_id) \
                 DO UPDATE SET last_checksum = EXCLUDED.last_checksum, applied_at = now()",
                &[&facility_id.as_i32(), &checksum],
            )
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Checksum update failed: {}", e)))?;

        Ok(())
    }
}
