//! Storage abstraction for the local fallback copy
//!
//! The fallback store keeps the last known remote payloads so screens
//! can still render remote data while the integrator is unreachable.
//! Adapters implement this trait; the core fallback layer decides what
//! to store and when to read it.

use crate::domain::ids::{FacilityId, PatientId};
use crate::domain::result::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// One stored payload: the last known copy of one kind of remote data
/// for one patient at one facility.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackRecord {
    /// Remote facility the payload was fetched from
    pub facility_id: FacilityId,

    /// Local patient the payload belongs to
    pub patient_id: PatientId,

    /// Payload kind, optionally with a per-item discriminator appended
    /// as `kind+item` (document contents are stored one row per
    /// document)
    pub type_key: String,

    /// Serialized payload
    pub payload: Value,

    /// Provider whose scoped fetch produced this copy, when one was
    /// acting
    pub recorded_by: Option<String>,

    /// When this copy was captured
    pub updated_at: DateTime<Utc>,
}

/// Backend for the local fallback store
///
/// Writes are last-writer-wins on the (facility, patient, type_key)
/// key: a save carrying an older `updated_at` than the stored row is
/// silently dropped.
#[async_trait]
pub trait FallbackStorage: Send + Sync {
    /// Verifies the backend is reachable.
    async fn test_connection(&self) -> Result<()>;

    /// Creates the schema if it does not exist.
    async fn initialize(&self) -> Result<()>;

    /// Inserts or replaces a record, keeping the newer copy.
    async fn save(&self, record: &FallbackRecord) -> Result<()>;

    /// The stored copy for one (facility, patient, kind), if any.
    async fn find(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        type_key: &str,
    ) -> Result<Option<FallbackRecord>>;

    /// Every stored copy of one kind, across patients and facilities.
    /// Used for reverse lookups such as "which patients have stored
    /// document contents".
    async fn find_by_type(&self, type_key: &str) -> Result<Vec<FallbackRecord>>;

    /// Removes every stored copy for one patient. Returns the number of
    /// rows removed.
    async fn delete_for_patient(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
    ) -> Result<u64>;

    /// Checksum of the last transfer applied from a facility, if any
    /// transfer has ever been applied.
    async fn transfer_checksum(&self, facility_id: FacilityId) -> Result<Option<String>>;

    /// Records the checksum of a transfer that was just applied.
    async fn set_transfer_checksum(&self, facility_id: FacilityId, checksum: &str) -> Result<()>;
}
