//! Typed access to the local fallback copy
//!
//! `LocalFallbackStore` sits between callers and the storage backend:
//! it serializes typed payload lists to JSON on the way in and back out,
//! applies the type-key convention, and enforces the fallback-path error
//! policy. Reads never fail: a disabled store, a missing row, a backend
//! error, or a corrupt payload all surface as absent data, because the
//! fallback path is consulted by callers who are already handling a
//! primary-path failure.

use crate::adapters::storage::{FallbackRecord, FallbackStorage};
use crate::core::fallback::payload::{type_key, FallbackPayload};
use crate::domain::ids::{FacilityId, PatientId, ProviderId};
use crate::domain::keys::DocumentKey;
use crate::domain::result::Result;
use chrono::Utc;
use std::sync::Arc;

/// Local store of last-known remote payloads
pub struct LocalFallbackStore {
    storage: Option<Arc<dyn FallbackStorage>>,
}

impl LocalFallbackStore {
    /// Creates a store over a backend.
    pub fn new(storage: Arc<dyn FallbackStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Creates a disabled store: saves are dropped and reads return
    /// nothing. Used when the fallback feature is switched off.
    pub fn disabled() -> Self {
        Self { storage: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.storage.is_some()
    }

    async fn save_record(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        key: String,
        payload: serde_json::Value,
        recorded_by: Option<&ProviderId>,
    ) -> Result<()> {
        let storage = match self.storage {
            Some(ref storage) => storage,
            None => {
                tracing::debug!(type_key = %key, "Fallback store disabled, dropping save");
                return Ok(());
            }
        };

        let record = FallbackRecord {
            facility_id,
            patient_id,
            type_key: key,
            payload,
            recorded_by: recorded_by.map(|p| p.as_str().to_string()),
            updated_at: Utc::now(),
        };

        storage.save(&record).await
    }

    /// Persists a list of payloads for one (facility, patient).
    ///
    /// An empty list is a strict no-op: it neither writes nor disturbs a
    /// previously stored copy, since an empty result usually means a
    /// degraded fetch rather than genuinely empty data.
    pub async fn save<T: FallbackPayload>(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        items: &[T],
        recorded_by: Option<&ProviderId>,
    ) -> Result<()> {
        self.save_with_sub_key(facility_id, patient_id, items, recorded_by, None)
            .await
    }

    /// Sub-keyed variant of [`save`](Self::save), for payload kinds
    /// stored per item (document contents).
    pub async fn save_with_sub_key<T: FallbackPayload>(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        items: &[T],
        recorded_by: Option<&ProviderId>,
        sub_key: Option<&str>,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let payload = serde_json::to_value(items)?;
        self.save_record(
            facility_id,
            patient_id,
            type_key::<T>(sub_key),
            payload,
            recorded_by,
        )
        .await
    }

    async fn load_record(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        key: &str,
    ) -> Option<FallbackRecord> {
        let storage = self.storage.as_ref()?;

        match storage.find(facility_id, patient_id, key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    facility_id = %facility_id,
                    patient_id = %patient_id,
                    type_key = %key,
                    error = %e,
                    "Fallback lookup failed, treating as absent"
                );
                None
            }
        }
    }

    fn decode<T: FallbackPayload>(record: FallbackRecord) -> Option<Vec<T>> {
        match serde_json::from_value(record.payload) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!(
                    type_key = %record.type_key,
                    patient_id = %record.patient_id,
                    error = %e,
                    "Stored fallback payload could not be deserialized, treating as absent"
                );
                None
            }
        }
    }

    /// The stored copy of one payload kind, if present and readable.
    pub async fn get<T: FallbackPayload>(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
    ) -> Option<Vec<T>> {
        self.get_with_sub_key(facility_id, patient_id, None).await
    }

    /// Sub-keyed variant of [`get`](Self::get).
    pub async fn get_with_sub_key<T: FallbackPayload>(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        sub_key: Option<&str>,
    ) -> Option<Vec<T>> {
        let key = type_key::<T>(sub_key);
        let record = self.load_record(facility_id, patient_id, &key).await?;
        Self::decode(record)
    }

    /// Which patient a stored document's contents belong to, found
    /// through the type index without knowing the patient up front.
    pub async fn patient_for_document(
        &self,
        document: &DocumentKey,
    ) -> Option<(FacilityId, PatientId)> {
        let storage = self.storage.as_ref()?;
        let key = type_key::<crate::domain::records::RemoteDocumentContent>(Some(
            &document.to_string(),
        ));

        match storage.find_by_type(&key).await {
            Ok(records) => records
                .first()
                .map(|record| (record.facility_id, record.patient_id)),
            Err(e) => {
                tracing::warn!(document = %document, error = %e, "Document reverse lookup failed");
                None
            }
        }
    }

    /// Every (facility, patient) that has a stored copy of one payload
    /// kind.
    pub async fn patients_with<T: FallbackPayload>(&self) -> Vec<(FacilityId, PatientId)> {
        let storage = match self.storage {
            Some(ref storage) => storage,
            None => return Vec::new(),
        };

        match storage.find_by_type(T::TYPE_NAME).await {
            Ok(records) => records
                .into_iter()
                .map(|record| (record.facility_id, record.patient_id))
                .collect(),
            Err(e) => {
                tracing::warn!(type_key = T::TYPE_NAME, error = %e, "Type lookup failed");
                Vec::new()
            }
        }
    }

    /// Removes every stored copy for one patient, e.g. after an unlink.
    pub async fn forget_patient(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
    ) -> Result<u64> {
        match self.storage {
            Some(ref storage) => storage.delete_for_patient(facility_id, patient_id).await,
            None => Ok(0),
        }
    }

    /// Checksum of the last transfer applied from a facility.
    pub async fn transfer_checksum(&self, facility_id: FacilityId) -> Result<Option<String>> {
        match self.storage {
            Some(ref storage) => storage.transfer_checksum(facility_id).await,
            None => Ok(None),
        }
    }

    /// Records the checksum of a transfer that was just applied.
    pub async fn set_transfer_checksum(
        &self,
        facility_id: FacilityId,
        checksum: &str,
    ) -> Result<()> {
        match self.storage {
            Some(ref storage) => storage.set_transfer_checksum(facility_id, checksum).await,
            None => Ok(()),
        }
    }

    pub(crate) fn storage(&self) -> Option<&Arc<dyn FallbackStorage>> {
        self.storage.as_ref()
    }
}
