//! In-memory backend for the local fallback store
//!
//! Used by tests and by deployments that want fallback behavior without
//! a database; contents do not survive a restart.

use crate::adapters::storage::traits::{FallbackRecord, FallbackStorage};
use crate::domain::ids::{FacilityId, PatientId};
use crate::domain::result::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

type RecordKey = (i32, i32, String);

/// HashMap-backed fallback store
#[derive(Default)]
pub struct MemoryFallbackStorage {
    records: Mutex<HashMap<RecordKey, FallbackRecord>>,
    checksums: Mutex<HashMap<i32, String>>,
}

impl MemoryFallbackStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RecordKey, FallbackRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl FallbackStorage for MemoryFallbackStorage {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn save(&self, record: &FallbackRecord) -> Result<()> {
        let key = (
            record.facility_id.as_i32(),
            record.patient_id.as_i32(),
            record.type_key.clone(),
        );

        let mut records = self.lock();
        match records.get(&key) {
            // Last writer wins, same as the database backend
            Some(existing) if existing.updated_at > record.updated_at => {}
            _ => {
                records.insert(key, record.clone());
            }
        }

        Ok(())
    }

    async fn find(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
        type_key: &str,
    ) -> Result<Option<FallbackRecord>> {
        let key = (facility_id.as_i32(), patient_id.as_i32(), type_key.to_string());
        Ok(self.lock().get(&key).cloned())
    }

    async fn find_by_type(&self, type_key: &str) -> Result<Vec<FallbackRecord>> {
        let records = self.lock();
        let mut found: Vec<FallbackRecord> = records
            .values()
            .filter(|record| record.type_key == type_key)
            .cloned()
            .collect();

        found.sort_by_key(|record| (record.facility_id.as_i32(), record.patient_id.as_i32()));
        Ok(found)
    }

    async fn delete_for_patient(
        &self,
        facility_id: FacilityId,
        patient_id: PatientId,
    ) -> Result<u64> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|(f, p, _), _| {
            *f != facility_id.as_i32() || *p != patient_id.as_i32()
        });
        Ok((before - records.len()) as u64)
    }

    async fn transfer_checksum(&self, facility_id: FacilityId) -> Result<Option<String>> {
        let checksums = match self.checksums.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(checksums.get(&facility_id.as_i32()).cloned())
    }

    async fn set_transfer_checksum(&self, facility_id: FacilityId, checksum: &str) -> Result<()> {
        let mut checksums = match self.checksums.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        checksums.insert(facility_id.as_i32(), checksum.to_string());
        Ok(())
    }
}
