//! Applying validated transfers to the local store

use crate::adapters::storage::FallbackRecord;
use crate::core::fallback::LocalFallbackStore;
use crate::core::transfer::framing::{TransferDisposition, TransferFrame};
use crate::core::transfer::stream::read_transfer;
use crate::domain::errors::{MeridianError, TransferError};
use crate::domain::result::Result;
use std::io::{BufRead, Cursor};

/// Summary of an applied transfer
#[derive(Debug)]
pub struct AppliedTransfer {
    pub facility_id: crate::domain::ids::FacilityId,
    pub disposition: TransferDisposition,
    pub records_applied: usize,
}

/// Reads, validates, and applies a transfer stream into the fallback
/// store, then records its checksum as the new last-applied state for
/// the sending facility.
///
/// Nothing is written unless the whole stream validates; a stream that
/// fails version, dependency, or checksum validation leaves the store
/// untouched.
pub async fn apply_transfer<R: BufRead>(
    store: &LocalFallbackStore,
    mut reader: R,
) -> Result<AppliedTransfer> {
    // The dependency check needs the sender's identity from the header,
    // so buffer the stream and peek at its first line before the full
    // validating read.
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;

    let first_line = contents
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(TransferError::Truncated)?;

    let facility_id = match serde_json::from_str::<TransferFrame>(first_line) {
        Ok(TransferFrame::Header(header)) => header.facility_id,
        Ok(_) => {
            return Err(MeridianError::from(TransferError::MalformedFrame(
                "stream does not start with a header".to_string(),
            )))
        }
        Err(e) => return Err(TransferError::MalformedFrame(e.to_string()).into()),
    };

    let last_applied = store.transfer_checksum(facility_id).await?;
    let transfer = read_transfer(Cursor::new(&contents), last_applied.as_deref())?;

    let records_applied = transfer.records.len();
    for record in transfer.records {
        store_record(store, facility_id, record).await?;
    }

    store
        .set_transfer_checksum(facility_id, &transfer.checksum)
        .await?;

    tracing::info!(
        facility_id = %facility_id,
        records = records_applied,
        disposition = ?transfer.disposition,
        "Transfer applied"
    );

    Ok(AppliedTransfer {
        facility_id,
        disposition: transfer.disposition,
        records_applied,
    })
}

async fn store_record(
    store: &LocalFallbackStore,
    facility_id: crate::domain::ids::FacilityId,
    record: crate::core::transfer::framing::TransferRecord,
) -> Result<()> {
    match store.storage() {
        Some(storage) => {
            storage
                .save(&FallbackRecord {
                    facility_id,
                    patient_id: record.patient_id,
                    type_key: record.type_key,
                    payload: record.payload,
                    recorded_by: None,
                    updated_at: record.updated_at,
                })
                .await
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryFallbackStorage;
    use crate::core::transfer::framing::{TransferHeader, TransferRecord, FORMAT_VERSION};
    use crate::core::transfer::stream::TransferWriter;
    use crate::domain::ids::{FacilityId, PatientId};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    fn header(depends_on: Option<&str>) -> TransferHeader {
        TransferHeader {
            version: FORMAT_VERSION,
            facility_id: FacilityId(3),
            facility_name: "Riverside Clinic".to_string(),
            username: "facility-3".to_string(),
            window_start: None,
            window_end: Utc::now(),
            depends_on: depends_on.map(str::to_string),
        }
    }

    fn stream(depends_on: Option<&str>) -> (Vec<u8>, String) {
        let mut buffer = Vec::new();
        let mut writer = TransferWriter::new(&mut buffer, header(depends_on)).unwrap();
        writer
            .write_record(TransferRecord {
                patient_id: PatientId(500),
                type_key: "notes".to_string(),
                payload: json!([{"note": "transferred"}]),
                updated_at: Utc::now(),
            })
            .unwrap();
        let checksum = writer.finish().unwrap();
        (buffer, checksum)
    }

    fn store() -> LocalFallbackStore {
        LocalFallbackStore::new(Arc::new(MemoryFallbackStorage::new()))
    }

    #[tokio::test]
    async fn test_full_push_applied_and_checksum_recorded() {
        let store = store();
        let (bytes, checksum) = stream(None);

        let applied = apply_transfer(&store, bytes.as_slice()).await.unwrap();
        assert_eq!(applied.disposition, TransferDisposition::Full);
        assert_eq!(applied.records_applied, 1);

        assert_eq!(
            store.transfer_checksum(FacilityId(3)).await.unwrap(),
            Some(checksum)
        );
    }

    #[tokio::test]
    async fn test_incremental_chain() {
        let store = store();

        let (full, full_checksum) = stream(None);
        apply_transfer(&store, full.as_slice()).await.unwrap();

        let (incremental, _) = stream(Some(&full_checksum));
        let applied = apply_transfer(&store, incremental.as_slice())
            .await
            .unwrap();
        assert_eq!(applied.disposition, TransferDisposition::Incremental);
    }

    #[tokio::test]
    async fn test_out_of_sequence_leaves_store_untouched() {
        let store = store();

        let (bytes, _) = stream(Some("not-the-applied-checksum"));
        let err = apply_transfer(&store, bytes.as_slice()).await.unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Transfer(TransferError::OutOfSequence { .. })
        ));

        // No checksum recorded, no records written
        assert!(store
            .transfer_checksum(FacilityId(3))
            .await
            .unwrap()
            .is_none());
    }
}
