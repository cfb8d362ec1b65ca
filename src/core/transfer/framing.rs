//! Transfer frame types
//!
//! Bulk transfers between facilities travel as a framed stream: one
//! header frame, any number of record frames, and one footer frame.
//! The header names the sending facility and declares which previous
//! transfer (by checksum) this one extends; the footer carries the
//! checksum of the record frames so truncation and corruption are
//! detected before anything is applied.

use crate::domain::errors::TransferError;
use crate::domain::ids::{FacilityId, PatientId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Framing version this build writes and accepts
pub const FORMAT_VERSION: u32 = 1;

/// How a validated transfer must be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDisposition {
    /// Complete snapshot; replaces whatever the receiver holds
    Full,

    /// Extends the receiver's last applied transfer
    Incremental,
}

/// Leading frame of a transfer stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferHeader {
    /// Framing version
    pub version: u32,

    /// Sending facility
    pub facility_id: FacilityId,

    /// Sending facility's display name at send time
    pub facility_name: String,

    /// Account that produced the transfer
    pub username: String,

    /// Start of the data window; `None` for a full snapshot
    pub window_start: Option<DateTime<Utc>>,

    /// End of the data window
    pub window_end: DateTime<Utc>,

    /// Checksum of the transfer this one extends; `None` marks a full
    /// push
    pub depends_on: Option<String>,
}

impl TransferHeader {
    /// Rejects headers from an unknown framing version.
    pub fn validate_version(&self) -> Result<(), TransferError> {
        if self.version != FORMAT_VERSION {
            return Err(TransferError::UnsupportedVersion(self.version));
        }
        Ok(())
    }

    /// Decides how this transfer relates to the receiver's state.
    ///
    /// A transfer with no dependency is a full push and is always
    /// accepted. A declared dependency must match the receiver's
    /// last-applied checksum exactly; any mismatch is rejected so the
    /// receiver can request a full resync instead of applying records
    /// onto a base they were not produced against.
    pub fn disposition(
        &self,
        last_applied: Option<&str>,
    ) -> Result<TransferDisposition, TransferError> {
        match (&self.depends_on, last_applied) {
            (None, _) => Ok(TransferDisposition::Full),
            (Some(declared), Some(applied)) if declared == applied => {
                Ok(TransferDisposition::Incremental)
            }
            (Some(declared), applied) => Err(TransferError::OutOfSequence {
                expected: applied.map(str::to_string),
                found: Some(declared.clone()),
            }),
        }
    }
}

/// One payload frame: a stored copy of one kind of data for one patient
/// at the sending facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Patient at the sending facility
    pub patient_id: PatientId,

    /// Payload kind, same convention as the fallback store's type keys
    pub type_key: String,

    /// Serialized payload
    pub payload: serde_json::Value,

    /// When the sender captured this copy
    pub updated_at: DateTime<Utc>,
}

/// Trailing frame carrying the integrity checksum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFooter {
    /// Hex SHA-256 over the serialized record frames
    pub checksum: String,
}

/// A single line of the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum TransferFrame {
    Header(TransferHeader),
    Record(TransferRecord),
    Footer(TransferFooter),
}
