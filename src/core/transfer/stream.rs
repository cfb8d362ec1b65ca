//! Transfer stream writer and reader
//!
//! Frames are JSON lines over any `Write`/`BufRead`. The writer hashes
//! every serialized record frame into a running SHA-256 and seals it
//! into the footer; the reader re-hashes the record lines it receives
//! and refuses to hand records back unless the footer matches. Nothing
//! is applied from a stream that fails version, dependency, or checksum
//! validation.

use crate::core::transfer::framing::{
    TransferDisposition, TransferFooter, TransferFrame, TransferHeader, TransferRecord,
};
use crate::domain::errors::{MeridianError, TransferError};
use crate::domain::result::Result;
use sha2::{Digest, Sha256};
use std::io::{BufRead, Write};

/// Writes a framed transfer stream
pub struct TransferWriter<W: Write> {
    out: W,
    hasher: Sha256,
    records: u64,
}

impl<W: Write> TransferWriter<W> {
    /// Starts a stream by writing the header frame.
    pub fn new(mut out: W, header: TransferHeader) -> Result<Self> {
        header.validate_version()?;

        let line = serde_json::to_string(&TransferFrame::Header(header))?;
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;

        Ok(Self {
            out,
            hasher: Sha256::new(),
            records: 0,
        })
    }

    /// Appends one record frame.
    pub fn write_record(&mut self, record: TransferRecord) -> Result<()> {
        let line = serde_json::to_string(&TransferFrame::Record(record))?;

        self.hasher.update(line.as_bytes());
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.records += 1;

        Ok(())
    }

    /// Seals the stream with the footer frame and returns the checksum
    /// it carried.
    pub fn finish(mut self) -> Result<String> {
        let checksum = format!("{:x}", self.hasher.finalize());

        let line = serde_json::to_string(&TransferFrame::Footer(TransferFooter {
            checksum: checksum.clone(),
        }))?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;

        tracing::debug!(records = self.records, checksum = %checksum, "Transfer stream sealed");

        Ok(checksum)
    }
}

/// A fully validated transfer, ready to apply
#[derive(Debug)]
pub struct Transfer {
    pub header: TransferHeader,
    pub disposition: TransferDisposition,
    pub records: Vec<TransferRecord>,

    /// Footer checksum, recorded as the receiver's new last-applied
    /// checksum once the records are applied
    pub checksum: String,
}

/// Reads and validates a complete transfer stream.
///
/// `last_applied` is the receiver's last-applied checksum for the
/// sending facility, used to validate the header's dependency.
///
/// # Errors
///
/// Returns a [`TransferError`] when the stream has an unsupported
/// version, an out-of-sequence dependency, a checksum mismatch, a
/// malformed frame, or ends before the footer.
pub fn read_transfer<R: BufRead>(reader: R, last_applied: Option<&str>) -> Result<Transfer> {
    let mut lines = reader.lines();

    let header_line = match lines.next() {
        Some(line) => line?,
        None => return Err(TransferError::Truncated.into()),
    };

    let header = match parse_frame(&header_line)? {
        TransferFrame::Header(header) => header,
        _ => {
            return Err(
                TransferError::MalformedFrame("stream does not start with a header".to_string())
                    .into(),
            )
        }
    };

    header.validate_version()?;
    let disposition = header.disposition(last_applied)?;

    let mut hasher = Sha256::new();
    let mut records = Vec::new();

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_frame(&line)? {
            TransferFrame::Record(record) => {
                hasher.update(line.as_bytes());
                records.push(record);
            }
            TransferFrame::Footer(footer) => {
                let computed = format!("{:x}", hasher.finalize());
                if computed != footer.checksum {
                    return Err(TransferError::ChecksumMismatch {
                        expected: footer.checksum,
                        computed,
                    }
                    .into());
                }

                tracing::debug!(
                    facility_id = %header.facility_id,
                    records = records.len(),
                    ?disposition,
                    "Transfer stream validated"
                );

                return Ok(Transfer {
                    header,
                    disposition,
                    records,
                    checksum: footer.checksum,
                });
            }
            TransferFrame::Header(_) => {
                return Err(
                    TransferError::MalformedFrame("unexpected second header".to_string()).into(),
                )
            }
        }
    }

    Err(TransferError::Truncated.into())
}

fn parse_frame(line: &str) -> Result<TransferFrame> {
    serde_json::from_str(line)
        .map_err(|e| MeridianError::from(TransferError::MalformedFrame(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transfer::framing::FORMAT_VERSION;
    use crate::domain::ids::{FacilityId, PatientId};
    use chrono::Utc;
    use serde_json::json;

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

    fn record(patient: i32, kind: &str) -> TransferRecord {
        TransferRecord {
            patient_id: PatientId(patient),
            type_key: kind.to_string(),
            payload: json!([{"kind": kind}]),
            updated_at: Utc::now(),
        }
    }

    fn write_stream(depends_on: Option<&str>, records: Vec<TransferRecord>) -> (Vec<u8>, String) {
        let mut buffer = Vec::new();
        let mut writer = TransferWriter::new(&mut buffer, header(depends_on)).unwrap();
        for r in records {
            writer.write_record(r).unwrap();
        }
        let checksum = writer.finish().unwrap();
        (buffer, checksum)
    }

    #[test]
    fn test_roundtrip_full_push() {
        let (bytes, checksum) =
            write_stream(None, vec![record(500, "notes"), record(501, "drugs")]);

        let transfer = read_transfer(bytes.as_slice(), None).unwrap();

        assert_eq!(transfer.disposition, TransferDisposition::Full);
        assert_eq!(transfer.records.len(), 2);
        assert_eq!(transfer.checksum, checksum);
        assert_eq!(transfer.records[0].patient_id, PatientId(500));
    }

    #[test]
    fn test_incremental_requires_matching_dependency() {
        let (bytes, _) = write_stream(Some("abc"), vec![record(500, "notes")]);

        let transfer = read_transfer(bytes.as_slice(), Some("abc")).unwrap();
        assert_eq!(transfer.disposition, TransferDisposition::Incremental);
    }

    #[test]
    fn test_dependency_mismatch_rejected_before_records() {
        let (bytes, _) = write_stream(Some("abc"), vec![record(500, "notes")]);

        let err = read_transfer(bytes.as_slice(), Some("different")).unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Transfer(TransferError::OutOfSequence { .. })
        ));
    }

    #[test]
    fn test_tampered_record_fails_checksum() {
        let (bytes, _) = write_stream(None, vec![record(500, "notes")]);

        let text = String::from_utf8(bytes).unwrap();
        let tampered = text.replace("\"notes\"", "\"drugs\"");

        let err = read_transfer(tampered.as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Transfer(TransferError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let (bytes, _) = write_stream(None, vec![record(500, "notes")]);

        let text = String::from_utf8(bytes).unwrap();
        let without_footer: String = text
            .lines()
            .filter(|line| !line.contains("\"footer\""))
            .map(|line| format!("{line}\n"))
            .collect();

        let err = read_transfer(without_footer.as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Transfer(TransferError::Truncated)
        ));
    }

    #[test]
    fn test_garbage_line_is_malformed_frame() {
        let err = read_transfer("not json\n".as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Transfer(TransferError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_empty_stream_is_truncated() {
        let err = read_transfer("".as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Transfer(TransferError::Truncated)
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut bad_header = header(None);
        bad_header.version = 99;

        let mut buffer = Vec::new();
        // Writer refuses to start a stream it could not read back
        assert!(TransferWriter::new(&mut buffer, bad_header).is_err());
    }
}
