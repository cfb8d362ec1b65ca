//! Remote record models
//!
//! Projections of data held by remote facilities, as returned by the
//! integrator services. These are wire models: plain serde structs with
//! no behavior beyond construction helpers. All clinical payload types
//! here are candidates for the segmented cache and the local fallback
//! store.

use crate::domain::ids::{FacilityId, PatientId, ProviderId};
use crate::domain::keys::{DocumentKey, ProgramKey, RemotePatientKey, RemoteProviderKey};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A facility as seen through the integrator
///
/// Created on cache refresh, immutable once cached, expires with the
/// cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFacility {
    /// Integrator-assigned facility id
    pub integrator_facility_id: FacilityId,

    /// Facility display name
    pub name: String,

    /// Timestamp of the facility's last data push into the integrator,
    /// if it has ever pushed
    pub last_data_update: Option<DateTime<Utc>>,
}

/// A program offered by a remote facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProgram {
    /// Composite key (facility, program id)
    pub key: ProgramKey,

    /// Program name
    pub name: String,

    /// Program type (e.g. "bed", "service", "community")
    pub program_type: String,

    /// Whether the program accepts referrals from other facilities
    pub allows_integrated_referrals: bool,
}

/// A provider (clinician) at a remote facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProvider {
    /// Composite key (facility, provider number)
    pub key: RemoteProviderKey,

    pub first_name: String,
    pub last_name: String,
}

/// Patient gender as transferred by the integrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    M,
    F,
    T,
    O,
    U,
}

/// A patient demographic record transferred from a remote facility
///
/// All fields other than the names are optional; receivers copy only the
/// fields that are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicTransfer {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,

    /// Health identification number
    pub hin: Option<String>,
    pub hin_type: Option<String>,
    pub hin_version: Option<String>,
    pub hin_valid_start: Option<NaiveDate>,
    pub hin_valid_end: Option<NaiveDate>,

    pub street_address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub sin: Option<String>,
}

impl Default for Gender {
    fn default() -> Self {
        Gender::U
    }
}

/// Parameters for matching a patient across facilities or against the
/// health network registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingPatientParameters {
    pub hin: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// A scored candidate match returned by the health network registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPatientScore {
    /// Registry linking id of the candidate
    pub linking_id: i32,

    /// Match confidence score, higher is better
    pub score: f64,

    pub transfer: DemographicTransfer,
}

/// A patient record held by the health network registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnrClient {
    /// Registry linking id, absent for a record not yet registered
    pub linking_id: Option<i32>,

    pub transfer: DemographicTransfer,
}

/// Consent status for sharing a patient's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    Given,
    Revoked,
    Deferred,
    None,
}

/// Per-facility share decision within a consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityConsentPair {
    pub remote_facility_id: FacilityId,
    pub share_data: bool,
}

/// Consent state read from the integrator for one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentState {
    pub patient_key: RemotePatientKey,
    pub status: ConsentStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Consent update pushed to the integrator
///
/// Only consents with status `Given` or `Revoked` are transmitted;
/// `expiry` is set only when the consent is revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentUpdate {
    pub patient_id: PatientId,
    pub status: ConsentStatus,
    pub created_at: DateTime<Utc>,
    pub expiry: Option<DateTime<Utc>>,
    pub exclude_mental_health_data: bool,
    pub recorded_by: Option<ProviderId>,
    pub share_data: Vec<FacilityConsentPair>,
}

/// A message sent between providers through the integrator
///
/// Unlike other integrated records, provider messages are meant to be
/// acknowledged and saved into the receiving facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub id: i32,
    pub source_provider: RemoteProviderKey,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub active: bool,
}

/// A referral pushed to a program at another facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralRequest {
    pub patient_id: PatientId,
    pub destination_program: ProgramKey,
    pub referring_provider: Option<ProviderId>,
    pub reason: String,
    pub sent_at: DateTime<Utc>,
}

// --- Clinical payload types ---------------------------------------------
//
// Each of these is returned as a list by the demographic service and can
// be persisted into the local fallback store. Fields are the subset the
// UI layers actually render.

/// Composite key of a remote clinical note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteKey {
    pub facility_id: FacilityId,
    pub note_id: String,
}

/// A clinical note from a linked remote record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteNote {
    pub key: NoteKey,
    pub observation_date: DateTime<Utc>,
    pub update_date: DateTime<Utc>,
    pub signing_provider: Option<RemoteProviderKey>,
    pub role: Option<String>,
    pub note: String,
}

/// A prevention (immunization or screening) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePrevention {
    pub facility_id: FacilityId,
    pub prevention_type: String,
    pub prevention_date: DateTime<Utc>,
    pub refused: bool,
    pub next_date: Option<DateTime<Utc>>,
}

/// A clinical measurement (vital sign, lab-adjacent observation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMeasurement {
    pub facility_id: FacilityId,
    pub measurement_type: String,
    pub data_field: String,
    pub measuring_instruction: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// A coded clinical issue attached to a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub facility_id: FacilityId,
    pub code: String,
    pub code_system: String,
    pub description: String,
    pub acute: bool,
    pub certain: bool,
}

/// A medication record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDrug {
    pub facility_id: FacilityId,
    pub drug_name: String,
    pub regional_identifier: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub archived: bool,
}

/// An admission to a program at a remote facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAdmission {
    pub facility_id: FacilityId,
    pub program_key: ProgramKey,
    pub admission_date: DateTime<Utc>,
    pub discharge_date: Option<DateTime<Utc>>,
    pub admission_notes: Option<String>,
}

/// An appointment at a remote facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAppointment {
    pub facility_id: FacilityId,
    pub appointment_date: DateTime<Utc>,
    pub status: String,
    pub reason: Option<String>,
}

/// An allergy record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAllergy {
    pub facility_id: FacilityId,
    pub description: String,
    pub reaction: Option<String>,
    pub severity: Option<String>,
    pub entry_date: DateTime<Utc>,
}

/// Document metadata (header)
///
/// Contents are stored and fetched separately so that listing a patient's
/// documents does not load every document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub key: DocumentKey,
    pub description: String,
    pub content_type: String,
    pub observation_date: Option<NaiveDate>,
    pub update_date: DateTime<Utc>,
}

/// Full document contents, keyed by the document's composite key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocumentContent {
    pub key: DocumentKey,
    pub content_type: String,

    /// Base64-encoded document body
    pub contents: String,
}

/// A lab result record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLabResult {
    pub facility_id: FacilityId,
    pub lab_type: String,

    /// Raw result payload in the source lab format
    pub data: String,
    pub collected_at: Option<DateTime<Utc>>,
}

/// A structured clinical form snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteForm {
    pub facility_id: FacilityId,

    /// Form table name (e.g. "formLabReq07")
    pub form_name: String,
    pub edit_date: DateTime<Utc>,

    /// Flattened form fields
    pub data: serde_json::Value,
}

impl DemographicTransfer {
    /// Copies every present (non-`None`) field of `self` onto `target`,
    /// leaving absent fields of the target untouched. Names are always
    /// copied. Used when refreshing a local patient record from a remote
    /// entry without erasing locally-known values.
    pub fn copy_onto(&self, target: &mut DemographicTransfer) {
        target.first_name = self.first_name.clone();
        target.last_name = self.last_name.clone();

        if self.birth_date.is_some() {
            target.birth_date = self.birth_date;
        }
        if self.gender.is_some() {
            target.gender = self.gender;
        }
        if let Some(ref hin) = self.hin {
            target.hin = Some(hin.clone());
        }
        if let Some(ref hin_type) = self.hin_type {
            target.hin_type = Some(hin_type.clone());
        }
        if let Some(ref hin_version) = self.hin_version {
            target.hin_version = Some(hin_version.clone());
        }
        if self.hin_valid_start.is_some() {
            target.hin_valid_start = self.hin_valid_start;
        }
        if self.hin_valid_end.is_some() {
            target.hin_valid_end = self.hin_valid_end;
        }
        if let Some(ref address) = self.street_address {
            target.street_address = Some(address.clone());
        }
        if let Some(ref city) = self.city {
            target.city = Some(city.clone());
        }
        if let Some(ref province) = self.province {
            target.province = Some(province.clone());
        }
        if let Some(ref phone) = self.phone1 {
            target.phone1 = Some(phone.clone());
        }
        if let Some(ref phone) = self.phone2 {
            target.phone2 = Some(phone.clone());
        }
        if let Some(ref sin) = self.sin {
            target.sin = Some(sin.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_facility_serde_roundtrip() {
        let facility = RemoteFacility {
            integrator_facility_id: FacilityId(3),
            name: "Riverside Clinic".to_string(),
            last_data_update: Some(Utc::now()),
        };

        let json = serde_json::to_string(&facility).unwrap();
        let back: RemoteFacility = serde_json::from_str(&json).unwrap();
        assert_eq!(facility, back);
    }

    #[test]
    fn test_copy_onto_preserves_absent_fields() {
        let mut target = DemographicTransfer {
            first_name: "Old".to_string(),
            last_name: "Name".to_string(),
            city: Some("Hamilton".to_string()),
            ..Default::default()
        };

        let source = DemographicTransfer {
            first_name: "New".to_string(),
            last_name: "Name".to_string(),
            hin: Some("1234567890".to_string()),
            ..Default::default()
        };

        source.copy_onto(&mut target);

        assert_eq!(target.first_name, "New");
        assert_eq!(target.hin.as_deref(), Some("1234567890"));
        // absent in source, untouched on target
        assert_eq!(target.city.as_deref(), Some("Hamilton"));
    }

    #[test]
    fn test_consent_status_serde_names() {
        let json = serde_json::to_string(&ConsentStatus::Given).unwrap();
        assert_eq!(json, "\"GIVEN\"");
        let back: ConsentStatus = serde_json::from_str("\"REVOKED\"").unwrap();
        assert_eq!(back, ConsentStatus::Revoked);
    }

    #[test]
    fn test_note_key_hash_equality() {
        use std::collections::HashSet;

        let a = NoteKey {
            facility_id: FacilityId(1),
            note_id: "n-17".to_string(),
        };
        let b = a.clone();

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
