//! Payload typing for the fallback store
//!
//! Each storable payload declares a stable type name used as the storage
//! key. The name is part of the on-disk contract: renaming a Rust type
//! must not change it, or previously stored copies become unreachable.

use crate::domain::records::{
    RemoteAdmission, RemoteAllergy, RemoteAppointment, RemoteDocument, RemoteDocumentContent,
    RemoteDrug, RemoteForm, RemoteIssue, RemoteLabResult, RemoteMeasurement, RemoteNote,
    RemotePrevention,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A payload kind the fallback store can persist
pub trait FallbackPayload: Serialize + DeserializeOwned + Send + Sync {
    /// Stable storage key for this payload kind
    const TYPE_NAME: &'static str;
}

impl FallbackPayload for RemoteNote {
    const TYPE_NAME: &'static str = "notes";
}

impl FallbackPayload for RemotePrevention {
    const TYPE_NAME: &'static str = "preventions";
}

impl FallbackPayload for RemoteMeasurement {
    const TYPE_NAME: &'static str = "measurements";
}

impl FallbackPayload for RemoteIssue {
    const TYPE_NAME: &'static str = "issues";
}

impl FallbackPayload for RemoteDrug {
    const TYPE_NAME: &'static str = "drugs";
}

impl FallbackPayload for RemoteAdmission {
    const TYPE_NAME: &'static str = "admissions";
}

impl FallbackPayload for RemoteAppointment {
    const TYPE_NAME: &'static str = "appointments";
}

impl FallbackPayload for RemoteAllergy {
    const TYPE_NAME: &'static str = "allergies";
}

impl FallbackPayload for RemoteDocument {
    const TYPE_NAME: &'static str = "documents";
}

impl FallbackPayload for RemoteDocumentContent {
    const TYPE_NAME: &'static str = "document_contents";
}

impl FallbackPayload for RemoteLabResult {
    const TYPE_NAME: &'static str = "lab_results";
}

impl FallbackPayload for RemoteForm {
    const TYPE_NAME: &'static str = "forms";
}

/// Builds the storage key for a payload kind, appending the per-item
/// discriminator when one applies: `kind` or `kind+sub`.
pub fn type_key<T: FallbackPayload>(sub_key: Option<&str>) -> String {
    match sub_key {
        Some(sub) => format!("{}+{}", T::TYPE_NAME, sub),
        None => T::TYPE_NAME.to_string(),
    }
}
