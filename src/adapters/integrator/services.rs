//! Integrator service traits
//!
//! Each remote endpoint family is modelled as a trait so the data
//! manager can be tested against in-memory fakes and so transport
//! details stay inside this adapter. All implementations must be
//! `Send + Sync`: clients are shared behind `Arc` across tasks.

use crate::domain::ids::ProviderId;
use crate::domain::keys::{AccessScope, DocumentKey, RemotePatientKey};
use crate::domain::records::{
    ConsentState, ConsentUpdate, DemographicTransfer, HnrClient, MatchingPatientScore,
    MatchingPatientParameters, ProviderMessage, ReferralRequest, RemoteAdmission, RemoteAllergy,
    RemoteAppointment, RemoteDocument, RemoteDocumentContent, RemoteDrug, RemoteFacility,
    RemoteForm, RemoteIssue, RemoteLabResult, RemoteMeasurement, RemoteNote, RemotePrevention,
    RemoteProgram, RemoteProvider,
};
use crate::domain::result::Result;
use async_trait::async_trait;

/// Facility directory service
#[async_trait]
pub trait FacilityService: Send + Sync {
    /// All facilities registered with the integrator, including this one.
    async fn all_facilities(&self) -> Result<Vec<RemoteFacility>>;
}

/// Program directory service
#[async_trait]
pub trait ProgramService: Send + Sync {
    /// All programs across all facilities.
    async fn all_programs(&self) -> Result<Vec<RemoteProgram>>;
}

/// Provider directory and messaging service
///
/// This service is non-critical: when it cannot be constructed, callers
/// degrade to empty directories instead of failing the operation that
/// needed a name lookup.
#[async_trait]
pub trait ProviderService: Send + Sync {
    /// All providers across all facilities.
    async fn all_providers(&self) -> Result<Vec<RemoteProvider>>;

    /// Unread messages addressed to a provider.
    async fn messages_for(&self, provider: &ProviderId) -> Result<Vec<ProviderMessage>>;

    /// Marks a message as read on the remote side.
    async fn acknowledge_message(&self, provider: &ProviderId, message_id: i32) -> Result<()>;
}

/// Patient data service
///
/// Every read is scoped: the remote side filters results by the
/// requesting provider's access rights before returning them, so two
/// providers can legitimately see different data for the same patient.
#[async_trait]
pub trait DemographicService: Send + Sync {
    /// Remote records linked to the scoped local patient.
    async fn linked_patients(&self, scope: &AccessScope) -> Result<Vec<RemotePatientKey>>;

    /// Records a link between the scoped local patient and a remote
    /// record.
    async fn link_patients(&self, scope: &AccessScope, remote: &RemotePatientKey) -> Result<()>;

    /// Demographic details of one linked remote record.
    async fn demographic(
        &self,
        scope: &AccessScope,
        remote: &RemotePatientKey,
    ) -> Result<DemographicTransfer>;

    /// Pushes the local patient's demographics to the integrator.
    async fn push_demographic(
        &self,
        scope: &AccessScope,
        transfer: &DemographicTransfer,
    ) -> Result<()>;

    /// Candidate matches for a patient across all facilities.
    async fn matching_patients(
        &self,
        provider: &ProviderId,
        parameters: &MatchingPatientParameters,
    ) -> Result<Vec<DemographicTransfer>>;

    async fn notes(&self, scope: &AccessScope) -> Result<Vec<RemoteNote>>;
    async fn preventions(&self, scope: &AccessScope) -> Result<Vec<RemotePrevention>>;
    async fn measurements(&self, scope: &AccessScope) -> Result<Vec<RemoteMeasurement>>;
    async fn issues(&self, scope: &AccessScope) -> Result<Vec<RemoteIssue>>;
    async fn drugs(&self, scope: &AccessScope) -> Result<Vec<RemoteDrug>>;
    async fn admissions(&self, scope: &AccessScope) -> Result<Vec<RemoteAdmission>>;
    async fn appointments(&self, scope: &AccessScope) -> Result<Vec<RemoteAppointment>>;
    async fn allergies(&self, scope: &AccessScope) -> Result<Vec<RemoteAllergy>>;

    /// Document headers only; contents are fetched one at a time.
    async fn documents(&self, scope: &AccessScope) -> Result<Vec<RemoteDocument>>;

    /// Full contents of a single document.
    async fn document_content(
        &self,
        scope: &AccessScope,
        document: &DocumentKey,
    ) -> Result<RemoteDocumentContent>;

    async fn lab_results(&self, scope: &AccessScope) -> Result<Vec<RemoteLabResult>>;

    /// Snapshots of one structured form table.
    async fn forms(&self, scope: &AccessScope, form_name: &str) -> Result<Vec<RemoteForm>>;

    /// Current consent state for the scoped patient, if any has been
    /// recorded.
    async fn consent(&self, scope: &AccessScope) -> Result<Option<ConsentState>>;

    /// Pushes a consent decision to the integrator.
    async fn push_consent(&self, update: &ConsentUpdate) -> Result<()>;
}

/// Cross-facility referral service
#[async_trait]
pub trait ReferralService: Send + Sync {
    /// Sends a referral to a program at another facility.
    async fn push_referral(&self, referral: &ReferralRequest) -> Result<()>;
}

/// Health network registry service
#[async_trait]
pub trait HnrService: Send + Sync {
    /// Scored candidate matches in the registry.
    async fn match_clients(
        &self,
        parameters: &MatchingPatientParameters,
    ) -> Result<Vec<MatchingPatientScore>>;

    /// Fetches one registry record by linking id. Returns `None` when
    /// the id is unknown.
    async fn get_client(&self, linking_id: i32) -> Result<Option<HnrClient>>;

    /// Creates or updates a registry record and returns its linking id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::DuplicateIdentifier`] when the health
    /// number already belongs to a different registry record, and
    /// [`RemoteError::InvalidIdentifier`] when the registry rejects the
    /// health number itself.
    ///
    /// [`RemoteError::DuplicateIdentifier`]: crate::domain::errors::RemoteError::DuplicateIdentifier
    /// [`RemoteError::InvalidIdentifier`]: crate::domain::errors::RemoteError::InvalidIdentifier
    async fn set_client(&self, client: &HnrClient) -> Result<i32>;
}
