//! Cache-first orchestration of integrator reads and writes
//!
//! `RemoteDataManager` is the single entry point the rest of the
//! application uses to talk to the integrator. It layers the basic and
//! segmented caches in front of the service clients, reports every
//! remote outcome to the shared offline flag, and keeps access-scoping
//! rules in one place.
//!
//! Caches are populated only after a remote call returns; no cache lock
//! is ever held across I/O.

use crate::adapters::integrator::{
    DemographicService, FacilityService, HnrService, ProgramService, ProviderService,
    RemoteServiceFactory,
};
use crate::cache::{BasicDataCache, SegmentedAccessCache};
use crate::config::{CacheConfig, IntegratorConfig};
use crate::core::offline::OfflineFlag;
use crate::domain::ids::{FacilityId, ProviderId};
use crate::domain::keys::{AccessScope, ProgramKey, RemotePatientKey, RemoteProviderKey};
use crate::domain::records::{
    ConsentState, ConsentStatus, ConsentUpdate, DemographicTransfer, HnrClient,
    MatchingPatientParameters, MatchingPatientScore, NoteKey, ProviderMessage, RemoteFacility,
    RemoteMeasurement, RemoteNote, RemotePrevention, RemoteProgram, RemoteProvider,
};
use crate::domain::result::Result;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Program type that never receives cross-facility referrals
const NON_REFERRABLE_PROGRAM_TYPE: &str = "community";

/// Header fields of a clinical note, without the note body
#[derive(Debug, Clone, PartialEq)]
pub struct NoteMetadata {
    pub key: NoteKey,
    pub observation_date: chrono::DateTime<Utc>,
    pub update_date: chrono::DateTime<Utc>,
    pub signing_provider: Option<RemoteProviderKey>,
    pub role: Option<String>,
}

/// True only when integration is up and this facility participates in
/// integrated referrals.
pub fn integrated_referrals_enabled(config: &IntegratorConfig) -> bool {
    config.enabled && config.integrated_referrals_enabled
}

/// Cache-first facade over the integrator services
pub struct RemoteDataManager {
    facilities: Arc<dyn FacilityService>,
    programs: Arc<dyn ProgramService>,

    /// Absent when the optional provider service could not be built;
    /// directory lookups then degrade to empty.
    providers: Option<Arc<dyn ProviderService>>,

    demographics: Arc<dyn DemographicService>,
    hnr: Arc<dyn HnrService>,

    current_facility: FacilityId,
    basic_cache: BasicDataCache,
    segmented_cache: SegmentedAccessCache,
    offline: OfflineFlag,
}

impl RemoteDataManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        facilities: Arc<dyn FacilityService>,
        programs: Arc<dyn ProgramService>,
        providers: Option<Arc<dyn ProviderService>>,
        demographics: Arc<dyn DemographicService>,
        hnr: Arc<dyn HnrService>,
        cache_config: &CacheConfig,
        current_facility: FacilityId,
        offline: OfflineFlag,
    ) -> Self {
        Self {
            facilities,
            programs,
            providers,
            demographics,
            hnr,
            current_facility,
            basic_cache: BasicDataCache::new(cache_config),
            segmented_cache: SegmentedAccessCache::new(cache_config),
            offline,
        }
    }

    /// Builds the manager from a service factory, degrading gracefully
    /// when the optional provider service is unavailable.
    pub fn from_factory(
        factory: &RemoteServiceFactory,
        cache_config: &CacheConfig,
        current_facility: FacilityId,
        offline: OfflineFlag,
    ) -> Self {
        let providers = match factory.provider_service() {
            Ok(service) => Some(service),
            Err(e) => {
                tracing::warn!(
                    service = e.service,
                    reason = %e.reason,
                    "Optional service unavailable; provider lookups degrade to empty"
                );
                None
            }
        };

        Self::new(
            factory.facility_service(),
            factory.program_service(),
            providers,
            factory.demographic_service(),
            factory.hnr_service(),
            cache_config,
            current_facility,
            offline,
        )
    }

    /// Shared offline state, for screens that branch to the fallback copy.
    pub fn offline_flag(&self) -> &OfflineFlag {
        &self.offline
    }

    /// Records the outcome of a remote call on the offline flag.
    fn track<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.offline.mark_online();
                Ok(value)
            }
            Err(e) => {
                self.offline.note_error(&e);
                Err(e)
            }
        }
    }

    // --- Facilities -----------------------------------------------------

    /// The full facility directory, cached.
    pub async fn remote_facilities(&self) -> Result<Arc<Vec<RemoteFacility>>> {
        if let Some(cached) = self.basic_cache.facilities() {
            return Ok(cached);
        }

        let fetched = self.track(self.facilities.all_facilities().await)?;
        let list = Arc::new(fetched);
        self.basic_cache.set_facilities(Arc::clone(&list));
        Ok(list)
    }

    /// Every facility except this one; the usual directory for screens
    /// that pick a remote facility to pull from.
    pub async fn remote_facilities_excluding_current(&self) -> Result<Vec<RemoteFacility>> {
        let all = self.remote_facilities().await?;
        Ok(all
            .iter()
            .filter(|f| f.integrator_facility_id != self.current_facility)
            .cloned()
            .collect())
    }

    /// One facility by id, from the cached directory.
    pub async fn remote_facility(&self, id: FacilityId) -> Result<Option<RemoteFacility>> {
        let all = self.remote_facilities().await?;
        Ok(all
            .iter()
            .find(|f| f.integrator_facility_id == id)
            .cloned())
    }

    /// This facility's own integrator record.
    ///
    /// Never served from cache: this is the identity used to decide
    /// whether local data is stale, so it must reflect the integrator's
    /// current view.
    pub async fn current_remote_facility(&self) -> Result<Option<RemoteFacility>> {
        let fetched = self.track(self.facilities.all_facilities().await)?;
        Ok(fetched
            .into_iter()
            .find(|f| f.integrator_facility_id == self.current_facility))
    }

    /// Facilities that pushed data into the integrator within `window`
    /// of now. Facilities that have never pushed are excluded.
    pub async fn all_facilities_synced_within(
        &self,
        window: Duration,
    ) -> Result<Vec<RemoteFacility>> {
        let cutoff = Utc::now() - window;
        let all = self.remote_facilities().await?;
        Ok(all
            .iter()
            .filter(|f| f.last_data_update.is_some_and(|at| at >= cutoff))
            .cloned()
            .collect())
    }

    // --- Programs -------------------------------------------------------

    /// The full cross-facility program directory, cached.
    pub async fn all_programs(&self) -> Result<Arc<Vec<RemoteProgram>>> {
        if let Some(cached) = self.basic_cache.programs() {
            return Ok(cached);
        }

        let fetched = self.track(self.programs.all_programs().await)?;
        let list = Arc::new(fetched);
        self.basic_cache.set_programs(Arc::clone(&list));
        Ok(list)
    }

    /// Programs of one type (e.g. "bed", "service").
    pub async fn programs_by_type(&self, program_type: &str) -> Result<Vec<RemoteProgram>> {
        let all = self.all_programs().await?;
        Ok(all
            .iter()
            .filter(|p| p.program_type == program_type)
            .cloned()
            .collect())
    }

    /// One program by its composite key.
    pub async fn program(&self, key: &ProgramKey) -> Result<Option<RemoteProgram>> {
        let all = self.all_programs().await?;
        Ok(all.iter().find(|p| &p.key == key).cloned())
    }

    /// Programs a referral can be sent to: the program must opt in, and
    /// community programs never accept cross-facility referrals.
    pub async fn programs_accepting_referrals(&self) -> Result<Vec<RemoteProgram>> {
        let all = self.all_programs().await?;
        Ok(all
            .iter()
            .filter(|p| {
                p.allows_integrated_referrals && p.program_type != NON_REFERRABLE_PROGRAM_TYPE
            })
            .cloned()
            .collect())
    }

    // --- Providers ------------------------------------------------------

    /// The cross-facility provider directory, cached.
    ///
    /// Degrades to an empty directory when the optional provider service
    /// is unavailable. Empty results are never cached, so the directory
    /// recovers as soon as the service does.
    pub async fn all_providers(&self) -> Result<Arc<Vec<RemoteProvider>>> {
        if let Some(cached) = self.basic_cache.providers() {
            return Ok(cached);
        }

        let service = match self.providers {
            Some(ref service) => service,
            None => return Ok(Arc::new(Vec::new())),
        };

        let fetched = self.track(service.all_providers().await)?;
        let list = Arc::new(fetched);
        self.basic_cache.set_providers(Arc::clone(&list));
        Ok(list)
    }

    /// One provider by composite key, from the cached directory.
    pub async fn provider(&self, key: &RemoteProviderKey) -> Result<Option<RemoteProvider>> {
        let all = self.all_providers().await?;
        Ok(all.iter().find(|p| &p.key == key).cloned())
    }

    /// Unread integrator messages for a provider. Empty when the
    /// provider service is unavailable.
    pub async fn provider_messages(&self, provider: &ProviderId) -> Result<Vec<ProviderMessage>> {
        match self.providers {
            Some(ref service) => self.track(service.messages_for(provider).await),
            None => Ok(Vec::new()),
        }
    }

    /// Acknowledges a batch of messages on the remote side.
    pub async fn acknowledge_provider_messages(
        &self,
        provider: &ProviderId,
        message_ids: &[i32],
    ) -> Result<()> {
        let service = match self.providers {
            Some(ref service) => service,
            None => {
                return Err(crate::domain::errors::MeridianError::Configuration(
                    "Provider service unavailable; cannot acknowledge messages".to_string(),
                ))
            }
        };

        for &message_id in message_ids {
            self.track(service.acknowledge_message(provider, message_id).await)?;
        }
        Ok(())
    }

    // --- Patients -------------------------------------------------------

    /// Fetches a linked remote record's demographics, for building an
    /// unpersisted local view of the remote patient. Callers merge the
    /// transfer onto a local record with
    /// [`DemographicTransfer::copy_onto`].
    pub async fn fetch_remote_patient(
        &self,
        scope: &AccessScope,
        remote: &RemotePatientKey,
    ) -> Result<DemographicTransfer> {
        self.track(self.demographics.demographic(scope, remote).await)
    }

    /// Records a link between the scoped local patient and a remote
    /// record.
    pub async fn link_patients(
        &self,
        scope: &AccessScope,
        remote: &RemotePatientKey,
    ) -> Result<()> {
        self.track(self.demographics.link_patients(scope, remote).await)
    }

    /// Candidate demographic matches across all facilities.
    pub async fn search_matching_patients(
        &self,
        provider: &ProviderId,
        parameters: &MatchingPatientParameters,
    ) -> Result<Vec<DemographicTransfer>> {
        self.track(self.demographics.matching_patients(provider, parameters).await)
    }

    /// Interprets a free-text patient search as matching parameters.
    ///
    /// Three modes, tried in order: a string of 9+ digits is a health
    /// identification number; an ISO date is a birth date; anything else
    /// is a name ("last, first" when a comma is present, otherwise
    /// "first last", a single word matching the last name).
    pub fn matching_parameters_from_search(query: &str) -> MatchingPatientParameters {
        let query = query.trim();

        if query.len() >= 9 && query.chars().all(|c| c.is_ascii_digit()) {
            return MatchingPatientParameters {
                hin: Some(query.to_string()),
                ..Default::default()
            };
        }

        if let Ok(date) = NaiveDate::parse_from_str(query, "%Y-%m-%d") {
            return MatchingPatientParameters {
                birth_date: Some(date),
                ..Default::default()
            };
        }

        if let Some((last, first)) = query.split_once(',') {
            return MatchingPatientParameters {
                last_name: non_empty(last),
                first_name: non_empty(first),
                ..Default::default()
            };
        }

        let mut words = query.split_whitespace();
        match (words.next(), words.next()) {
            (Some(first), Some(last)) => MatchingPatientParameters {
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                ..Default::default()
            },
            (Some(only), None) => MatchingPatientParameters {
                last_name: Some(only.to_string()),
                ..Default::default()
            },
            _ => MatchingPatientParameters::default(),
        }
    }

    // --- Segmented clinical reads ----------------------------------------

    /// Clinical notes for the scoped patient, cached per access scope.
    pub async fn linked_notes(&self, scope: &AccessScope) -> Result<Arc<Vec<RemoteNote>>> {
        if let Some(cached) = self.segmented_cache.get::<Vec<RemoteNote>>(scope) {
            return Ok(cached);
        }

        let fetched = self.track(self.demographics.notes(scope).await)?;
        let list = Arc::new(fetched);
        self.segmented_cache.put(scope, Arc::clone(&list));
        Ok(list)
    }

    /// Note headers without bodies, for list screens. Served from the
    /// same cache entry as [`linked_notes`](Self::linked_notes).
    pub async fn linked_note_metadata(&self, scope: &AccessScope) -> Result<Vec<NoteMetadata>> {
        let notes = self.linked_notes(scope).await?;
        Ok(notes
            .iter()
            .map(|n| NoteMetadata {
                key: n.key.clone(),
                observation_date: n.observation_date,
                update_date: n.update_date,
                signing_provider: n.signing_provider.clone(),
                role: n.role.clone(),
            })
            .collect())
    }

    /// The subset of the scoped patient's notes with the given keys, in
    /// directory order.
    pub async fn linked_notes_by_ids(
        &self,
        scope: &AccessScope,
        keys: &[NoteKey],
    ) -> Result<Vec<RemoteNote>> {
        let wanted: HashSet<&NoteKey> = keys.iter().collect();
        let notes = self.linked_notes(scope).await?;
        Ok(notes
            .iter()
            .filter(|n| wanted.contains(&n.key))
            .cloned()
            .collect())
    }

    /// Prevention records for the scoped patient, cached per access scope.
    pub async fn linked_preventions(
        &self,
        scope: &AccessScope,
    ) -> Result<Arc<Vec<RemotePrevention>>> {
        if let Some(cached) = self.segmented_cache.get::<Vec<RemotePrevention>>(scope) {
            return Ok(cached);
        }

        let fetched = self.track(self.demographics.preventions(scope).await)?;
        let list = Arc::new(fetched);
        self.segmented_cache.put(scope, Arc::clone(&list));
        Ok(list)
    }

    /// Measurements for the scoped patient, cached per access scope.
    pub async fn linked_measurements(
        &self,
        scope: &AccessScope,
    ) -> Result<Arc<Vec<RemoteMeasurement>>> {
        if let Some(cached) = self.segmented_cache.get::<Vec<RemoteMeasurement>>(scope) {
            return Ok(cached);
        }

        let fetched = self.track(self.demographics.measurements(scope).await)?;
        let list = Arc::new(fetched);
        self.segmented_cache.put(scope, Arc::clone(&list));
        Ok(list)
    }

    // --- Consent ---------------------------------------------------------

    /// Current consent state for the scoped patient.
    pub async fn consent_state(&self, scope: &AccessScope) -> Result<Option<ConsentState>> {
        self.track(self.demographics.consent(scope).await)
    }

    /// Pushes a consent decision to the integrator.
    ///
    /// Only decided consents travel: `Deferred` and `None` stay local,
    /// and the call is a no-op for them.
    pub async fn push_consent(&self, update: &ConsentUpdate) -> Result<()> {
        match update.status {
            ConsentStatus::Given | ConsentStatus::Revoked => {
                self.track(self.demographics.push_consent(update).await)
            }
            ConsentStatus::Deferred | ConsentStatus::None => {
                tracing::debug!(
                    patient_id = %update.patient_id,
                    status = ?update.status,
                    "Undecided consent not transmitted"
                );
                Ok(())
            }
        }
    }

    // --- Health network registry -----------------------------------------

    /// Scored candidate matches in the health network registry.
    pub async fn search_matching_clients(
        &self,
        parameters: &MatchingPatientParameters,
    ) -> Result<Vec<MatchingPatientScore>> {
        self.track(self.hnr.match_clients(parameters).await)
    }

    /// One registry record by linking id.
    pub async fn hnr_client(&self, linking_id: i32) -> Result<Option<HnrClient>> {
        self.track(self.hnr.get_client(linking_id).await)
    }

    /// Creates or updates a registry record, returning its linking id.
    /// Duplicate or invalid health numbers surface as typed remote
    /// errors for the screen to render.
    pub async fn set_hnr_client(&self, client: &HnrClient) -> Result<i32> {
        self.track(self.hnr.set_client(client).await)
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
