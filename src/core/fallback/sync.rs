//! Opportunistic remote-to-local snapshots
//!
//! Whenever a screen has just fetched remote data anyway, the
//! synchronizer persists a copy into the fallback store so it is
//! available the next time the integrator is down. These writes are
//! best-effort by contract: a failed snapshot is logged and swallowed,
//! because it must never break the caller's primary operation. There is
//! no internal retry; the next successful fetch simply overwrites.

use crate::adapters::integrator::DemographicService;
use crate::core::fallback::payload::FallbackPayload;
use crate::core::fallback::store::LocalFallbackStore;
use crate::domain::keys::AccessScope;
use crate::domain::records::RemoteDocumentContent;
use std::sync::Arc;

/// Structured form tables captured into the fallback store
pub const SYNCED_FORM_TYPES: &[&str] = &["formLabReq07"];

/// Fetch-and-persist snapshots per patient scope
pub struct FallbackSynchronizer {
    service: Arc<dyn DemographicService>,
    store: Arc<LocalFallbackStore>,
}

impl FallbackSynchronizer {
    pub fn new(service: Arc<dyn DemographicService>, store: Arc<LocalFallbackStore>) -> Self {
        Self { service, store }
    }

    async fn persist<T: FallbackPayload>(&self, scope: &AccessScope, items: &[T]) {
        if let Err(e) = self
            .store
            .save(
                scope.facility_id,
                scope.patient_id,
                items,
                Some(&scope.provider),
            )
            .await
        {
            tracing::warn!(
                type_key = T::TYPE_NAME,
                patient_id = %scope.patient_id,
                error = %e,
                "Fallback snapshot write failed"
            );
        }
    }

    /// Logs and swallows a fetch failure: snapshots are best-effort.
    fn note_fetch_failure(kind: &str, scope: &AccessScope, error: &crate::domain::MeridianError) {
        tracing::warn!(
            kind,
            facility_id = %scope.facility_id,
            patient_id = %scope.patient_id,
            error = %error,
            "Fallback snapshot fetch failed"
        );
    }

    pub async fn save_notes(&self, scope: &AccessScope) {
        match self.service.notes(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("notes", scope, &e),
        }
    }

    pub async fn save_preventions(&self, scope: &AccessScope) {
        match self.service.preventions(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("preventions", scope, &e),
        }
    }

    pub async fn save_measurements(&self, scope: &AccessScope) {
        match self.service.measurements(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("measurements", scope, &e),
        }
    }

    pub async fn save_issues(&self, scope: &AccessScope) {
        match self.service.issues(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("issues", scope, &e),
        }
    }

    pub async fn save_drugs(&self, scope: &AccessScope) {
        match self.service.drugs(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("drugs", scope, &e),
        }
    }

    pub async fn save_admissions(&self, scope: &AccessScope) {
        match self.service.admissions(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("admissions", scope, &e),
        }
    }

    pub async fn save_appointments(&self, scope: &AccessScope) {
        match self.service.appointments(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("appointments", scope, &e),
        }
    }

    pub async fn save_allergies(&self, scope: &AccessScope) {
        match self.service.allergies(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("allergies", scope, &e),
        }
    }

    pub async fn save_lab_results(&self, scope: &AccessScope) {
        match self.service.lab_results(scope).await {
            Ok(items) => self.persist(scope, &items).await,
            Err(e) => Self::note_fetch_failure("lab_results", scope, &e),
        }
    }

    /// Snapshots each configured form table.
    pub async fn save_forms(&self, scope: &AccessScope) {
        for form_name in SYNCED_FORM_TYPES {
            match self.service.forms(scope, form_name).await {
                Ok(items) => self.persist(scope, &items).await,
                Err(e) => Self::note_fetch_failure(form_name, scope, &e),
            }
        }
    }

    /// Snapshots document headers, then each document's contents under
    /// its own sub-key so single documents can be recovered without
    /// loading all of them.
    pub async fn save_documents(&self, scope: &AccessScope) {
        let headers = match self.service.documents(scope).await {
            Ok(headers) => headers,
            Err(e) => {
                Self::note_fetch_failure("documents", scope, &e);
                return;
            }
        };

        self.persist(scope, &headers).await;

        for header in &headers {
            match self.service.document_content(scope, &header.key).await {
                Ok(content) => {
                    let sub_key = header.key.to_string();
                    if let Err(e) = self
                        .store
                        .save_with_sub_key(
                            scope.facility_id,
                            scope.patient_id,
                            std::slice::from_ref(&content),
                            Some(&scope.provider),
                            Some(&sub_key),
                        )
                        .await
                    {
                        tracing::warn!(
                            type_key = RemoteDocumentContent::TYPE_NAME,
                            document = %header.key,
                            error = %e,
                            "Fallback snapshot write failed"
                        );
                    }
                }
                Err(e) => Self::note_fetch_failure("document_contents", scope, &e),
            }
        }
    }

    /// Snapshots every payload kind for one scope. Used by the sync
    /// command; interactive callers snapshot only what they fetched.
    pub async fn save_all(&self, scope: &AccessScope) {
        self.save_notes(scope).await;
        self.save_preventions(scope).await;
        self.save_measurements(scope).await;
        self.save_issues(scope).await;
        self.save_drugs(scope).await;
        self.save_admissions(scope).await;
        self.save_appointments(scope).await;
        self.save_allergies(scope).await;
        self.save_documents(scope).await;
        self.save_lab_results(scope).await;
        self.save_forms(scope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryFallbackStorage;
    use crate::domain::errors::{MeridianError, RemoteError};
    use crate::domain::ids::{FacilityId, PatientId, ProviderId};
    use crate::domain::keys::{DocumentKey, RemotePatientKey};
    use crate::domain::records::*;
    use crate::domain::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeDemographicService {
        fail: bool,
    }

    fn sample_note() -> RemoteNote {
        RemoteNote {
            key: NoteKey {
                facility_id: FacilityId(1),
                note_id: "n1".to_string(),
            },
            observation_date: Utc::now(),
            update_date: Utc::now(),
            signing_provider: None,
            role: None,
            note: "remote note".to_string(),
        }
    }

    #[async_trait]
    impl DemographicService for FakeDemographicService {
        async fn linked_patients(&self, _: &AccessScope) -> Result<Vec<RemotePatientKey>> {
            Ok(vec![])
        }

        async fn link_patients(&self, _: &AccessScope, _: &RemotePatientKey) -> Result<()> {
            Ok(())
        }

        async fn demographic(
            &self,
            _: &AccessScope,
            _: &RemotePatientKey,
        ) -> Result<DemographicTransfer> {
            Ok(DemographicTransfer::default())
        }

        async fn push_demographic(&self, _: &AccessScope, _: &DemographicTransfer) -> Result<()> {
            Ok(())
        }

        async fn matching_patients(
            &self,
            _: &ProviderId,
            _: &MatchingPatientParameters,
        ) -> Result<Vec<DemographicTransfer>> {
            Ok(vec![])
        }

        async fn notes(&self, _: &AccessScope) -> Result<Vec<RemoteNote>> {
            if self.fail {
                Err(RemoteError::ConnectionRefused("down".into()).into())
            } else {
                Ok(vec![sample_note()])
            }
        }

        async fn preventions(&self, _: &AccessScope) -> Result<Vec<RemotePrevention>> {
            Ok(vec![])
        }

        async fn measurements(&self, _: &AccessScope) -> Result<Vec<RemoteMeasurement>> {
            Ok(vec![])
        }

        async fn issues(&self, _: &AccessScope) -> Result<Vec<RemoteIssue>> {
            Ok(vec![])
        }

        async fn drugs(&self, _: &AccessScope) -> Result<Vec<RemoteDrug>> {
            Ok(vec![])
        }

        async fn admissions(&self, _: &AccessScope) -> Result<Vec<RemoteAdmission>> {
            Ok(vec![])
        }

        async fn appointments(&self, _: &AccessScope) -> Result<Vec<RemoteAppointment>> {
            Ok(vec![])
        }

        async fn allergies(&self, _: &AccessScope) -> Result<Vec<RemoteAllergy>> {
            Ok(vec![])
        }

        async fn documents(&self, _: &AccessScope) -> Result<Vec<RemoteDocument>> {
            Ok(vec![RemoteDocument {
                key: DocumentKey::new(FacilityId(1), 42),
                description: "discharge summary".to_string(),
                content_type: "application/pdf".to_string(),
                observation_date: None,
                update_date: Utc::now(),
            }])
        }

        async fn document_content(
            &self,
            _: &AccessScope,
            document: &DocumentKey,
        ) -> Result<RemoteDocumentContent> {
            Ok(RemoteDocumentContent {
                key: document.clone(),
                content_type: "application/pdf".to_string(),
                contents: "aGVsbG8=".to_string(),
            })
        }

        async fn lab_results(&self, _: &AccessScope) -> Result<Vec<RemoteLabResult>> {
            Ok(vec![])
        }

        async fn forms(&self, _: &AccessScope, _: &str) -> Result<Vec<RemoteForm>> {
            Ok(vec![])
        }

        async fn consent(&self, _: &AccessScope) -> Result<Option<ConsentState>> {
            Ok(None)
        }

        async fn push_consent(&self, _: &ConsentUpdate) -> Result<()> {
            Ok(())
        }
    }

    fn scope() -> AccessScope {
        AccessScope::new(
            FacilityId(1),
            ProviderId::new("10023").unwrap(),
            PatientId(500),
        )
    }

    fn synchronizer(fail: bool) -> (FallbackSynchronizer, Arc<LocalFallbackStore>) {
        let store = Arc::new(LocalFallbackStore::new(Arc::new(
            MemoryFallbackStorage::new(),
        )));
        let sync = FallbackSynchronizer::new(
            Arc::new(FakeDemographicService { fail }),
            Arc::clone(&store),
        );
        (sync, store)
    }

    #[tokio::test]
    async fn test_notes_snapshot_persisted() {
        let (sync, store) = synchronizer(false);
        sync.save_notes(&scope()).await;

        let saved: Vec<RemoteNote> = store.get(FacilityId(1), PatientId(500)).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].note, "remote note");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_swallowed() {
        let (sync, store) = synchronizer(true);

        // Must not panic or propagate
        sync.save_notes(&scope()).await;

        let saved: Option<Vec<RemoteNote>> = store.get(FacilityId(1), PatientId(500)).await;
        assert!(saved.is_none());
    }

    #[tokio::test]
    async fn test_documents_store_headers_and_contents() {
        let (sync, store) = synchronizer(false);
        sync.save_documents(&scope()).await;

        let headers: Vec<RemoteDocument> = store.get(FacilityId(1), PatientId(500)).await.unwrap();
        assert_eq!(headers.len(), 1);

        let contents: Vec<RemoteDocumentContent> = store
            .get_with_sub_key(FacilityId(1), PatientId(500), Some("1:42"))
            .await
            .unwrap();
        assert_eq!(contents.len(), 1);

        // Reverse lookup resolves the owning patient
        let owner = store
            .patient_for_document(&DocumentKey::new(FacilityId(1), 42))
            .await;
        assert_eq!(owner, Some((FacilityId(1), PatientId(500))));
    }

    #[tokio::test]
    async fn test_empty_lists_do_not_write() {
        let (sync, store) = synchronizer(false);
        sync.save_drugs(&scope()).await;

        let saved: Option<Vec<RemoteDrug>> = store.get(FacilityId(1), PatientId(500)).await;
        assert!(saved.is_none());
    }
}
