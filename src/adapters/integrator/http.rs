//! HTTP transport for the integrator services
//!
//! One shared [`ServiceClient`] owns the connection pool, the endpoint
//! URL, and the authenticator; the per-service types are thin wrappers
//! that map trait operations onto paths. All transport errors are
//! converted to [`RemoteError`] here so nothing above this module sees
//! the HTTP client's types.

use crate::adapters::integrator::auth::RequestAuthenticator;
use crate::adapters::integrator::services::{
    DemographicService, FacilityService, HnrService, ProgramService, ProviderService,
    ReferralService,
};
use crate::config::IntegratorConfig;
use crate::domain::errors::{MeridianError, RemoteError};
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
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Shared HTTP client for all integrator services
pub struct ServiceClient {
    client: Client,
    base_url: String,
    auth: RequestAuthenticator,
}

impl ServiceClient {
    /// Builds the client from the integrator configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URL is not a valid
    /// absolute URL or the HTTP client cannot be constructed.
    pub fn new(config: &IntegratorConfig) -> Result<Self> {
        let parsed = Url::parse(&config.base_url).map_err(|e| {
            MeridianError::Configuration(format!(
                "Invalid integrator base URL '{}': {}",
                config.base_url, e
            ))
        })?;

        if !parsed.has_host() {
            return Err(MeridianError::Configuration(format!(
                "Integrator base URL '{}' has no host",
                config.base_url
            )));
        }

        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds));

        if !config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            MeridianError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth: RequestAuthenticator::new(config),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Classifies a send-level failure. Only failures to reach the
    /// endpoint count as connectivity errors; everything after a
    /// response arrived is a protocol or business error.
    fn map_send_error(error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout(error.to_string())
        } else if error.is_connect() {
            RemoteError::ConnectionRefused(error.to_string())
        } else {
            RemoteError::InvalidResponse(error.to_string())
        }
    }

    async fn check_status(response: Response) -> std::result::Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RemoteError::AuthenticationFailed(message)
            }
            StatusCode::CONFLICT => RemoteError::DuplicateIdentifier(message),
            StatusCode::UNPROCESSABLE_ENTITY => RemoteError::InvalidIdentifier(message),
            s if s.is_client_error() => RemoteError::ClientError {
                status: s.as_u16(),
                message,
            },
            s => RemoteError::ServerError {
                status: s.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()).into())
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        provider: Option<&ProviderId>,
    ) -> Result<T> {
        let request = self.auth.apply(self.client.get(self.url(path)), provider);
        let response = request.send().await.map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    /// GET a JSON resource that may not exist; a 404 becomes `None`.
    pub async fn get_json_opt<T: DeserializeOwned>(
        &self,
        path: &str,
        provider: Option<&ProviderId>,
    ) -> Result<Option<T>> {
        let request = self.auth.apply(self.client.get(self.url(path)), provider);
        let response = request.send().await.map_err(Self::map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check_status(response).await?;
        Ok(Some(Self::decode(response).await?))
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        provider: Option<&ProviderId>,
    ) -> Result<T> {
        let request = self
            .auth
            .apply(self.client.post(self.url(path)).json(body), provider);
        let response = request.send().await.map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    /// POST a JSON body, discarding the response body.
    pub async fn post_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        provider: Option<&ProviderId>,
    ) -> Result<()> {
        let request = self
            .auth
            .apply(self.client.post(self.url(path)).json(body), provider);
        let response = request.send().await.map_err(Self::map_send_error)?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Facility account name (safe to log).
    pub fn username(&self) -> &str {
        self.auth.username()
    }
}

fn scope_path(scope: &AccessScope, resource: &str) -> String {
    format!(
        "facilities/{}/patients/{}/{}",
        scope.facility_id, scope.patient_id, resource
    )
}

/// Facility directory over HTTP
pub struct HttpFacilityService {
    client: Arc<ServiceClient>,
}

impl HttpFacilityService {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FacilityService for HttpFacilityService {
    async fn all_facilities(&self) -> Result<Vec<RemoteFacility>> {
        self.client.get_json("facilities", None).await
    }
}

/// Program directory over HTTP
pub struct HttpProgramService {
    client: Arc<ServiceClient>,
}

impl HttpProgramService {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProgramService for HttpProgramService {
    async fn all_programs(&self) -> Result<Vec<RemoteProgram>> {
        self.client.get_json("programs", None).await
    }
}

/// Provider directory and messaging over HTTP
pub struct HttpProviderService {
    client: Arc<ServiceClient>,
}

impl HttpProviderService {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderService for HttpProviderService {
    async fn all_providers(&self) -> Result<Vec<RemoteProvider>> {
        self.client.get_json("providers", None).await
    }

    async fn messages_for(&self, provider: &ProviderId) -> Result<Vec<ProviderMessage>> {
        self.client
            .get_json(
                &format!("providers/{provider}/messages"),
                Some(provider),
            )
            .await
    }

    async fn acknowledge_message(&self, provider: &ProviderId, message_id: i32) -> Result<()> {
        self.client
            .post_unit(
                &format!("providers/{provider}/messages/{message_id}/read"),
                &serde_json::json!({}),
                Some(provider),
            )
            .await
    }
}

/// Patient data service over HTTP
pub struct HttpDemographicService {
    client: Arc<ServiceClient>,
}

impl HttpDemographicService {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }

    async fn scoped_list<T: DeserializeOwned>(
        &self,
        scope: &AccessScope,
        resource: &str,
    ) -> Result<Vec<T>> {
        self.client
            .get_json(&scope_path(scope, resource), Some(&scope.provider))
            .await
    }
}

#[async_trait]
impl DemographicService for HttpDemographicService {
    async fn linked_patients(&self, scope: &AccessScope) -> Result<Vec<RemotePatientKey>> {
        self.client
            .get_json(
                &format!("patients/{}/linked-records", scope.patient_id),
                Some(&scope.provider),
            )
            .await
    }

    async fn link_patients(&self, scope: &AccessScope, remote: &RemotePatientKey) -> Result<()> {
        self.client
            .post_unit(
                &format!("patients/{}/linked-records", scope.patient_id),
                remote,
                Some(&scope.provider),
            )
            .await
    }

    async fn demographic(
        &self,
        scope: &AccessScope,
        remote: &RemotePatientKey,
    ) -> Result<DemographicTransfer> {
        self.client
            .get_json(
                &format!(
                    "facilities/{}/demographics/{}",
                    remote.facility_id, remote.item_id
                ),
                Some(&scope.provider),
            )
            .await
    }

    async fn push_demographic(
        &self,
        scope: &AccessScope,
        transfer: &DemographicTransfer,
    ) -> Result<()> {
        self.client
            .post_unit(
                &scope_path(scope, "demographic"),
                transfer,
                Some(&scope.provider),
            )
            .await
    }

    async fn matching_patients(
        &self,
        provider: &ProviderId,
        parameters: &MatchingPatientParameters,
    ) -> Result<Vec<DemographicTransfer>> {
        self.client
            .post_json("patients/search", parameters, Some(provider))
            .await
    }

    async fn notes(&self, scope: &AccessScope) -> Result<Vec<RemoteNote>> {
        self.scoped_list(scope, "notes").await
    }

    async fn preventions(&self, scope: &AccessScope) -> Result<Vec<RemotePrevention>> {
        self.scoped_list(scope, "preventions").await
    }

    async fn measurements(&self, scope: &AccessScope) -> Result<Vec<RemoteMeasurement>> {
        self.scoped_list(scope, "measurements").await
    }

    async fn issues(&self, scope: &AccessScope) -> Result<Vec<RemoteIssue>> {
        self.scoped_list(scope, "issues").await
    }

    async fn drugs(&self, scope: &AccessScope) -> Result<Vec<RemoteDrug>> {
        self.scoped_list(scope, "drugs").await
    }

    async fn admissions(&self, scope: &AccessScope) -> Result<Vec<RemoteAdmission>> {
        self.scoped_list(scope, "admissions").await
    }

    async fn appointments(&self, scope: &AccessScope) -> Result<Vec<RemoteAppointment>> {
        self.scoped_list(scope, "appointments").await
    }

    async fn allergies(&self, scope: &AccessScope) -> Result<Vec<RemoteAllergy>> {
        self.scoped_list(scope, "allergies").await
    }

    async fn documents(&self, scope: &AccessScope) -> Result<Vec<RemoteDocument>> {
        self.scoped_list(scope, "documents").await
    }

    async fn document_content(
        &self,
        scope: &AccessScope,
        document: &DocumentKey,
    ) -> Result<RemoteDocumentContent> {
        self.client
            .get_json(
                &format!(
                    "facilities/{}/documents/{}/content",
                    document.facility_id, document.item_id
                ),
                Some(&scope.provider),
            )
            .await
    }

    async fn lab_results(&self, scope: &AccessScope) -> Result<Vec<RemoteLabResult>> {
        self.scoped_list(scope, "lab-results").await
    }

    async fn forms(&self, scope: &AccessScope, form_name: &str) -> Result<Vec<RemoteForm>> {
        self.client
            .get_json(
                &format!("{}?name={}", scope_path(scope, "forms"), form_name),
                Some(&scope.provider),
            )
            .await
    }

    async fn consent(&self, scope: &AccessScope) -> Result<Option<ConsentState>> {
        self.client
            .get_json_opt(&scope_path(scope, "consent"), Some(&scope.provider))
            .await
    }

    async fn push_consent(&self, update: &ConsentUpdate) -> Result<()> {
        let provider = update.recorded_by.clone();
        self.client
            .post_unit("consents", update, provider.as_ref())
            .await
    }
}

/// Referral service over HTTP
pub struct HttpReferralService {
    client: Arc<ServiceClient>,
}

impl HttpReferralService {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferralService for HttpReferralService {
    async fn push_referral(&self, referral: &ReferralRequest) -> Result<()> {
        self.client
            .post_unit("referrals", referral, referral.referring_provider.as_ref())
            .await
    }
}

#[derive(Deserialize)]
struct LinkingIdResponse {
    linking_id: i32,
}

/// Health network registry service over HTTP
pub struct HttpHnrService {
    client: Arc<ServiceClient>,
}

impl HttpHnrService {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HnrService for HttpHnrService {
    async fn match_clients(
        &self,
        parameters: &MatchingPatientParameters,
    ) -> Result<Vec<MatchingPatientScore>> {
        self.client.post_json("hnr/match", parameters, None).await
    }

    async fn get_client(&self, linking_id: i32) -> Result<Option<HnrClient>> {
        self.client
            .get_json_opt(&format!("hnr/clients/{linking_id}"), None)
            .await
    }

    async fn set_client(&self, client: &HnrClient) -> Result<i32> {
        let response: LinkingIdResponse =
            self.client.post_json("hnr/clients", client, None).await?;
        Ok(response.linking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::ids::{FacilityId, PatientId};

    fn config(base_url: &str) -> IntegratorConfig {
        IntegratorConfig {
            enabled: true,
            base_url: base_url.to_string(),
            username: "facility-3".to_string(),
            password: secret_string("pw".to_string()),
            integrated_referrals_enabled: true,
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
            tls_verify: true,
        }
    }

    fn scope() -> AccessScope {
        AccessScope::new(
            FacilityId(3),
            ProviderId::new("10023").unwrap(),
            PatientId(500),
        )
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = ServiceClient::new(&config("not a url"));
        assert!(matches!(result, Err(MeridianError::Configuration(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = ServiceClient::new(&config("http://localhost:8080/ws/")).unwrap();
        assert_eq!(client.url("facilities"), "http://localhost:8080/ws/facilities");
    }

    #[test]
    fn test_scope_path_layout() {
        assert_eq!(
            scope_path(&scope(), "notes"),
            "facilities/3/patients/500/notes"
        );
    }

    #[tokio::test]
    async fn test_facilities_fetch_and_auth_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/facilities")
            .match_header("authorization", mockito::Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"integrator_facility_id":1,"name":"North","last_data_update":null}]"#)
            .create_async()
            .await;

        let client = Arc::new(ServiceClient::new(&config(&server.url())).unwrap());
        let service = HttpFacilityService::new(client);

        let facilities = service.all_facilities().await.unwrap();
        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].name, "North");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_scoped_fetch_sends_provider_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/facilities/3/patients/500/notes")
            .match_header("x-requesting-provider", "10023")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = Arc::new(ServiceClient::new(&config(&server.url())).unwrap());
        let service = HttpDemographicService::new(client);

        let notes = service.notes(&scope()).await.unwrap();
        assert!(notes.is_empty());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/facilities")
            .with_status(401)
            .with_body("bad credentials")
            .create_async()
            .await;

        let client = Arc::new(ServiceClient::new(&config(&server.url())).unwrap());
        let service = HttpFacilityService::new(client);

        let err = service.all_facilities().await.unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Remote(RemoteError::AuthenticationFailed(_))
        ));
        assert!(!err.is_connectivity());
    }

    #[tokio::test]
    async fn test_server_error_is_not_connectivity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/programs")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = Arc::new(ServiceClient::new(&config(&server.url())).unwrap());
        let service = HttpProgramService::new(client);

        let err = service.all_programs().await.unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Remote(RemoteError::ServerError { status: 500, .. })
        ));
        assert!(!err.is_connectivity());
    }

    #[tokio::test]
    async fn test_connection_refused_is_connectivity() {
        // Nothing listens on this port
        let client = Arc::new(ServiceClient::new(&config("http://127.0.0.1:1")).unwrap());
        let service = HttpFacilityService::new(client);

        let err = service.all_facilities().await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_missing_consent_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/facilities/3/patients/500/consent")
            .with_status(404)
            .create_async()
            .await;

        let client = Arc::new(ServiceClient::new(&config(&server.url())).unwrap());
        let service = HttpDemographicService::new(client);

        let consent = service.consent(&scope()).await.unwrap();
        assert!(consent.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identifier_from_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hnr/clients")
            .with_status(409)
            .with_body("9999999999")
            .create_async()
            .await;

        let client = Arc::new(ServiceClient::new(&config(&server.url())).unwrap());
        let service = HttpHnrService::new(client);

        let hnr_client = HnrClient {
            linking_id: None,
            transfer: DemographicTransfer::default(),
        };

        let err = service.set_client(&hnr_client).await.unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Remote(RemoteError::DuplicateIdentifier(_))
        ));
    }
}
