//! Integrator service factory
//!
//! Builds the per-service clients from one shared transport. The factory
//! is constructed once at startup and handed around behind `Arc`; the
//! services it returns share the underlying connection pool.

use crate::adapters::integrator::http::{
    HttpDemographicService, HttpFacilityService, HttpHnrService, HttpProgramService,
    HttpProviderService, HttpReferralService, ServiceClient,
};
use crate::adapters::integrator::services::{
    DemographicService, FacilityService, HnrService, ProgramService, ProviderService,
    ReferralService,
};
use crate::config::IntegratorConfig;
use crate::domain::errors::{MeridianError, OptionalServiceError};
use crate::domain::result::Result;
use std::sync::Arc;

/// Factory for integrator service clients
///
/// # Example
///
/// ```no_run
/// use meridian::adapters::integrator::RemoteServiceFactory;
/// use meridian::config::{secret_string, IntegratorConfig};
///
/// # fn example() -> meridian::domain::Result<()> {
/// let config = IntegratorConfig {
///     enabled: true,
///     base_url: "https://integrator.example.org/ws".to_string(),
///     username: "facility-main".to_string(),
///     password: secret_string("secret".to_string()),
///     integrated_referrals_enabled: true,
///     timeout_seconds: 30,
///     connect_timeout_seconds: 10,
///     tls_verify: true,
/// };
///
/// let factory = RemoteServiceFactory::new(&config)?;
/// let facilities = factory.facility_service();
/// # Ok(())
/// # }
/// ```
pub struct RemoteServiceFactory {
    client: Arc<ServiceClient>,
    referrals_enabled: bool,
}

impl RemoteServiceFactory {
    /// Creates the factory and its shared transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when integration is disabled, the
    /// base URL is invalid, or the HTTP client cannot be built.
    pub fn new(config: &IntegratorConfig) -> Result<Self> {
        if !config.enabled {
            return Err(MeridianError::Configuration(
                "Integrator is disabled; no remote services are available".to_string(),
            ));
        }

        let client = Arc::new(ServiceClient::new(config)?);

        tracing::info!(
            base_url = %config.base_url,
            username = client.username(),
            "Integrator service factory initialized"
        );

        Ok(Self {
            client,
            referrals_enabled: config.integrated_referrals_enabled,
        })
    }

    /// Facility directory client.
    pub fn facility_service(&self) -> Arc<dyn FacilityService> {
        Arc::new(HttpFacilityService::new(Arc::clone(&self.client)))
    }

    /// Program directory client.
    pub fn program_service(&self) -> Arc<dyn ProgramService> {
        Arc::new(HttpProgramService::new(Arc::clone(&self.client)))
    }

    /// Provider directory client.
    ///
    /// This service is non-critical. Callers that only need it for name
    /// lookups handle the error by degrading to an empty directory
    /// rather than failing their own operation.
    pub fn provider_service(
        &self,
    ) -> std::result::Result<Arc<dyn ProviderService>, OptionalServiceError> {
        Ok(Arc::new(HttpProviderService::new(Arc::clone(&self.client))))
    }

    /// Patient data client.
    pub fn demographic_service(&self) -> Arc<dyn DemographicService> {
        Arc::new(HttpDemographicService::new(Arc::clone(&self.client)))
    }

    /// Referral client.
    ///
    /// # Errors
    ///
    /// Fails when integrated referrals are switched off for this
    /// facility.
    pub fn referral_service(&self) -> Result<Arc<dyn ReferralService>> {
        if !self.referrals_enabled {
            return Err(MeridianError::Configuration(
                "Integrated referrals are disabled for this facility".to_string(),
            ));
        }
        Ok(Arc::new(HttpReferralService::new(Arc::clone(&self.client))))
    }

    /// Health network registry client.
    pub fn hnr_service(&self) -> Arc<dyn HnrService> {
        Arc::new(HttpHnrService::new(Arc::clone(&self.client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn config(enabled: bool, referrals: bool) -> IntegratorConfig {
        IntegratorConfig {
            enabled,
            base_url: "http://localhost:8080/ws".to_string(),
            username: "facility-3".to_string(),
            password: secret_string("pw".to_string()),
            integrated_referrals_enabled: referrals,
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
            tls_verify: true,
        }
    }

    #[test]
    fn test_factory_requires_enabled_integration() {
        let result = RemoteServiceFactory::new(&config(false, true));
        assert!(matches!(result, Err(MeridianError::Configuration(_))));
    }

    #[test]
    fn test_factory_builds_all_services() {
        let factory = RemoteServiceFactory::new(&config(true, true)).unwrap();

        let _ = factory.facility_service();
        let _ = factory.program_service();
        let _ = factory.demographic_service();
        let _ = factory.hnr_service();
        assert!(factory.provider_service().is_ok());
        assert!(factory.referral_service().is_ok());
    }

    #[test]
    fn test_referral_service_gated_by_configuration() {
        let factory = RemoteServiceFactory::new(&config(true, false)).unwrap();
        assert!(factory.referral_service().is_err());
    }
}
