//! Request authentication for integrator calls
//!
//! Every outbound request carries the facility-level credential as an
//! HTTP Basic Authorization header. When the call is made on behalf of
//! an individual provider, their number is attached as an additional
//! header so the remote side can audit which person triggered the call;
//! system-initiated calls (background sync, health checks) omit it.

use crate::config::{IntegratorConfig, SecretString};
use crate::domain::ids::ProviderId;
use base64::{engine::general_purpose, Engine as _};
use reqwest::RequestBuilder;
use secrecy::ExposeSecret;

/// Header naming the individual provider a call is made on behalf of
pub const REQUESTING_PROVIDER_HEADER: &str = "X-Requesting-Provider";

/// Attaches facility credentials and the optional requesting-provider
/// identity to outbound requests.
pub struct RequestAuthenticator {
    username: String,
    password: SecretString,
}

impl RequestAuthenticator {
    /// Creates an authenticator from the integrator configuration.
    pub fn new(config: &IntegratorConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Builds the Basic Authorization header value from the facility
    /// credential.
    fn authorization_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password.expose_secret().as_ref());
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {encoded}")
    }

    /// Applies authentication headers to a request.
    ///
    /// The requesting-provider header is added only when a provider is
    /// given; it is never sent empty.
    pub fn apply(
        &self,
        request: RequestBuilder,
        requesting_provider: Option<&ProviderId>,
    ) -> RequestBuilder {
        let request = request.header("Authorization", self.authorization_value());

        match requesting_provider {
            Some(provider) => request.header(REQUESTING_PROVIDER_HEADER, provider.as_str()),
            None => request,
        }
    }

    /// Facility account name (safe to log).
    pub fn username(&self) -> &str {
        &self.username
    }
}
