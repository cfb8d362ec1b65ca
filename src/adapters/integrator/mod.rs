//! Integrator web service adapter
//!
//! Everything that talks HTTP to the integrator lives here: the shared
//! transport, request authentication, the service traits, and the
//! factory that wires them together.

pub mod auth;
pub mod client;
pub mod http;
pub mod services;

pub use auth::{RequestAuthenticator, REQUESTING_PROVIDER_HEADER};
pub use client::RemoteServiceFactory;
pub use services::{
    DemographicService, FacilityService, HnrService, ProgramService, ProviderService,
    ReferralService,
};
