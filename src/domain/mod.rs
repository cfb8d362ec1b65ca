//! Domain types and models
//!
//! This module contains the core domain types used throughout Meridian:
//! identifiers, composite keys, remote record models, and the error
//! hierarchy.

pub mod errors;
pub mod ids;
pub mod keys;
pub mod records;
pub mod result;

pub use errors::{
    MeridianError, OptionalServiceError, RemoteError, StorageError, TransferError,
};
pub use ids::{FacilityId, PatientId, ProviderId};
pub use keys::{
    AccessScope, DocumentKey, FacilityItemKey, ProgramKey, RemotePatientKey, RemoteProviderKey,
};
pub use result::Result;
