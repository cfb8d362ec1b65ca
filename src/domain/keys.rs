//! Composite key types for remote records
//!
//! Remote items are identified by (facility, item) pairs. These are proper
//! value types with derived equality and hashing; the original system
//! compared composite keys through reflective helpers that swallowed
//! exceptions, which is replaced here by the type system.

use crate::domain::ids::{FacilityId, PatientId, ProviderId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The access-control scope of a patient-data request.
///
/// Identifies one viewer's window onto one patient at one facility:
/// remote data is filtered by the provider's access rights before it
/// leaves the remote side, so results are only meaningful within the
/// exact scope that requested them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessScope {
    /// Remote facility the data is fetched from
    pub facility_id: FacilityId,

    /// Provider whose access rights filter the data
    pub provider: ProviderId,

    /// Local patient the data belongs to
    pub patient_id: PatientId,
}

impl AccessScope {
    pub fn new(facility_id: FacilityId, provider: ProviderId, patient_id: PatientId) -> Self {
        Self {
            facility_id,
            provider,
            patient_id,
        }
    }
}

/// Composite key of a remote item: the owning facility plus the item's id
/// within that facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityItemKey<T> {
    /// Integrator facility that owns the item
    pub facility_id: FacilityId,

    /// Item id within the owning facility
    pub item_id: T,
}

impl<T> FacilityItemKey<T> {
    /// Creates a new composite key
    pub fn new(facility_id: FacilityId, item_id: T) -> Self {
        Self {
            facility_id,
            item_id,
        }
    }
}

impl<T: fmt::Display> fmt::Display for FacilityItemKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.facility_id, self.item_id)
    }
}

/// Key of a remote program: (facility, program id)
pub type ProgramKey = FacilityItemKey<i32>;

/// Key of a remote provider: (facility, provider number)
pub type RemoteProviderKey = FacilityItemKey<String>;

/// Key of a remote patient record: (facility, demographic id)
pub type RemotePatientKey = FacilityItemKey<i32>;

/// Key of a remote document: (facility, document id)
pub type DocumentKey = FacilityItemKey<i32>;
