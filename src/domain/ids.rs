//! Domain identifier types
//!
//! Newtype wrappers for the identifiers used across the integrator
//! boundary. Facility and patient ids are integers assigned by the
//! integrator; provider numbers are opaque strings assigned by each
//! facility's EMR.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integrator-assigned facility identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacilityId(pub i32);

impl FacilityId {
    /// Returns the raw integer value
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for FacilityId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Local patient (demographic) identifier within a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatientId(pub i32);

impl PatientId {
    /// Returns the raw integer value
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PatientId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Provider (individual clinician) number
///
/// Identifies the human user acting on a request, distinct from the
/// facility-level credential. Carried on outbound calls so the remote
/// side can audit which individual triggered the call.
///
/// # Examples
///
/// ```
/// use meridian::domain::ids::ProviderId;
/// use std::str::FromStr;
///
/// let provider = ProviderId::from_str("10023").unwrap();
/// assert_eq!(provider.as_str(), "10023");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a new ProviderId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Provider number cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the provider number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
