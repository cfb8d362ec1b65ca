//! Process-scoped integrator availability flag
//!
//! Screens consult this flag to decide between remote fetches and the
//! local fallback copy. It latches on connectivity failures only:
//! a remote business error means the integrator answered, so the link
//! is up even though the operation failed.

use crate::domain::errors::MeridianError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the shared offline state
#[derive(Clone, Default)]
pub struct OfflineFlag {
    offline: Arc<AtomicBool>,
}

impl OfflineFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the integrator is considered unreachable.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    /// Classifies a failed remote call. Only connectivity failures latch
    /// the flag; everything else leaves it untouched.
    pub fn note_error(&self, error: &MeridianError) {
        if error.is_connectivity() {
            if !self.offline.swap(true, Ordering::Relaxed) {
                tracing::warn!(error = %error, "Integrator marked offline");
            }
        }
    }

    /// Records a successful remote call, clearing the flag.
    pub fn mark_online(&self) {
        if self.offline.swap(false, Ordering::Relaxed) {
            tracing::info!("Integrator back online");
        }
    }

    /// Explicitly clears the flag without a successful call, e.g. from
    /// an operator command.
    pub fn clear(&self) {
        self.offline.store(false, Ordering::Relaxed);
    }
}
