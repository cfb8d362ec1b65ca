//! Local fallback copy of remote data
//!
//! - [`LocalFallbackStore`] — typed save/get over a storage backend
//! - [`FallbackSynchronizer`] — opportunistic remote-to-local snapshots
//! - [`FallbackPayload`] — storage key contract for storable types

pub mod payload;
pub mod store;
pub mod sync;

pub use payload::FallbackPayload;
pub use store::LocalFallbackStore;
pub use sync::{FallbackSynchronizer, SYNCED_FORM_TYPES};
