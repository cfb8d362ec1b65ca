//! Core orchestration
//!
//! The data manager, the offline flag it feeds, the local fallback
//! layer, and the transfer framing used to move fallback data between
//! facilities.

pub mod fallback;
pub mod manager;
pub mod offline;
pub mod transfer;

pub use manager::{integrated_referrals_enabled, NoteMetadata, RemoteDataManager};
pub use offline::OfflineFlag;
