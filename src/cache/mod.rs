//! In-memory caching layer
//!
//! Two caches sit in front of the integrator services, both built on the
//! same sharded FIFO-with-expiry store:
//!
//! - [`BasicDataCache`] for facility-wide reference lists shared by
//!   every caller
//! - [`SegmentedAccessCache`] for patient data whose visibility depends
//!   on who is asking

pub mod basic;
pub mod queue;
pub mod segmented;

pub use basic::BasicDataCache;
pub use queue::QueueCache;
pub use segmented::SegmentedAccessCache;
