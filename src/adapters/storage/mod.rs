//! Fallback storage backends

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryFallbackStorage;
pub use postgres::PostgresFallbackStorage;
pub use traits::{FallbackRecord, FallbackStorage};
