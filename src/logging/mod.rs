//! Logging and observability
//!
//! Structured logging through `tracing`: console output for operators,
//! optional rotating JSON files for ingestion.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
