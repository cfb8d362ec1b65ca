//! External system adapters
//!
//! This module contains adapters for external systems:
//! - `integrator` - HTTP clients for the integrator web services
//! - `storage` - backends for the local fallback store

pub mod integrator;
pub mod storage;
