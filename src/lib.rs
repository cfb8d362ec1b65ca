// Meridian - EMR Integrator Client Layer
// Copyright (c) 2026 Meridian Contributors
// Licensed under the MIT License

//! # Meridian - EMR Integrator Client Layer
//!
//! Meridian is the client layer an EMR uses to share patient data with
//! other facilities through a central integrator service. It wraps the
//! integrator's web services behind typed service traits and layers on
//! the pieces a clinic-facing deployment needs:
//!
//! - **Caching**: facility-wide reference data under fixed keys, and
//!   patient data segmented by access scope so one provider's view is
//!   never served to another
//! - **Offline fallback**: a local PostgreSQL copy of remote data,
//!   consulted when the integrator is unreachable
//! - **Transfers**: checksummed, dependency-ordered bulk transfer
//!   framing for moving fallback data between facilities
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - The data manager, offline flag, fallback store, and
//!   transfer framing
//! - [`adapters`] - External integrations (integrator HTTP services,
//!   fallback storage backends)
//! - [`cache`] - FIFO-with-TTL caches
//! - [`domain`] - Core domain types, keys, and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meridian::adapters::integrator::RemoteServiceFactory;
//! use meridian::config::load_config;
//! use meridian::core::{OfflineFlag, RemoteDataManager};
//! use meridian::domain::ids::FacilityId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("meridian.toml")?;
//!     let factory = RemoteServiceFactory::new(&config.integrator)?;
//!
//!     let manager = RemoteDataManager::from_factory(
//!         &factory,
//!         &config.cache,
//!         FacilityId(3),
//!         OfflineFlag::new(),
//!     );
//!
//!     let facilities = manager.remote_facilities_excluding_current().await?;
//!     println!("{} remote facilities", facilities.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with a
//! [`domain::MeridianError`]; transport errors are mapped to typed
//! [`domain::errors::RemoteError`] variants at the HTTP boundary, so
//! callers can distinguish connectivity failures (which flip the
//! offline flag) from business rejections (which never do).

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
