//! Facility-to-facility bulk transfer framing
//!
//! - [`framing`] — frame types and dependency/version validation
//! - [`stream`] — JSON-lines writer and validating reader
//! - [`apply`] — applying a validated transfer into the fallback store

pub mod apply;
pub mod framing;
pub mod stream;

pub use apply::{apply_transfer, AppliedTransfer};
pub use framing::{
    TransferDisposition, TransferFooter, TransferFrame, TransferHeader, TransferRecord,
    FORMAT_VERSION,
};
pub use stream::{read_transfer, Transfer, TransferWriter};
