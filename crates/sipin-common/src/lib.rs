//! SIP-in Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the SIP creator workspace.
//!
//! # Overview
//!
//! - **Error Handling**: Common error type and result alias
//! - **Checksums**: Streaming file digests (MD5 for fixity, SHA-256 on request)
//! - **Identifiers**: Randomised identifiers usable as XML `ID` values
//! - **Mimetypes**: Extension to mimetype and mimetype to SIP type tables
//! - **Logging**: `tracing` subscriber bootstrap shared by all binaries
//!
//! # Example
//!
//! ```no_run
//! use sipin_common::checksum::compute_file_checksum;
//! use sipin_common::types::ChecksumAlgorithm;
//!
//! fn fixity(path: &str) -> sipin_common::Result<String> {
//!     compute_file_checksum(path, ChecksumAlgorithm::Md5)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod ids;
pub mod logging;
pub mod mimetype;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
