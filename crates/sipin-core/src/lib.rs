//! SIP-in Core
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns an essence file and its metadata sidecar into a BagIt-zipped
//! Submission Information Package with METS structural metadata and PREMIS
//! preservation metadata.
//!
//! # Overview
//!
//! - **Sidecar**: parsing and validation of the producer's XML sidecar
//! - **METS / PREMIS / DC**: document models rendered through a small
//!   XML element tree
//! - **Layout**: the on-disk package tree and the per-run identifier set
//! - **Bag / Archive**: BagIt tag files and the final `.bag.zip`
//! - **Pipeline**: the staged assembly run and its failure context
//! - **Event / Run**: the outcome event and the transport intents of a run
//!
//! Everything here is synchronous and blocking. Callers run assemblies
//! off latency-sensitive threads.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sipin_core::{
//!     handle_run, AssemblerConfig, OrganizationLookup, PackageAssembler, WatchfolderDescriptor,
//! };
//!
//! struct Static;
//!
//! impl OrganizationLookup for Static {
//!     fn label_for(&self, _flow_id: &str) -> sipin_core::Result<String> {
//!         Ok("Het Archief".to_string())
//!     }
//! }
//!
//! let assembler = PackageAssembler::new(AssemblerConfig::default(), Arc::new(Static));
//! let descriptor = WatchfolderDescriptor {
//!     cp_name: "CP".into(),
//!     flow_id: "OR-abc123".into(),
//!     essence: "/watch/video.mxf".into(),
//!     sidecar: "/watch/video.xml".into(),
//!     collaterals: vec![],
//! };
//! let report = handle_run(&descriptor, &assembler, "worker-1");
//! println!("{:?}", report.intents);
//! ```

pub mod archive;
pub mod bag;
pub mod dc;
pub mod error;
pub mod event;
pub mod layout;
pub mod mets;
pub mod pipeline;
pub mod premis;
pub mod run;
pub mod sidecar;
pub mod xml;

// Re-export commonly used types
pub use error::{ErrorKind, Result, SidecarError, SipError};
pub use event::{EventOutcome, SipEvent};
pub use layout::{PackageLayout, SipIdentitySet};
pub use pipeline::{
    AssembledPackage, AssemblerConfig, AssemblyFailure, FailureContext, OrganizationLookup,
    PackageAssembler, Stage, WatchfolderDescriptor,
};
pub use run::{handle_run, Intent, RunReport};
pub use sidecar::Sidecar;
