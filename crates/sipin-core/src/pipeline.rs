//! Package assembly pipeline
//!
//! A run moves linearly through the [`Stage`]s:
//!
//! ```text
//! Received -> PathsValidated -> SidecarValidated -> DirectoryLaidOut
//!   -> MetadataWritten -> EssenceCopied -> MetsWritten -> Bagged
//!   -> Archived -> Done
//! ```
//!
//! Any step may fail. The failure carries the last stage reached and
//! whatever was computed up to that point, so the caller can report on it
//! and clean up. Sources are copied, never moved. The working directory is
//! removed only once the archive exists.

use crate::archive::zip_bag;
use crate::bag::{make_bag, BagInfo, BagManifest};
use crate::dc::descriptive_record;
use crate::error::{IoResultExt, Result, SipError};
use crate::layout::{bag_payload_path, file_name_of, PackageLayout, SipIdentitySet};
use crate::mets::{package_mets, representation_mets, SoftwareAgent};
use crate::premis::{ie_premis, representation_premis};
use crate::sidecar::Sidecar;
use serde::{Deserialize, Serialize};
use sipin_common::checksum::digests_match;
use sipin_common::mimetype::{classify_sip_type, mimetype_for_path};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Progress of one assembly run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    PathsValidated,
    SidecarValidated,
    DirectoryLaidOut,
    MetadataWritten,
    EssenceCopied,
    MetsWritten,
    Bagged,
    Archived,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &str {
        match self {
            Stage::Received => "received",
            Stage::PathsValidated => "paths_validated",
            Stage::SidecarValidated => "sidecar_validated",
            Stage::DirectoryLaidOut => "directory_laid_out",
            Stage::MetadataWritten => "metadata_written",
            Stage::EssenceCopied => "essence_copied",
            Stage::MetsWritten => "mets_written",
            Stage::Bagged => "bagged",
            Stage::Archived => "archived",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The files of one watchfolder delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchfolderDescriptor {
    /// Producer (content partner) name
    pub cp_name: String,
    /// Flow identifier, resolved to an organization label
    pub flow_id: String,
    pub essence: PathBuf,
    pub sidecar: PathBuf,
    /// Auxiliary files, in delivery order
    pub collaterals: Vec<PathBuf>,
}

/// Resolves an organization display name from a flow identifier.
///
/// Shared by concurrent runs; implementations must not rely on mutation.
pub trait OrganizationLookup: Send + Sync {
    fn label_for(&self, flow_id: &str) -> Result<String>;
}

impl<T: OrganizationLookup + ?Sized> OrganizationLookup for Arc<T> {
    fn label_for(&self, flow_id: &str) -> Result<String> {
        (**self).label_for(flow_id)
    }
}

/// Assembler settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Root for working directories and archives. Defaults to the
    /// essence's own directory.
    pub work_dir: Option<PathBuf>,
    pub software: SoftwareAgent,
}

/// A finished package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPackage {
    pub archive_path: PathBuf,
    pub archive_size: u64,
    pub manifest: BagManifest,
    /// Manifest digest of the essence, equal to the sidecar digest
    pub essence_manifest_md5: String,
    pub essence_name: String,
    pub essence_size: u64,
    pub ids: SipIdentitySet,
    pub sidecar: Sidecar,
}

/// What a failed run had computed before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureContext {
    pub sidecar: Option<Sidecar>,
    /// Intermediate directory left on disk
    pub working_dir: Option<PathBuf>,
    /// Archive left on disk
    pub archive_path: Option<PathBuf>,
    pub archive_size: Option<u64>,
    pub manifest_md5: Option<String>,
    pub essence_size: Option<u64>,
}

/// A failed run
#[derive(Error, Debug)]
#[error("SIP assembly failed after stage '{stage}': {error}")]
pub struct AssemblyFailure {
    /// Last stage completed before the failure
    pub stage: Stage,
    #[source]
    pub error: SipError,
    pub context: FailureContext,
}

/// Builds SIPs. One instance serves any number of concurrent runs.
pub struct PackageAssembler {
    config: AssemblerConfig,
    lookup: Arc<dyn OrganizationLookup>,
}

impl std::fmt::Debug for PackageAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageAssembler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct Run {
    essence: String,
    stage: Stage,
    context: FailureContext,
}

impl Run {
    fn advance(&mut self, stage: Stage, path: &Path) {
        self.stage = stage;
        info!(
            essence = %self.essence,
            stage = %stage,
            path = %path.display(),
            "SIP stage reached"
        );
    }
}

impl PackageAssembler {
    pub fn new(config: AssemblerConfig, lookup: Arc<dyn OrganizationLookup>) -> Self {
        Self { config, lookup }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble the SIP for one delivery
    pub fn assemble(
        &self,
        descriptor: &WatchfolderDescriptor,
    ) -> std::result::Result<AssembledPackage, AssemblyFailure> {
        let mut run = Run {
            essence: descriptor.essence.display().to_string(),
            stage: Stage::Received,
            context: FailureContext::default(),
        };
        info!(essence = %run.essence, stage = %run.stage, "SIP creation started");

        match self.run_stages(descriptor, &mut run) {
            Ok(package) => Ok(package),
            Err(error) => {
                error!(
                    essence = %run.essence,
                    stage = %run.stage,
                    kind = %error.kind(),
                    error = %error,
                    "SIP creation failed"
                );
                Err(AssemblyFailure {
                    stage: run.stage,
                    error,
                    context: run.context,
                })
            },
        }
    }

    fn run_stages(
        &self,
        descriptor: &WatchfolderDescriptor,
        run: &mut Run,
    ) -> Result<AssembledPackage> {
        let essence = descriptor.essence.as_path();
        for path in [essence, descriptor.sidecar.as_path()] {
            if !path.is_file() {
                return Err(SipError::InputMissing(path.to_path_buf()));
            }
        }
        let essence_size = std::fs::metadata(essence).at(essence)?.len();
        run.context.essence_size = Some(essence_size);
        run.advance(Stage::PathsValidated, essence);

        let sidecar = Sidecar::parse(&descriptor.sidecar)?;
        run.context.sidecar = Some(sidecar.clone());
        run.advance(Stage::SidecarValidated, &descriptor.sidecar);

        let organization = self.lookup.label_for(&descriptor.flow_id)?;
        let ids = SipIdentitySet::allocate(&descriptor.collaterals)?;
        let essence_name = file_name_of(essence)?;
        let sip_type = classify_sip_type(mimetype_for_path(essence));

        let layout = PackageLayout::for_essence(self.config.work_dir.as_deref(), essence)?;
        layout.reserve()?;
        layout.create()?;
        run.context.working_dir = Some(layout.root().to_path_buf());
        run.advance(Stage::DirectoryLaidOut, layout.root());

        // dc.xml has to exist before the package METS hashes it
        descriptive_record(&ids.ie_id, &sidecar).write_to_file(&layout.dc_xml())?;
        ie_premis(&ids, &sidecar)
            .to_element()
            .write_to_file(&layout.ie_premis())?;
        run.advance(Stage::MetadataWritten, &layout.preservation_dir());

        let target = layout.data_file(&essence_name);
        std::fs::copy(essence, &target).at(&target)?;
        for collateral in &ids.collaterals {
            let target = layout.data_file(&collateral.file_name);
            std::fs::copy(&collateral.source, &target).at(&collateral.source)?;
        }
        run.advance(Stage::EssenceCopied, &layout.representation_data_dir());

        representation_premis(&layout, &ids, &sidecar, &essence_name)?
            .to_element()
            .write_to_file(&layout.representation_premis())?;
        representation_mets(&layout, &ids, &essence_name, &sidecar.md5, sip_type)
            .to_element()?
            .write_to_file(&layout.representation_mets())?;
        package_mets(
            &layout,
            &ids,
            sip_type,
            &organization,
            &descriptor.flow_id,
            &self.config.software,
        )
        .to_element()?
        .write_to_file(&layout.package_mets())?;
        run.advance(Stage::MetsWritten, &layout.package_mets());

        let bag = make_bag(layout.root(), &BagInfo::from_sidecar(&sidecar))?;
        let payload_path = bag_payload_path(&essence_name);
        let manifest_md5 = bag
            .manifest
            .get(&payload_path)
            .map(str::to_string)
            .ok_or_else(|| {
                SipError::InvalidDocument(format!(
                    "Essence '{}' missing from the bag manifest",
                    payload_path
                ))
            })?;
        run.context.manifest_md5 = Some(manifest_md5.clone());
        run.advance(Stage::Bagged, &bag.root);

        let (archive_path, archive_size) = zip_bag(&bag.root)?;
        run.context.archive_path = Some(archive_path.clone());
        run.context.archive_size = Some(archive_size);
        std::fs::remove_dir_all(&bag.root).at(&bag.root)?;
        run.context.working_dir = None;
        run.advance(Stage::Archived, &archive_path);

        // The archive stays on disk on a mismatch
        if !digests_match(&manifest_md5, &sidecar.md5) {
            return Err(SipError::ChecksumMismatch {
                path: archive_path,
                expected: sidecar.md5.to_lowercase(),
                actual: manifest_md5,
            });
        }
        run.advance(Stage::Done, &archive_path);

        Ok(AssembledPackage {
            archive_path,
            archive_size,
            manifest: bag.manifest,
            essence_manifest_md5: manifest_md5,
            essence_name,
            essence_size,
            ids,
            sidecar,
        })
    }
}
