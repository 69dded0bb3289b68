//! On-disk package layout and per-run identifiers
//!
//! ```text
//! <essence-stem>/
//!   mets.xml
//!   metadata/descriptive/dc.xml
//!   metadata/preservation/premis.xml
//!   representations/representation_1/
//!     mets.xml
//!     data/<essence>[, collaterals...]
//!     metadata/descriptive/
//!     metadata/preservation/premis.xml
//! ```

use crate::error::{IoResultExt, Result, SipError};
use sipin_common::ids::new_id;
use std::path::{Path, PathBuf};

pub const METS_FILE: &str = "mets.xml";
pub const DC_FILE: &str = "dc.xml";
pub const PREMIS_FILE: &str = "premis.xml";
pub const REPRESENTATIONS_DIR: &str = "representations";
pub const REPRESENTATION_DIR: &str = "representation_1";

/// Path of a representation data file inside the bag payload
pub fn bag_payload_path(file_name: &str) -> String {
    format!(
        "data/{}/{}/data/{}",
        REPRESENTATIONS_DIR, REPRESENTATION_DIR, file_name
    )
}

/// Bare file name of a path as UTF-8
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| SipError::InvalidDocument(format!("No file name in '{}'", path.display())))
}

/// File stem of a path as UTF-8
pub fn file_stem_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| SipError::InvalidDocument(format!("No file stem in '{}'", path.display())))
}

/// Directory tree of one SIP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    root: PathBuf,
}

impl PackageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Working directory for an essence: `<base>/<essence stem>`, where base
    /// defaults to the essence's own directory
    pub fn for_essence(work_dir: Option<&Path>, essence: &Path) -> Result<Self> {
        let stem = file_stem_of(essence)?;
        let base = match work_dir {
            Some(dir) => dir.to_path_buf(),
            None => essence
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Ok(Self::new(base.join(stem)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_mets(&self) -> PathBuf {
        self.root.join(METS_FILE)
    }

    pub fn descriptive_dir(&self) -> PathBuf {
        self.root.join("metadata").join("descriptive")
    }

    pub fn preservation_dir(&self) -> PathBuf {
        self.root.join("metadata").join("preservation")
    }

    pub fn dc_xml(&self) -> PathBuf {
        self.descriptive_dir().join(DC_FILE)
    }

    pub fn ie_premis(&self) -> PathBuf {
        self.preservation_dir().join(PREMIS_FILE)
    }

    pub fn representation_dir(&self) -> PathBuf {
        self.root.join(REPRESENTATIONS_DIR).join(REPRESENTATION_DIR)
    }

    pub fn representation_mets(&self) -> PathBuf {
        self.representation_dir().join(METS_FILE)
    }

    pub fn representation_data_dir(&self) -> PathBuf {
        self.representation_dir().join("data")
    }

    pub fn representation_descriptive_dir(&self) -> PathBuf {
        self.representation_dir().join("metadata").join("descriptive")
    }

    pub fn representation_preservation_dir(&self) -> PathBuf {
        self.representation_dir().join("metadata").join("preservation")
    }

    pub fn representation_premis(&self) -> PathBuf {
        self.representation_preservation_dir().join(PREMIS_FILE)
    }

    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.representation_data_dir().join(file_name)
    }

    /// Claim the root directory for this run. An existing root belongs to
    /// an earlier run and is left untouched.
    pub fn reserve(&self) -> Result<()> {
        if let Some(parent) = self.root.parent() {
            std::fs::create_dir_all(parent).at(parent)?;
        }
        std::fs::create_dir(&self.root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                SipError::filesystem(
                    &self.root,
                    std::io::Error::new(
                        e.kind(),
                        "working directory already exists, left by an earlier run",
                    ),
                )
            } else {
                SipError::filesystem(&self.root, e)
            }
        })
    }

    /// Create every directory of the layout. Safe to call repeatedly.
    pub fn create(&self) -> Result<()> {
        for dir in [
            self.descriptive_dir(),
            self.preservation_dir(),
            self.representation_data_dir(),
            self.representation_descriptive_dir(),
            self.representation_preservation_dir(),
        ] {
            std::fs::create_dir_all(&dir).at(&dir)?;
        }
        Ok(())
    }
}

/// A collateral file and the identifier allocated for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collateral {
    pub id: String,
    pub source: PathBuf,
    pub file_name: String,
}

/// Identifiers allocated once per run and shared by METS and PREMIS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipIdentitySet {
    pub ie_id: String,
    pub representation_id: String,
    pub file_id: String,
    pub collaterals: Vec<Collateral>,
}

impl SipIdentitySet {
    pub fn allocate(collaterals: &[PathBuf]) -> Result<Self> {
        let collaterals = collaterals
            .iter()
            .map(|source| {
                Ok(Collateral {
                    id: new_id(),
                    file_name: file_name_of(source)?,
                    source: source.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            ie_id: new_id(),
            representation_id: new_id(),
            file_id: new_id(),
            collaterals,
        })
    }

    pub fn collateral_ids(&self) -> Vec<String> {
        self.collaterals.iter().map(|c| c.id.clone()).collect()
    }

    /// Every identifier in the set
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids = vec![
            self.ie_id.as_str(),
            self.representation_id.as_str(),
            self.file_id.as_str(),
        ];
        ids.extend(self.collaterals.iter().map(|c| c.id.as_str()));
        ids
    }
}
