//! Common types used across the SIP creator

use serde::{Deserialize, Serialize};

/// Checksum algorithm type
///
/// MD5 is the fixity algorithm the sidecar declares and the one the bag
/// manifest is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl ChecksumAlgorithm {
    /// Label used in BagIt manifest file names (`manifest-<label>.txt`)
    pub fn bagit_label(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }

    /// Label used in METS `CHECKSUMTYPE` attributes
    pub fn mets_label(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "MD5",
            ChecksumAlgorithm::Sha256 => "SHA-256",
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.bagit_label())
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(crate::Error::Parse(format!(
                "Unsupported checksum algorithm: {}",
                other
            ))),
        }
    }
}
