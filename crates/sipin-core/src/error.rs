//! Error types for SIP assembly
//!
//! [`SipError`] is the run-level taxonomy a transport layer acts on.
//! [`SidecarError`] is the narrower error of the sidecar parser and folds
//! into [`SipError`].

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for SIP assembly operations
pub type Result<T> = std::result::Result<T, SipError>;

/// Errors raised while parsing a metadata sidecar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidecarError {
    /// The sidecar is not well-formed XML
    #[error("Malformed sidecar '{}': {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    /// A mandatory element is absent or blank
    #[error("Missing mandatory key: '{field}'")]
    MissingMandatoryField { field: String },
}

/// Errors that end a SIP creation run
#[derive(Error, Debug)]
pub enum SipError {
    /// Essence or sidecar does not exist
    #[error("Input file not found: '{}'", .0.display())]
    InputMissing(PathBuf),

    /// Sidecar could not be parsed
    #[error("Sidecar not valid. Malformed document '{}': {message}", .path.display())]
    MalformedSidecar { path: PathBuf, message: String },

    /// Sidecar lacks the fixity digest
    #[error("Sidecar not valid. Missing mandatory key: '{field}'")]
    MissingMandatoryField { field: String },

    /// The organization label could not be resolved
    #[error("Organization lookup unavailable: {0}")]
    LookupUnavailable(String),

    /// The bag manifest disagrees with the sidecar digest
    #[error("Supplied MD5 differs from the calculated MD5 for '{}': sidecar {expected}, manifest {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Disk full, permissions, vanished files
    #[error("Filesystem operation failed on '{}': {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A metadata document could not be built or serialised
    #[error("Invalid metadata document: {0}")]
    InvalidDocument(String),
}

/// Coarse classification of a [`SipError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputMissing,
    MalformedSidecar,
    MissingMandatoryField,
    LookupUnavailable,
    ChecksumMismatch,
    Filesystem,
    InvalidDocument,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InputMissing => "input_missing",
            ErrorKind::MalformedSidecar => "malformed_sidecar",
            ErrorKind::MissingMandatoryField => "missing_mandatory_field",
            ErrorKind::LookupUnavailable => "lookup_unavailable",
            ErrorKind::ChecksumMismatch => "checksum_mismatch",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::InvalidDocument => "invalid_document",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SipError {
    /// Build a filesystem error for the given path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SipError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Map an error from the shared utilities onto the run taxonomy
    pub fn from_common(path: &Path, err: sipin_common::Error) -> Self {
        match err {
            sipin_common::Error::Io(source) => SipError::filesystem(path, source),
            sipin_common::Error::ChecksumMismatch { expected, actual } => {
                SipError::ChecksumMismatch {
                    path: path.to_path_buf(),
                    expected,
                    actual,
                }
            },
            other => SipError::InvalidDocument(other.to_string()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SipError::InputMissing(_) => ErrorKind::InputMissing,
            SipError::MalformedSidecar { .. } => ErrorKind::MalformedSidecar,
            SipError::MissingMandatoryField { .. } => ErrorKind::MissingMandatoryField,
            SipError::LookupUnavailable(_) => ErrorKind::LookupUnavailable,
            SipError::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            SipError::Filesystem { .. } => ErrorKind::Filesystem,
            SipError::InvalidDocument(_) => ErrorKind::InvalidDocument,
        }
    }

    /// Only lookup failures are worth redelivering
    pub fn is_retryable(&self) -> bool {
        matches!(self, SipError::LookupUnavailable(_))
    }
}

impl From<SidecarError> for SipError {
    fn from(err: SidecarError) -> Self {
        match err {
            SidecarError::Malformed { path, message } => {
                SipError::MalformedSidecar { path, message }
            },
            SidecarError::MissingMandatoryField { field } => {
                SipError::MissingMandatoryField { field }
            },
        }
    }
}

/// Attach the offending path to an I/O result
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| SipError::filesystem(path, source))
    }
}
