//! Checksum utilities for fixity verification
//!
//! Digests are computed by streaming the input through a fixed-size buffer,
//! so essences of several hundred gigabytes never have to fit in memory.

use crate::error::{Error, Result};
use crate::types::ChecksumAlgorithm;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Read buffer size used for streaming digests
pub const CHUNK_SIZE: usize = 8192;

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute the MD5 digest of a file as lowercase hex
pub fn md5_file(path: impl AsRef<Path>) -> Result<String> {
    compute_file_checksum(path, ChecksumAlgorithm::Md5)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut buffer = [0u8; CHUNK_SIZE];

    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }

            Ok(format!("{:x}", context.compute()))
        },
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }

            Ok(hex::encode(hasher.finalize()))
        },
    }
}

/// Compare two hex digests, ignoring case and surrounding whitespace
pub fn digests_match(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Verify checksum for a file
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<()> {
    let actual = compute_file_checksum(path, algorithm)?;
    if digests_match(&actual, expected) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
