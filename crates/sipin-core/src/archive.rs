//! Zip archiving of a finished bag

use crate::bag::relative_path;
use crate::error::{IoResultExt, Result, SipError};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_SUFFIX: &str = ".bag.zip";

/// `<bag dir>.bag.zip`, next to the bag directory
pub fn archive_path_for(bag_dir: &Path) -> Result<PathBuf> {
    let name = crate::layout::file_name_of(bag_dir)?;
    Ok(bag_dir.with_file_name(format!("{}{}", name, ARCHIVE_SUFFIX)))
}

/// Zip `bag_dir` with entry names relative to it.
///
/// Returns the archive path and its size in bytes.
pub fn zip_bag(bag_dir: &Path) -> Result<(PathBuf, u64)> {
    let target = archive_path_for(bag_dir)?;
    let file = File::create(&target).at(&target)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    for entry in WalkDir::new(bag_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            SipError::filesystem(bag_dir, source)
        })?;
        let name = relative_path(bag_dir, entry.path())?;
        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{}/", name), options)
                .map_err(|e| zip_error(&target, e))?;
        } else {
            writer
                .start_file(name, options)
                .map_err(|e| zip_error(&target, e))?;
            let mut source = File::open(entry.path()).at(entry.path())?;
            std::io::copy(&mut source, &mut writer).at(&target)?;
        }
    }

    writer.finish().map_err(|e| zip_error(&target, e))?;
    let size = std::fs::metadata(&target).at(&target)?.len();
    tracing::debug!(path = %target.display(), size, "Archive written");
    Ok((target, size))
}

fn zip_error(path: &Path, err: ZipError) -> SipError {
    match err {
        ZipError::Io(source) => SipError::filesystem(path, source),
        other => SipError::InvalidDocument(format!(
            "Failed to write archive '{}': {}",
            path.display(),
            other
        )),
    }
}
