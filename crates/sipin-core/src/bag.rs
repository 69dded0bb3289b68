//! BagIt 0.97 packaging
//!
//! [`make_bag`] turns an assembled SIP directory into a bag in place: the
//! existing content moves under `data/` and the tag files are written
//! next to it.

use crate::error::{IoResultExt, Result, SipError};
use crate::sidecar::Sidecar;
use chrono::Local;
use sipin_common::{checksum::md5_file, ids::new_id};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const BAGIT_VERSION: &str = "0.97";
pub const PAYLOAD_DIR: &str = "data";
pub const BAGIT_TXT: &str = "bagit.txt";
pub const BAG_INFO_TXT: &str = "bag-info.txt";
pub const MANIFEST_TXT: &str = "manifest-md5.txt";
pub const TAG_MANIFEST_TXT: &str = "tagmanifest-md5.txt";

/// Source-player name that marks a tape digitisation workflow
pub const TAPE_WORKFLOW: &str = "TAPE";

/// Extra `bag-info.txt` fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagInfo {
    pub batch_id: Option<String>,
    pub workflow: Option<String>,
}

impl BagInfo {
    pub fn from_sidecar(sidecar: &Sidecar) -> Self {
        Self {
            batch_id: sidecar.batch_id.clone(),
            workflow: sidecar
                .xdcam
                .sp_name
                .as_deref()
                .filter(|name| *name == TAPE_WORKFLOW)
                .map(str::to_string),
        }
    }
}

/// Payload manifest: bag-relative path to MD5
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagManifest {
    entries: BTreeMap<String, String>,
}

impl BagManifest {
    /// Parse `manifest-md5.txt` of an existing bag
    pub fn read(bag_root: &Path) -> Result<Self> {
        let path = bag_root.join(MANIFEST_TXT);
        let content = std::fs::read_to_string(&path).at(&path)?;
        let mut entries = BTreeMap::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let (digest, file) = line.split_once(char::is_whitespace).ok_or_else(|| {
                SipError::InvalidDocument(format!("Malformed manifest line: '{}'", line))
            })?;
            entries.insert(file.trim_start().to_string(), digest.to_lowercase());
        }
        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A bag on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bag {
    pub root: PathBuf,
    pub manifest: BagManifest,
}

/// Convert `dir` into a bag
pub fn make_bag(dir: &Path, info: &BagInfo) -> Result<Bag> {
    let staging = dir.join(format!(".{}", new_id()));
    std::fs::create_dir(&staging).at(&staging)?;
    for entry in std::fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        let from = entry.path();
        if from == staging {
            continue;
        }
        let to = staging.join(entry.file_name());
        std::fs::rename(&from, &to).at(&from)?;
    }
    let payload = dir.join(PAYLOAD_DIR);
    std::fs::rename(&staging, &payload).at(&payload)?;

    let mut manifest = String::new();
    let mut total_bytes = 0u64;
    let mut file_count = 0u64;
    for entry in WalkDir::new(&payload).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(&payload, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let digest = md5_file(entry.path()).map_err(|e| SipError::from_common(entry.path(), e))?;
        total_bytes += entry.metadata().map_err(|e| walk_error(entry.path(), e))?.len();
        file_count += 1;
        manifest.push_str(&format!("{}  {}\n", digest, relative_path(dir, entry.path())?));
    }

    write_tag_file(dir, MANIFEST_TXT, &manifest)?;
    write_tag_file(
        dir,
        BAGIT_TXT,
        &format!(
            "BagIt-Version: {}\nTag-File-Character-Encoding: UTF-8\n",
            BAGIT_VERSION
        ),
    )?;

    let mut bag_info = format!(
        "Bag-Software-Agent: sipin-sip-creator v{}\nBagging-Date: {}\nPayload-Oxum: {}.{}\n",
        env!("CARGO_PKG_VERSION"),
        Local::now().format("%Y-%m-%d"),
        total_bytes,
        file_count
    );
    if let Some(batch_id) = &info.batch_id {
        bag_info.push_str(&format!("Meemoo-Batch-Identifier: {}\n", batch_id));
    }
    if let Some(workflow) = &info.workflow {
        bag_info.push_str(&format!("Meemoo-Workflow: {}\n", workflow));
    }
    write_tag_file(dir, BAG_INFO_TXT, &bag_info)?;

    let mut tag_manifest = String::new();
    for name in [BAG_INFO_TXT, BAGIT_TXT, MANIFEST_TXT] {
        let path = dir.join(name);
        let digest = md5_file(&path).map_err(|e| SipError::from_common(&path, e))?;
        tag_manifest.push_str(&format!("{}  {}\n", digest, name));
    }
    write_tag_file(dir, TAG_MANIFEST_TXT, &tag_manifest)?;

    Ok(Bag {
        root: dir.to_path_buf(),
        manifest: BagManifest::read(dir)?,
    })
}

fn write_tag_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, content).at(&path)
}

fn walk_error(path: &Path, err: walkdir::Error) -> SipError {
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
    SipError::filesystem(path, source)
}

/// `/`-separated path of `path` relative to `base`
pub fn relative_path(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        SipError::InvalidDocument(format!(
            "'{}' is not inside '{}'",
            path.display(),
            base.display()
        ))
    })?;
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().map(str::to_string).ok_or_else(|| {
                SipError::InvalidDocument(format!("Non UTF-8 path '{}'", path.display()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sip_dir(dir: &TempDir) -> PathBuf {
        let root = dir.path().join("video");
        std::fs::create_dir_all(root.join("representations/representation_1/data")).unwrap();
        std::fs::write(root.join("mets.xml"), "<mets/>").unwrap();
        std::fs::write(
            root.join("representations/representation_1/data/video.mxf"),
            "hello world",
        )
        .unwrap();
        root
    }

    #[test]
    fn test_make_bag_layout_and_manifest() {
        let dir = TempDir::new().unwrap();
        let root = sip_dir(&dir);

        let bag = make_bag(
            &root,
            &BagInfo {
                batch_id: Some("BATCH-7".into()),
                workflow: Some("TAPE".into()),
            },
        )
        .unwrap();

        assert!(root.join("data/mets.xml").is_file());
        assert!(!root.join("mets.xml").exists());
        assert_eq!(bag.manifest.len(), 2);
        assert_eq!(
            bag.manifest
                .get("data/representations/representation_1/data/video.mxf"),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );

        let bagit = std::fs::read_to_string(root.join(BAGIT_TXT)).unwrap();
        assert_eq!(
            bagit,
            "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n"
        );

        let info = std::fs::read_to_string(root.join(BAG_INFO_TXT)).unwrap();
        assert!(info.contains("Payload-Oxum: 18.2\n"));
        assert!(info.contains("Meemoo-Batch-Identifier: BATCH-7\n"));
        assert!(info.contains("Meemoo-Workflow: TAPE\n"));

        let tags = std::fs::read_to_string(root.join(TAG_MANIFEST_TXT)).unwrap();
        assert_eq!(tags.lines().count(), 3);
        assert!(tags.contains("  manifest-md5.txt"));
    }

    #[test]
    fn test_bag_info_without_extras() {
        let dir = TempDir::new().unwrap();
        let root = sip_dir(&dir);
        make_bag(&root, &BagInfo::default()).unwrap();

        let info = std::fs::read_to_string(root.join(BAG_INFO_TXT)).unwrap();
        assert!(!info.contains("Meemoo-"));
        assert!(info.contains("Bagging-Date: "));
    }

    #[test]
    fn test_bag_info_from_sidecar() {
        let sidecar = Sidecar::from_xml(
            "<VIAA><md5>abc</md5><sp_name>TAPE</sp_name></VIAA>",
            Path::new("s.xml"),
        )
        .unwrap();
        let info = BagInfo::from_sidecar(&sidecar);
        assert_eq!(info.workflow.as_deref(), Some("TAPE"));
        assert_eq!(info.batch_id, None);

        let sidecar = Sidecar::from_xml(
            "<VIAA><md5>abc</md5><sp_name>DISC</sp_name><batch_id>B</batch_id></VIAA>",
            Path::new("s.xml"),
        )
        .unwrap();
        let info = BagInfo::from_sidecar(&sidecar);
        assert_eq!(info.workflow, None);
        assert_eq!(info.batch_id.as_deref(), Some("B"));
    }

    #[test]
    fn test_manifest_names_follow_algorithm() {
        let label = sipin_common::types::ChecksumAlgorithm::Md5.bagit_label();
        assert_eq!(MANIFEST_TXT, format!("manifest-{}.txt", label));
        assert_eq!(TAG_MANIFEST_TXT, format!("tagmanifest-{}.txt", label));
    }

    #[test]
    fn test_relative_path_outside_base() {
        let err = relative_path(Path::new("/bags/a"), Path::new("/bags/b/x.txt")).unwrap_err();
        assert!(matches!(err, SipError::InvalidDocument(_)));
    }

    proptest::proptest! {
        #[test]
        fn prop_relative_path_uses_forward_slashes(
            segments in proptest::collection::vec("[a-z0-9_]{1,8}", 1..5),
        ) {
            let base = Path::new("/bags/video");
            let path = segments.iter().fold(base.to_path_buf(), |p, s| p.join(s));
            proptest::prop_assert_eq!(relative_path(base, &path).unwrap(), segments.join("/"));
        }
    }

    #[test]
    fn test_manifest_read_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_TXT), "no-separator\n").unwrap();
        assert!(matches!(
            BagManifest::read(dir.path()).unwrap_err(),
            SipError::InvalidDocument(_)
        ));
    }
}
