//! Shared fixtures for SIP assembly integration tests

#![allow(dead_code)]

use sipin_core::{
    AssemblerConfig, OrganizationLookup, PackageAssembler, SipError, WatchfolderDescriptor,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// MD5 of [`ESSENCE_CONTENT`]
pub const ESSENCE_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";
pub const ESSENCE_CONTENT: &str = "hello world";
pub const ORGANIZATION: &str = "Het Archief";

// ============================================================================
// Lookup doubles
// ============================================================================

pub struct StaticLookup(pub &'static str);

impl OrganizationLookup for StaticLookup {
    fn label_for(&self, _flow_id: &str) -> sipin_core::Result<String> {
        Ok(self.0.to_string())
    }
}

pub struct UnreachableLookup;

impl OrganizationLookup for UnreachableLookup {
    fn label_for(&self, flow_id: &str) -> sipin_core::Result<String> {
        Err(SipError::LookupUnavailable(format!(
            "no route to lookup service for '{}'",
            flow_id
        )))
    }
}

pub fn assembler() -> PackageAssembler {
    PackageAssembler::new(AssemblerConfig::default(), Arc::new(StaticLookup(ORGANIZATION)))
}

// ============================================================================
// Delivery fixture
// ============================================================================

/// Builder for a watchfolder delivery on disk
pub struct DeliveryFixture {
    sidecar_body: String,
    collaterals: Vec<(&'static str, &'static str)>,
}

impl DeliveryFixture {
    /// Delivery whose sidecar declares the correct digest
    pub fn new() -> Self {
        Self::with_md5(ESSENCE_MD5)
    }

    pub fn with_md5(md5: &str) -> Self {
        Self {
            sidecar_body: format!("<md5>{}</md5>", md5),
            collaterals: Vec::new(),
        }
    }

    /// Append raw elements to the sidecar
    pub fn sidecar_xml(mut self, xml: &str) -> Self {
        self.sidecar_body.push_str(xml);
        self
    }

    pub fn collateral(mut self, name: &'static str, content: &'static str) -> Self {
        self.collaterals.push((name, content));
        self
    }

    pub fn write(self, dir: &TempDir) -> WatchfolderDescriptor {
        let essence = dir.path().join("video.mxf");
        let sidecar = dir.path().join("video.xml");
        std::fs::write(&essence, ESSENCE_CONTENT).unwrap();
        std::fs::write(
            &sidecar,
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<VIAA>{}</VIAA>",
                self.sidecar_body
            ),
        )
        .unwrap();

        let collaterals = self
            .collaterals
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                std::fs::write(&path, content).unwrap();
                path
            })
            .collect();

        WatchfolderDescriptor {
            cp_name: "Testomroep".into(),
            flow_id: "OR-abc123".into(),
            essence,
            sidecar,
            collaterals,
        }
    }
}

// ============================================================================
// Archive inspection
// ============================================================================

pub fn read_zip_entry(archive: &Path, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut content = String::new();
    zip.by_name(name)
        .unwrap_or_else(|_| panic!("missing entry {}", name))
        .read_to_string(&mut content)
        .unwrap();
    content
}

pub fn zip_entry_names(archive: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    zip.file_names().map(str::to_string).collect()
}

/// Bodies of every `<{tag} ...>...</{tag}>` element in `xml`
pub fn element_blocks<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open_plain = format!("<{}>", tag);
    let open_attrs = format!("<{} ", tag);
    let close = format!("</{}>", tag);

    let mut blocks = Vec::new();
    let mut rest = xml;
    loop {
        let start = match (rest.find(&open_plain), rest.find(&open_attrs)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => break,
        };
        let Some(len) = rest[start..].find(&close) else {
            break;
        };
        blocks.push(&rest[start..start + len]);
        rest = &rest[start + len + close.len()..];
    }
    blocks
}
