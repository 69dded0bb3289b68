//! Metadata sidecar parsing
//!
//! The sidecar is a flat XML document delivered next to the essence. Only
//! the fields the package needs are read; everything else is ignored.
//!
//! ```xml
//! <VIAA>
//!   <md5>1234abcd...</md5>
//!   <CP_id>OR-abc123</CP_id>
//!   <dc_source>tape_0001.mxf</dc_source>
//!   <dc_identifier_localids>
//!     <Bestandsnaam>tape_0001.mxf</Bestandsnaam>
//!     <Inventarisnummer>INV-1</Inventarisnummer>
//!   </dc_identifier_localids>
//!   <format>XDCAM</format>
//! </VIAA>
//! ```

use crate::error::SidecarError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Local identifier key holding the original filename (preferred spelling)
pub const FILENAME_KEY: &str = "Bestandsnaam";
/// Lowercase spelling of [`FILENAME_KEY`]
pub const FILENAME_KEY_LOWER: &str = "bestandsnaam";

/// Storage format tag marking XDCAM digitisations
pub const XDCAM_FORMAT: &str = "XDCAM";

#[derive(Debug, Default, Deserialize)]
struct RawSidecar {
    md5: Option<String>,
    #[serde(rename = "CP_id")]
    cp_id: Option<String>,
    dc_source: Option<String>,
    dc_identifier_localid: Option<String>,
    dc_identifier_localids: Option<BTreeMap<String, String>>,
    batch_id: Option<String>,

    dc_title: Option<String>,
    dc_title_alternative: Option<String>,
    dc_description: Option<String>,
    dc_created: Option<String>,
    dc_issued: Option<String>,
    dc_subjects: Option<RawSubjects>,

    type_viaa: Option<String>,
    format: Option<String>,
    sp_name: Option<String>,
    sp_id: Option<String>,
    digitization_date: Option<String>,
    digitization_time: Option<String>,
    digitization_note: Option<String>,
    player_manufacturer: Option<String>,
    player_serial_number: Option<String>,
    player_model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSubjects {
    #[serde(rename = "Trefwoord", default)]
    keywords: Vec<String>,
}

/// Descriptive fields carried over into `dc.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptiveFields {
    pub title: Option<String>,
    pub title_alternative: Option<String>,
    pub description: Option<String>,
    pub created: Option<String>,
    pub issued: Option<String>,
    pub subjects: Vec<String>,
}

/// Digitisation provenance, only meaningful for XDCAM material
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XdcamProvenance {
    pub type_viaa: Option<String>,
    /// Storage format tag
    pub format: Option<String>,
    /// Service provider (source player) name
    pub sp_name: Option<String>,
    /// Service provider (source player) agent id
    pub sp_id: Option<String>,
    pub digitization_date: Option<String>,
    pub digitization_time: Option<String>,
    pub digitization_note: Option<String>,
    pub player_manufacturer: Option<String>,
    pub player_serial_number: Option<String>,
    pub player_model: Option<String>,
}

/// Parsed and validated sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    /// Declared MD5 of the essence, trimmed
    pub md5: String,
    pub cp_id: Option<String>,
    pub dc_source: Option<String>,
    pub local_id: Option<String>,
    /// Local identifiers keyed by element name
    pub local_ids: BTreeMap<String, String>,
    pub batch_id: Option<String>,
    pub descriptive: DescriptiveFields,
    pub xdcam: XdcamProvenance,
}

/// Trim a value; blank counts as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl Sidecar {
    /// Read and parse a sidecar file
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, SidecarError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SidecarError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_xml(&content, path)
    }

    /// Parse sidecar content. `origin` is only used in error messages.
    pub fn from_xml(content: &str, origin: &Path) -> Result<Self, SidecarError> {
        check_well_formed(content).map_err(|message| SidecarError::Malformed {
            path: origin.to_path_buf(),
            message,
        })?;
        let raw: RawSidecar =
            quick_xml::de::from_str(content).map_err(|e| SidecarError::Malformed {
                path: origin.to_path_buf(),
                message: format!("XML syntax error: '{}'", e),
            })?;

        let md5 = non_blank(raw.md5).ok_or_else(|| SidecarError::MissingMandatoryField {
            field: "md5".to_string(),
        })?;

        let local_ids = raw
            .dc_identifier_localids
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.trim().to_string()))
            .collect();

        Ok(Self {
            md5,
            cp_id: non_blank(raw.cp_id),
            dc_source: non_blank(raw.dc_source),
            local_id: non_blank(raw.dc_identifier_localid),
            local_ids,
            batch_id: non_blank(raw.batch_id),
            descriptive: DescriptiveFields {
                title: non_blank(raw.dc_title),
                title_alternative: non_blank(raw.dc_title_alternative),
                description: non_blank(raw.dc_description),
                created: non_blank(raw.dc_created),
                issued: non_blank(raw.dc_issued),
                subjects: raw
                    .dc_subjects
                    .map(|s| s.keywords)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| non_blank(Some(s)))
                    .collect(),
            },
            xdcam: XdcamProvenance {
                type_viaa: non_blank(raw.type_viaa),
                format: non_blank(raw.format),
                sp_name: non_blank(raw.sp_name),
                sp_id: non_blank(raw.sp_id),
                digitization_date: non_blank(raw.digitization_date),
                digitization_time: non_blank(raw.digitization_time),
                digitization_note: non_blank(raw.digitization_note),
                player_manufacturer: non_blank(raw.player_manufacturer),
                player_serial_number: non_blank(raw.player_serial_number),
                player_model: non_blank(raw.player_model),
            },
        })
    }

    /// Original filename of the essence, if the sidecar records one.
    ///
    /// Priority: `Bestandsnaam` local id, then `bestandsnaam`, then
    /// `dc_source`.
    pub fn original_filename(&self) -> Option<&str> {
        [FILENAME_KEY, FILENAME_KEY_LOWER]
            .iter()
            .find_map(|key| self.local_ids.get(*key).filter(|v| !v.is_empty()))
            .map(String::as_str)
            .or(self.dc_source.as_deref())
    }

    pub fn is_xdcam(&self) -> bool {
        self.xdcam.format.as_deref() == Some(XDCAM_FORMAT)
    }

    /// Local identifiers that identify the entity, without filename hints
    pub fn entity_local_ids(&self) -> impl Iterator<Item = (&str, &str)> {
        self.local_ids
            .iter()
            .filter(|(key, _)| !is_filename_key(key))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Walk the whole document: exactly one root element, balanced tags, and
/// nothing but whitespace, comments or PIs around the root
fn check_well_formed(content: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(content);
    let mut depth = 0usize;
    let mut seen_root = false;
    loop {
        let event = reader.read_event().map_err(|e| {
            format!(
                "XML syntax error at position {}: '{}'",
                reader.buffer_position(),
                e
            )
        })?;
        match event {
            Event::Eof => break,
            Event::Start(_) | Event::Empty(_) if depth == 0 && seen_root => {
                return Err("Extra content at the end of the document".to_string());
            },
            Event::Start(_) => {
                seen_root = true;
                depth += 1;
            },
            Event::Empty(_) if depth == 0 => seen_root = true,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(text) if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) => {
                return Err("Text outside the root element".to_string());
            },
            Event::CData(_) if depth == 0 => {
                return Err("CDATA outside the root element".to_string());
            },
            _ => {},
        }
    }
    if !seen_root {
        return Err("Document has no root element".to_string());
    }
    if depth > 0 {
        return Err("Premature end of document, root element not closed".to_string());
    }
    Ok(())
}

fn is_filename_key(key: &str) -> bool {
    key == FILENAME_KEY || key == FILENAME_KEY_LOWER
}
