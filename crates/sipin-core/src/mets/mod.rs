//! METS document model with the E-ARK CSIP/SIP extensions
//!
//! A [`MetsDocument`] holds agents, references to descriptive and
//! provenance metadata, and a tree of [`FileGroup`]s mirroring the package
//! directories. The same tree renders twice: once as the nested
//! `mets:fileSec` and once as the `mets:structMap`.
//!
//! File attributes (size, creation time, mimetype, MD5) are read from disk
//! when the document is rendered, never when it is built.

mod builder;

pub use builder::{package_mets, representation_mets, SoftwareAgent};

use crate::error::{IoResultExt, Result, SipError};
use crate::xml::Element;
use chrono::{DateTime, Local};
use sipin_common::types::ChecksumAlgorithm;
use sipin_common::{checksum::md5_file, ids::new_id, mimetype::mimetype_for_path};
use std::path::PathBuf;

pub const NS_METS: &str = "http://www.loc.gov/METS/";
pub const NS_CSIP: &str = "https://DILCIS.eu/XML/METS/CSIPExtensionMETS";
pub const NS_SIP: &str = "https://DILCIS.eu/XML/METS/SIPExtensionMETS";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";

pub const PROFILE: &str = "https://earksip.dilcis.eu/profile/E-ARK-SIP.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Creator,
    Editor,
    Archivist,
    Preservation,
    Disseminator,
    Custodian,
    IpOwner,
    Other,
}

impl AgentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Creator => "CREATOR",
            AgentRole::Editor => "EDITOR",
            AgentRole::Archivist => "ARCHIVIST",
            AgentRole::Preservation => "PRESERVATION",
            AgentRole::Disseminator => "DISSEMINATOR",
            AgentRole::Custodian => "CUSTODIAN",
            AgentRole::IpOwner => "IPOWNER",
            AgentRole::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentType {
    Individual,
    Organization,
    Other,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Individual => "INDIVIDUAL",
            AgentType::Organization => "ORGANIZATION",
            AgentType::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteType {
    SoftwareVersion,
    IdentificationCode,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::SoftwareVersion => "SOFTWARE VERSION",
            NoteType::IdentificationCode => "IDENTIFICATIONCODE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub value: String,
    pub note_type: Option<NoteType>,
}

impl Note {
    pub fn new(value: impl Into<String>, note_type: NoteType) -> Self {
        Self {
            value: value.into(),
            note_type: Some(note_type),
        }
    }

    fn to_element(&self) -> Element {
        Element::with_text("mets:note", self.value.as_str())
            .attr_opt("csip:NOTETYPE", self.note_type.map(NoteType::as_str))
    }
}

/// A `mets:agent` in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub role: AgentRole,
    pub agent_type: AgentType,
    /// Required when `role` is [`AgentRole::Other`]
    pub other_role: Option<String>,
    /// Required when `agent_type` is [`AgentType::Other`]
    pub other_type: Option<String>,
    pub name: Option<String>,
    pub note: Option<Note>,
}

impl Agent {
    pub fn new(role: AgentRole, agent_type: AgentType) -> Self {
        Self {
            role,
            agent_type,
            other_role: None,
            other_type: None,
            name: None,
            note: None,
        }
    }

    pub fn other_role(mut self, other_role: impl Into<String>) -> Self {
        self.other_role = Some(other_role.into());
        self
    }

    pub fn other_type(mut self, other_type: impl Into<String>) -> Self {
        self.other_type = Some(other_type.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn note(mut self, note: Note) -> Self {
        self.note = Some(note);
        self
    }

    fn to_element(&self) -> Result<Element> {
        if self.role == AgentRole::Other && self.other_role.is_none() {
            return Err(SipError::InvalidDocument(
                "The field 'other_role' is mandatory when role is 'OTHER'".to_string(),
            ));
        }
        if self.agent_type == AgentType::Other && self.other_type.is_none() {
            return Err(SipError::InvalidDocument(
                "The field 'other_type' is mandatory when type is 'OTHER'".to_string(),
            ));
        }

        let mut element = Element::new("mets:agent")
            .attr("ROLE", self.role.as_str())
            .attr_opt("OTHERROLE", self.other_role.as_deref())
            .attr("TYPE", self.agent_type.as_str())
            .attr_opt("OTHERTYPE", self.other_type.as_deref())
            .text_child_opt("mets:name", self.name.as_deref());
        if let Some(note) = &self.note {
            element.push(note.to_element());
        }
        Ok(element)
    }
}

/// Where a file's MD5 comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumSource {
    /// Digest supplied by the producer, written as-is
    Declared(String),
    /// Digest computed from the file at render time
    Computed,
}

/// A file on disk and how the METS document refers to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Absolute location, used to stat the file
    pub path: PathBuf,
    /// Location relative to the directory holding the METS file, `/`-separated
    pub href: String,
    pub checksum: ChecksumSource,
}

struct FileStat {
    size: u64,
    created: String,
    mimetype: Option<&'static str>,
    checksum: String,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>, href: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            href: href.into(),
            checksum: ChecksumSource::Computed,
        }
    }

    pub fn declared(mut self, md5: impl Into<String>) -> Self {
        self.checksum = ChecksumSource::Declared(md5.into());
        self
    }

    fn stat(&self) -> Result<FileStat> {
        let metadata = std::fs::metadata(&self.path).at(&self.path)?;
        // Not every filesystem records a birth time
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .at(&self.path)?;
        let checksum = match &self.checksum {
            ChecksumSource::Declared(md5) => md5.clone(),
            ChecksumSource::Computed => {
                md5_file(&self.path).map_err(|e| SipError::from_common(&self.path, e))?
            },
        };

        Ok(FileStat {
            size: metadata.len(),
            created: DateTime::<Local>::from(created).to_rfc3339(),
            mimetype: mimetype_for_path(&self.path),
            checksum,
        })
    }

    fn with_file_attrs(&self, element: Element) -> Result<Element> {
        let stat = self.stat()?;
        Ok(element
            .attr_opt("MIMETYPE", stat.mimetype)
            .attr("SIZE", stat.size.to_string())
            .attr("CREATED", stat.created)
            .attr("CHECKSUM", stat.checksum)
            .attr("CHECKSUMTYPE", ChecksumAlgorithm::Md5.mets_label()))
    }

    fn locator(&self, name: &str) -> Element {
        Element::new(name)
            .attr("LOCTYPE", "URL")
            .attr("xlink:type", "simple")
            .attr("xlink:href", self.href.as_str())
    }
}

/// How the structural map points at a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    /// `mets:fptr` to the file's `fileSec` entry
    File,
    /// `mets:mptr` to a nested METS document
    Mets,
}

/// A `mets:file` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    pub usage: String,
    pub file: FileRef,
    pub pointer: Pointer,
}

impl FileEntry {
    pub fn new(id: impl Into<String>, usage: impl Into<String>, file: FileRef) -> Self {
        Self {
            id: id.into(),
            usage: usage.into(),
            file,
            pointer: Pointer::File,
        }
    }

    /// Entry for a nested METS document
    pub fn mets(usage: impl Into<String>, file: FileRef) -> Self {
        Self {
            pointer: Pointer::Mets,
            ..Self::new(new_id(), usage, file)
        }
    }
}

/// A directory, rendered as `mets:fileGrp` and `mets:div`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub id: String,
    pub div_id: String,
    pub usage: String,
    pub label: String,
    pub children: Vec<FileNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    Group(FileGroup),
    File(FileEntry),
}

impl FileGroup {
    pub fn new(usage: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            div_id: new_id(),
            usage: usage.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn group(mut self, group: FileGroup) -> Self {
        self.children.push(FileNode::Group(group));
        self
    }

    pub fn file(mut self, file: FileEntry) -> Self {
        self.children.push(FileNode::File(file));
        self
    }

    /// All file entries in the subtree, depth-first
    pub fn files(&self) -> Vec<&FileEntry> {
        let mut files = Vec::new();
        for child in &self.children {
            match child {
                FileNode::Group(group) => files.extend(group.files()),
                FileNode::File(file) => files.push(file),
            }
        }
        files
    }

    fn to_file_grp(&self) -> Result<Element> {
        let mut element = Element::new("mets:fileGrp")
            .attr("ID", self.id.as_str())
            .attr("USE", self.usage.as_str());
        for child in &self.children {
            match child {
                FileNode::Group(group) => element.push(group.to_file_grp()?),
                FileNode::File(entry) => {
                    let file = Element::new("mets:file")
                        .attr("ID", entry.id.as_str())
                        .attr("USE", entry.usage.as_str());
                    let file = entry.file.with_file_attrs(file)?;
                    element.push(file.child(entry.file.locator("mets:FLocat")));
                },
            }
        }
        Ok(element)
    }

    fn to_div(&self) -> Element {
        let mut element = Element::new("mets:div")
            .attr("ID", self.div_id.as_str())
            .attr("LABEL", self.label.as_str());
        for child in &self.children {
            match child {
                FileNode::Group(group) => element.push(group.to_div()),
                FileNode::File(entry) => match entry.pointer {
                    Pointer::File => {
                        element.push(Element::new("mets:fptr").attr("FILEID", entry.id.as_str()))
                    },
                    Pointer::Mets => element.push(entry.file.locator("mets:mptr")),
                },
            }
        }
        element
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdType {
    Dc,
    Premis,
}

impl MdType {
    pub fn as_str(self) -> &'static str {
        match self {
            MdType::Dc => "DC",
            MdType::Premis => "PREMIS",
        }
    }
}

/// A metadata file referenced from a `dmdSec` or `digiprovMD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSection {
    pub id: String,
    pub md_type: MdType,
    pub file: FileRef,
}

impl MetadataSection {
    fn md_ref(&self) -> Result<Element> {
        let md_ref = self.file.locator("mets:mdRef").attr("MDTYPE", self.md_type.as_str());
        self.file.with_file_attrs(md_ref)
    }
}

/// Package-level or representation-level document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetsKind {
    Package,
    Representation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetsDocument {
    pub kind: MetsKind,
    pub obj_id: String,
    pub sip_type: String,
    pub created: DateTime<Local>,
    pub agents: Vec<Agent>,
    pub descriptive: Vec<MetadataSection>,
    pub provenance: Vec<MetadataSection>,
    pub root: FileGroup,
    amd_sec_id: String,
    file_sec_id: String,
    struct_map_id: String,
}

impl MetsDocument {
    pub fn new(
        kind: MetsKind,
        obj_id: impl Into<String>,
        sip_type: impl Into<String>,
        root: FileGroup,
    ) -> Self {
        Self {
            kind,
            obj_id: obj_id.into(),
            sip_type: sip_type.into(),
            created: Local::now(),
            agents: Vec::new(),
            descriptive: Vec::new(),
            provenance: Vec::new(),
            root,
            amd_sec_id: new_id(),
            file_sec_id: new_id(),
            struct_map_id: new_id(),
        }
    }

    pub fn add_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    /// Reference a descriptive metadata file; returns the `dmdSec` ID
    pub fn add_descriptive(&mut self, md_type: MdType, file: FileRef) -> String {
        let id = new_id();
        self.descriptive.push(MetadataSection {
            id: id.clone(),
            md_type,
            file,
        });
        id
    }

    /// Reference a provenance metadata file; returns the `digiprovMD` ID
    pub fn add_provenance(&mut self, md_type: MdType, file: FileRef) -> String {
        let id = new_id();
        self.provenance.push(MetadataSection {
            id: id.clone(),
            md_type,
            file,
        });
        id
    }

    /// Render the document. Every referenced file must exist by now.
    pub fn to_element(&self) -> Result<Element> {
        let mut root = Element::new("mets:mets")
            .attr("xmlns:mets", NS_METS)
            .attr("xmlns:csip", NS_CSIP)
            .attr("xmlns:sip", NS_SIP)
            .attr("xmlns:xsi", NS_XSI)
            .attr("xmlns:xlink", NS_XLINK)
            .attr("OBJID", self.obj_id.as_str())
            .attr("TYPE", self.sip_type.as_str())
            .attr("PROFILE", PROFILE);

        root.push(self.header()?);

        for section in &self.descriptive {
            root.push(
                Element::new("mets:dmdSec")
                    .attr("ID", section.id.as_str())
                    .attr("CREATED", self.created.to_rfc3339())
                    .child(section.md_ref()?),
            );
        }

        if !self.provenance.is_empty() {
            let mut amd_sec = Element::new("mets:amdSec").attr("ID", self.amd_sec_id.as_str());
            for section in &self.provenance {
                amd_sec.push(
                    Element::new("mets:digiprovMD")
                        .attr("ID", section.id.as_str())
                        .child(section.md_ref()?),
                );
            }
            root.push(amd_sec);
        }

        root.push(
            Element::new("mets:fileSec")
                .attr("ID", self.file_sec_id.as_str())
                .child(self.root.to_file_grp()?),
        );

        let mut root_div = self.root.to_div();
        if !self.descriptive.is_empty() {
            root_div.set_attr("DMDID", join_ids(&self.descriptive));
        }
        if !self.provenance.is_empty() {
            root_div.set_attr("ADMID", join_ids(&self.provenance));
        }
        root.push(
            Element::new("mets:structMap")
                .attr("ID", self.struct_map_id.as_str())
                .attr("TYPE", "PHYSICAL")
                .attr("LABEL", "CSIP")
                .child(root_div),
        );

        Ok(root)
    }

    fn header(&self) -> Result<Element> {
        let mut header = Element::new("mets:metsHdr").attr("CREATEDATE", self.created.to_rfc3339());
        if self.kind == MetsKind::Package {
            header.set_attr("csip:OAISPACKAGETYPE", "SIP");
        }
        for agent in &self.agents {
            header.push(agent.to_element()?);
        }
        Ok(header)
    }
}

fn join_ids(sections: &[MetadataSection]) -> String {
    sections
        .iter()
        .map(|s| s.id.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
