use super::{
    Agent, AgentRole, AgentType, FileEntry, FileGroup, FileRef, MdType, MetsDocument, MetsKind,
    Note, NoteType,
};
use crate::layout::{
    PackageLayout, SipIdentitySet, DC_FILE, METS_FILE, PREMIS_FILE, REPRESENTATIONS_DIR,
    REPRESENTATION_DIR,
};
use sipin_common::ids::new_id;

/// The software agent credited in the package METS header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareAgent {
    pub name: String,
    pub version: String,
}

impl Default for SoftwareAgent {
    fn default() -> Self {
        Self {
            name: "meemoo SIP creator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Package-level METS, at the SIP root.
///
/// Declares the software, archivist and submitter agents and references
/// `dc.xml` and the IE-level `premis.xml` as metadata sections.
pub fn package_mets(
    layout: &PackageLayout,
    ids: &SipIdentitySet,
    sip_type: &str,
    organization: &str,
    flow_id: &str,
    software: &SoftwareAgent,
) -> MetsDocument {
    let dc_href = format!("metadata/descriptive/{}", DC_FILE);
    let premis_href = format!("metadata/preservation/{}", PREMIS_FILE);
    let rep_href = format!("{}/{}/{}", REPRESENTATIONS_DIR, REPRESENTATION_DIR, METS_FILE);

    let dc = FileRef::new(layout.dc_xml(), dc_href);
    let premis = FileRef::new(layout.ie_premis(), premis_href);
    let rep_mets = FileRef::new(layout.representation_mets(), rep_href);

    let label = layout
        .root()
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let root = FileGroup::new("root", label)
        .group(
            FileGroup::new("metadata", "metadata")
                .group(
                    FileGroup::new("metadata/descriptive", "descriptive").file(FileEntry::new(
                        new_id(),
                        "metadata/descriptive",
                        dc.clone(),
                    )),
                )
                .group(
                    FileGroup::new("metadata/preservation", "preservation").file(FileEntry::new(
                        new_id(),
                        "metadata/preservation",
                        premis.clone(),
                    )),
                ),
        )
        .group(
            FileGroup::new(REPRESENTATIONS_DIR, REPRESENTATIONS_DIR).group(
                FileGroup::new(
                    format!("{}/{}", REPRESENTATIONS_DIR, REPRESENTATION_DIR),
                    REPRESENTATION_DIR,
                )
                .file(FileEntry::mets(REPRESENTATIONS_DIR, rep_mets)),
            ),
        );

    let mut doc = MetsDocument::new(MetsKind::Package, ids.ie_id.as_str(), sip_type, root);

    doc.add_agent(
        Agent::new(AgentRole::Creator, AgentType::Other)
            .other_type("SOFTWARE")
            .name(software.name.as_str())
            .note(Note::new(software.version.as_str(), NoteType::SoftwareVersion)),
    );
    doc.add_agent(Agent::new(AgentRole::Archivist, AgentType::Organization).name(organization));
    doc.add_agent(
        Agent::new(AgentRole::Creator, AgentType::Organization)
            .name(organization)
            .note(Note::new(flow_id, NoteType::IdentificationCode)),
    );

    doc.add_descriptive(MdType::Dc, dc);
    doc.add_provenance(MdType::Premis, premis);
    doc
}

/// Representation-level METS, inside `representations/representation_1`.
///
/// The essence keeps the producer's declared MD5. Collaterals and the
/// representation `premis.xml` are hashed when rendered.
pub fn representation_mets(
    layout: &PackageLayout,
    ids: &SipIdentitySet,
    essence_name: &str,
    declared_md5: &str,
    sip_type: &str,
) -> MetsDocument {
    let premis = FileRef::new(
        layout.representation_premis(),
        format!("metadata/preservation/{}", PREMIS_FILE),
    );

    let mut data = FileGroup::new("data", "data").file(FileEntry::new(
        ids.file_id.as_str(),
        "data",
        FileRef::new(layout.data_file(essence_name), format!("data/{}", essence_name))
            .declared(declared_md5),
    ));
    for collateral in &ids.collaterals {
        data = data.file(FileEntry::new(
            collateral.id.as_str(),
            "data",
            FileRef::new(
                layout.data_file(&collateral.file_name),
                format!("data/{}", collateral.file_name),
            ),
        ));
    }

    let root = FileGroup::new(
        format!("{}/{}", REPRESENTATIONS_DIR, REPRESENTATION_DIR),
        REPRESENTATION_DIR,
    )
    .group(
        FileGroup::new("metadata", "metadata")
            .group(FileGroup::new("metadata/descriptive", "descriptive"))
            .group(FileGroup::new("metadata/preservation", "preservation").file(FileEntry::new(
                new_id(),
                "metadata/preservation",
                premis.clone(),
            ))),
    )
    .group(data);

    let mut doc = MetsDocument::new(
        MetsKind::Representation,
        ids.representation_id.as_str(),
        sip_type,
        root,
    );
    doc.add_provenance(MdType::Premis, premis);
    doc
}
