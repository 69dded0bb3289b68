use super::{
    agent_role_uri, object_role_uri, AgentExtension, Identifier, Link, ObjectCategory,
    PremisAgent, PremisDocument, PremisEvent, PremisObject, RelationshipSubtype,
};
use crate::error::{Result, SipError};
use crate::layout::{PackageLayout, SipIdentitySet};
use crate::sidecar::Sidecar;
use sipin_common::{checksum::md5_file, ids::new_id};

const SP_AGENT_ID_TYPE: &str = "VIAA SP Agent ID";

/// IE-level PREMIS: the intellectual entity, plus the digitisation
/// provenance sub-graph for XDCAM material
pub fn ie_premis(ids: &SipIdentitySet, sidecar: &Sidecar) -> PremisDocument {
    let mut ie = PremisObject::new(
        ObjectCategory::IntellectualEntity,
        Identifier::new("uuid", ids.ie_id.as_str()),
    );
    if let Some(local_id) = &sidecar.local_id {
        ie = ie.identifier(Identifier::new("local_id", local_id.as_str()));
    }
    for (key, value) in sidecar.entity_local_ids() {
        ie = ie.identifier(Identifier::new(key, value));
    }
    let ie = ie.relationship(
        RelationshipSubtype::RepresentedBy,
        vec![ids.representation_id.clone()],
    );

    let mut doc = PremisDocument {
        objects: vec![ie],
        ..Default::default()
    };

    if sidecar.is_xdcam() {
        add_digitization(&mut doc, ids, sidecar);
    }
    doc
}

fn add_digitization(doc: &mut PremisDocument, ids: &SipIdentitySet, sidecar: &Sidecar) {
    let xdcam = &sidecar.xdcam;
    let player_id = new_id();
    let source_rep_id = new_id();
    let sp_identifier = xdcam
        .sp_id
        .as_deref()
        .map(|id| Identifier::new(SP_AGENT_ID_TYPE, id));

    doc.objects.push(
        PremisObject::new(
            ObjectCategory::Representation,
            Identifier::new("uuid", source_rep_id.as_str()),
        )
        .storage_medium("XDCAM"),
    );

    let date_time = match (&xdcam.digitization_date, &xdcam.digitization_time) {
        (Some(date), Some(time)) => Some(format!("{}T{}", date, time)),
        (Some(date), None) => Some(date.clone()),
        _ => None,
    };

    // Without a declared SP id the source player is only named
    let mut linking_agents: Vec<Link> = sp_identifier
        .iter()
        .map(|id| Link::new(id.clone()).role("implementer", Some(agent_role_uri("imp"))))
        .collect();
    linking_agents
        .push(Link::new(Identifier::new("UUID", player_id.as_str())).role("player", None));

    doc.events.push(PremisEvent {
        identifier: Identifier::new("UUID", new_id()),
        event_type: "DIGITIZATION".to_string(),
        date_time,
        details: xdcam.digitization_note.iter().cloned().collect(),
        linking_agents,
        linking_objects: vec![
            Link::new(Identifier::new("UUID", ids.representation_id.as_str()))
                .role("outcome", Some(object_role_uri("out"))),
            Link::new(Identifier::new("UUID", source_rep_id.as_str()))
                .role("source", Some(object_role_uri("sou"))),
        ],
    });

    doc.agents.push(PremisAgent {
        identifiers: sp_identifier.into_iter().collect(),
        name: xdcam.sp_name.clone(),
        agent_type: Some("SP Agent".to_string()),
        extension: None,
    });

    let player_name = [&xdcam.player_manufacturer, &xdcam.player_model]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    doc.agents.push(PremisAgent {
        identifiers: vec![Identifier::new("UUID", player_id)],
        name: (!player_name.is_empty()).then_some(player_name),
        agent_type: Some("player".to_string()),
        extension: Some(AgentExtension {
            model: xdcam.player_model.clone(),
            brand: xdcam.player_manufacturer.clone(),
            serial_number: xdcam.player_serial_number.clone(),
        }),
    });
}

/// Representation-level PREMIS: the representation, the essence file and
/// each collateral with their structural and dependency relationships.
///
/// Collateral digests are computed from the copies in the layout, so the
/// data folder must be populated first.
pub fn representation_premis(
    layout: &PackageLayout,
    ids: &SipIdentitySet,
    sidecar: &Sidecar,
    essence_name: &str,
) -> Result<PremisDocument> {
    let collateral_ids = ids.collateral_ids();

    let mut included = vec![ids.file_id.clone()];
    included.extend(collateral_ids.iter().cloned());
    let representation = PremisObject::new(
        ObjectCategory::Representation,
        Identifier::new("uuid", ids.representation_id.as_str()),
    )
    .relationship(RelationshipSubtype::Includes, included)
    .relationship(RelationshipSubtype::Represents, vec![ids.ie_id.clone()]);

    let mut essence = PremisObject::new(
        ObjectCategory::File,
        Identifier::new("uuid", ids.file_id.as_str()),
    )
    .fixity(sidecar.md5.as_str())
    .original_name(sidecar.original_filename().unwrap_or(essence_name))
    .relationship(
        RelationshipSubtype::IncludedIn,
        vec![ids.representation_id.clone()],
    );
    if !collateral_ids.is_empty() {
        essence = essence.relationship(RelationshipSubtype::IsRequiredBy, collateral_ids);
    }

    let mut objects = vec![representation, essence];
    for collateral in &ids.collaterals {
        let path = layout.data_file(&collateral.file_name);
        let md5 = md5_file(&path).map_err(|e| SipError::from_common(&path, e))?;
        objects.push(
            PremisObject::new(ObjectCategory::File, Identifier::new("uuid", collateral.id.as_str()))
                .fixity(md5)
                .original_name(collateral.file_name.as_str())
                .relationship(
                    RelationshipSubtype::IncludedIn,
                    vec![ids.representation_id.clone()],
                )
                .relationship(RelationshipSubtype::Requires, vec![ids.file_id.clone()]),
        );
    }

    Ok(PremisDocument {
        objects,
        ..Default::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn sidecar(xml: &str) -> Sidecar {
        Sidecar::from_xml(xml, Path::new("sidecar.xml")).unwrap()
    }

    const XDCAM: &str = "<VIAA><md5>abc</md5><format>XDCAM</format>\
        <sp_id>SP-1</sp_id><sp_name>TAPE</sp_name>\
        <digitization_date>2023-03-01</digitization_date><digitization_time>10:11:12</digitization_time>\
        <digitization_note>Dropouts at 00:12</digitization_note>\
        <player_manufacturer>Sony</player_manufacturer><player_model>PDW-U1</player_model>\
        <player_serial_number>SN-42</player_serial_number></VIAA>";

    #[test]
    fn test_xdcam_without_sp_id_has_no_empty_identifier() {
        let ids = SipIdentitySet::allocate(&[]).unwrap();
        let doc = ie_premis(
            &ids,
            &sidecar("<VIAA><md5>abc</md5><format>XDCAM</format><sp_name>TAPE</sp_name></VIAA>"),
        );

        assert_eq!(doc.agents.len(), 2);
        assert!(doc.agents[0].identifiers.is_empty());
        assert_eq!(doc.agents[0].name.as_deref(), Some("TAPE"));

        let event = &doc.events[0];
        assert_eq!(event.linking_agents.len(), 1);
        assert_eq!(event.linking_agents[0].roles[0].0, "player");
        assert!(event
            .linking_agents
            .iter()
            .all(|link| !link.identifier.value.is_empty()));
    }

    #[test]
    fn test_ie_identifiers_and_relationship() {
        let ids = SipIdentitySet::allocate(&[]).unwrap();
        let sidecar = sidecar(
            "<VIAA><md5>abc</md5><dc_identifier_localid>L-1</dc_identifier_localid>\
             <dc_identifier_localids><Bestandsnaam>a.mxf</Bestandsnaam><bestandsnaam>b.mxf</bestandsnaam>\
             <Inventarisnummer>INV-1</Inventarisnummer></dc_identifier_localids></VIAA>",
        );
        let doc = ie_premis(&ids, &sidecar);

        assert_eq!(doc.objects.len(), 1);
        assert!(doc.events.is_empty());
        assert!(doc.agents.is_empty());
        let ie = doc.object(&ids.ie_id).unwrap();
        let types: Vec<_> = ie.identifiers.iter().map(|i| i.id_type.as_str()).collect();
        assert_eq!(types, vec!["uuid", "local_id", "Inventarisnummer"]);
        assert_eq!(
            ie.related(RelationshipSubtype::RepresentedBy),
            Some(&[ids.representation_id.clone()][..])
        );
    }

    #[test]
    fn test_xdcam_digitization_graph() {
        let ids = SipIdentitySet::allocate(&[]).unwrap();
        let doc = ie_premis(&ids, &sidecar(XDCAM));

        assert_eq!(doc.objects.len(), 2);
        assert_eq!(doc.objects[1].storage_media, vec!["XDCAM"]);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.agents.len(), 2);

        let event = &doc.events[0];
        assert_eq!(event.event_type, "DIGITIZATION");
        assert_eq!(event.date_time.as_deref(), Some("2023-03-01T10:11:12"));
        assert_eq!(event.details, vec!["Dropouts at 00:12"]);
        assert_eq!(event.linking_agents[0].identifier.value, "SP-1");
        assert_eq!(event.linking_agents[0].roles[0].0, "implementer");
        assert_eq!(event.linking_agents[1].roles[0].0, "player");
        assert_eq!(event.linking_objects[0].identifier.value, ids.representation_id);
        assert_eq!(event.linking_objects[0].roles[0].0, "outcome");
        assert_eq!(event.linking_objects[1].roles[0].0, "source");
        assert_eq!(
            event.linking_objects[1].identifier.value,
            doc.objects[1].uuid().unwrap()
        );

        let sp = &doc.agents[0];
        assert_eq!(sp.agent_type.as_deref(), Some("SP Agent"));
        assert_eq!(sp.name.as_deref(), Some("TAPE"));

        let player = &doc.agents[1];
        assert_eq!(player.identifiers[0].value, event.linking_agents[1].identifier.value);
        assert_eq!(player.name.as_deref(), Some("Sony PDW-U1"));
        let extension = player.extension.as_ref().unwrap();
        assert_eq!(extension.model.as_deref(), Some("PDW-U1"));
        assert_eq!(extension.brand.as_deref(), Some("Sony"));
        assert_eq!(extension.serial_number.as_deref(), Some("SN-42"));
    }

    #[test]
    fn test_representation_relationships_with_collaterals() {
        let dir = TempDir::new().unwrap();
        let ids = SipIdentitySet::allocate(&[
            PathBuf::from("/in/video.srt"),
            PathBuf::from("/in/video.txt"),
        ])
        .unwrap();
        let layout = PackageLayout::new(dir.path().join("video"));
        layout.create().unwrap();
        std::fs::write(layout.data_file("video.srt"), "hello world").unwrap();
        std::fs::write(layout.data_file("video.txt"), "").unwrap();

        let doc = representation_premis(&layout, &ids, &sidecar("<VIAA><md5>abc</md5></VIAA>"), "video.mxf")
            .unwrap();
        assert_eq!(doc.objects.len(), 4);

        let rep = doc.object(&ids.representation_id).unwrap();
        assert_eq!(rep.related(RelationshipSubtype::Includes).unwrap().len(), 3);
        assert_eq!(
            rep.related(RelationshipSubtype::Represents),
            Some(&[ids.ie_id.clone()][..])
        );

        let essence = doc.object(&ids.file_id).unwrap();
        assert_eq!(essence.original_name.as_deref(), Some("video.mxf"));
        assert_eq!(essence.fixity.as_deref(), Some("abc"));
        assert_eq!(
            essence.related(RelationshipSubtype::IsRequiredBy).unwrap(),
            ids.collateral_ids().as_slice()
        );

        let srt = doc.object(&ids.collaterals[0].id).unwrap();
        assert_eq!(srt.fixity.as_deref(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
        assert_eq!(srt.original_name.as_deref(), Some("video.srt"));
        assert_eq!(
            srt.related(RelationshipSubtype::Requires),
            Some(&[ids.file_id.clone()][..])
        );
        let txt = doc.object(&ids.collaterals[1].id).unwrap();
        assert_eq!(txt.fixity.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn test_no_collaterals_no_dependency() {
        let dir = TempDir::new().unwrap();
        let ids = SipIdentitySet::allocate(&[]).unwrap();
        let layout = PackageLayout::new(dir.path().join("video"));
        let sidecar = sidecar("<VIAA><md5>abc</md5><dc_source>orig.mxf</dc_source></VIAA>");

        let doc = representation_premis(&layout, &ids, &sidecar, "video.mxf").unwrap();
        let essence = doc.object(&ids.file_id).unwrap();
        assert!(essence.related(RelationshipSubtype::IsRequiredBy).is_none());
        assert_eq!(essence.original_name.as_deref(), Some("orig.mxf"));
    }

    #[test]
    fn test_missing_collateral_copy_fails() {
        let dir = TempDir::new().unwrap();
        let ids = SipIdentitySet::allocate(&[PathBuf::from("/in/video.srt")]).unwrap();
        let layout = PackageLayout::new(dir.path().join("video"));
        let err = representation_premis(&layout, &ids, &sidecar("<VIAA><md5>abc</md5></VIAA>"), "video.mxf")
            .unwrap_err();
        assert!(matches!(err, SipError::Filesystem { .. }));
    }
}
