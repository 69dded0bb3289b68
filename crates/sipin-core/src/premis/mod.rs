//! PREMIS v3 document model
//!
//! Objects, events and agents render in that order under a single
//! `premis:premis` root. Relationship subtypes carry the Library of
//! Congress preservation vocabulary URIs.

mod builder;

pub use builder::{ie_premis, representation_premis};

use crate::xml::Element;

pub const NS_PREMIS: &str = "http://www.loc.gov/premis/v3";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const NS_SCHEMA: &str = "http://schema.org/";

pub const PREMIS_VERSION: &str = "3.0";

const LOC_VOCABULARY: &str = "http://id.loc.gov/vocabulary/preservation";

/// `premis:object` flavour, rendered as `xsi:type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCategory {
    IntellectualEntity,
    Representation,
    File,
}

impl ObjectCategory {
    pub fn xsi_type(self) -> &'static str {
        match self {
            ObjectCategory::IntellectualEntity => "premis:intellectualEntity",
            ObjectCategory::Representation => "premis:representation",
            ObjectCategory::File => "premis:file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    Structural,
    Dependency,
}

impl RelationshipType {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipType::Structural => "structural",
            RelationshipType::Dependency => "dependency",
        }
    }

    pub fn uri_suffix(self) -> &'static str {
        match self {
            RelationshipType::Structural => "str",
            RelationshipType::Dependency => "dep",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipSubtype {
    Includes,
    IncludedIn,
    Represents,
    RepresentedBy,
    Requires,
    IsRequiredBy,
}

impl RelationshipSubtype {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipSubtype::Includes => "includes",
            RelationshipSubtype::IncludedIn => "is included in",
            RelationshipSubtype::Represents => "represents",
            RelationshipSubtype::RepresentedBy => "is represented by",
            RelationshipSubtype::Requires => "requires",
            RelationshipSubtype::IsRequiredBy => "is required by",
        }
    }

    /// Code in the LoC `relationshipSubType` vocabulary
    pub fn uri_suffix(self) -> &'static str {
        match self {
            RelationshipSubtype::Includes => "inc",
            RelationshipSubtype::IncludedIn => "isi",
            RelationshipSubtype::Represents => "rep",
            RelationshipSubtype::RepresentedBy => "isr",
            RelationshipSubtype::Requires => "req",
            RelationshipSubtype::IsRequiredBy => "irb",
        }
    }

    pub fn relationship_type(self) -> RelationshipType {
        match self {
            RelationshipSubtype::Requires | RelationshipSubtype::IsRequiredBy => {
                RelationshipType::Dependency
            },
            _ => RelationshipType::Structural,
        }
    }
}

/// Identifier type and value, rendered under a kind-specific element name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub id_type: String,
    pub value: String,
}

impl Identifier {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }

    /// `<premis:{kind}Identifier>` with `...Type` and `...Value` children
    fn to_element(&self, kind: &str) -> Element {
        Element::new(format!("premis:{}Identifier", kind))
            .child(Element::with_text(
                format!("premis:{}IdentifierType", kind),
                self.id_type.as_str(),
            ))
            .child(Element::with_text(
                format!("premis:{}IdentifierValue", kind),
                self.value.as_str(),
            ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub subtype: RelationshipSubtype,
    pub related: Vec<String>,
}

impl Relationship {
    pub fn new(subtype: RelationshipSubtype, related: Vec<String>) -> Self {
        Self { subtype, related }
    }

    fn to_element(&self) -> Element {
        let rel_type = self.subtype.relationship_type();
        let mut element = Element::new("premis:relationship")
            .child(
                Element::with_text("premis:relationshipType", rel_type.label())
                    .attr("authority", "relationshipType")
                    .attr("authorityURI", format!("{}/relationshipType", LOC_VOCABULARY))
                    .attr(
                        "valueURI",
                        format!("{}/relationshipType/{}", LOC_VOCABULARY, rel_type.uri_suffix()),
                    ),
            )
            .child(
                Element::with_text("premis:relationshipSubType", self.subtype.label())
                    .attr("authority", "relationshipSubType")
                    .attr("authorityURI", format!("{}/relationshipSubType", LOC_VOCABULARY))
                    .attr(
                        "valueURI",
                        format!(
                            "{}/relationshipSubType/{}",
                            LOC_VOCABULARY,
                            self.subtype.uri_suffix()
                        ),
                    ),
            );
        for related in &self.related {
            element.push(Identifier::new("UUID", related.as_str()).to_element("relatedObject"));
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremisObject {
    pub category: ObjectCategory,
    pub identifiers: Vec<Identifier>,
    /// MD5 fixity digest
    pub fixity: Option<String>,
    pub original_name: Option<String>,
    pub storage_media: Vec<String>,
    pub relationships: Vec<Relationship>,
}

impl PremisObject {
    pub fn new(category: ObjectCategory, identifier: Identifier) -> Self {
        Self {
            category,
            identifiers: vec![identifier],
            fixity: None,
            original_name: None,
            storage_media: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn identifier(mut self, identifier: Identifier) -> Self {
        self.identifiers.push(identifier);
        self
    }

    pub fn fixity(mut self, md5: impl Into<String>) -> Self {
        self.fixity = Some(md5.into());
        self
    }

    pub fn original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn storage_medium(mut self, medium: impl Into<String>) -> Self {
        self.storage_media.push(medium.into());
        self
    }

    pub fn relationship(mut self, subtype: RelationshipSubtype, related: Vec<String>) -> Self {
        self.relationships.push(Relationship::new(subtype, related));
        self
    }

    /// The `uuid` identifier value, if any
    pub fn uuid(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.id_type == "uuid")
            .map(|i| i.value.as_str())
    }

    /// Related ids of the first relationship with this subtype
    pub fn related(&self, subtype: RelationshipSubtype) -> Option<&[String]> {
        self.relationships
            .iter()
            .find(|r| r.subtype == subtype)
            .map(|r| r.related.as_slice())
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("premis:object").attr("xsi:type", self.category.xsi_type());
        element.extend(self.identifiers.iter().map(|i| i.to_element("object")));

        if let Some(md5) = &self.fixity {
            element.push(
                Element::new("premis:objectCharacteristics").child(
                    Element::new("premis:fixity")
                        .child(
                            Element::with_text("premis:messageDigestAlgorithm", "MD5")
                                .attr("authority", "cryptographicHashFunctions")
                                .attr(
                                    "authorityURI",
                                    format!("{}/cryptographicHashFunctions", LOC_VOCABULARY),
                                )
                                .attr(
                                    "valueURI",
                                    format!("{}/cryptographicHashFunctions/md5", LOC_VOCABULARY),
                                ),
                        )
                        .child(Element::with_text("premis:messageDigest", md5.as_str())),
                ),
            );
        }

        if let Some(name) = &self.original_name {
            element.push(Element::with_text("premis:originalName", name.as_str()));
        }

        for medium in &self.storage_media {
            element.push(
                Element::new("premis:storage")
                    .child(Element::with_text("premis:storageMedium", medium.as_str())),
            );
        }

        element.extend(self.relationships.iter().map(Relationship::to_element));
        element
    }
}

/// A linking agent or object reference with its roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub identifier: Identifier,
    /// Role label and optional vocabulary URI
    pub roles: Vec<(String, Option<String>)>,
}

impl Link {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            roles: Vec::new(),
        }
    }

    pub fn role(mut self, role: impl Into<String>, value_uri: Option<String>) -> Self {
        self.roles.push((role.into(), value_uri));
        self
    }

    fn to_element(&self, kind: &str) -> Element {
        let mut element = self.identifier.to_element(kind);
        for (role, value_uri) in &self.roles {
            element.push(
                Element::with_text(format!("premis:{}Role", kind), role.as_str())
                    .attr_opt("valueURI", value_uri.as_deref()),
            );
        }
        element
    }
}

/// Vocabulary URI for an event-related agent role code
pub fn agent_role_uri(code: &str) -> String {
    format!("{}/eventRelatedAgentRole/{}", LOC_VOCABULARY, code)
}

/// Vocabulary URI for an event-related object role code
pub fn object_role_uri(code: &str) -> String {
    format!("{}/eventRelatedObjectRole/{}", LOC_VOCABULARY, code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremisEvent {
    pub identifier: Identifier,
    pub event_type: String,
    pub date_time: Option<String>,
    pub details: Vec<String>,
    pub linking_agents: Vec<Link>,
    pub linking_objects: Vec<Link>,
}

impl PremisEvent {
    fn to_element(&self) -> Element {
        let mut element = Element::new("premis:event")
            .child(self.identifier.to_element("event"))
            .child(Element::with_text("premis:eventType", self.event_type.as_str()))
            .text_child_opt("premis:eventDateTime", self.date_time.as_deref());
        for detail in &self.details {
            element.push(
                Element::new("premis:eventDetailInformation")
                    .child(Element::with_text("premis:eventDetail", detail.as_str())),
            );
        }
        element.extend(self.linking_agents.iter().map(|l| l.to_element("linkingAgent")));
        element.extend(self.linking_objects.iter().map(|l| l.to_element("linkingObject")));
        element
    }
}

/// Device details rendered with schema.org terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentExtension {
    pub model: Option<String>,
    pub brand: Option<String>,
    pub serial_number: Option<String>,
}

impl AgentExtension {
    fn to_element(&self) -> Element {
        let mut element =
            Element::new("premis:agentExtension").text_child_opt("schema:model", self.model.as_deref());
        if let Some(brand) = &self.brand {
            element.push(
                Element::new("schema:brand").child(Element::with_text("schema:name", brand.as_str())),
            );
        }
        element.text_child_opt("schema:serialNumber", self.serial_number.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremisAgent {
    pub identifiers: Vec<Identifier>,
    pub name: Option<String>,
    pub agent_type: Option<String>,
    pub extension: Option<AgentExtension>,
}

impl PremisAgent {
    fn to_element(&self) -> Element {
        let mut element = Element::new("premis:agent");
        element.extend(self.identifiers.iter().map(|i| i.to_element("agent")));
        let mut element = element
            .text_child_opt("premis:agentName", self.name.as_deref())
            .text_child_opt("premis:agentType", self.agent_type.as_deref());
        if let Some(extension) = &self.extension {
            element.push(extension.to_element());
        }
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PremisDocument {
    pub objects: Vec<PremisObject>,
    pub events: Vec<PremisEvent>,
    pub agents: Vec<PremisAgent>,
}

impl PremisDocument {
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("premis:premis")
            .attr("xmlns:premis", NS_PREMIS)
            .attr("xmlns:xsi", NS_XSI)
            .attr("xmlns:schema", NS_SCHEMA)
            .attr("version", PREMIS_VERSION);
        root.extend(self.objects.iter().map(PremisObject::to_element));
        root.extend(self.events.iter().map(PremisEvent::to_element));
        root.extend(self.agents.iter().map(PremisAgent::to_element));
        root
    }

    /// Object whose `uuid` identifier equals `id`
    pub fn object(&self, id: &str) -> Option<&PremisObject> {
        self.objects.iter().find(|o| o.uuid() == Some(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_vocabulary() {
        let expected = [
            (RelationshipSubtype::Includes, "inc", "str"),
            (RelationshipSubtype::IncludedIn, "isi", "str"),
            (RelationshipSubtype::Represents, "rep", "str"),
            (RelationshipSubtype::RepresentedBy, "isr", "str"),
            (RelationshipSubtype::Requires, "req", "dep"),
            (RelationshipSubtype::IsRequiredBy, "irb", "dep"),
        ];
        for (subtype, code, type_code) in expected {
            assert_eq!(subtype.uri_suffix(), code);
            assert_eq!(subtype.relationship_type().uri_suffix(), type_code);
        }
    }

    #[test]
    fn test_relationship_element() {
        let el = Relationship::new(
            RelationshipSubtype::RepresentedBy,
            vec!["uuid-rep".to_string()],
        )
        .to_element();

        let rel_type = el.find("premis:relationshipType").unwrap();
        assert_eq!(rel_type.text_content(), "structural");
        assert_eq!(
            rel_type.attribute("valueURI"),
            Some("http://id.loc.gov/vocabulary/preservation/relationshipType/str")
        );
        let subtype = el.find("premis:relationshipSubType").unwrap();
        assert_eq!(subtype.text_content(), "is represented by");
        assert_eq!(
            subtype.attribute("valueURI"),
            Some("http://id.loc.gov/vocabulary/preservation/relationshipSubType/isr")
        );
        let related = el.find("premis:relatedObjectIdentifier").unwrap();
        assert_eq!(
            related.find("premis:relatedObjectIdentifierType").unwrap().text_content(),
            "UUID"
        );
        assert_eq!(
            related.find("premis:relatedObjectIdentifierValue").unwrap().text_content(),
            "uuid-rep"
        );
    }

    #[test]
    fn test_file_object_element_order() {
        let el = PremisObject::new(ObjectCategory::File, Identifier::new("uuid", "uuid-file"))
            .fixity("abc")
            .original_name("video.mxf")
            .relationship(RelationshipSubtype::IncludedIn, vec!["uuid-rep".into()])
            .to_element();

        assert_eq!(el.attribute("xsi:type"), Some("premis:file"));
        let names: Vec<_> = el.elements().map(|e| e.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "premis:objectIdentifier",
                "premis:objectCharacteristics",
                "premis:originalName",
                "premis:relationship"
            ]
        );
        let digest = el.descendants_named("premis:messageDigest");
        assert_eq!(digest[0].text_content(), "abc");
        let algorithm = el.descendants_named("premis:messageDigestAlgorithm");
        assert_eq!(algorithm[0].text_content(), "MD5");
    }

    #[test]
    fn test_link_roles() {
        let el = Link::new(Identifier::new("UUID", "uuid-player"))
            .role("player", None)
            .role("implementer", Some(agent_role_uri("imp")))
            .to_element("linkingAgent");
        let roles = el.descendants_named("premis:linkingAgentRole");
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].attribute("valueURI"), None);
        assert_eq!(
            roles[1].attribute("valueURI"),
            Some("http://id.loc.gov/vocabulary/preservation/eventRelatedAgentRole/imp")
        );
    }

    #[test]
    fn test_agent_extension_skips_absent_fields() {
        let el = AgentExtension {
            model: Some("PDW-U1".into()),
            brand: None,
            serial_number: Some("SN-42".into()),
        }
        .to_element();
        let names: Vec<_> = el.elements().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["schema:model", "schema:serialNumber"]);
    }

    #[test]
    fn test_document_root() {
        let el = PremisDocument::default().to_element();
        assert_eq!(el.name(), "premis:premis");
        assert_eq!(el.attribute("version"), Some("3.0"));
        assert_eq!(el.attribute("xmlns:premis"), Some(NS_PREMIS));
    }
}
