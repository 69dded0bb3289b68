//! Descriptive metadata (`dc.xml`) in DC terms

use crate::sidecar::Sidecar;
use crate::xml::Element;

pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Build the descriptive record of the intellectual entity
pub fn descriptive_record(ie_id: &str, sidecar: &Sidecar) -> Element {
    let fields = &sidecar.descriptive;

    let mut root = Element::new("metadata")
        .attr("xmlns:dc", NS_DC)
        .attr("xmlns:dcterms", NS_DCTERMS)
        .attr("xmlns:xsi", NS_XSI)
        .child(Element::with_text("dcterms:identifier", ie_id))
        .text_child_opt("dcterms:title", fields.title.as_deref())
        .text_child_opt("dcterms:alternative", fields.title_alternative.as_deref())
        .text_child_opt("dcterms:description", fields.description.as_deref())
        .text_child_opt("dcterms:created", fields.created.as_deref())
        .text_child_opt("dcterms:issued", fields.issued.as_deref());

    root.extend(
        fields
            .subjects
            .iter()
            .map(|s| Element::with_text("dcterms:subject", s.as_str())),
    );
    root.extend(
        sidecar
            .entity_local_ids()
            .map(|(_, value)| Element::with_text("dcterms:identifier", value)),
    );
    root
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_descriptive_record() {
        let sidecar = Sidecar::from_xml(
            "<VIAA><md5>abc</md5><dc_title>Concert</dc_title><dc_created>2001</dc_created>\
             <dc_subjects><Trefwoord>jazz</Trefwoord><Trefwoord>live</Trefwoord></dc_subjects>\
             <dc_identifier_localids><bestandsnaam>a.mxf</bestandsnaam><Inventaris>INV-9</Inventaris>\
             </dc_identifier_localids></VIAA>",
            Path::new("sidecar.xml"),
        )
        .unwrap();

        let el = descriptive_record("uuid-ie", &sidecar);
        assert_eq!(el.name(), "metadata");
        assert_eq!(el.attribute("xmlns:dcterms"), Some(NS_DCTERMS));

        let identifiers: Vec<_> = el
            .elements_named("dcterms:identifier")
            .map(|e| e.text_content())
            .collect();
        assert_eq!(identifiers, vec!["uuid-ie", "INV-9"]);
        assert_eq!(el.find("dcterms:title").unwrap().text_content(), "Concert");
        assert_eq!(el.find("dcterms:created").unwrap().text_content(), "2001");
        assert!(el.find("dcterms:description").is_none());
        assert_eq!(el.elements_named("dcterms:subject").count(), 2);
    }
}
