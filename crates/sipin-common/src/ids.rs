//! Identifier generation
//!
//! METS and PREMIS identifiers end up in attributes of type `xs:ID`, which
//! must start with a letter. Every identifier is therefore a random v4 UUID
//! prefixed with `uuid-`.

use uuid::Uuid;

/// Prefix applied to every generated identifier
pub const ID_PREFIX: &str = "uuid-";

/// Generate a fresh, random identifier (`uuid-<v4 uuid>`)
pub fn new_id() -> String {
    format!("{}{}", ID_PREFIX, Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_id_format() {
        let id = new_id();
        assert!(id.starts_with(ID_PREFIX));
        assert!(Uuid::parse_str(&id[ID_PREFIX.len()..]).is_ok());
    }

    #[test]
    fn test_new_id_is_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
