use std::collections::HashMap;

use log::{debug, trace};
use url::Url;

use super::{FromRef, Ref, RefError, Spec};

/// Registry of loaded documents, keyed by canonical base URI.
///
/// Populated as documents are loaded; after a load completes its entries are
/// read-only for the lifetime of the run. Cross-document `$ref`s are followed
/// by looking the reference's `source` part up here.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    docs: HashMap<Url, Spec>,
}

impl DocumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `spec` under its base URI.
    ///
    /// The fragment is stripped so that lookups by reference `source` match.
    /// Returns the canonical URI the document was registered under.
    pub fn insert(&mut self, mut base_uri: Url, spec: Spec) -> Url {
        base_uri.set_fragment(None);
        debug!("registering document: {base_uri}");
        self.docs.insert(base_uri.clone(), spec);
        base_uri
    }

    /// Returns the document registered under `base_uri`, if any.
    pub fn get(&self, base_uri: &Url) -> Option<&Spec> {
        let mut canonical = base_uri.clone();
        canonical.set_fragment(None);
        self.docs.get(&canonical)
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns `true` when no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Resolves a component reference against the registered documents.
    ///
    /// Intra-document references (empty `source`) must be resolved against
    /// their containing spec instead.
    pub fn resolve<T: FromRef>(&self, reference: &Ref) -> Result<T, RefError> {
        trace!("registry lookup: {}", reference.source);

        let source = Url::parse(&reference.source)
            .map_err(|_| RefError::Unresolvable(reference.source.clone()))?;

        let spec = self
            .get(&source)
            .ok_or_else(|| RefError::Unresolvable(reference.source.clone()))?;

        let local = format!(
            "#/components/{}/{}",
            reference.kind.collection(),
            reference.name
        );

        T::from_ref(spec, &local)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::ObjectSchema;

    fn spec_with_schema(name: &str) -> Spec {
        serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "test", "version": "v1" },
            "components": {
                "schemas": { name: { "type": "object" } }
            },
        }))
        .unwrap()
    }

    #[test]
    fn resolves_cross_document_reference() {
        let mut registry = DocumentRegistry::new();
        registry.insert(
            Url::parse("https://example.com/defs.json").unwrap(),
            spec_with_schema("Pet"),
        );

        let reference = "https://example.com/defs.json#/components/schemas/Pet"
            .parse::<Ref>()
            .unwrap();

        let schema: ObjectSchema = registry.resolve(&reference).unwrap();
        assert!(schema.schema_type.is_some());
    }

    #[test]
    fn lookup_ignores_fragment() {
        let mut registry = DocumentRegistry::new();
        let registered = registry.insert(
            Url::parse("https://example.com/defs.json#frag").unwrap(),
            spec_with_schema("Pet"),
        );

        assert_eq!(registered.as_str(), "https://example.com/defs.json");
        assert!(registry
            .get(&Url::parse("https://example.com/defs.json").unwrap())
            .is_some());
    }

    #[test]
    fn unknown_document_is_unresolvable() {
        let registry = DocumentRegistry::new();
        let reference = "https://example.com/nope.json#/components/schemas/Pet"
            .parse::<Ref>()
            .unwrap();

        assert!(registry.resolve::<ObjectSchema>(&reference).is_err());
    }
}
