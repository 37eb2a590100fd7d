use std::fmt;

use indexmap::IndexMap;
use serde::{de, Deserializer, Serializer};

/// Deserializes fields of a map beginning with `x-`.
///
/// Declaration order is kept so that extension blobs re-serialize the way
/// they were written.
pub(crate) fn deserialize<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ExtraFieldsVisitor;

    impl<'de> de::Visitor<'de> for ExtraFieldsVisitor {
        type Value = IndexMap<String, serde_json::Value>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("extensions")
        }

        fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
        where
            M: de::MapAccess<'de>,
        {
            let mut map = IndexMap::new();

            while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                if let Some(key) = key.strip_prefix("x-") {
                    map.insert(key.to_owned(), value);
                }
            }

            Ok(map)
        }
    }

    deserializer.deserialize_map(ExtraFieldsVisitor)
}

/// Serializes fields of a map prefixed with `x-`.
pub(crate) fn serialize<S>(
    extensions: &IndexMap<String, serde_json::Value>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(
        extensions
            .iter()
            .map(|(key, value)| (format!("x-{key}"), value)),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::spec::Spec;

    #[test]
    fn spec_extensions_deserialize() {
        let spec = indoc::indoc! {r#"{
            "openapi": "3.1.0",
            "info": { "title": "test", "version": "v1" },
            "components": {},
            "x-bar": true,
            "qux": true
        }"#};

        let spec = serde_json::from_str::<Spec>(spec).unwrap();
        assert!(spec.components.is_some());
        assert!(!spec.extensions.contains_key("x-bar"));
        assert!(!spec.extensions.contains_key("qux"));
        assert_eq!(spec.extensions.get("bar").unwrap(), true);
    }

    #[test]
    fn spec_extensions_preserve_declaration_order() {
        let spec = indoc::indoc! {r#"{
            "openapi": "3.1.0",
            "info": { "title": "test", "version": "v1" },
            "x-zulu": 1,
            "x-alpha": 2
        }"#};

        let spec = serde_json::from_str::<Spec>(spec).unwrap();
        let keys = spec.extensions.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["zulu".to_owned(), "alpha".to_owned()]);
    }

    #[test]
    fn spec_extensions_serialize() {
        let spec = indoc::indoc! {r#"{
            "openapi": "3.1.0",
            "info": { "title": "test", "version": "v1" },
            "x-bar": true
        }"#};

        let parsed_spec = serde_json::from_str::<Spec>(spec).unwrap();
        let round_trip = serde_json::to_value(&parsed_spec).unwrap();
        assert_eq!(round_trip.get("x-bar").unwrap(), true);
    }
}
