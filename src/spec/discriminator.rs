use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Used to inform the consumer of an alternative schema based on the value associated with it.
///
/// See <https://spec.openapis.org/oas/v3.2.0#discriminator-object>.
#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
pub struct Discriminator {
    /// The name of the property in the payload that will hold the discriminator value.
    #[serde(rename = "propertyName")]
    pub property_name: String,

    /// An object to hold mappings between payload values and schema names or references.
    ///
    /// When using the discriminator, inline schemas will not be considered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<BTreeMap<String, String>>,

    /// The schema name or URI reference to use when no mapping entry matches.
    #[serde(rename = "defaultMapping", skip_serializing_if = "Option::is_none")]
    pub default_mapping: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn discriminator_mapping_parsed_correctly() {
        let discriminator = serde_json::from_str::<Discriminator>(indoc::indoc! {r##"{
            "propertyName": "petType",
            "mapping": {
                "dog": "#/components/schemas/Dog",
                "cat": "#/components/schemas/Cat"
            }
        }"##})
        .unwrap();

        assert_eq!("petType", discriminator.property_name);

        let mapping = discriminator.mapping.unwrap();
        assert_eq!("#/components/schemas/Dog", mapping.get("dog").unwrap());
        assert_eq!("#/components/schemas/Cat", mapping.get("cat").unwrap());
    }
}
