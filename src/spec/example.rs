use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{spec_extensions, FromRef, Ref, RefError, RefType, Spec};

/// An example grouping an internal or external value with metadata.
///
/// See <https://spec.openapis.org/oas/v3.2.0#example-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct Example {
    /// Short description for the example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Long description for the example.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// An example of the data structure that the schema describes.
    #[serde(rename = "dataValue", skip_serializing_if = "Option::is_none")]
    pub data_value: Option<serde_json::Value>,

    /// An example of the serialized form of the value, as a string.
    #[serde(rename = "serializedValue", skip_serializing_if = "Option::is_none")]
    pub serialized_value: Option<String>,

    /// Embedded literal example (superseded by `dataValue`/`serializedValue`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    /// A URI that identifies the literal example.
    ///
    /// The `value` field and `externalValue` field are mutually exclusive.
    #[serde(rename = "externalValue", skip_serializing_if = "Option::is_none")]
    pub external_value: Option<Url>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl FromRef for Example {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::Example => spec
                .components
                .as_ref()
                .and_then(|cs| cs.examples.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            typ => Err(RefError::MismatchedType(typ, RefType::Example)),
        }
    }
}
