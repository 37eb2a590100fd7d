use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    spec_extensions, Encoding, Example, FromRef, MediaTypeExamples, ObjectOrReference, Ref,
    RefError, RefType, Schema, Spec,
};

/// Provides schema and examples for the media type identified by its key.
///
/// See <https://spec.openapis.org/oas/v3.2.0#media-type-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct MediaType {
    /// The schema defining the content of the request, response, or parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ObjectOrReference<Schema>>,

    /// Schema applied to each item of a sequential media type, e.g. a JSON
    /// event stream.
    #[serde(rename = "itemSchema", skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<ObjectOrReference<Schema>>,

    /// Example(s) of the media type.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub examples: Option<MediaTypeExamples>,

    /// A map between a property name and its encoding information.
    ///
    /// The key, being the property name, MUST exist in the schema as a property. The encoding
    /// object SHALL only apply to `requestBody` objects when the media type is `multipart` or
    /// `application/x-www-form-urlencoded`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, Encoding>,

    /// Positional encodings, applied to array items by index.
    ///
    /// Distinct from `encoding`, which is keyed by property name.
    #[serde(
        default,
        rename = "prefixEncoding",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub prefix_encoding: Vec<Encoding>,

    /// Encoding applied to every item of a sequential media type.
    #[serde(rename = "itemEncoding", skip_serializing_if = "Option::is_none")]
    pub item_encoding: Option<Box<Encoding>>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl MediaType {
    /// Resolves and returns the media type's schema.
    pub fn schema(&self, spec: &Spec) -> Result<Schema, RefError> {
        self.schema
            .as_ref()
            .ok_or_else(|| RefError::Unresolvable("no schema".to_owned()))?
            .resolve(spec)
    }

    /// Resolves and returns all examples, keyed by name.
    pub fn examples(&self, spec: &Spec) -> IndexMap<String, Example> {
        self.examples
            .as_ref()
            .map(|examples| examples.resolve_all(spec))
            .unwrap_or_default()
    }
}

impl FromRef for MediaType {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::MediaType => spec
                .components
                .as_ref()
                .and_then(|cs| cs.media_types.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            typ => Err(RefError::MismatchedType(typ, RefType::MediaType)),
        }
    }
}
