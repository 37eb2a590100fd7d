use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{spec_extensions, ExternalDoc};

/// Adds metadata to a single tag that is used by [`Operation`](super::Operation).
///
/// It is not mandatory to have a Tag Object per tag defined in the Operation Object instances.
///
/// See <https://spec.openapis.org/oas/v3.2.0#tag-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct Tag {
    /// The name of the tag.
    pub name: String,

    /// A short summary of the tag, suitable for display in a navigation sidebar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// A description for the tag.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The name of a tag that this tag is nested under.
    ///
    /// The named tag MUST exist in the API description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// A machine-readable category of the tag, e.g. `nav` or `audience`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Additional external documentation for this tag.
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDoc>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}
