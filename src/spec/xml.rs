use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::spec_extensions;

/// Node type an XML-mapped schema serializes to.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum XmlNodeType {
    /// An XML element node.
    Element,
    /// An XML attribute node.
    Attribute,
    /// A text node.
    Text,
    /// A CDATA section.
    Cdata,
    /// No node is produced.
    None,
}

/// Metadata describing how a schema maps to XML.
///
/// See <https://spec.openapis.org/oas/v3.2.0#xml-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct Xml {
    /// The kind of node this schema produces.
    #[serde(rename = "nodeType", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<XmlNodeType>,

    /// Replaces the name of the element/attribute used for the described schema property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The URI of the namespace definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Url>,

    /// The prefix to be used for the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Declares whether the property definition translates to an attribute instead of an
    /// element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<bool>,

    /// MAY be used only for an array definition, signifying the array is wrapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<bool>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}
