use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::spec_extensions;

/// An object representing a Server.
///
/// See <https://spec.openapis.org/oas/v3.2.0#server-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct Server {
    /// A URL to the target host.
    ///
    /// This URL supports Server Variables and MAY be relative, to indicate that the host location
    /// is relative to the location where the OpenAPI document is being served. Variable
    /// substitutions will be made when a variable is named in `{` brackets `}`.
    pub url: String,

    /// A human-readable name for the server, e.g. `Production`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// An optional string describing the host designated by the URL.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A map between a variable name and its value.
    ///
    /// The value is used for substitution in the server's URL template.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// An object representing a Server Variable for server URL template substitution.
///
/// See <https://spec.openapis.org/oas/v3.2.0#server-variable-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct ServerVariable {
    /// The default value to use for substitution, and to send, if an alternate value is not
    /// supplied.
    pub default: String,

    /// An enumeration of string values to be used if the substitution options are from a limited
    /// set.
    #[serde(
        default,
        rename = "enum",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub substitutions_enum: Vec<String>,

    /// An optional description for the server variable.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
