use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{spec_extensions, Contact, License};

/// General information about the API.
///
/// See <https://spec.openapis.org/oas/v3.2.0#info-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct Info {
    /// The title of the API.
    pub title: String,

    /// A short summary of the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// A description of the API.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The version of the OpenAPI document (which is distinct from the OpenAPI Specification
    /// version or the API implementation version).
    pub version: String,

    /// A URL to the Terms of Service for the API.
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<Url>,

    /// The contact information for the exposed API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    /// The license information for the exposed API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn terms_of_service_is_parsed_as_url() {
        let info = serde_json::from_str::<Info>(
            r#"{ "title": "pets", "version": "1.0", "termsOfService": "https://example.com/tos" }"#,
        )
        .unwrap();

        assert_eq!(
            info.terms_of_service.unwrap().as_str(),
            "https://example.com/tos"
        );
    }
}
