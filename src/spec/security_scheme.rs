use serde::{Deserialize, Serialize};
use url::Url;

use super::{Flows, FromRef, Ref, RefError, RefType, Spec};

/// Defines a security scheme that can be used by the operations.
///
/// Supported schemes are HTTP authentication, an API key (as a header, cookie, or query
/// parameter), mutual TLS, OAuth2's common flows as defined in
/// [RFC6749](https://tools.ietf.org/html/rfc6749), and
/// [OpenID Connect Discovery](https://tools.ietf.org/html/draft-ietf-oauth-discovery-06).
///
/// See <https://spec.openapis.org/oas/v3.2.0#security-scheme-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// API key, sent in a header, cookie, or query parameter.
    #[serde(rename = "apiKey")]
    ApiKey {
        /// The name of the header, query or cookie parameter to be used.
        name: String,

        /// The location of the API key: `query`, `header`, or `cookie`.
        #[serde(rename = "in")]
        location: String,

        /// A description for the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// HTTP authentication per RFC7235.
    #[serde(rename = "http")]
    Http {
        /// The name of the HTTP Authentication scheme, e.g. `basic` or `bearer`.
        scheme: String,

        /// A hint to the client to identify how the bearer token is formatted.
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,

        /// A description for the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// Mutual TLS client certificate authentication.
    #[serde(rename = "mutualTLS")]
    MutualTls {
        /// A description for the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// OAuth2 flows.
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Configuration for the supported flow types.
        flows: Box<Flows>,

        /// URL to the OAuth2 authorization server metadata (RFC8414).
        #[serde(
            rename = "oauth2MetadataUrl",
            skip_serializing_if = "Option::is_none"
        )]
        oauth2_metadata_url: Option<Url>,

        /// A description for the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// OpenID Connect discovery.
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        /// Well-known URL to discover the OpenID Connect provider metadata.
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: Url,

        /// A description for the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl FromRef for SecurityScheme {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::SecurityScheme => spec
                .components
                .as_ref()
                .and_then(|cs| cs.security_schemes.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            typ => Err(RefError::MismatchedType(typ, RefType::SecurityScheme)),
        }
    }
}
