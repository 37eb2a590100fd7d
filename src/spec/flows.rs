use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::spec_extensions;

/// Allows configuration of the supported OAuth2 flows.
///
/// See <https://spec.openapis.org/oas/v3.2.0#oauth-flows-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct Flows {
    /// Configuration for the OAuth2 Implicit flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<ImplicitFlow>,

    /// Configuration for the OAuth2 Resource Owner Password flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<PasswordFlow>,

    /// Configuration for the OAuth2 Client Credentials flow.
    #[serde(rename = "clientCredentials", skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<ClientCredentialsFlow>,

    /// Configuration for the OAuth2 Authorization Code flow.
    #[serde(rename = "authorizationCode", skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<AuthorizationCodeFlow>,

    /// Configuration for the OAuth2 Device Authorization flow (RFC8628).
    #[serde(
        rename = "deviceAuthorization",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_authorization: Option<DeviceAuthorizationFlow>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// Configuration details for the OAuth2 Implicit flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ImplicitFlow {
    /// The authorization URL to be used for this flow.
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: Url,

    /// The URL to be used for obtaining refresh tokens.
    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<Url>,

    /// The available scopes for the OAuth2 security scheme.
    ///
    /// A map between the scope name and a short description for it.
    pub scopes: IndexMap<String, String>,
}

/// Configuration details for the OAuth2 Resource Owner Password flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PasswordFlow {
    /// The token URL to be used for this flow.
    #[serde(rename = "tokenUrl")]
    pub token_url: Url,

    /// The URL to be used for obtaining refresh tokens.
    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<Url>,

    /// The available scopes for the OAuth2 security scheme.
    pub scopes: IndexMap<String, String>,
}

/// Configuration details for the OAuth2 Client Credentials flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ClientCredentialsFlow {
    /// The token URL to be used for this flow.
    #[serde(rename = "tokenUrl")]
    pub token_url: Url,

    /// The URL to be used for obtaining refresh tokens.
    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<Url>,

    /// The available scopes for the OAuth2 security scheme.
    pub scopes: IndexMap<String, String>,
}

/// Configuration details for the OAuth2 Authorization Code flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AuthorizationCodeFlow {
    /// The authorization URL to be used for this flow.
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: Url,

    /// The token URL to be used for this flow.
    #[serde(rename = "tokenUrl")]
    pub token_url: Url,

    /// The URL to be used for obtaining refresh tokens.
    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<Url>,

    /// The available scopes for the OAuth2 security scheme.
    pub scopes: IndexMap<String, String>,
}

/// Configuration details for the OAuth2 Device Authorization flow.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DeviceAuthorizationFlow {
    /// The device authorization endpoint to be used for this flow.
    #[serde(rename = "deviceAuthorizationUrl")]
    pub device_authorization_url: Url,

    /// The token URL to be used for this flow.
    #[serde(rename = "tokenUrl")]
    pub token_url: Url,

    /// The URL to be used for obtaining refresh tokens.
    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<Url>,

    /// The available scopes for the OAuth2 security scheme.
    pub scopes: IndexMap<String, String>,
}
