//! Structures used in parsing and navigating OpenAPI specifications.
//!
//! High-level structures include [`Spec`], [`Components`] & [`ObjectSchema`].

use http::Method;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

mod callback;
mod components;
mod contact;
mod discriminator;
mod encoding;
mod error;
mod example;
mod external_doc;
mod flows;
mod header;
mod info;
mod license;
mod link;
mod media_type;
mod media_type_examples;
mod operation;
mod parameter;
mod path_item;
mod r#ref;
mod registry;
mod request_body;
mod response;
mod schema;
mod security_requirement;
mod security_scheme;
mod server;
mod spec_extensions;
mod tag;
mod xml;

pub use self::{
    callback::*,
    components::*,
    contact::*,
    discriminator::*,
    encoding::*,
    error::Error,
    example::*,
    external_doc::*,
    flows::*,
    header::*,
    info::*,
    license::*,
    link::*,
    media_type::*,
    media_type_examples::*,
    operation::*,
    parameter::*,
    path_item::*,
    r#ref::*,
    registry::*,
    request_body::*,
    response::*,
    schema::{
        BooleanSchema, ObjectSchema, Schema, Type as SchemaType, TypeSet as SchemaTypeSet,
    },
    security_requirement::*,
    security_scheme::*,
    server::*,
    tag::*,
    xml::*,
};

const OPENAPI_SUPPORTED_VERSION_RANGE: &str = ">=3.1, <3.3";

/// A complete OpenAPI specification.
///
/// See <https://spec.openapis.org/oas/v3.2.0#openapi-object>.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Spec {
    /// This string MUST be the [semantic version number](https://semver.org/spec/v2.0.0.html)
    /// of the OpenAPI Specification version that the OpenAPI document uses.
    ///
    /// This is not related to the API [`Info::version`] string.
    pub openapi: String,

    /// Provides metadata about the API.
    ///
    /// The metadata MAY be used by tooling as required.
    pub info: Info,

    /// The canonical URI of this document, used as its base URI.
    #[serde(rename = "$self", skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<Url>,

    /// The default value for the `$schema` keyword within Schema Objects contained within this
    /// OAS document.
    #[serde(rename = "jsonSchemaDialect", skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<Url>,

    /// An array of Server Objects, which provide connectivity information to a target server.
    ///
    /// If the `servers` property is not provided, or is an empty array, the default value would
    /// be a Server Object with a `url` value of `/`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// Holds the relative paths to the individual endpoints and their operations.
    ///
    /// The path is appended to the URL from the Server Object in order to construct the full
    /// URL. Declaration order is preserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<IndexMap<String, PathItem>>,

    /// The incoming webhooks that MAY be received as part of this API.
    ///
    /// The key name is a unique string to refer to each webhook, while the (optionally
    /// referenced) Path Item Object describes a request that may be initiated by the API
    /// provider and the expected responses.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, PathItem>,

    /// An element to hold various schemas for the specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// A declaration of which security mechanisms can be used across the API.
    ///
    /// Only one of the requirement sets needs to be satisfied to authorize a request. An empty
    /// array makes security explicitly optional; individual operations can override this
    /// definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    /// A list of tags used by the specification with additional metadata.
    ///
    /// The order of the tags can be used to reflect on their order by the parsing tools. Not
    /// all tags that are used by the Operation Object must be declared. Each tag name in the
    /// list MUST be unique.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Additional external documentation.
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDoc>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Spec {
    /// Validates the spec version field against the supported range.
    pub fn validate_version(&self) -> Result<semver::Version, Error> {
        let spec_version = &self.openapi;
        let sem_ver = semver::Version::parse(spec_version)?;
        let required_version = semver::VersionReq::parse(OPENAPI_SUPPORTED_VERSION_RANGE).unwrap();

        if required_version.matches(&sem_ver) {
            Ok(sem_ver)
        } else {
            Err(Error::UnsupportedSpecFileVersion(sem_ver))
        }
    }

    /// Returns a reference to the operation with given `operation_id`, or `None` if not found.
    pub fn operation_by_id(&self, operation_id: &str) -> Option<&Operation> {
        self.operations()
            .into_iter()
            .find(|(_, _, op)| {
                op.operation_id
                    .as_deref()
                    .is_some_and(|id| id == operation_id)
            })
            .map(|(_, _, op)| op)
    }

    /// Returns a reference to the operation with given `method` and `path`, or `None` if not
    /// found.
    pub fn operation(&self, method: &Method, path: &str) -> Option<&Operation> {
        self.operations()
            .into_iter()
            .find(|(op_path, op_method, _)| op_path == path && op_method == method)
            .map(|(_, _, op)| op)
    }

    /// Returns all operations defined in this spec, in path declaration order.
    ///
    /// Non-standard verbs from `additionalOperations` are included with their
    /// raw method strings.
    pub fn operations(&self) -> Vec<(String, Method, &Operation)> {
        let paths = &self.paths;

        debug!(
            "num paths: {}",
            paths.as_ref().map_or(0, |paths| paths.len())
        );

        let ops = paths
            .iter()
            .flatten()
            .flat_map(|(path, item)| {
                item.methods()
                    .into_iter()
                    .chain(item.additional_operations.iter().filter_map(|(raw, op)| {
                        Method::from_bytes(raw.as_bytes()).ok().map(|m| (m, op))
                    }))
                    .map(move |(method, op)| (path.clone(), method, op))
            })
            .collect::<Vec<_>>();

        debug!("num ops: {}", ops.len());

        ops
    }

    /// Returns all webhook operations, keyed by webhook name.
    pub fn webhook_operations(&self) -> Vec<(String, Method, &Operation)> {
        self.webhooks
            .iter()
            .flat_map(|(name, item)| {
                item.methods()
                    .into_iter()
                    .map(move |(method, op)| (name.clone(), method, op))
            })
            .collect()
    }

    /// Returns a reference to the primary (first) server definition.
    pub fn primary_server(&self) -> Option<&Server> {
        self.servers.first()
    }

    /// Base URI of this document per the `$self` → retrieval-URI precedence.
    pub fn base_uri(&self, retrieval_uri: Option<&Url>) -> Option<Url> {
        self.self_uri
            .clone()
            .or_else(|| retrieval_uri.cloned())
            .map(|mut uri| {
                uri.set_fragment(None);
                uri
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn minimal(version: &str) -> Spec {
        serde_json::from_value(serde_json::json!({
            "openapi": version,
            "info": { "title": "test", "version": "v1" },
        }))
        .unwrap()
    }

    #[test]
    fn accepts_supported_versions() {
        assert!(minimal("3.1.0").validate_version().is_ok());
        assert!(minimal("3.2.0").validate_version().is_ok());
    }

    #[test]
    fn rejects_unsupported_versions() {
        assert!(minimal("3.0.3").validate_version().is_err());
        assert!(minimal("4.0.0").validate_version().is_err());
    }

    #[test]
    fn operations_preserve_path_declaration_order() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "test", "version": "v1" },
            "paths": {
                "/zebra": { "get": { "operationId": "z" } },
                "/aardvark": { "get": { "operationId": "a" } },
            },
        }))
        .unwrap();

        let ids = spec
            .operations()
            .into_iter()
            .map(|(_, _, op)| op.operation_id.clone().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["z".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn base_uri_prefers_self_over_retrieval() {
        let mut spec = minimal("3.2.0");
        let retrieval = Url::parse("https://example.com/fetched.json").unwrap();

        assert_eq!(
            spec.base_uri(Some(&retrieval)).unwrap().as_str(),
            "https://example.com/fetched.json"
        );

        spec.self_uri = Some(Url::parse("https://example.com/canonical.json#frag").unwrap());
        assert_eq!(
            spec.base_uri(Some(&retrieval)).unwrap().as_str(),
            "https://example.com/canonical.json"
        );
    }
}
