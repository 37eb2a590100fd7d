use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::error;
use serde::{Deserialize, Serialize};

use super::{
    spec_extensions, Callback, Error, ExternalDoc, ObjectOrReference, Parameter, RequestBody,
    Response, SecurityRequirement, Server, Spec,
};

/// Describes a single API operation on a path.
///
/// See <https://spec.openapis.org/oas/v3.2.0#operation-object>.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Operation {
    /// A list of tags for API documentation control.
    ///
    /// Tags can be used for logical grouping of operations by resources or any other qualifier.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// A short summary of what the operation does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// A verbose explanation of the operation behavior.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Additional external documentation for this operation.
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDoc>,

    /// String used to uniquely identify the operation within this spec.
    ///
    /// The ID MUST be unique among all operations described in the API. Tools and libraries MAY
    /// use the operation ID to uniquely identify an operation, therefore, it is RECOMMENDED to
    /// follow common programming naming conventions.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// A list of parameters that are applicable for this operation.
    ///
    /// If a parameter is already defined at the Path Item, the new definition will override it
    /// but can never remove it. The list MUST NOT include duplicated parameters. A unique
    /// parameter is defined by a combination of a name and location.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ObjectOrReference<Parameter>>,

    /// The request body applicable for this operation.
    ///
    /// The `requestBody` is only supported in HTTP methods where the HTTP/1.1 specification
    /// RFC7231 has explicitly defined semantics for request bodies.
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<ObjectOrReference<RequestBody>>,

    /// The list of possible responses as they are returned from executing this operation,
    /// keyed by status code or `default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<BTreeMap<String, ObjectOrReference<Response>>>,

    /// A map of possible out-of-band callbacks related to the parent operation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub callbacks: BTreeMap<String, Callback>,

    /// Declares this operation to be deprecated. Default value is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// A declaration of which security mechanisms can be used for this operation.
    ///
    /// Only one of the requirement sets needs to be satisfied to authorize a request. An empty
    /// array removes security from the operation; an absent field inherits the root
    /// declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    /// An alternative `servers` array to service this operation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Operation {
    /// Resolves and returns this operation's request body.
    pub fn request_body(&self, spec: &Spec) -> Result<Option<RequestBody>, Error> {
        let Some(req_body) = self.request_body.as_ref() else {
            return Ok(None);
        };

        let req_body = req_body.resolve(spec).map_err(Error::Ref)?;

        Ok(Some(req_body))
    }

    /// Resolves and returns map of this operation's responses, keyed by status code.
    ///
    /// Unresolvable references are logged and skipped.
    pub fn responses(&self, spec: &Spec) -> BTreeMap<String, Response> {
        self.responses
            .iter()
            .flatten()
            .filter_map(|(code, oor)| {
                oor.resolve(spec)
                    .map(|obj| (code.clone(), obj))
                    .map_err(|err| error!("{err}"))
                    .ok()
            })
            .collect()
    }

    /// Resolves and returns list of this operation's parameters.
    ///
    /// Unresolvable references are logged and skipped.
    pub fn parameters(&self, spec: &Spec) -> Vec<Parameter> {
        self.parameters
            .iter()
            .filter_map(|oor| oor.resolve(spec).map_err(|err| error!("{err}")).ok())
            .collect()
    }

    /// Finds, resolves, and returns one of this operation's parameters by name.
    pub fn parameter(&self, search: &str, spec: &Spec) -> Option<Parameter> {
        self.parameters(spec)
            .into_iter()
            .find(|param| param.name == search)
    }

    /// Security requirement sets in effect, falling back to the root declaration.
    ///
    /// An explicit empty array means "no security" and does not fall back.
    pub fn effective_security<'a>(&'a self, spec: &'a Spec) -> &'a [SecurityRequirement] {
        match &self.security {
            Some(own) => own,
            None => spec.security.as_deref().unwrap_or(&[]),
        }
    }
}
