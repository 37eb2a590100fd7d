use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    spec_extensions, FromRef, ObjectOrReference, Operation, Parameter, Ref, RefError, RefType,
    Server, Spec,
};

/// Describes the operations available on a single path.
///
/// A Path Item MAY be empty, due to
/// [ACL constraints](https://spec.openapis.org/oas/v3.2.0#security-filtering). The path itself
/// is still exposed to the documentation viewer but they will not know which operations and
/// parameters are available.
///
/// See <https://spec.openapis.org/oas/v3.2.0#path-item-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct PathItem {
    /// Allows for an external definition of this path item.
    ///
    /// The referenced structure MUST be in the format of a Path Item Object. If there are
    /// conflicts between the referenced definition and this Path Item's definition, the
    /// behavior is undefined.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// An optional string summary, intended to apply to all operations in this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// An optional string description, intended to apply to all operations in this path.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A definition of a GET operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    /// A definition of a PUT operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    /// A definition of a POST operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    /// A definition of a DELETE operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    /// A definition of a OPTIONS operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,

    /// A definition of a HEAD operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,

    /// A definition of a PATCH operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    /// A definition of a TRACE operation on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    /// A definition of a QUERY operation (safe, idempotent request with a body) on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Operation>,

    /// Operations keyed by non-standard HTTP method names.
    ///
    /// The raw method string is the map key and is preserved verbatim.
    #[serde(
        default,
        rename = "additionalOperations",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub additional_operations: IndexMap<String, Operation>,

    /// An alternative `servers` array to service all operations in this path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// A list of parameters that are applicable for all the operations described under this
    /// path.
    ///
    /// These parameters can be overridden at the operation level, but cannot be removed there.
    /// The list MUST NOT include duplicated parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ObjectOrReference<Parameter>>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl PathItem {
    /// Returns the standard-method operations defined on this path item.
    pub fn methods(&self) -> Vec<(Method, &Operation)> {
        let mut methods = vec![];

        macro_rules! push_method {
            ($field:ident, $method:ident) => {{
                if let Some(ref op) = self.$field {
                    methods.push((Method::$method, op))
                }
            }};
        }

        push_method!(get, GET);
        push_method!(put, PUT);
        push_method!(post, POST);
        push_method!(delete, DELETE);
        push_method!(options, OPTIONS);
        push_method!(head, HEAD);
        push_method!(patch, PATCH);
        push_method!(trace, TRACE);

        if let Some(ref op) = self.query {
            // No associated constant; QUERY is registered as an extension method.
            methods.push((Method::from_bytes(b"QUERY").unwrap(), op));
        }

        methods
    }

    /// Returns a mutable slot for the given uppercase verb, standard or not.
    ///
    /// Non-standard verbs land in `additionalOperations` keyed by the raw
    /// method string.
    pub fn operation_slot(&mut self, verb: &str) -> &mut Option<Operation> {
        match verb {
            "GET" => &mut self.get,
            "PUT" => &mut self.put,
            "POST" => &mut self.post,
            "DELETE" => &mut self.delete,
            "OPTIONS" => &mut self.options,
            "HEAD" => &mut self.head,
            "PATCH" => &mut self.patch,
            "TRACE" => &mut self.trace,
            "QUERY" => &mut self.query,
            _ => unreachable!("additional operations are stored by raw method"),
        }
    }

    /// Returns `true` when `verb` maps to a dedicated operation field.
    pub fn is_standard_verb(verb: &str) -> bool {
        matches!(
            verb,
            "GET" | "PUT" | "POST" | "DELETE" | "OPTIONS" | "HEAD" | "PATCH" | "TRACE" | "QUERY"
        )
    }
}

impl FromRef for PathItem {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::PathItem => spec
                .components
                .as_ref()
                .and_then(|cs| cs.path_items.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            typ => Err(RefError::MismatchedType(typ, RefType::PathItem)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn additional_operations_keep_raw_method() {
        let item = serde_json::from_str::<PathItem>(indoc::indoc! {r#"{
            "get": { "operationId": "listPets" },
            "additionalOperations": {
                "PURGE": { "operationId": "purgePets" }
            }
        }"#})
        .unwrap();

        assert_eq!(item.methods().len(), 1);
        assert_eq!(
            item.additional_operations["PURGE"].operation_id.as_deref(),
            Some("purgePets")
        );
    }

    #[test]
    fn query_is_a_first_class_verb() {
        let item =
            serde_json::from_str::<PathItem>(r#"{ "query": { "operationId": "searchPets" } }"#)
                .unwrap();

        let methods = item.methods();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].0.as_str(), "QUERY");
    }
}
