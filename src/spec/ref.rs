use std::str::FromStr;

use derive_more::derive::{Display, Error};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Spec;

static REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^(?P<source>[^#]*)#/components/(?P<type>[^/]+)/(?P<name>.+)$").unwrap()
});

/// Component reference errors.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum RefError {
    /// Reference points at an unknown component collection.
    #[display("Invalid type: {_0}")]
    InvalidType(#[error(not(source))] String),

    /// Reference resolved to a component of a different type than requested.
    #[display("Mismatched type: cannot reference a {_0} as a {_1}")]
    MismatchedType(RefType, RefType),

    /// Reference does not point at a component in this document or its
    /// registry.
    #[display("Unresolvable path: {_0}")]
    Unresolvable(#[error(not(source))] String),
}

/// Component type of a reference target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RefType {
    /// Schema Objects under `#/components/schemas`.
    Schema,
    /// Response Objects under `#/components/responses`.
    Response,
    /// Parameter Objects under `#/components/parameters`.
    Parameter,
    /// Example Objects under `#/components/examples`.
    Example,
    /// Request Body Objects under `#/components/requestBodies`.
    RequestBody,
    /// Header Objects under `#/components/headers`.
    Header,
    /// Media Type Objects under `#/components/mediaTypes`.
    MediaType,
    /// Path Item Objects under `#/components/pathItems`.
    PathItem,
    /// Security Scheme Objects under `#/components/securitySchemes`.
    SecurityScheme,
    /// Link Objects under `#/components/links`.
    Link,
    /// Callback Objects under `#/components/callbacks`.
    Callback,
}

impl FromStr for RefType {
    type Err = RefError;

    fn from_str(typ: &str) -> Result<Self, Self::Err> {
        Ok(match typ {
            "schemas" => Self::Schema,
            "responses" => Self::Response,
            "parameters" => Self::Parameter,
            "examples" => Self::Example,
            "requestBodies" => Self::RequestBody,
            "headers" => Self::Header,
            "mediaTypes" => Self::MediaType,
            "pathItems" => Self::PathItem,
            "securitySchemes" => Self::SecurityScheme,
            "links" => Self::Link,
            "callbacks" => Self::Callback,
            typ => return Err(RefError::InvalidType(typ.to_owned())),
        })
    }
}

impl RefType {
    /// Collection key of this component type under `#/components/`.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Schema => "schemas",
            Self::Response => "responses",
            Self::Parameter => "parameters",
            Self::Example => "examples",
            Self::RequestBody => "requestBodies",
            Self::Header => "headers",
            Self::MediaType => "mediaTypes",
            Self::PathItem => "pathItems",
            Self::SecurityScheme => "securitySchemes",
            Self::Link => "links",
            Self::Callback => "callbacks",
        }
    }
}

/// Parsed component reference path.
///
/// The `source` part (everything before `#`) is empty for intra-document
/// references and holds the target document URI otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    /// Document part of the reference, before the fragment.
    pub source: String,

    /// Component type of the reference target.
    pub kind: RefType,

    /// Component name of the reference target.
    pub name: String,
}

impl FromStr for Ref {
    type Err = RefError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let parts = REF_RE
            .captures(path)
            .ok_or_else(|| RefError::Unresolvable(path.to_owned()))?;

        trace!("creating Ref: {}/{}", &parts["type"], &parts["name"]);

        Ok(Self {
            source: parts["source"].to_owned(),
            kind: parts["type"].parse()?,
            name: parts["name"].to_owned(),
        })
    }
}

/// Object lookup via `$ref` path within a spec.
pub trait FromRef: Clone {
    /// Resolves this component type from `path` within `spec`.
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError>;
}

/// Container for an object, a `$ref` to one, or a `$dynamicRef` to one.
///
/// `$dynamicRef` carries dynamic-scope resolution semantics and is kept
/// distinct so emitters can honor them; both reference forms preserve the
/// raw path verbatim.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ObjectOrReference<T> {
    /// Dynamic reference to an object elsewhere.
    DynamicRef {
        /// Raw dynamic reference path.
        #[serde(rename = "$dynamicRef")]
        ref_path: String,
    },

    /// Reference to an object elsewhere, usually under `#/components`.
    Ref {
        /// Raw reference path.
        #[serde(rename = "$ref")]
        ref_path: String,
    },

    /// Inline object.
    Object(T),
}

impl<T> ObjectOrReference<T>
where
    T: FromRef,
{
    /// Resolves the object, looking references up within `spec`.
    pub fn resolve(&self, spec: &Spec) -> Result<T, RefError> {
        match self {
            Self::Object(component) => Ok(component.clone()),
            Self::Ref { ref_path } | Self::DynamicRef { ref_path } => T::from_ref(spec, ref_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_intra_document_ref() {
        let reference = "#/components/schemas/Pet".parse::<Ref>().unwrap();
        assert_eq!(reference.source, "");
        assert_eq!(reference.kind, RefType::Schema);
        assert_eq!(reference.name, "Pet");
    }

    #[test]
    fn parses_cross_document_ref() {
        let reference = "https://example.com/defs.json#/components/responses/Error"
            .parse::<Ref>()
            .unwrap();
        assert_eq!(reference.source, "https://example.com/defs.json");
        assert_eq!(reference.kind, RefType::Response);
        assert_eq!(reference.name, "Error");
    }

    #[test]
    fn rejects_unknown_collection() {
        let err = "#/components/gizmos/Thing".parse::<Ref>().unwrap_err();
        assert_matches!(err, RefError::InvalidType(typ) if typ == "gizmos");
    }

    #[test]
    fn rejects_non_component_path() {
        let err = "#/paths/~1pets".parse::<Ref>().unwrap_err();
        assert_matches!(err, RefError::Unresolvable(_));
    }
}
