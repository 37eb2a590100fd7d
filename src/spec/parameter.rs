use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    spec_extensions, Example, FromRef, MediaType, ObjectOrReference, Ref, RefError, RefType,
    Schema, Spec,
};

/// The location of a parameter.
///
/// See <https://spec.openapis.org/oas/v3.2.0#parameter-locations>.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ParameterIn {
    /// Used together with path templating, where the parameter value is part of the operation's
    /// URL.
    Path,

    /// Parameters that are appended to the URL.
    Query,

    /// The entire query string, described as one value.
    Querystring,

    /// Custom headers that are expected as part of the request.
    Header,

    /// Used to pass a specific cookie value to the API.
    Cookie,
}

/// Serialization style of a parameter.
///
/// Describes how the parameter value will be serialized depending on the type of the parameter
/// value. Default values (based on value of `in`): for `query` - `form`; for `path` - `simple`;
/// for `header` - `simple`; for `cookie` - `form`.
///
/// See <https://spec.openapis.org/oas/v3.2.0#style-values>.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    /// Path-style parameters defined by RFC6570.
    Matrix,

    /// Label-style parameters defined by RFC6570.
    Label,

    /// Form style parameters defined by RFC6570.
    Form,

    /// Simple style parameters defined by RFC6570.
    Simple,

    /// Space separated array values.
    SpaceDelimited,

    /// Pipe separated array values.
    PipeDelimited,

    /// Provides a simple way of rendering nested objects using form parameters.
    DeepObject,

    /// Cookie-list serialization, usable only for `querystring` parameters.
    Cookie,
}

/// Where an example for a parameter was supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExampleLocation {
    /// No example present.
    None,

    /// Singular `example` field on the Parameter Object.
    Object,

    /// Keyed `examples` map on the Parameter Object.
    ObjectMap,

    /// Example(s) inside the `content` media type map.
    Media,
}

/// Describes a single operation parameter.
///
/// A unique parameter is defined by a combination of a [name] and [location].
///
/// See <https://spec.openapis.org/oas/v3.2.0#parameter-object>.
///
/// [name]: https://spec.openapis.org/oas/v3.2.0#parameterName
/// [location]: https://spec.openapis.org/oas/v3.2.0#parameterIn
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Parameter {
    /// The name of the parameter. Parameter names are case sensitive.
    pub name: String,

    /// The location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterIn,

    /// A brief description of the parameter.
    ///
    /// This could contain examples of use. [CommonMark syntax](https://spec.commonmark.org) MAY
    /// be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Determines whether this parameter is mandatory.
    ///
    /// If the parameter location is `path`, this property is REQUIRED and its value MUST be
    /// `true`. Otherwise, the property MAY be included and its default value is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Specifies that a parameter is deprecated and SHOULD be transitioned out of usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Sets the ability to pass empty-valued parameters.
    ///
    /// This is valid only for `query` parameters.
    #[serde(rename = "allowEmptyValue", skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,

    /// Describes how the parameter value will be serialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,

    /// True if array/object parameter values generate separate parameters for each value of the
    /// array or key-value pair of the map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    /// Determines whether the parameter value SHOULD allow reserved characters, as defined by
    /// RFC3986, to be included without percent-encoding.
    ///
    /// This property only applies to parameters with an `in` value of `query`.
    #[serde(rename = "allowReserved", skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,

    /// The schema defining the type used for the parameter.
    ///
    /// A parameter MUST contain either a `schema` property, or a `content` property, but not
    /// both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ObjectOrReference<Schema>>,

    /// Example of the parameter's potential value; mutually exclusive of `examples`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    /// Examples of the parameter's potential value; mutually exclusive of `example`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ObjectOrReference<Example>>,

    /// A map containing the representations for the parameter.
    ///
    /// The key is the media type and the value describes it. The map MUST only contain one
    /// entry. A parameter MUST contain either a `schema` property, or a `content` property, but
    /// not both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Parameter {
    /// Returns `true` when the parameter must be supplied.
    ///
    /// Path parameters are always required.
    pub fn is_required(&self) -> bool {
        self.location == ParameterIn::Path || self.required.unwrap_or(false)
    }

    /// Effective serialization style, applying the per-location defaults.
    pub fn effective_style(&self) -> ParameterStyle {
        self.style.unwrap_or(match self.location {
            ParameterIn::Query | ParameterIn::Querystring | ParameterIn::Cookie => {
                ParameterStyle::Form
            }
            ParameterIn::Path | ParameterIn::Header => ParameterStyle::Simple,
        })
    }

    /// Effective explode flag; `form` style defaults to exploded.
    pub fn effective_explode(&self) -> bool {
        self.explode
            .unwrap_or(self.effective_style() == ParameterStyle::Form)
    }

    /// Where this parameter's example, if any, was supplied.
    pub fn example_location(&self) -> ExampleLocation {
        if self.example.is_some() {
            ExampleLocation::Object
        } else if !self.examples.is_empty() {
            ExampleLocation::ObjectMap
        } else if self
            .content
            .as_ref()
            .is_some_and(|content| content.values().any(|mt| mt.examples.is_some()))
        {
            ExampleLocation::Media
        } else {
            ExampleLocation::None
        }
    }
}

impl FromRef for Parameter {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::Parameter => spec
                .components
                .as_ref()
                .and_then(|cs| cs.parameters.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            typ => Err(RefError::MismatchedType(typ, RefType::Parameter)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn style_defaults_follow_location() {
        let param = serde_json::from_str::<Parameter>(r#"{ "name": "id", "in": "path" }"#).unwrap();
        assert_eq!(param.effective_style(), ParameterStyle::Simple);
        assert!(!param.effective_explode());
        assert!(param.is_required());

        let param = serde_json::from_str::<Parameter>(r#"{ "name": "q", "in": "query" }"#).unwrap();
        assert_eq!(param.effective_style(), ParameterStyle::Form);
        assert!(param.effective_explode());
        assert!(!param.is_required());
    }

    #[test]
    fn querystring_location_is_accepted() {
        let param = serde_json::from_str::<Parameter>(
            r#"{ "name": "filter", "in": "querystring", "content": { "application/json": {} } }"#,
        )
        .unwrap();

        assert_eq!(param.location, ParameterIn::Querystring);
        assert_eq!(param.example_location(), ExampleLocation::None);
    }
}
