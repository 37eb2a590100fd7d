//! Schema specification as used by OpenAPI 3.1 and later.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    spec_extensions, Discriminator, ExternalDoc, FromRef, ObjectOrReference, Ref, RefError,
    RefType, Spec, Xml,
};

/// A schema: either a boolean acceptor or a full Schema Object.
///
/// See <https://spec.openapis.org/oas/v3.2.0#schema-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Schema {
    /// The `true`/`false` schema form accepting everything or nothing.
    Boolean(BooleanSchema),

    /// A full Schema Object.
    Object(Box<ObjectSchema>),
}

impl Schema {
    /// Returns the contained Schema Object, or `None` for a boolean schema.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Boolean(_) => None,
            Self::Object(obj) => Some(obj),
        }
    }
}

/// A boolean schema (`true` accepts all instances, `false` rejects all).
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BooleanSchema(pub bool);

/// Data type of a schema.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// JSON boolean.
    Boolean,
    /// JSON number restricted to integral values.
    Integer,
    /// JSON number.
    Number,
    /// JSON string.
    String,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// JSON null.
    Null,
}

/// The `type` keyword: a single type or a union of types (OAS 3.1+).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TypeSet {
    /// A single named type.
    Single(Type),

    /// A union of types.
    Multiple(Vec<Type>),
}

impl TypeSet {
    /// Returns `true` if the set names `typ`.
    pub fn contains(&self, typ: Type) -> bool {
        match self {
            Self::Single(this) => *this == typ,
            Self::Multiple(these) => these.contains(&typ),
        }
    }

    /// Returns `true` if the set admits `null`.
    pub fn is_nullable(&self) -> bool {
        self.contains(Type::Null)
    }

    /// Returns the first non-null type in the set, if any.
    pub fn primary(&self) -> Option<Type> {
        match self {
            Self::Single(Type::Null) => None,
            Self::Single(this) => Some(*this),
            Self::Multiple(these) => these.iter().copied().find(|typ| *typ != Type::Null),
        }
    }
}

/// The Schema Object allows the definition of input and output data types.
///
/// These types can be objects, but also primitives and arrays. References
/// (`$ref` and `$dynamicRef`) are recorded verbatim alongside any sibling
/// keywords rather than eagerly resolved.
///
/// See <https://spec.openapis.org/oas/v3.2.0#schema-object>.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct ObjectSchema {
    //
    // reference keywords
    //
    /// Reference to another schema, preserved verbatim.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,

    /// Dynamic reference, preserved verbatim with its dynamic-scope semantics.
    #[serde(rename = "$dynamicRef", skip_serializing_if = "Option::is_none")]
    pub dynamic_ref: Option<String>,

    /// Schema resource identifier, used as a base URI by the registry.
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    //
    // display metadata
    //
    /// A short title for the schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// A description of the schema.
    ///
    /// [CommonMark syntax](https://spec.commonmark.org) MAY be used for rich text representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    //
    // type
    //
    /// The `type` keyword; a union array records the full set.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    /// Format hint layered over the type, e.g. `int64` or `date-time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    //
    // structure
    //
    /// Property names that must be present on instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Schema applied to array items (after `prefixItems`, if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ObjectOrReference<Schema>>>,

    /// Positional schemas applied to the first array items.
    #[serde(
        default,
        rename = "prefixItems",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub prefix_items: Vec<ObjectOrReference<Schema>>,

    /// Named properties; declaration order is preserved.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, ObjectOrReference<Schema>>,

    /// Schema applied to properties not matched by `properties`.
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,

    //
    // additional metadata
    //
    /// Default instance value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Constant instance value.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<serde_json::Value>,

    /// Example value (deprecated in favor of `examples`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    /// Example values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,

    //
    // validation keywords
    //
    /// Admissible instance values.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    /// Regular expression that string instances must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Numeric instances must be a multiple of this value.
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<serde_json::Number>,

    /// Inclusive lower bound for numeric instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Number>,

    /// Exclusive lower bound for numeric instances.
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<serde_json::Number>,

    /// Inclusive upper bound for numeric instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Number>,

    /// Exclusive upper bound for numeric instances.
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<serde_json::Number>,

    /// Minimum string length.
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// Maximum string length.
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Minimum array length.
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    /// Maximum array length.
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    /// Whether array items must be pairwise distinct.
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    /// Minimum property count.
    #[serde(rename = "minProperties", skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    /// Maximum property count.
    #[serde(rename = "maxProperties", skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    //
    // content keywords
    //
    /// Media type of string-encoded content.
    #[serde(rename = "contentMediaType", skip_serializing_if = "Option::is_none")]
    pub content_media_type: Option<String>,

    /// Encoding of string-encoded content, e.g. `base64`.
    #[serde(rename = "contentEncoding", skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    //
    // composition
    //
    /// Instances must validate against every listed schema.
    #[serde(default, rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<ObjectOrReference<Schema>>,

    /// Instances must validate against exactly one listed schema.
    #[serde(default, rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<ObjectOrReference<Schema>>,

    /// Instances must validate against at least one listed schema.
    #[serde(default, rename = "anyOf", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<ObjectOrReference<Schema>>,

    /// Instances must not validate against this schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<ObjectOrReference<Schema>>>,

    //
    // semantic metadata
    //
    /// Declares the schema readable but not writable.
    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    /// Declares the schema writable but not readable.
    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    /// Declares the schema deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Discriminator for polymorphic composition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    /// XML serialization metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<Xml>,

    /// Additional external documentation for this schema.
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDoc>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    #[serde(flatten, with = "spec_extensions")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl ObjectSchema {
    /// Returns `true` if this schema is (or can be) `null`.
    pub fn is_nullable(&self) -> bool {
        self.schema_type
            .as_ref()
            .is_some_and(TypeSet::is_nullable)
    }

    /// Returns `true` if the primary type is `array`.
    pub fn is_array(&self) -> bool {
        self.schema_type
            .as_ref()
            .and_then(TypeSet::primary)
            .is_some_and(|typ| typ == Type::Array)
    }

    /// Returns the component name a plain `#/components/schemas/<name>`
    /// reference points at, if this schema is such a reference.
    pub fn ref_name(&self) -> Option<String> {
        let path = self.ref_path.as_deref()?;
        let reference = path.parse::<Ref>().ok()?;

        (reference.kind == RefType::Schema).then_some(reference.name)
    }
}

impl FromRef for ObjectSchema {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::Schema => spec
                .components
                .as_ref()
                .and_then(|cs| cs.schemas.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec))
                .and_then(|schema| match schema {
                    Schema::Object(obj) => Ok(*obj),
                    Schema::Boolean(_) => Err(RefError::Unresolvable(path.to_owned())),
                }),

            typ => Err(RefError::MismatchedType(typ, RefType::Schema)),
        }
    }
}

impl FromRef for Schema {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::Schema => spec
                .components
                .as_ref()
                .and_then(|cs| cs.schemas.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            typ => Err(RefError::MismatchedType(typ, RefType::Schema)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn type_union_records_full_set_and_nullability() {
        let schema = serde_json::from_str::<ObjectSchema>(
            r#"{ "type": ["string", "null"], "minLength": 1 }"#,
        )
        .unwrap();

        let types = schema.schema_type.as_ref().unwrap();
        assert!(types.contains(Type::String));
        assert!(types.is_nullable());
        assert_eq!(types.primary(), Some(Type::String));
        assert_eq!(schema.min_length, Some(1));
    }

    #[test]
    fn boolean_schema_round_trips() {
        let schema = serde_json::from_str::<Schema>("true").unwrap();
        assert_eq!(schema, Schema::Boolean(BooleanSchema(true)));
        assert_eq!(serde_json::to_string(&schema).unwrap(), "true");
    }

    #[test]
    fn ref_is_preserved_verbatim() {
        let schema = serde_json::from_str::<ObjectSchema>(
            r##"{ "$ref": "#/components/schemas/Pet", "description": "a pet" }"##,
        )
        .unwrap();

        assert_eq!(schema.ref_path.as_deref(), Some("#/components/schemas/Pet"));
        assert_eq!(schema.ref_name().as_deref(), Some("Pet"));
        assert_eq!(schema.description.as_deref(), Some("a pet"));
    }

    #[test]
    fn dynamic_ref_is_kept_distinct() {
        let schema =
            serde_json::from_str::<ObjectSchema>(r##"{ "$dynamicRef": "#node" }"##).unwrap();

        assert_eq!(schema.dynamic_ref.as_deref(), Some("#node"));
        assert!(schema.ref_path.is_none());
    }

    #[test]
    fn content_keywords_parse_at_schema_level() {
        let schema = serde_json::from_str::<ObjectSchema>(
            r#"{ "type": "string", "contentMediaType": "image/png", "contentEncoding": "base64" }"#,
        )
        .unwrap();

        assert_eq!(schema.content_media_type.as_deref(), Some("image/png"));
        assert_eq!(schema.content_encoding.as_deref(), Some("base64"));
    }
}
