//! Component-schema normal form used for code generation.
//!
//! A [`StructFields`] is an ordered field list that both the C type
//! inspector and the OpenAPI schema lowering produce. Schemas the normal
//! form cannot express are retained as raw JSON alongside their name so the
//! writer round-trips them untouched.

use log::debug;

use crate::spec::{
    ObjectOrReference, ObjectSchema, Schema, SchemaType, Spec,
};

/// Scalar type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScalar {
    /// OpenAPI `integer`.
    Integer,
    /// OpenAPI `number`.
    Number,
    /// OpenAPI `string`.
    String,
    /// OpenAPI `boolean`.
    Boolean,
}

impl FieldScalar {
    /// OpenAPI type name.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

/// Shape of a field: scalar, reference, or array of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Inline scalar.
    Scalar(FieldScalar),
    /// Reference to a named component schema.
    Ref(String),
    /// Array of inline scalars.
    Array(FieldScalar),
    /// Array of references to a named component schema.
    ArrayRef(String),
}

impl FieldShape {
    /// Returns `true` for the array shapes.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_) | Self::ArrayRef(_))
    }
}

/// Validation constraints carried by a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldConstraints {
    /// Inclusive numeric lower bound.
    pub minimum: Option<serde_json::Number>,
    /// Inclusive numeric upper bound.
    pub maximum: Option<serde_json::Number>,
    /// Minimum string length.
    pub min_length: Option<u64>,
    /// Maximum string length.
    pub max_length: Option<u64>,
    /// Minimum array length.
    pub min_items: Option<u64>,
    /// Maximum array length.
    pub max_items: Option<u64>,
    /// Pattern for string values.
    pub pattern: Option<String>,
    /// Array items must be pairwise distinct.
    pub unique_items: bool,
}

impl FieldConstraints {
    fn from_schema(schema: &ObjectSchema) -> Self {
        Self {
            minimum: schema.minimum.clone(),
            maximum: schema.maximum.clone(),
            min_length: schema.min_length,
            max_length: schema.max_length,
            min_items: schema.min_items,
            max_items: schema.max_items,
            pattern: schema.pattern.clone(),
            unique_items: schema.unique_items.unwrap_or(false),
        }
    }
}

/// One field of the normal form.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// Field name.
    pub name: String,
    /// Field shape.
    pub shape: FieldShape,
    /// Format hint, e.g. `int64`.
    pub format: Option<String>,
    /// Field description.
    pub description: Option<String>,
    /// Default literal.
    pub default: Option<serde_json::Value>,
    /// Field is listed in the schema's `required` array.
    pub required: bool,
    /// Validation constraints.
    pub constraints: FieldConstraints,
}

/// An ordered field list for one named component schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructFields {
    /// Component schema name.
    pub name: String,
    /// Schema description.
    pub description: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<StructField>,
}

impl StructFields {
    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Raises the normal form back into a Schema Object.
    ///
    /// Inverse of [`lower_schema`] for expressible shapes; used when C types
    /// are registered as component schemas.
    pub fn to_schema(&self) -> ObjectSchema {
        let mut schema = ObjectSchema {
            schema_type: Some(crate::spec::SchemaTypeSet::Single(SchemaType::Object)),
            description: self.description.clone(),
            ..ObjectSchema::default()
        };

        for field in &self.fields {
            if field.required {
                schema.required.push(field.name.clone());
            }

            let scalar_schema = |scalar: FieldScalar, field: &StructField| {
                let type_name = match scalar {
                    FieldScalar::Integer => SchemaType::Integer,
                    FieldScalar::Number => SchemaType::Number,
                    FieldScalar::String => SchemaType::String,
                    FieldScalar::Boolean => SchemaType::Boolean,
                };
                ObjectSchema {
                    schema_type: Some(crate::spec::SchemaTypeSet::Single(type_name)),
                    format: field.format.clone(),
                    description: field.description.clone(),
                    default: field.default.clone(),
                    minimum: field.constraints.minimum.clone(),
                    maximum: field.constraints.maximum.clone(),
                    min_length: field.constraints.min_length,
                    max_length: field.constraints.max_length,
                    pattern: field.constraints.pattern.clone(),
                    ..ObjectSchema::default()
                }
            };

            let ref_schema = |name: &str| ObjectSchema {
                ref_path: Some(format!("#/components/schemas/{name}")),
                ..ObjectSchema::default()
            };

            let array_schema = |item: ObjectSchema, field: &StructField| ObjectSchema {
                schema_type: Some(crate::spec::SchemaTypeSet::Single(SchemaType::Array)),
                items: Some(Box::new(ObjectOrReference::Object(Schema::Object(
                    Box::new(item),
                )))),
                description: field.description.clone(),
                min_items: field.constraints.min_items,
                max_items: field.constraints.max_items,
                unique_items: field.constraints.unique_items.then_some(true),
                ..ObjectSchema::default()
            };

            let property = match &field.shape {
                FieldShape::Scalar(scalar) => scalar_schema(*scalar, field),
                FieldShape::Ref(name) => ref_schema(name),
                FieldShape::Array(scalar) => {
                    let mut item = scalar_schema(*scalar, field);
                    item.description = None;
                    array_schema(item, field)
                }
                FieldShape::ArrayRef(name) => array_schema(ref_schema(name), field),
            };

            schema.properties.insert(
                field.name.clone(),
                ObjectOrReference::Object(Schema::Object(Box::new(property))),
            );
        }

        schema
    }
}

/// A component schema lowered for code generation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoweredSchema {
    /// Normal form the struct/codec emitters consume.
    Fields(StructFields),

    /// Shape the normal form cannot express; kept verbatim for round-trips.
    Raw {
        /// Component schema name.
        name: String,
        /// Original schema JSON.
        json: serde_json::Value,
    },
}

impl LoweredSchema {
    /// Component schema name.
    pub fn name(&self) -> &str {
        match self {
            Self::Fields(fields) => &fields.name,
            Self::Raw { name, .. } => name,
        }
    }
}

fn scalar_of(schema: &ObjectSchema) -> Option<FieldScalar> {
    match schema.schema_type.as_ref()?.primary()? {
        SchemaType::Integer => Some(FieldScalar::Integer),
        SchemaType::Number => Some(FieldScalar::Number),
        SchemaType::String => Some(FieldScalar::String),
        SchemaType::Boolean => Some(FieldScalar::Boolean),
        SchemaType::Array | SchemaType::Object | SchemaType::Null => None,
    }
}

fn shape_of(property: &ObjectOrReference<Schema>) -> Option<FieldShape> {
    let schema = match property {
        ObjectOrReference::Ref { ref_path } => {
            let reference = ref_path.parse::<crate::spec::Ref>().ok()?;
            return Some(FieldShape::Ref(reference.name));
        }
        ObjectOrReference::DynamicRef { .. } => return None,
        ObjectOrReference::Object(Schema::Boolean(_)) => return None,
        ObjectOrReference::Object(Schema::Object(obj)) => obj,
    };

    if let Some(name) = schema.ref_name() {
        return Some(FieldShape::Ref(name));
    }

    if schema.is_array() {
        let items = schema.items.as_deref()?;
        return match shape_of(items)? {
            FieldShape::Scalar(scalar) => Some(FieldShape::Array(scalar)),
            FieldShape::Ref(name) => Some(FieldShape::ArrayRef(name)),
            // Arrays of arrays have no field form.
            _ => None,
        };
    }

    scalar_of(schema).map(FieldShape::Scalar)
}

fn is_plain_object(schema: &ObjectSchema) -> bool {
    match schema.schema_type.as_ref().and_then(|set| set.primary()) {
        Some(SchemaType::Object) => true,
        None => !schema.properties.is_empty(),
        _ => false,
    }
}

/// Lowers one named component schema into the normal form.
///
/// Compositions the form cannot express (`oneOf`, `anyOf`, `not`, boolean
/// schemas, dynamic references, non-object shapes, nested inline objects)
/// are retained as raw JSON.
pub fn lower_schema(name: &str, schema: &Schema) -> LoweredSchema {
    let raw = || LoweredSchema::Raw {
        name: name.to_owned(),
        json: serde_json::to_value(schema).expect("schema serialization should not fail"),
    };

    let Schema::Object(boxed) = schema else {
        return raw();
    };
    let obj: &ObjectSchema = boxed;

    let inexpressible = !obj.one_of.is_empty()
        || !obj.any_of.is_empty()
        || obj.not.is_some()
        || obj.dynamic_ref.is_some()
        || obj.ref_path.is_some()
        || !is_plain_object(obj);
    if inexpressible {
        debug!("schema {name} kept as raw JSON");
        return raw();
    }

    // `allOf` of plain object branches flattens into one field list.
    let mut branches: Vec<&ObjectSchema> = vec![obj];
    for branch in &obj.all_of {
        match branch {
            ObjectOrReference::Object(Schema::Object(branch_obj))
                if is_plain_object(branch_obj) && branch_obj.all_of.is_empty() =>
            {
                branches.push(branch_obj)
            }
            _ => return raw(),
        }
    }

    let mut fields = Vec::new();
    for branch in &branches {
        for (field_name, property) in &branch.properties {
            let Some(shape) = shape_of(property) else {
                debug!("schema {name} kept as raw JSON: property {field_name}");
                return raw();
            };

            let prop_obj = match property {
                ObjectOrReference::Object(Schema::Object(prop_obj)) => Some(prop_obj.as_ref()),
                _ => None,
            };

            fields.push(StructField {
                name: field_name.clone(),
                shape,
                format: prop_obj.and_then(|p| p.format.clone()),
                description: prop_obj.and_then(|p| p.description.clone()),
                default: prop_obj.and_then(|p| p.default.clone()),
                required: branch.required.iter().any(|req| req == field_name),
                constraints: prop_obj
                    .map(FieldConstraints::from_schema)
                    .unwrap_or_default(),
            });
        }
    }

    LoweredSchema::Fields(StructFields {
        name: name.to_owned(),
        description: obj.description.clone(),
        fields,
    })
}

/// Ordered index of a spec's component schemas in lowered form.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    entries: Vec<LoweredSchema>,
}

impl SchemaIndex {
    /// Lowers every component schema of `spec`, in registration order.
    pub fn from_spec(spec: &Spec) -> Self {
        let entries = spec
            .components
            .iter()
            .flat_map(|cs| cs.schemas.iter())
            .map(|(name, oor)| match oor {
                ObjectOrReference::Object(schema) => lower_schema(name, schema),
                ObjectOrReference::Ref { ref_path }
                | ObjectOrReference::DynamicRef { ref_path } => LoweredSchema::Raw {
                    name: name.clone(),
                    json: serde_json::json!({ "$ref": ref_path }),
                },
            })
            .collect();

        Self { entries }
    }

    /// All lowered schemas in registration order.
    pub fn entries(&self) -> &[LoweredSchema] {
        &self.entries
    }

    /// Looks up the normal form of a named schema; `None` when the schema
    /// is unknown or kept raw.
    pub fn fields(&self, name: &str) -> Option<&StructFields> {
        self.entries.iter().find_map(|entry| match entry {
            LoweredSchema::Fields(fields) if fields.name == name => Some(fields),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn schema(json: serde_json::Value) -> Schema {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn object_schema_lowers_to_ordered_fields() {
        let lowered = lower_schema(
            "Pet",
            &schema(serde_json::json!({
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "integer", "format": "int64" },
                    "name": { "type": "string", "maxLength": 64 },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "owner": { "$ref": "#/components/schemas/Owner" },
                },
            })),
        );

        let LoweredSchema::Fields(fields) = lowered else {
            panic!("expected normal form");
        };

        assert_eq!(fields.name, "Pet");
        let names = fields.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "name", "tags", "owner"]);

        assert!(fields.fields[0].required);
        assert_eq!(fields.fields[0].shape, FieldShape::Scalar(FieldScalar::Integer));
        assert_eq!(fields.fields[0].format.as_deref(), Some("int64"));
        assert_eq!(fields.fields[1].constraints.max_length, Some(64));
        assert_eq!(fields.fields[2].shape, FieldShape::Array(FieldScalar::String));
        assert_eq!(fields.fields[3].shape, FieldShape::Ref("Owner".to_owned()));
    }

    #[test]
    fn one_of_is_kept_as_raw_json() {
        let value = serde_json::json!({
            "oneOf": [
                { "type": "string" },
                { "type": "integer" },
            ],
        });
        let lowered = lower_schema("StringOrInt", &schema(value.clone()));

        assert_matches!(lowered, LoweredSchema::Raw { name, json } => {
            assert_eq!(name, "StringOrInt");
            assert_eq!(json, value);
        });
    }

    #[test]
    fn boolean_schema_is_kept_as_raw_json() {
        let lowered = lower_schema("Anything", &schema(serde_json::json!(true)));
        assert_matches!(lowered, LoweredSchema::Raw { .. });
    }

    #[test]
    fn all_of_object_branches_flatten() {
        let lowered = lower_schema(
            "Dog",
            &schema(serde_json::json!({
                "type": "object",
                "properties": { "bark": { "type": "boolean" } },
                "allOf": [{
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } },
                }],
            })),
        );

        let LoweredSchema::Fields(fields) = lowered else {
            panic!("expected normal form");
        };
        assert_eq!(fields.fields.len(), 2);
        assert!(fields.field("name").unwrap().required);
    }

    #[test]
    fn to_schema_round_trips_through_lowering() {
        let original = schema(serde_json::json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "integer", "format": "int64" },
                "tags": { "type": "array", "items": { "type": "string" } },
            },
        }));

        let LoweredSchema::Fields(fields) = lower_schema("Pet", &original) else {
            panic!("expected normal form");
        };

        let raised = Schema::Object(Box::new(fields.to_schema()));
        assert_matches!(
            lower_schema("Pet", &raised),
            LoweredSchema::Fields(again) if again == fields
        );
    }

    #[test]
    fn nested_inline_object_is_inexpressible() {
        let lowered = lower_schema(
            "Outer",
            &schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "inner": { "type": "object", "properties": { "x": { "type": "integer" } } },
                },
            })),
        );

        assert_matches!(lowered, LoweredSchema::Raw { .. });
    }
}
