//! C struct declarations and parson-backed JSON codecs.
//!
//! For every component schema in normal form this emits a `struct`
//! declaration plus `_to_json`, `_from_json`, `_array_from_json`, and
//! `_free` functions. Schemas kept as raw JSON emit nothing but a note.
//! Emission order is schema registration order.

use std::fmt::Write;

use crate::fields::{FieldScalar, FieldShape, LoweredSchema, SchemaIndex, StructField, StructFields};

fn c_field_decl(field: &StructField) -> Vec<String> {
    let name = &field.name;
    match &field.shape {
        FieldShape::Scalar(FieldScalar::String) => vec![format!("char *{name};")],
        FieldShape::Scalar(FieldScalar::Integer) => match field.format.as_deref() {
            Some("int64") => vec![format!("long {name};")],
            _ => vec![format!("int {name};")],
        },
        FieldShape::Scalar(FieldScalar::Number) => match field.format.as_deref() {
            Some("float") => vec![format!("float {name};")],
            _ => vec![format!("double {name};")],
        },
        FieldShape::Scalar(FieldScalar::Boolean) => vec![format!("int {name};")],
        FieldShape::Ref(target) => vec![format!("struct {target} *{name};")],
        FieldShape::Array(FieldScalar::String) => vec![
            format!("char **{name};"),
            format!("size_t {name}_len;"),
        ],
        FieldShape::Array(FieldScalar::Integer) => vec![
            format!("long *{name};"),
            format!("size_t {name}_len;"),
        ],
        FieldShape::Array(FieldScalar::Number) => vec![
            format!("double *{name};"),
            format!("size_t {name}_len;"),
        ],
        FieldShape::Array(FieldScalar::Boolean) => vec![
            format!("int *{name};"),
            format!("size_t {name}_len;"),
        ],
        FieldShape::ArrayRef(target) => vec![
            format!("struct {target} *{name};"),
            format!("size_t {name}_len;"),
        ],
    }
}

/// Writes one struct declaration.
pub(crate) fn write_struct_decl(out: &mut String, fields: &StructFields) {
    if let Some(description) = &fields.description {
        let _ = writeln!(out, "/** {description} */");
    }
    let _ = writeln!(out, "struct {} {{", fields.name);

    for field in &fields.fields {
        for (idx, decl) in c_field_decl(field).into_iter().enumerate() {
            match (&field.description, idx) {
                (Some(description), 0) => {
                    let _ = writeln!(out, "  {decl} /**< {description} */");
                }
                _ => {
                    let _ = writeln!(out, "  {decl}");
                }
            }
        }
    }

    let _ = writeln!(out, "}};");
    let _ = writeln!(out);
}

/// Writes codec prototypes for one struct.
pub(crate) fn write_codec_prototypes(out: &mut String, name: &str) {
    let _ = writeln!(out, "int {name}_to_json(const struct {name} *obj, char **out);");
    let _ = writeln!(out, "int {name}_from_json(const char *json, struct {name} **out);");
    let _ = writeln!(
        out,
        "int {name}_array_from_json(const char *json, struct {name} **out, size_t *out_len);"
    );
    let _ = writeln!(out, "void {name}_free(struct {name} *obj);");
    let _ = writeln!(out);
}

fn write_to_object(out: &mut String, fields: &StructFields) {
    let name = &fields.name;
    let _ = writeln!(
        out,
        "static int {name}_to_object(const struct {name} *obj, JSON_Object *o) {{"
    );

    for field in &fields.fields {
        let fname = &field.name;
        match &field.shape {
            FieldShape::Scalar(FieldScalar::String) => {
                let _ = writeln!(out, "  if (obj->{fname}) {{");
                let _ = writeln!(
                    out,
                    "    json_object_set_string(o, \"{fname}\", obj->{fname});"
                );
                let _ = writeln!(out, "  }}");
            }
            FieldShape::Scalar(FieldScalar::Boolean) => {
                let _ = writeln!(
                    out,
                    "  json_object_set_boolean(o, \"{fname}\", obj->{fname});"
                );
            }
            FieldShape::Scalar(_) => {
                let _ = writeln!(
                    out,
                    "  json_object_set_number(o, \"{fname}\", (double)obj->{fname});"
                );
            }
            FieldShape::Ref(target) => {
                let _ = writeln!(out, "  if (obj->{fname}) {{");
                let _ = writeln!(out, "    JSON_Value *sub = json_value_init_object();");
                let _ = writeln!(
                    out,
                    "    if (!sub || {target}_to_object(obj->{fname}, \
                     json_value_get_object(sub)) != 0) {{"
                );
                let _ = writeln!(out, "      if (sub) json_value_free(sub);");
                let _ = writeln!(out, "      return ENOMEM;");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "    json_object_set_value(o, \"{fname}\", sub);");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::Array(item) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(out, "    JSON_Value *arr_val = json_value_init_array();");
                let _ = writeln!(out, "    JSON_Array *arr = json_value_get_array(arr_val);");
                let _ = writeln!(out, "    size_t i;");
                let _ = writeln!(out, "    for (i = 0; i < obj->{fname}_len; ++i) {{");
                match item {
                    FieldScalar::String => {
                        let _ = writeln!(
                            out,
                            "      json_array_append_string(arr, obj->{fname}[i]);"
                        );
                    }
                    FieldScalar::Boolean => {
                        let _ = writeln!(
                            out,
                            "      json_array_append_boolean(arr, obj->{fname}[i]);"
                        );
                    }
                    _ => {
                        let _ = writeln!(
                            out,
                            "      json_array_append_number(arr, (double)obj->{fname}[i]);"
                        );
                    }
                }
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "    json_object_set_value(o, \"{fname}\", arr_val);");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::ArrayRef(target) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(out, "    JSON_Value *arr_val = json_value_init_array();");
                let _ = writeln!(out, "    JSON_Array *arr = json_value_get_array(arr_val);");
                let _ = writeln!(out, "    size_t i;");
                let _ = writeln!(out, "    for (i = 0; i < obj->{fname}_len; ++i) {{");
                let _ = writeln!(out, "      JSON_Value *sub = json_value_init_object();");
                let _ = writeln!(
                    out,
                    "      if (!sub || {target}_to_object(&obj->{fname}[i], \
                     json_value_get_object(sub)) != 0) {{"
                );
                let _ = writeln!(out, "        if (sub) json_value_free(sub);");
                let _ = writeln!(out, "        json_value_free(arr_val);");
                let _ = writeln!(out, "        return ENOMEM;");
                let _ = writeln!(out, "      }}");
                let _ = writeln!(out, "      json_array_append_value(arr, sub);");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "    json_object_set_value(o, \"{fname}\", arr_val);");
                let _ = writeln!(out, "  }}");
            }
        }
    }

    let _ = writeln!(out, "  return 0;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

fn write_from_object(out: &mut String, fields: &StructFields) {
    let name = &fields.name;
    let _ = writeln!(
        out,
        "static int {name}_from_object(const JSON_Object *o, struct {name} *obj) {{"
    );
    let _ = writeln!(out, "  memset(obj, 0, sizeof(*obj));");

    for field in &fields.fields {
        let fname = &field.name;
        match &field.shape {
            FieldShape::Scalar(FieldScalar::String) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(
                    out,
                    "    const char *s = json_object_get_string(o, \"{fname}\");"
                );
                let _ = writeln!(out, "    if (s) {{");
                let _ = writeln!(out, "      obj->{fname} = strdup(s);");
                let _ = writeln!(out, "      if (!obj->{fname}) return ENOMEM;");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::Scalar(FieldScalar::Boolean) => {
                let _ = writeln!(
                    out,
                    "  obj->{fname} = json_object_get_boolean(o, \"{fname}\") == 1;"
                );
            }
            FieldShape::Scalar(FieldScalar::Integer) => {
                let cast = match field.format.as_deref() {
                    Some("int64") => "long",
                    _ => "int",
                };
                let _ = writeln!(
                    out,
                    "  obj->{fname} = ({cast})json_object_get_number(o, \"{fname}\");"
                );
            }
            FieldShape::Scalar(FieldScalar::Number) => {
                let cast = match field.format.as_deref() {
                    Some("float") => "(float)",
                    _ => "",
                };
                let _ = writeln!(
                    out,
                    "  obj->{fname} = {cast}json_object_get_number(o, \"{fname}\");"
                );
            }
            FieldShape::Ref(target) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(
                    out,
                    "    const JSON_Object *sub = json_object_get_object(o, \"{fname}\");"
                );
                let _ = writeln!(out, "    if (sub) {{");
                let _ = writeln!(
                    out,
                    "      obj->{fname} = calloc(1, sizeof(struct {target}));"
                );
                let _ = writeln!(out, "      if (!obj->{fname}) return ENOMEM;");
                let _ = writeln!(
                    out,
                    "      if ({target}_from_object(sub, obj->{fname}) != 0) return EINVAL;"
                );
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::Array(item) => {
                let (c_type, getter) = match item {
                    FieldScalar::String => ("char *", "strdup(json_array_get_string(arr, i))"),
                    FieldScalar::Boolean => ("int", "json_array_get_boolean(arr, i) == 1"),
                    FieldScalar::Integer => ("long", "(long)json_array_get_number(arr, i)"),
                    FieldScalar::Number => ("double", "json_array_get_number(arr, i)"),
                };
                let _ = writeln!(out, "  {{");
                let _ = writeln!(
                    out,
                    "    const JSON_Array *arr = json_object_get_array(o, \"{fname}\");"
                );
                let _ = writeln!(out, "    if (arr) {{");
                let _ = writeln!(out, "      size_t i, n = json_array_get_count(arr);");
                let _ = writeln!(
                    out,
                    "      obj->{fname} = calloc(n ? n : 1, sizeof({c_type}));"
                );
                let _ = writeln!(out, "      if (!obj->{fname}) return ENOMEM;");
                let _ = writeln!(out, "      for (i = 0; i < n; ++i) {{");
                let _ = writeln!(out, "        obj->{fname}[i] = {getter};");
                let _ = writeln!(out, "      }}");
                let _ = writeln!(out, "      obj->{fname}_len = n;");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::ArrayRef(target) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(
                    out,
                    "    const JSON_Array *arr = json_object_get_array(o, \"{fname}\");"
                );
                let _ = writeln!(out, "    if (arr) {{");
                let _ = writeln!(out, "      size_t i, n = json_array_get_count(arr);");
                let _ = writeln!(
                    out,
                    "      obj->{fname} = calloc(n ? n : 1, sizeof(struct {target}));"
                );
                let _ = writeln!(out, "      if (!obj->{fname}) return ENOMEM;");
                let _ = writeln!(out, "      for (i = 0; i < n; ++i) {{");
                let _ = writeln!(
                    out,
                    "        if ({target}_from_object(json_array_get_object(arr, i), \
                     &obj->{fname}[i]) != 0) return EINVAL;"
                );
                let _ = writeln!(out, "      }}");
                let _ = writeln!(out, "      obj->{fname}_len = n;");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "  }}");
            }
        }
    }

    let _ = writeln!(out, "  return 0;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

fn write_free(out: &mut String, fields: &StructFields) {
    let name = &fields.name;
    let _ = writeln!(out, "void {name}_free(struct {name} *obj) {{");
    let _ = writeln!(out, "  if (!obj) return;");

    for field in &fields.fields {
        let fname = &field.name;
        match &field.shape {
            FieldShape::Scalar(FieldScalar::String) => {
                let _ = writeln!(out, "  if (obj->{fname}) free(obj->{fname});");
            }
            FieldShape::Ref(target) => {
                let _ = writeln!(out, "  if (obj->{fname}) {target}_free(obj->{fname});");
            }
            FieldShape::Array(FieldScalar::String) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(out, "    size_t i;");
                let _ = writeln!(out, "    for (i = 0; i < obj->{fname}_len; ++i) {{");
                let _ = writeln!(out, "      if (obj->{fname}[i]) free(obj->{fname}[i]);");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "    if (obj->{fname}) free(obj->{fname});");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::Array(_) => {
                let _ = writeln!(out, "  if (obj->{fname}) free(obj->{fname});");
            }
            FieldShape::ArrayRef(target) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(out, "    size_t i;");
                let _ = writeln!(out, "    for (i = 0; i < obj->{fname}_len; ++i) {{");
                // Nested arrays own their elements in place.
                let _ = writeln!(out, "      {target}_free_members(&obj->{fname}[i]);");
                let _ = writeln!(out, "    }}");
                let _ = writeln!(out, "    if (obj->{fname}) free(obj->{fname});");
                let _ = writeln!(out, "  }}");
            }
            FieldShape::Scalar(_) => {}
        }
    }

    let _ = writeln!(out, "  free(obj);");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

fn write_free_members(out: &mut String, fields: &StructFields) {
    let name = &fields.name;
    let _ = writeln!(out, "static void {name}_free_members(struct {name} *obj) {{");
    let _ = writeln!(out, "  if (!obj) return;");

    for field in &fields.fields {
        let fname = &field.name;
        match &field.shape {
            FieldShape::Scalar(FieldScalar::String) => {
                let _ = writeln!(out, "  if (obj->{fname}) free(obj->{fname});");
            }
            FieldShape::Ref(target) => {
                let _ = writeln!(out, "  if (obj->{fname}) {target}_free(obj->{fname});");
            }
            FieldShape::Array(_) | FieldShape::ArrayRef(_) => {
                let _ = writeln!(out, "  if (obj->{fname}) free(obj->{fname});");
            }
            FieldShape::Scalar(_) => {}
        }
    }

    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

fn write_public_codecs(out: &mut String, fields: &StructFields) {
    let name = &fields.name;

    let _ = writeln!(out, "int {name}_to_json(const struct {name} *obj, char **out) {{");
    let _ = writeln!(out, "  JSON_Value *root = NULL;");
    let _ = writeln!(out, "  if (!obj || !out) return EINVAL;");
    let _ = writeln!(out, "  root = json_value_init_object();");
    let _ = writeln!(out, "  if (!root) return ENOMEM;");
    let _ = writeln!(
        out,
        "  if ({name}_to_object(obj, json_value_get_object(root)) != 0) {{"
    );
    let _ = writeln!(out, "    json_value_free(root);");
    let _ = writeln!(out, "    return ENOMEM;");
    let _ = writeln!(out, "  }}");
    let _ = writeln!(out, "  *out = json_serialize_to_string(root);");
    let _ = writeln!(out, "  json_value_free(root);");
    let _ = writeln!(out, "  return *out ? 0 : ENOMEM;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "int {name}_from_json(const char *json, struct {name} **out) {{"
    );
    let _ = writeln!(out, "  JSON_Value *root = NULL;");
    let _ = writeln!(out, "  struct {name} *parsed = NULL;");
    let _ = writeln!(out, "  if (!json || !out) return EINVAL;");
    let _ = writeln!(out, "  root = json_parse_string(json);");
    let _ = writeln!(out, "  if (!root) return EINVAL;");
    let _ = writeln!(out, "  parsed = calloc(1, sizeof(*parsed));");
    let _ = writeln!(out, "  if (!parsed) {{ json_value_free(root); return ENOMEM; }}");
    let _ = writeln!(
        out,
        "  if ({name}_from_object(json_value_get_object(root), parsed) != 0) {{"
    );
    let _ = writeln!(out, "    {name}_free(parsed);");
    let _ = writeln!(out, "    json_value_free(root);");
    let _ = writeln!(out, "    return EINVAL;");
    let _ = writeln!(out, "  }}");
    let _ = writeln!(out, "  json_value_free(root);");
    let _ = writeln!(out, "  *out = parsed;");
    let _ = writeln!(out, "  return 0;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "int {name}_array_from_json(const char *json, struct {name} **out, size_t *out_len) {{"
    );
    let _ = writeln!(out, "  JSON_Value *root = NULL;");
    let _ = writeln!(out, "  JSON_Array *arr = NULL;");
    let _ = writeln!(out, "  struct {name} *items = NULL;");
    let _ = writeln!(out, "  size_t i, n;");
    let _ = writeln!(out, "  if (!json || !out || !out_len) return EINVAL;");
    let _ = writeln!(out, "  root = json_parse_string(json);");
    let _ = writeln!(out, "  if (!root) return EINVAL;");
    let _ = writeln!(out, "  arr = json_value_get_array(root);");
    let _ = writeln!(out, "  if (!arr) {{ json_value_free(root); return EINVAL; }}");
    let _ = writeln!(out, "  n = json_array_get_count(arr);");
    let _ = writeln!(out, "  items = calloc(n ? n : 1, sizeof(*items));");
    let _ = writeln!(out, "  if (!items) {{ json_value_free(root); return ENOMEM; }}");
    let _ = writeln!(out, "  for (i = 0; i < n; ++i) {{");
    let _ = writeln!(
        out,
        "    if ({name}_from_object(json_array_get_object(arr, i), &items[i]) != 0) {{"
    );
    let _ = writeln!(out, "      free(items);");
    let _ = writeln!(out, "      json_value_free(root);");
    let _ = writeln!(out, "      return EINVAL;");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "  }}");
    let _ = writeln!(out, "  json_value_free(root);");
    let _ = writeln!(out, "  *out = items;");
    let _ = writeln!(out, "  *out_len = n;");
    let _ = writeln!(out, "  return 0;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

/// Writes all struct declarations in registration order.
pub(crate) fn write_struct_decls(out: &mut String, index: &SchemaIndex) {
    for entry in index.entries() {
        match entry {
            LoweredSchema::Fields(fields) => write_struct_decl(out, fields),
            LoweredSchema::Raw { name, .. } => {
                let _ = writeln!(out, "/* Schema {name} has no struct form. */");
                let _ = writeln!(out);
            }
        }
    }
}

/// Writes all codec prototypes in registration order.
pub(crate) fn write_codec_decls(out: &mut String, index: &SchemaIndex) {
    for entry in index.entries() {
        if let LoweredSchema::Fields(fields) = entry {
            write_codec_prototypes(out, &fields.name);
        }
    }
}

/// Writes all codec implementations in registration order.
pub(crate) fn write_codec_impls(out: &mut String, index: &SchemaIndex) {
    // Internal object-level helpers first so cross-references resolve.
    for entry in index.entries() {
        if let LoweredSchema::Fields(fields) = entry {
            let _ = writeln!(
                out,
                "static int {0}_to_object(const struct {0} *obj, JSON_Object *o);",
                fields.name
            );
            let _ = writeln!(
                out,
                "static int {0}_from_object(const JSON_Object *o, struct {0} *obj);",
                fields.name
            );
            let _ = writeln!(
                out,
                "static void {0}_free_members(struct {0} *obj);",
                fields.name
            );
        }
    }
    let _ = writeln!(out);

    for entry in index.entries() {
        if let LoweredSchema::Fields(fields) = entry {
            write_to_object(out, fields);
            write_from_object(out, fields);
            write_free_members(out, fields);
            write_free(out, fields);
            write_public_codecs(out, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::spec::Spec;

    use super::*;

    fn index() -> SchemaIndex {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" },
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "owner": { "$ref": "#/components/schemas/Owner" },
                        },
                    },
                    "Owner": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } },
                    },
                    "Weird": { "oneOf": [{ "type": "string" }, { "type": "integer" }] },
                },
            },
        }))
        .unwrap();

        SchemaIndex::from_spec(&spec)
    }

    #[test]
    fn struct_decl_shapes() {
        let mut out = String::new();
        write_struct_decls(&mut out, &index());

        assert!(out.contains("struct Pet {"));
        assert!(out.contains("long id;"));
        assert!(out.contains("char *name;"));
        assert!(out.contains("char **tags;"));
        assert!(out.contains("size_t tags_len;"));
        assert!(out.contains("struct Owner *owner;"));
        assert!(out.contains("/* Schema Weird has no struct form. */"));
    }

    #[test]
    fn codecs_cover_nested_and_array_fields() {
        let mut out = String::new();
        write_codec_impls(&mut out, &index());

        assert!(out.contains("int Pet_to_json(const struct Pet *obj, char **out)"));
        assert!(out.contains("Owner_to_object(obj->owner"));
        assert!(out.contains("json_array_append_string(arr, obj->tags[i]);"));
        assert!(out.contains("int Pet_array_from_json(const char *json, struct Pet **out, size_t *out_len)"));
        assert!(out.contains("void Pet_free(struct Pet *obj)"));
    }
}
