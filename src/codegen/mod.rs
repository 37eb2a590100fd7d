//! C client code emission.
//!
//! Given a spec, emits a client header (lifecycle, `ApiError`, struct and
//! codec prototypes, one annotated prototype per operation) and a source
//! file whose bodies follow a fixed assembly order so the in-place
//! synchronizer stays anchored. All output is text; emission is
//! deterministic for a given spec and config.

use std::collections::BTreeMap;

use log::warn;

use crate::{
    fields::SchemaIndex,
    spec::{
        ObjectOrReference, ObjectSchema, Operation, Parameter, ParameterIn, Response, Schema,
        Spec,
    },
};

pub mod body;
pub mod header_file;
pub mod security;
pub mod signature;
pub mod structs;
pub mod url;

/// Code-generation configuration.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Prefix applied to every generated function, e.g. `api_`.
    pub func_prefix: String,
    /// Optional namespace prepended before the group, e.g. `PetStore`.
    pub namespace: Option<String>,
    /// Context argument type.
    pub ctx_type: String,
    /// Variable the URL builder assigns into when no query string exists.
    pub url_variable: String,
    /// Header include-guard and file-name stem, e.g. `api_client`.
    pub header_stem: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            func_prefix: String::new(),
            namespace: None,
            ctx_type: "struct HttpClient *".to_owned(),
            url_variable: "url".to_owned(),
            header_stem: "api_client".to_owned(),
        }
    }
}

/// Replaces non-alphanumeric characters with `_`.
pub(crate) fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

/// Sanitized, initial-capped group name from an operation's first tag.
pub(crate) fn group_name(op: &Operation) -> Option<String> {
    let tag = op.tags.first()?;
    let sanitized = sanitize(tag);
    let mut chars = sanitized.chars();
    let first = chars.next()?;

    Some(first.to_ascii_uppercase().to_string() + chars.as_str())
}

/// Full C function name for an operation: `[Namespace_][Group_]<prefix><opId>`.
pub(crate) fn function_name(view: &OpView<'_>, cfg: &GenConfig) -> String {
    let mut name = String::new();

    if let Some(namespace) = &cfg.namespace {
        name.push_str(&sanitize(namespace));
        name.push('_');
    }
    if let Some(group) = group_name(view.op) {
        name.push_str(&group);
        name.push('_');
    }
    name.push_str(&cfg.func_prefix);
    name.push_str(&sanitize(&view.operation_id));

    name
}

/// C scalar type a schema maps onto, per the type/format table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CScalar {
    /// `integer`/`int32` (and `short`).
    Int,
    /// `integer`/`int64`.
    Long,
    /// `number`/`float`.
    Float,
    /// `number`/`double` (and plain `number`).
    Double,
    /// `boolean`.
    Bool,
    /// `string`.
    Str,
}

impl CScalar {
    /// Argument type for a by-value parameter.
    pub(crate) fn arg_type(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "int",
            Self::Str => "const char *",
        }
    }

    /// `printf` conversion for URL interpolation.
    pub(crate) fn fmt_spec(self) -> &'static str {
        match self {
            Self::Int | Self::Bool => "%d",
            Self::Long => "%ld",
            Self::Float | Self::Double => "%g",
            Self::Str => "%s",
        }
    }
}

/// Scalar kind of a resolved parameter schema, with the array flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamKind {
    /// A scalar value.
    Scalar(CScalar),
    /// An array of scalars.
    Array(CScalar),
    /// An object serialized as a key/value list.
    Object,
}

/// A resolved parameter with its classification.
#[derive(Debug, Clone)]
pub(crate) struct ParamView {
    pub param: Parameter,
    pub kind: ParamKind,
}

impl ParamView {
    pub(crate) fn name(&self) -> &str {
        &self.param.name
    }
}

/// Resolved request body shape.
#[derive(Debug, Clone)]
pub(crate) struct ReqBodyView {
    /// Component schema name of the body, when one is referenced.
    pub ref_name: Option<String>,
    /// First declared content type; `application/json` when unspecified.
    pub content_type: String,
}

/// Resolved success (2xx / `default`) payload.
#[derive(Debug, Clone)]
pub(crate) struct SuccessView {
    /// Component schema name, for struct payloads.
    pub ref_name: Option<String>,
    /// Scalar payload kind, for primitive payloads.
    pub scalar: Option<CScalar>,
    /// Payload is an array.
    pub is_array: bool,
}

/// One operation resolved against its containing spec.
#[derive(Debug)]
pub(crate) struct OpView<'a> {
    pub route: &'a str,
    pub verb: String,
    pub operation_id: String,
    pub op: &'a Operation,
    pub params: Vec<ParamView>,
    pub req_body: Option<ReqBodyView>,
    pub success: Option<SuccessView>,
    pub responses: BTreeMap<String, Response>,
}

fn schema_object<'s>(schema: &'s ObjectOrReference<Schema>, spec: &Spec) -> Option<ObjectSchema> {
    match schema {
        ObjectOrReference::Object(Schema::Object(obj)) => Some((**obj).clone()),
        ObjectOrReference::Object(Schema::Boolean(_)) => None,
        ObjectOrReference::Ref { .. } | ObjectOrReference::DynamicRef { .. } => {
            schema.resolve(spec).ok().and_then(|schema| match schema {
                Schema::Object(obj) => Some(*obj),
                Schema::Boolean(_) => None,
            })
        }
    }
}

fn scalar_kind(obj: &ObjectSchema) -> CScalar {
    use crate::spec::SchemaType;

    match obj.schema_type.as_ref().and_then(|set| set.primary()) {
        Some(SchemaType::Integer) => match obj.format.as_deref() {
            Some("int64") => CScalar::Long,
            _ => CScalar::Int,
        },
        Some(SchemaType::Number) => match obj.format.as_deref() {
            Some("float") => CScalar::Float,
            _ => CScalar::Double,
        },
        Some(SchemaType::Boolean) => CScalar::Bool,
        _ => CScalar::Str,
    }
}

fn classify_param(param: &Parameter, spec: &Spec) -> ParamKind {
    use crate::spec::SchemaType;

    let from_schema = param
        .schema
        .as_ref()
        .or_else(|| {
            param
                .content
                .as_ref()
                .and_then(|content| content.values().next())
                .and_then(|media| media.schema.as_ref())
        })
        .and_then(|schema| schema_object(schema, spec));

    let Some(obj) = from_schema else {
        return ParamKind::Scalar(CScalar::Str);
    };

    match obj.schema_type.as_ref().and_then(|set| set.primary()) {
        Some(SchemaType::Array) => {
            let item = obj
                .items
                .as_deref()
                .and_then(|items| schema_object(items, spec))
                .map(|item| scalar_kind(&item))
                .unwrap_or(CScalar::Str);
            ParamKind::Array(item)
        }
        Some(SchemaType::Object) => ParamKind::Object,
        _ => ParamKind::Scalar(scalar_kind(&obj)),
    }
}

fn success_view(responses: &BTreeMap<String, Response>, spec: &Spec) -> Option<SuccessView> {
    let candidate = responses
        .iter()
        .find(|(code, response)| is_success_code(code) && !response.content.is_empty())
        .or_else(|| {
            responses
                .iter()
                .find(|(code, response)| *code == "default" && !response.content.is_empty())
        })?;

    let media = candidate.1.content.values().next()?;
    let obj = media
        .schema
        .as_ref()
        .and_then(|schema| match schema {
            ObjectOrReference::Object(Schema::Object(obj)) => Some((**obj).clone()),
            ObjectOrReference::Ref { ref_path } | ObjectOrReference::DynamicRef { ref_path } => {
                ref_path.parse::<crate::spec::Ref>().ok().map(|reference| ObjectSchema {
                    ref_path: Some(format!("#/components/schemas/{}", reference.name)),
                    ..ObjectSchema::default()
                })
            }
            ObjectOrReference::Object(Schema::Boolean(_)) => None,
        })?;

    if obj.is_array() {
        let item = obj.items.as_deref().and_then(|items| match items {
            ObjectOrReference::Object(Schema::Object(item)) => Some((**item).clone()),
            ObjectOrReference::Ref { ref_path } => {
                ref_path.parse::<crate::spec::Ref>().ok().map(|reference| ObjectSchema {
                    ref_path: Some(format!("#/components/schemas/{}", reference.name)),
                    ..ObjectSchema::default()
                })
            }
            _ => None,
        })?;

        return Some(SuccessView {
            ref_name: item.ref_name(),
            scalar: item.ref_name().is_none().then(|| scalar_kind(&item)),
            is_array: true,
        });
    }

    Some(SuccessView {
        ref_name: obj.ref_name(),
        scalar: obj.ref_name().is_none().then(|| scalar_kind(&obj)),
        is_array: false,
    })
}

fn is_success_code(code: &str) -> bool {
    code.starts_with('2')
}

impl<'a> OpView<'a> {
    /// Resolves `op` against `spec` for emission.
    pub(crate) fn new(route: &'a str, verb: &str, op: &'a Operation, spec: &Spec) -> Self {
        let operation_id = op.operation_id.clone().unwrap_or_else(|| {
            warn!("operation {verb} {route} has no operationId; deriving one");
            format!(
                "{}_{}",
                verb.to_ascii_lowercase(),
                sanitize(route.trim_start_matches('/'))
            )
        });

        let params = op
            .parameters(spec)
            .into_iter()
            .map(|param| ParamView {
                kind: classify_param(&param, spec),
                param,
            })
            .collect();

        let req_body = op.request_body(spec).ok().flatten().map(|body| {
            let (content_type, media) = body
                .content
                .iter()
                .next()
                .map(|(ct, media)| (ct.clone(), Some(media)))
                .unwrap_or_else(|| ("application/json".to_owned(), None));

            let ref_name = media
                .and_then(|media| media.schema.as_ref())
                .and_then(|schema| match schema {
                    ObjectOrReference::Object(Schema::Object(obj)) => obj.ref_name(),
                    ObjectOrReference::Ref { ref_path } => ref_path
                        .parse::<crate::spec::Ref>()
                        .ok()
                        .map(|reference| reference.name),
                    _ => None,
                });

            ReqBodyView {
                ref_name,
                content_type,
            }
        });

        let responses = op.responses(spec);
        let success = success_view(&responses, spec);

        Self {
            route,
            verb: verb.to_owned(),
            operation_id,
            op,
            params,
            req_body,
            success,
            responses,
        }
    }

    /// Parameters at `location`, in declaration order.
    pub(crate) fn params_in(&self, location: ParameterIn) -> impl Iterator<Item = &ParamView> {
        self.params
            .iter()
            .filter(move |view| view.param.location == location)
    }

    /// Operation declares at least one query(-string) parameter.
    pub(crate) fn has_query(&self) -> bool {
        self.params.iter().any(|view| {
            matches!(
                view.param.location,
                ParameterIn::Query | ParameterIn::Querystring
            )
        })
    }
}

/// Resolved operation views for a whole spec, in declaration order.
pub(crate) fn spec_views<'s>(spec: &'s Spec) -> Vec<OpView<'s>> {
    let mut views = Vec::new();

    for (route, item) in spec.paths.iter().flatten() {
        for (method, op) in item.methods() {
            views.push(OpView::new(route, method.as_str(), op, spec));
        }
        for (raw, op) in &item.additional_operations {
            views.push(OpView::new(route, raw, op, spec));
        }
    }

    views
}

/// Emits the full client header for `spec`.
pub fn emit_header(spec: &Spec, cfg: &GenConfig) -> String {
    let index = SchemaIndex::from_spec(spec);
    header_file::write_header(spec, &index, cfg)
}

/// Emits the full client source for `spec`.
pub fn emit_source(spec: &Spec, cfg: &GenConfig) -> String {
    let index = SchemaIndex::from_spec(spec);
    header_file::write_source(spec, &index, cfg)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn group_name_is_sanitized_and_capped() {
        let op = Operation {
            tags: vec!["pet store".to_owned()],
            ..Operation::default()
        };
        assert_eq!(group_name(&op).as_deref(), Some("Pet_store"));
    }

    #[test]
    fn function_name_composes_namespace_group_prefix_and_id() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/pet": {
                    "get": { "operationId": "listPets", "tags": ["pets"] },
                },
            },
        }))
        .unwrap();

        let views = spec_views(&spec);
        let cfg = GenConfig {
            namespace: Some("Store".to_owned()),
            func_prefix: "api_".to_owned(),
            ..GenConfig::default()
        };

        assert_eq!(function_name(&views[0], &cfg), "Store_Pets_api_listPets");
    }

    #[test]
    fn emission_is_deterministic() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/pet/{id}": {
                    "get": {
                        "operationId": "getPet",
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "type": "integer", "format": "int64" } },
                        ],
                    },
                },
            },
        }))
        .unwrap();

        let cfg = GenConfig::default();
        assert_eq!(emit_source(&spec, &cfg), emit_source(&spec, &cfg));
        assert_eq!(emit_header(&spec, &cfg), emit_header(&spec, &cfg));
    }
}
