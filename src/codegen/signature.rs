//! C prototype composition.
//!
//! The signature shape is fixed: context first, then path, query, header,
//! and cookie parameters in declaration order, the request body, any
//! success output, and `struct ApiError **api_error` last.

use std::fmt::Write;

use crate::spec::ParameterIn;

use super::{function_name, sanitize, CScalar, GenConfig, OpView, ParamKind, ParamView};

fn scalar_item_type(scalar: CScalar) -> &'static str {
    match scalar {
        CScalar::Int => "const int *",
        CScalar::Long => "const long *",
        CScalar::Float => "const float *",
        CScalar::Double => "const double *",
        CScalar::Bool => "const int *",
        CScalar::Str => "const char **",
    }
}

fn scalar_out_type(scalar: CScalar) -> &'static str {
    match scalar {
        CScalar::Int => "int *",
        CScalar::Long => "long *",
        CScalar::Float => "float *",
        CScalar::Double => "double *",
        CScalar::Bool => "int *",
        CScalar::Str => "char **",
    }
}

fn scalar_array_out_type(scalar: CScalar) -> &'static str {
    match scalar {
        CScalar::Int => "int **",
        CScalar::Long => "long **",
        CScalar::Float => "float **",
        CScalar::Double => "double **",
        CScalar::Bool => "int **",
        CScalar::Str => "char ***",
    }
}

fn push_param(args: &mut Vec<String>, view: &ParamView) {
    let name = sanitize(view.name());

    match &view.kind {
        ParamKind::Scalar(scalar) => {
            let ty = scalar.arg_type();
            let sep = if ty.ends_with('*') { "" } else { " " };
            args.push(format!("{ty}{sep}{name}"));
        }
        ParamKind::Array(item) => {
            args.push(format!("{}{}", scalar_item_type(*item), name));
            args.push(format!("size_t {name}_len"));
        }
        ParamKind::Object => {
            args.push(format!("struct OpenAPI_KV *{name}"));
            args.push(format!("size_t {name}_len"));
        }
    }
}

/// Writes the prototype for one operation, without a trailing `;` or body.
pub(crate) fn write_signature(out: &mut String, view: &OpView<'_>, cfg: &GenConfig) {
    let mut args: Vec<String> = Vec::new();

    args.push(format!("{}ctx", cfg.ctx_type));

    for location in [
        ParameterIn::Path,
        ParameterIn::Query,
        ParameterIn::Querystring,
        ParameterIn::Header,
        ParameterIn::Cookie,
    ] {
        for param in view.params_in(location) {
            push_param(&mut args, param);
        }
    }

    if let Some(body) = &view.req_body {
        match &body.ref_name {
            Some(name) => args.push(format!("const struct {name} *req_body")),
            None => args.push("const char *req_body".to_owned()),
        }
    }

    if let Some(success) = &view.success {
        match (&success.ref_name, success.scalar) {
            (Some(name), _) => {
                args.push(format!("struct {name} **out"));
                if success.is_array {
                    args.push("size_t *out_len".to_owned());
                }
            }
            (None, Some(scalar)) => {
                if success.is_array {
                    args.push(format!("{}out", scalar_array_out_type(scalar)));
                    args.push("size_t *out_len".to_owned());
                } else {
                    args.push(format!("{}out", scalar_out_type(scalar)));
                }
            }
            (None, None) => {}
        }
    }

    args.push("struct ApiError **api_error".to_owned());

    let _ = write!(out, "int {}({})", function_name(view, cfg), args.join(", "));
}

/// The expected signature text for an operation, as the synchronizer
/// compares it.
pub(crate) fn expected_signature(view: &OpView<'_>, cfg: &GenConfig) -> String {
    let mut out = String::new();
    write_signature(&mut out, view, cfg);
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::Spec;

    fn views(spec: &serde_json::Value) -> (Spec, GenConfig) {
        let spec: Spec = serde_json::from_value(spec.clone()).unwrap();
        (spec, GenConfig::default())
    }

    #[test]
    fn path_parameter_signature_matches_expected_shape() {
        let (spec, cfg) = views(&serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/user/{id}": {
                    "get": {
                        "operationId": "api_user_get",
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "type": "integer" } },
                        ],
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let sig = expected_signature(&views[0], &cfg);

        assert_eq!(
            sig,
            "int api_user_get(struct HttpClient *ctx, long id, struct ApiError **api_error)"
        );
    }

    #[test]
    fn array_success_appends_out_len() {
        let (spec, cfg) = views(&serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Pet" },
                                        },
                                    },
                                },
                            },
                        },
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let sig = expected_signature(&views[0], &cfg);

        assert_eq!(
            sig,
            "int listPets(struct HttpClient *ctx, struct Pet **out, size_t *out_len, \
             struct ApiError **api_error)"
        );
    }

    #[test]
    fn body_and_object_query_parameters() {
        let (spec, cfg) = views(&serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/pets": {
                    "post": {
                        "operationId": "createPet",
                        "parameters": [
                            { "name": "filter", "in": "query",
                              "schema": { "type": "object" } },
                        ],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Pet" },
                                },
                            },
                        },
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let sig = expected_signature(&views[0], &cfg);

        assert_eq!(
            sig,
            "int createPet(struct HttpClient *ctx, struct OpenAPI_KV *filter, \
             size_t filter_len, const struct Pet *req_body, struct ApiError **api_error)"
        );
    }
}
