//! Request-orchestration body emission.
//!
//! Bodies are assembled in a fixed order so generated code stays
//! predictable and the in-place synchronizer can anchor on it:
//! declarations, init and context check, security, header parameters, the
//! query block, body serialization, URL assembly, method, the retry loop,
//! the response switch, and the `cleanup:` label.

use std::fmt::Write;

use crate::{
    fields::SchemaIndex,
    spec::{ParameterIn, Spec},
};

use super::{security, url, CScalar, GenConfig, OpView, ParamKind};

fn verb_enum(verb: &str) -> String {
    match verb {
        "GET" | "POST" | "PUT" | "DELETE" | "HEAD" | "PATCH" | "OPTIONS" | "TRACE" | "QUERY" => {
            format!("HTTP_{verb}")
        }
        // Non-standard methods travel as raw strings.
        _ => "HTTP_CUSTOM".to_owned(),
    }
}

fn errno_for_status(status: u16) -> &'static str {
    match status {
        400 => "EINVAL",
        401 | 403 => "EACCES",
        404 => "ENOENT",
        _ => "EIO",
    }
}

/// Writes one header-parameter statement, anchored by its marker comment.
pub(crate) fn write_header_param(out: &mut String, param: &super::ParamView) {
    let name = param.name();
    let _ = writeln!(out, "  /* Header Parameter: {name} */");

    match &param.kind {
        ParamKind::Scalar(CScalar::Str) => {
            let _ = writeln!(out, "  if ({name}) {{");
            let _ = writeln!(
                out,
                "    rc = http_headers_add(&req.headers, \"{name}\", {name});"
            );
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
        ParamKind::Scalar(CScalar::Bool) => {
            let _ = writeln!(out, "  {{");
            let _ = writeln!(
                out,
                "    rc = http_headers_add(&req.headers, \"{name}\", {name} ? \"true\" : \"false\");"
            );
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
        ParamKind::Scalar(scalar) => {
            let _ = writeln!(out, "  {{");
            let _ = writeln!(out, "    char num_buf[32];");
            let _ = writeln!(
                out,
                "    sprintf(num_buf, \"{}\", {name});",
                scalar.fmt_spec()
            );
            let _ = writeln!(
                out,
                "    rc = http_headers_add(&req.headers, \"{name}\", num_buf);"
            );
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
        // Simple-style joins for arrays and objects are produced by a
        // runtime helper.
        ParamKind::Array(_) | ParamKind::Object => {
            let _ = writeln!(out, "  {{");
            let _ = writeln!(
                out,
                "    rc = http_headers_add_joined(&req.headers, \"{name}\", {name}, {name}_len);"
            );
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
    }
}

fn write_header_params(out: &mut String, view: &OpView<'_>) {
    for param in view.params_in(ParameterIn::Header) {
        write_header_param(out, param);
    }

    // Cookie parameters fold into one Cookie header.
    for param in view.params_in(ParameterIn::Cookie) {
        let name = param.name();
        let _ = writeln!(out, "  /* Cookie Parameter: {name} */");
        let _ = writeln!(out, "  if ({name}) {{");
        let _ = writeln!(out, "    char cookie_buf[512];");
        let _ = writeln!(
            out,
            "    snprintf(cookie_buf, sizeof cookie_buf, \"{name}=%s\", {name});"
        );
        let _ = writeln!(
            out,
            "    rc = http_headers_add(&req.headers, \"Cookie\", cookie_buf);"
        );
        let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
        let _ = writeln!(out, "  }}");
    }
}

fn write_body_serialization(out: &mut String, view: &OpView<'_>, index: &SchemaIndex) {
    let Some(body) = &view.req_body else {
        return;
    };
    let Some(ref_name) = &body.ref_name else {
        // Raw text bodies pass through.
        let _ = writeln!(out, "  if (req_body) {{");
        let _ = writeln!(out, "    req.body = (char *)req_body;");
        let _ = writeln!(out, "    req.body_len = strlen(req_body);");
        let _ = writeln!(
            out,
            "    http_headers_add(&req.headers, \"Content-Type\", \"{}\");",
            body.content_type
        );
        let _ = writeln!(out, "  }}");
        let _ = writeln!(out);
        return;
    };

    match body.content_type.as_str() {
        "multipart/form-data" => write_multipart_body(out, ref_name, index),
        "application/x-www-form-urlencoded" => write_form_body(out, ref_name, index),
        _ => {
            let _ = writeln!(out, "  rc = {ref_name}_to_json(req_body, &req_json);");
            let _ = writeln!(out, "  if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  req.body = req_json;");
            let _ = writeln!(out, "  req.body_len = strlen(req_json);");
            let _ = writeln!(
                out,
                "  http_headers_add(&req.headers, \"Content-Type\", \"application/json\");"
            );
            let _ = writeln!(out);
        }
    }
}

fn write_multipart_body(out: &mut String, ref_name: &str, index: &SchemaIndex) {
    let Some(fields) = index.fields(ref_name) else {
        let _ = writeln!(
            out,
            "  /* Warning: schema {ref_name} definition not found, skipping multipart */"
        );
        return;
    };

    let _ = writeln!(out, "  /* Multipart Body Construction */");
    for field in &fields.fields {
        let name = &field.name;
        match &field.shape {
            crate::fields::FieldShape::Scalar(crate::fields::FieldScalar::String) => {
                let _ = writeln!(out, "  if (req_body->{name}) {{");
                let _ = writeln!(
                    out,
                    "    rc = http_request_add_part(&req, \"{name}\", NULL, NULL, \
                     req_body->{name}, strlen(req_body->{name}));"
                );
                let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                let _ = writeln!(out, "  }}");
            }
            crate::fields::FieldShape::Scalar(crate::fields::FieldScalar::Integer) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(out, "    char num_buf[32];");
                let _ = writeln!(out, "    sprintf(num_buf, \"%ld\", (long)req_body->{name});");
                let _ = writeln!(
                    out,
                    "    rc = http_request_add_part(&req, \"{name}\", NULL, NULL, num_buf, \
                     strlen(num_buf));"
                );
                let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                let _ = writeln!(out, "  }}");
            }
            _ => {
                let _ = writeln!(out, "  /* part {name}: unsupported field shape */");
            }
        }
    }
    let _ = writeln!(out, "  rc = http_request_flatten_parts(&req);");
    let _ = writeln!(out, "  if (rc != 0) goto cleanup;");
    let _ = writeln!(out);
}

fn write_form_body(out: &mut String, ref_name: &str, index: &SchemaIndex) {
    let Some(fields) = index.fields(ref_name) else {
        let _ = writeln!(
            out,
            "  /* Warning: schema {ref_name} definition not found, skipping form body */"
        );
        return;
    };

    let _ = writeln!(out, "  /* Form Body Construction */");
    for field in &fields.fields {
        let name = &field.name;
        match &field.shape {
            crate::fields::FieldShape::Scalar(crate::fields::FieldScalar::String) => {
                let _ = writeln!(out, "  if (req_body->{name}) {{");
                let _ = writeln!(
                    out,
                    "    rc = http_request_add_form(&req, \"{name}\", req_body->{name});"
                );
                let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                let _ = writeln!(out, "  }}");
            }
            crate::fields::FieldShape::Scalar(_) => {
                let _ = writeln!(out, "  {{");
                let _ = writeln!(out, "    char num_buf[32];");
                let _ = writeln!(out, "    sprintf(num_buf, \"%ld\", (long)req_body->{name});");
                let _ = writeln!(
                    out,
                    "    rc = http_request_add_form(&req, \"{name}\", num_buf);"
                );
                let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                let _ = writeln!(out, "  }}");
            }
            _ => {
                let _ = writeln!(out, "  /* form field {name}: unsupported field shape */");
            }
        }
    }
    let _ = writeln!(
        out,
        "  http_headers_add(&req.headers, \"Content-Type\", \
         \"application/x-www-form-urlencoded\");"
    );
    let _ = writeln!(out);
}

fn write_response_switch(out: &mut String, view: &OpView<'_>) {
    let _ = writeln!(out, "  switch (res->status_code) {{");

    for (code, _response) in &view.responses {
        let Ok(status) = code.parse::<u16>() else {
            // `default` and wildcard classes fall to the default arm.
            continue;
        };

        let _ = writeln!(out, "    case {status}:");

        if code.starts_with('2') {
            if let Some(success) = &view.success {
                if let Some(ref_name) = &success.ref_name {
                    let from = if success.is_array {
                        format!("{ref_name}_array_from_json((const char *)res->body, out, out_len)")
                    } else {
                        format!("{ref_name}_from_json((const char *)res->body, out)")
                    };
                    let _ = writeln!(out, "      if (res->body && out) {{");
                    let _ = writeln!(out, "        rc = {from};");
                    let _ = writeln!(out, "      }}");
                }
            }
            let _ = writeln!(out, "      break;");
        } else {
            let _ = writeln!(out, "      rc = {};", errno_for_status(status));
            let _ = writeln!(out, "      if (res->body && api_error) {{");
            let _ = writeln!(
                out,
                "        ApiError_from_json((const char *)res->body, api_error);"
            );
            let _ = writeln!(out, "      }}");
            let _ = writeln!(out, "      break;");
        }
    }

    let _ = writeln!(out, "    default:");
    let _ = writeln!(out, "      rc = EIO;");
    let _ = writeln!(out, "      if (res->body && api_error) {{");
    let _ = writeln!(
        out,
        "        ApiError_from_json((const char *)res->body, api_error);"
    );
    let _ = writeln!(out, "      }}");
    let _ = writeln!(out, "      break;");
    let _ = writeln!(out, "  }}");
    let _ = writeln!(out);
}

/// Writes the full function body (braces included) for one operation.
pub(crate) fn write_body(
    out: &mut String,
    view: &OpView<'_>,
    spec: &Spec,
    index: &SchemaIndex,
    cfg: &GenConfig,
) {
    let query_exists = url::needs_query_block(view, spec);
    let json_body = view
        .req_body
        .as_ref()
        .is_some_and(|body| {
            body.ref_name.is_some()
                && !matches!(
                    body.content_type.as_str(),
                    "multipart/form-data" | "application/x-www-form-urlencoded"
                )
        });
    let needs_index_var = view.params.iter().any(|param| {
        matches!(param.kind, ParamKind::Array(_) | ParamKind::Object)
            && matches!(
                param.param.location,
                ParameterIn::Query | ParameterIn::Querystring
            )
    });

    let _ = writeln!(out, " {{");

    // 1. Declarations.
    let _ = writeln!(out, "  struct HttpRequest req;");
    let _ = writeln!(out, "  struct HttpResponse *res = NULL;");
    let _ = writeln!(out, "  int rc = 0;");
    let _ = writeln!(out, "  int attempt = 0;");
    if needs_index_var {
        let _ = writeln!(out, "  size_t i;");
    }
    if query_exists {
        let _ = writeln!(out, "  struct UrlQueryParams qp;");
        let _ = writeln!(out, "  char *query_str = NULL;");
        let _ = writeln!(out, "  char *path_str = NULL;");
    } else {
        let _ = writeln!(out, "  char *{} = NULL;", cfg.url_variable);
    }
    if json_body {
        let _ = writeln!(out, "  char *req_json = NULL;");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  if (api_error) *api_error = NULL;");

    // 2. Init and context sanity check.
    let _ = writeln!(out, "  if (!ctx || !ctx->send) return EINVAL;");
    let _ = writeln!(out, "  rc = http_request_init(&req);");
    let _ = writeln!(out, "  if (rc != 0) return rc;");
    let _ = writeln!(out);

    // 3. Security injection.
    security::write_security(out, view, spec);

    // 4. Header parameters.
    write_header_params(out, view);

    // 5. Query parameter block.
    if query_exists {
        url::write_query_block(out, view, spec);
        let _ = writeln!(out);
    }

    // 6. Body serialization.
    write_body_serialization(out, view, index);

    // 7. URL assembly.
    if query_exists {
        url::write_url_builder(out, view, "path_str", "ctx->base_url");
        let _ = writeln!(
            out,
            "  if (asprintf(&req.url, \"%s%s\", path_str, query_str) == -1) \
             {{ rc = ENOMEM; goto cleanup; }}"
        );
    } else {
        url::write_url_builder(out, view, &cfg.url_variable, "ctx->base_url");
        let _ = writeln!(out, "  req.url = {};", cfg.url_variable);
        let _ = writeln!(out, "  {} = NULL;", cfg.url_variable);
    }

    // 8. Method.
    let method = verb_enum(&view.verb);
    let _ = writeln!(out, "  req.method = {method};");
    if method == "HTTP_CUSTOM" {
        let _ = writeln!(out, "  req.method_str = \"{}\";", view.verb);
    }
    let _ = writeln!(out);

    // 9. Send loop with retry; backoff is a runtime hook.
    let _ = writeln!(out, "  do {{");
    let _ = writeln!(out, "    if (attempt > 0 && ctx->config.backoff) {{");
    let _ = writeln!(out, "      ctx->config.backoff(attempt);");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "    rc = ctx->send(ctx->transport, &req, &res);");
    let _ = writeln!(out, "    attempt++;");
    let _ = writeln!(
        out,
        "  }} while (rc != 0 && attempt <= ctx->config.retry_count);"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  if (rc != 0) goto cleanup;");
    let _ = writeln!(out, "  if (!res) {{ rc = EIO; goto cleanup; }}");
    let _ = writeln!(out);

    // 10. Response switch.
    write_response_switch(out, view);

    // 11. Cleanup.
    let _ = writeln!(out, "cleanup:");
    if json_body {
        let _ = writeln!(out, "  if (req_json) free(req_json);");
    }
    if query_exists {
        let _ = writeln!(out, "  if (path_str) free(path_str);");
        let _ = writeln!(out, "  if (query_str) free(query_str);");
        let _ = writeln!(out, "  url_query_free(&qp);");
    } else {
        let _ = writeln!(out, "  if ({0}) free({0});", cfg.url_variable);
    }
    let _ = writeln!(out, "  http_request_free(&req);");
    let _ = writeln!(out, "  if (res) {{ http_response_free(res); free(res); }}");
    let _ = writeln!(out, "  return rc;");
    let _ = writeln!(out, "}}");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codegen::spec_views;

    fn body_for(spec_json: serde_json::Value, operation_id: &str) -> String {
        let spec: Spec = serde_json::from_value(spec_json).unwrap();
        let index = SchemaIndex::from_spec(&spec);
        let views = spec_views(&spec);
        let view = views
            .iter()
            .find(|view| view.operation_id == operation_id)
            .unwrap();

        let mut out = String::new();
        write_body(&mut out, view, &spec, &index, &GenConfig::default());
        out
    }

    #[test]
    fn assembly_order_is_fixed() {
        let out = body_for(
            serde_json::json!({
                "openapi": "3.1.0",
                "info": { "title": "t", "version": "v" },
                "security": [{ "bearerAuth": [] }],
                "paths": {
                    "/pet/{id}": {
                        "get": {
                            "operationId": "getPet",
                            "parameters": [
                                { "name": "id", "in": "path", "required": true,
                                  "schema": { "type": "integer", "format": "int64" } },
                                { "name": "verbose", "in": "query",
                                  "schema": { "type": "boolean" } },
                                { "name": "x_trace", "in": "header",
                                  "schema": { "type": "string" } },
                            ],
                            "responses": {
                                "200": {
                                    "description": "ok",
                                    "content": {
                                        "application/json": {
                                            "schema": { "$ref": "#/components/schemas/Pet" },
                                        },
                                    },
                                },
                                "404": { "description": "missing" },
                            },
                        },
                    },
                },
                "components": {
                    "securitySchemes": {
                        "bearerAuth": { "type": "http", "scheme": "bearer" },
                    },
                },
            }),
            "getPet",
        );

        let order = [
            "struct HttpRequest req;",
            "http_request_init(&req);",
            "http_request_set_auth_bearer",
            "/* Header Parameter: x_trace */",
            "url_query_init(&qp);",
            "url_query_build(&qp, &query_str);",
            "asprintf(&path_str",
            "req.method = HTTP_GET;",
            "} while (rc != 0 && attempt <= ctx->config.retry_count);",
            "switch (res->status_code) {",
            "case 200:",
            "Pet_from_json((const char *)res->body, out)",
            "case 404:",
            "rc = ENOENT;",
            "cleanup:",
        ];

        let mut last = 0;
        for anchor in order {
            let pos = out[last..]
                .find(anchor)
                .unwrap_or_else(|| panic!("missing anchor {anchor:?} in:\n{out}"));
            last += pos;
        }
    }

    #[test]
    fn status_codes_map_to_errno_values() {
        let out = body_for(
            serde_json::json!({
                "openapi": "3.1.0",
                "info": { "title": "t", "version": "v" },
                "paths": {
                    "/x": {
                        "get": {
                            "operationId": "x",
                            "responses": {
                                "400": { "description": "bad" },
                                "401": { "description": "no auth" },
                                "404": { "description": "missing" },
                                "500": { "description": "boom" },
                            },
                        },
                    },
                },
            }),
            "x",
        );

        assert!(out.contains("case 400:\n      rc = EINVAL;"));
        assert!(out.contains("case 401:\n      rc = EACCES;"));
        assert!(out.contains("case 404:\n      rc = ENOENT;"));
        assert!(out.contains("case 500:\n      rc = EIO;"));
    }

    #[test]
    fn json_body_serializes_and_frees() {
        let out = body_for(
            serde_json::json!({
                "openapi": "3.1.0",
                "info": { "title": "t", "version": "v" },
                "paths": {
                    "/pets": {
                        "post": {
                            "operationId": "createPet",
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
                "components": {
                    "schemas": {
                        "Pet": { "type": "object", "properties": { "id": { "type": "integer" } } },
                    },
                },
            }),
            "createPet",
        );

        assert!(out.contains("rc = Pet_to_json(req_body, &req_json);"));
        assert!(out.contains("if (req_json) free(req_json);"));
        assert!(out.contains("\"Content-Type\", \"application/json\""));
    }

    #[test]
    fn multipart_body_builds_parts_per_field() {
        let out = body_for(
            serde_json::json!({
                "openapi": "3.1.0",
                "info": { "title": "t", "version": "v" },
                "paths": {
                    "/upload": {
                        "post": {
                            "operationId": "upload",
                            "requestBody": {
                                "content": {
                                    "multipart/form-data": {
                                        "schema": { "$ref": "#/components/schemas/Upload" },
                                    },
                                },
                            },
                        },
                    },
                },
                "components": {
                    "schemas": {
                        "Upload": {
                            "type": "object",
                            "properties": {
                                "label": { "type": "string" },
                                "weight": { "type": "integer" },
                            },
                        },
                    },
                },
            }),
            "upload",
        );

        assert!(out.contains("/* Multipart Body Construction */"));
        assert!(out.contains("http_request_add_part(&req, \"label\""));
        assert!(out.contains("http_request_flatten_parts(&req);"));
    }

    #[test]
    fn custom_verbs_send_raw_method_strings() {
        let out = body_for(
            serde_json::json!({
                "openapi": "3.1.0",
                "info": { "title": "t", "version": "v" },
                "paths": {
                    "/cache": {
                        "additionalOperations": {
                            "PURGE": { "operationId": "purge" },
                        },
                    },
                },
            }),
            "purge",
        );

        assert!(out.contains("req.method = HTTP_CUSTOM;"));
        assert!(out.contains("req.method_str = \"PURGE\";"));
    }

    #[test]
    fn no_query_operations_use_the_plain_url_variable() {
        let out = body_for(
            serde_json::json!({
                "openapi": "3.1.0",
                "info": { "title": "t", "version": "v" },
                "paths": {
                    "/ping": { "get": { "operationId": "ping" } },
                },
            }),
            "ping",
        );

        assert!(out.contains("char *url = NULL;"));
        assert!(out.contains("req.url = url;"));
        assert!(!out.contains("url_query_init"));
        assert_eq!(out.matches("cleanup:").count(), 1);
    }
}
