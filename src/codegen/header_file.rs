//! Client header and source file layout.
//!
//! The header carries the include preamble, the C++ `extern "C"` guard,
//! the `ApiError` problem-details struct, lifecycle prototypes, struct and
//! codec declarations, and one Doxygen-annotated prototype per operation in
//! aggregation order. The source selects a transport backend by macro,
//! defines the private `ApiError_from_json` helper and the lifecycle
//! implementations, then one body per operation.

use std::fmt::Write;

use crate::{fields::SchemaIndex, spec::Spec};

use super::{body, signature, spec_views, structs, GenConfig};

fn write_operation_doc(out: &mut String, view: &super::OpView<'_>) {
    let _ = writeln!(out, "/**");
    if let Some(summary) = &view.op.summary {
        let _ = writeln!(out, " * @brief {summary}");
    }
    if let Some(description) = &view.op.description {
        for line in description.lines() {
            let _ = writeln!(out, " * {line}");
        }
    }
    let _ = writeln!(out, " * @route {} {}", view.verb, view.route);
    for param in &view.params {
        let location = serde_json::to_value(param.param.location)
            .ok()
            .and_then(|value| value.as_str().map(str::to_owned))
            .unwrap_or_default();
        match &param.param.description {
            Some(description) => {
                let _ = writeln!(
                    out,
                    " * @param {} [in:{location}] {description}",
                    param.name()
                );
            }
            None => {
                let _ = writeln!(out, " * @param {} [in:{location}]", param.name());
            }
        }
    }
    for (code, response) in &view.responses {
        match response.description.as_deref().or(response.summary.as_deref()) {
            Some(text) => {
                let _ = writeln!(out, " * @return {code} {text}");
            }
            None => {
                let _ = writeln!(out, " * @return {code}");
            }
        }
    }
    if view.op.deprecated.unwrap_or(false) {
        let _ = writeln!(out, " * @deprecated");
    }
    let _ = writeln!(out, " */");
}

/// Emits the client header.
pub(crate) fn write_header(spec: &Spec, index: &SchemaIndex, cfg: &GenConfig) -> String {
    let mut out = String::new();
    let guard = format!("{}_H", cfg.header_stem.to_ascii_uppercase());
    let prefix = &cfg.func_prefix;

    let _ = writeln!(out, "/* Generated API client for {}. */", spec.info.title);
    let _ = writeln!(out, "#ifndef {guard}");
    let _ = writeln!(out, "#define {guard}");
    let _ = writeln!(out);
    let _ = writeln!(out, "#include <stddef.h>");
    let _ = writeln!(out);
    let _ = writeln!(out, "#ifdef __cplusplus");
    let _ = writeln!(out, "extern \"C\" {{");
    let _ = writeln!(out, "#endif /* __cplusplus */");
    let _ = writeln!(out);

    let _ = writeln!(out, "struct HttpClient;");
    let _ = writeln!(out);

    // RFC 9457 problem details, returned by every operation on failure.
    let _ = writeln!(out, "struct ApiError {{");
    let _ = writeln!(out, "  char *type;");
    let _ = writeln!(out, "  char *title;");
    let _ = writeln!(out, "  int status;");
    let _ = writeln!(out, "  char *detail;");
    let _ = writeln!(out, "  char *instance;");
    let _ = writeln!(out, "}};");
    let _ = writeln!(out);
    let _ = writeln!(out, "void ApiError_free(struct ApiError *err);");
    let _ = writeln!(out);

    let _ = writeln!(out, "/** Allocate and configure a client context. */");
    let _ = writeln!(
        out,
        "int {prefix}init(struct HttpClient **ctx, const char *base_url);"
    );
    let _ = writeln!(out, "/** Release a client context. */");
    let _ = writeln!(out, "void {prefix}cleanup(struct HttpClient *ctx);");
    let _ = writeln!(out);

    structs::write_struct_decls(&mut out, index);
    structs::write_codec_decls(&mut out, index);

    for view in spec_views(spec) {
        write_operation_doc(&mut out, &view);
        signature::write_signature(&mut out, &view, cfg);
        out.push_str(";\n\n");
    }

    let _ = writeln!(out, "#ifdef __cplusplus");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out, "#endif /* __cplusplus */");
    let _ = writeln!(out);
    let _ = writeln!(out, "#endif /* {guard} */");

    out
}

fn write_api_error_helpers(out: &mut String) {
    let _ = writeln!(
        out,
        "static void ApiError_from_json(const char *json, struct ApiError **out) {{"
    );
    let _ = writeln!(out, "  JSON_Value *root = NULL;");
    let _ = writeln!(out, "  JSON_Object *o = NULL;");
    let _ = writeln!(out, "  struct ApiError *err = NULL;");
    let _ = writeln!(out, "  const char *s = NULL;");
    let _ = writeln!(out, "  if (!json || !out) return;");
    let _ = writeln!(out, "  root = json_parse_string(json);");
    let _ = writeln!(out, "  if (!root) return;");
    let _ = writeln!(out, "  o = json_value_get_object(root);");
    let _ = writeln!(out, "  if (!o) {{ json_value_free(root); return; }}");
    let _ = writeln!(out, "  err = calloc(1, sizeof(*err));");
    let _ = writeln!(out, "  if (!err) {{ json_value_free(root); return; }}");
    for field in ["type", "title", "detail", "instance"] {
        let _ = writeln!(out, "  s = json_object_get_string(o, \"{field}\");");
        let _ = writeln!(out, "  if (s) err->{field} = strdup(s);");
    }
    let _ = writeln!(
        out,
        "  err->status = (int)json_object_get_number(o, \"status\");"
    );
    let _ = writeln!(out, "  json_value_free(root);");
    let _ = writeln!(out, "  *out = err;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(out, "void ApiError_free(struct ApiError *err) {{");
    let _ = writeln!(out, "  if (!err) return;");
    for field in ["type", "title", "detail", "instance"] {
        let _ = writeln!(out, "  if (err->{field}) free(err->{field});");
    }
    let _ = writeln!(out, "  free(err);");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

fn write_lifecycle(out: &mut String, cfg: &GenConfig) {
    let prefix = &cfg.func_prefix;

    let _ = writeln!(
        out,
        "int {prefix}init(struct HttpClient **ctx, const char *base_url) {{"
    );
    let _ = writeln!(out, "  struct HttpClient *client = NULL;");
    let _ = writeln!(out, "  if (!ctx || !base_url) return EINVAL;");
    let _ = writeln!(out, "  client = calloc(1, sizeof(*client));");
    let _ = writeln!(out, "  if (!client) return ENOMEM;");
    let _ = writeln!(out, "  client->base_url = strdup(base_url);");
    let _ = writeln!(
        out,
        "  if (!client->base_url) {{ free(client); return ENOMEM; }}"
    );
    let _ = writeln!(out, "  client->send = http_transport_send;");
    let _ = writeln!(out, "  client->config.retry_count = 3;");
    let _ = writeln!(out, "  *ctx = client;");
    let _ = writeln!(out, "  return 0;");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(out, "void {prefix}cleanup(struct HttpClient *ctx) {{");
    let _ = writeln!(out, "  if (!ctx) return;");
    let _ = writeln!(out, "  if (ctx->base_url) free(ctx->base_url);");
    let _ = writeln!(out, "  free(ctx);");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
}

/// Emits the client source file.
pub(crate) fn write_source(spec: &Spec, index: &SchemaIndex, cfg: &GenConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "/* Generated API client for {}. */", spec.info.title);
    let _ = writeln!(out, "#include <errno.h>");
    let _ = writeln!(out, "#include <stdio.h>");
    let _ = writeln!(out, "#include <stdlib.h>");
    let _ = writeln!(out, "#include <string.h>");
    let _ = writeln!(out);
    let _ = writeln!(out, "#include <parson.h>");
    let _ = writeln!(out);
    let _ = writeln!(out, "#include \"{}.h\"", cfg.header_stem);
    let _ = writeln!(out);
    let _ = writeln!(out, "#if defined(USE_WININET)");
    let _ = writeln!(out, "#include \"transport_wininet.h\"");
    let _ = writeln!(out, "#elif defined(USE_WINHTTP)");
    let _ = writeln!(out, "#include \"transport_winhttp.h\"");
    let _ = writeln!(out, "#else");
    let _ = writeln!(out, "#include \"transport_curl.h\"");
    let _ = writeln!(out, "#endif");
    let _ = writeln!(out);

    write_api_error_helpers(&mut out);
    write_lifecycle(&mut out, cfg);
    structs::write_codec_impls(&mut out, index);

    for view in spec_views(spec) {
        signature::write_signature(&mut out, &view, cfg);
        body::write_body(&mut out, &view, spec, index, cfg);
        let _ = writeln!(out);
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn petstore() -> Spec {
        serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "Pet Store", "version": "1.0" },
            "paths": {
                "/pet/{id}": {
                    "get": {
                        "operationId": "getPet",
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "type": "integer", "format": "int64" } },
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
                        },
                    },
                    "delete": { "operationId": "deletePet" },
                },
            },
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" },
                        },
                    },
                },
            },
        }))
        .unwrap()
    }

    #[test]
    fn header_has_guards_error_type_and_lifecycle() {
        let spec = petstore();
        let index = SchemaIndex::from_spec(&spec);
        let out = write_header(&spec, &index, &GenConfig::default());

        assert!(out.contains("#ifndef API_CLIENT_H"));
        assert!(out.contains("extern \"C\""));
        assert!(out.contains("struct ApiError {"));
        assert!(out.contains("int init(struct HttpClient **ctx, const char *base_url);"));
        assert!(out.contains("struct Pet {"));
        assert!(out.contains("@route GET /pet/{id}"));
        assert!(out.ends_with("#endif /* API_CLIENT_H */\n"));
    }

    #[test]
    fn prototype_names_are_unique() {
        let spec = petstore();
        let index = SchemaIndex::from_spec(&spec);
        let out = write_header(&spec, &index, &GenConfig::default());

        let mut names = HashSet::new();
        for line in out.lines() {
            let Some(rest) = line.strip_prefix("int ") else {
                continue;
            };
            let Some(name) = rest.split('(').next() else {
                continue;
            };
            assert!(names.insert(name.to_owned()), "duplicate prototype {name}");
        }
    }

    #[test]
    fn source_selects_transport_by_macro() {
        let spec = petstore();
        let index = SchemaIndex::from_spec(&spec);
        let out = write_source(&spec, &index, &GenConfig::default());

        assert!(out.contains("#include <parson.h>"));
        assert!(out.contains("#if defined(USE_WININET)"));
        assert!(out.contains("transport_curl.h"));
        assert!(out.contains("static void ApiError_from_json"));
        assert!(out.contains("int getPet(struct HttpClient *ctx, long id, struct Pet **out, struct ApiError **api_error) {"));
    }
}
