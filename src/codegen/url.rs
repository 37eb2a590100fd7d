//! URL construction and query-parameter block emission.
//!
//! The query block runs from `url_query_init` through `url_query_build` so
//! the in-place synchronizer can locate and replace it as one unit. Array
//! parameters honor the form/spaceDelimited/pipeDelimited/deepObject styles
//! with their explode flags.

use std::fmt::Write;

use log::warn;

use crate::spec::{ParameterIn, ParameterStyle, SecurityScheme};

use super::{security, CScalar, OpView, ParamKind, ParamView};

fn write_scalar_add(out: &mut String, name: &str, scalar: CScalar) {
    match scalar {
        CScalar::Str => {
            let _ = writeln!(out, "  if ({name}) {{");
            let _ = writeln!(out, "    rc = url_query_add(&qp, \"{name}\", {name});");
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
        CScalar::Bool => {
            let _ = writeln!(
                out,
                "  rc = url_query_add(&qp, \"{name}\", {name} ? \"true\" : \"false\");"
            );
            let _ = writeln!(out, "  if (rc != 0) goto cleanup;");
        }
        scalar => {
            let _ = writeln!(out, "  {{");
            let _ = writeln!(out, "    char num_buf[32];");
            let _ = writeln!(
                out,
                "    sprintf(num_buf, \"{}\", {name});",
                scalar.fmt_spec()
            );
            let _ = writeln!(out, "    rc = url_query_add(&qp, \"{name}\", num_buf);");
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
    }
}

fn write_array_add(out: &mut String, view: &ParamView, item: CScalar) {
    let name = view.name();
    let style = view.param.effective_style();
    let explode = view.param.effective_explode();

    match (style, explode) {
        // form + explode repeats the key per element.
        (ParameterStyle::Form, true) => {
            let _ = writeln!(out, "  for (i = 0; i < {name}_len; ++i) {{");
            match item {
                CScalar::Str => {
                    let _ = writeln!(
                        out,
                        "    rc = url_query_add(&qp, \"{name}\", {name}[i]);"
                    );
                }
                scalar => {
                    let _ = writeln!(out, "    char num_buf[32];");
                    let _ = writeln!(
                        out,
                        "    sprintf(num_buf, \"{}\", {name}[i]);",
                        scalar.fmt_spec()
                    );
                    let _ = writeln!(out, "    rc = url_query_add(&qp, \"{name}\", num_buf);");
                }
            }
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }

        // Joined styles emit one pair with a delimiter.
        (ParameterStyle::Form, false)
        | (ParameterStyle::SpaceDelimited, _)
        | (ParameterStyle::PipeDelimited, _) => {
            let delim = match style {
                ParameterStyle::SpaceDelimited => ' ',
                ParameterStyle::PipeDelimited => '|',
                _ => ',',
            };
            let _ = writeln!(
                out,
                "  rc = url_query_add_joined(&qp, \"{name}\", {name}, {name}_len, '{delim}');"
            );
            let _ = writeln!(out, "  if (rc != 0) goto cleanup;");
        }

        (style, _) => {
            warn!("unsupported array style {style:?} for query parameter {name}");
            let _ = writeln!(out, "  /* unsupported style for {name} */");
        }
    }
}

fn write_object_add(out: &mut String, view: &ParamView) {
    let name = view.name();
    let style = view.param.effective_style();

    match style {
        // deepObject renders `name[key]=value` pairs.
        ParameterStyle::DeepObject => {
            let _ = writeln!(out, "  for (i = 0; i < {name}_len; ++i) {{");
            let _ = writeln!(out, "    char key_buf[128];");
            let _ = writeln!(
                out,
                "    snprintf(key_buf, sizeof key_buf, \"{name}[%s]\", {name}[i].key);"
            );
            let _ = writeln!(out, "    rc = url_query_add(&qp, key_buf, {name}[i].value);");
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }

        // form + explode renders each property as its own pair.
        _ => {
            let _ = writeln!(out, "  for (i = 0; i < {name}_len; ++i) {{");
            let _ = writeln!(
                out,
                "    rc = url_query_add(&qp, {name}[i].key, {name}[i].value);"
            );
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
    }
}

/// Operation needs a query-parameter block, for security or parameters.
pub(crate) fn needs_query_block(view: &OpView<'_>, spec: &crate::spec::Spec) -> bool {
    view.has_query() || security::query_api_key_schemes(view, spec).count() > 0
}

/// Writes the query block: `url_query_init` through `url_query_build`.
pub(crate) fn write_query_block(out: &mut String, view: &OpView<'_>, spec: &crate::spec::Spec) {
    let _ = writeln!(out, "  rc = url_query_init(&qp);");
    let _ = writeln!(out, "  if (rc != 0) goto cleanup;");

    // API keys carried in the query string live inside this block so the
    // synchronizer replaces them together with the parameters.
    for (name, scheme) in security::query_api_key_schemes(view, spec) {
        if let SecurityScheme::ApiKey { name: key_name, .. } = scheme {
            let _ = writeln!(out, "  /* Security: {name} */");
            let _ = writeln!(out, "  if (ctx->security.api_key) {{");
            let _ = writeln!(
                out,
                "    rc = url_query_add(&qp, \"{key_name}\", ctx->security.api_key);"
            );
            let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
            let _ = writeln!(out, "  }}");
        }
    }

    for location in [ParameterIn::Query, ParameterIn::Querystring] {
        for param in view.params_in(location) {
            match &param.kind {
                ParamKind::Scalar(scalar) => write_scalar_add(out, param.name(), *scalar),
                ParamKind::Array(item) => write_array_add(out, param, *item),
                ParamKind::Object => write_object_add(out, param),
            }
        }
    }

    let _ = writeln!(out, "  rc = url_query_build(&qp, &query_str);");
    let _ = writeln!(out, "  if (rc != 0) goto cleanup;");
}

/// Path-template interpolation honoring simple, label, and matrix styles.
///
/// Returns the `asprintf` statement assigning into `out_variable`.
pub(crate) fn write_url_builder(
    out: &mut String,
    view: &OpView<'_>,
    out_variable: &str,
    base_variable: &str,
) {
    let mut format = String::from("%s");
    let mut args: Vec<String> = vec![base_variable.to_owned()];

    for segment in view.route.split('/').filter(|segment| !segment.is_empty()) {
        format.push('/');

        let Some(name) = segment
            .strip_prefix('{')
            .and_then(|segment| segment.strip_suffix('}'))
        else {
            format.push_str(segment);
            continue;
        };

        let param = view
            .params_in(ParameterIn::Path)
            .find(|param| param.name() == name);

        let (spec_fmt, style) = match param {
            Some(param) => {
                let scalar = match &param.kind {
                    ParamKind::Scalar(scalar) => *scalar,
                    _ => CScalar::Str,
                };
                (scalar.fmt_spec(), param.param.effective_style())
            }
            None => {
                warn!("path template {{{name}}} has no matching parameter");
                ("%s", ParameterStyle::Simple)
            }
        };

        match style {
            ParameterStyle::Label => format.push('.'),
            ParameterStyle::Matrix => {
                format.push(';');
                format.push_str(name);
                format.push('=');
            }
            _ => {}
        }

        format.push_str(spec_fmt);
        args.push(super::sanitize(name));
    }

    let _ = writeln!(
        out,
        "  if (asprintf(&{out_variable}, \"{format}\", {}) == -1) {{ rc = ENOMEM; goto cleanup; }}",
        args.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::Spec;

    fn spec(json: serde_json::Value) -> Spec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn form_explode_array_emits_a_loop() {
        let spec = spec(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/list": {
                    "get": {
                        "operationId": "list",
                        "parameters": [
                            { "name": "tags", "in": "query", "style": "form", "explode": true,
                              "schema": { "type": "array", "items": { "type": "string" } } },
                        ],
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let mut out = String::new();
        write_query_block(&mut out, &views[0], &spec);

        assert!(out.contains("for (i = 0; i < tags_len; ++i)"));
        assert!(out.contains("url_query_add(&qp, \"tags\", tags[i]);"));
        assert!(out.starts_with("  rc = url_query_init(&qp);"));
        assert!(out.contains("url_query_build(&qp, &query_str);"));
    }

    #[test]
    fn pipe_delimited_array_joins() {
        let spec = spec(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/list": {
                    "get": {
                        "operationId": "list",
                        "parameters": [
                            { "name": "ids", "in": "query", "style": "pipeDelimited",
                              "schema": { "type": "array", "items": { "type": "string" } } },
                        ],
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let mut out = String::new();
        write_query_block(&mut out, &views[0], &spec);

        assert!(out.contains("url_query_add_joined(&qp, \"ids\", ids, ids_len, '|');"));
    }

    #[test]
    fn deep_object_serializes_key_paths() {
        let spec = spec(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/search": {
                    "get": {
                        "operationId": "search",
                        "parameters": [
                            { "name": "filter", "in": "query", "style": "deepObject",
                              "schema": { "type": "object" } },
                        ],
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let mut out = String::new();
        write_query_block(&mut out, &views[0], &spec);

        assert!(out.contains("\"filter[%s]\""));
        assert!(out.contains("url_query_add(&qp, key_buf, filter[i].value);"));
    }

    #[test]
    fn url_builder_interpolates_styles() {
        let spec = spec(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/user/{id}/posts/{slug}": {
                    "get": {
                        "operationId": "getPost",
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "type": "integer", "format": "int64" } },
                            { "name": "slug", "in": "path", "required": true, "style": "label",
                              "schema": { "type": "string" } },
                        ],
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let mut out = String::new();
        write_url_builder(&mut out, &views[0], "url", "ctx->base_url");

        assert_eq!(
            out,
            "  if (asprintf(&url, \"%s/user/%ld/posts/.%s\", ctx->base_url, id, slug) == -1) \
             { rc = ENOMEM; goto cleanup; }\n"
        );
    }

    #[test]
    fn matrix_style_prefixes_name_value() {
        let spec = spec(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/report/{year}": {
                    "get": {
                        "operationId": "report",
                        "parameters": [
                            { "name": "year", "in": "path", "required": true, "style": "matrix",
                              "schema": { "type": "integer" } },
                        ],
                    },
                },
            },
        }));

        let views = super::super::spec_views(&spec);
        let mut out = String::new();
        write_url_builder(&mut out, &views[0], "path_str", "ctx->base_url");

        assert!(out.contains("\"%s/report/;year=%d\""));
    }
}
