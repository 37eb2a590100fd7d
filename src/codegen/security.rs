//! Authentication-injection blocks.
//!
//! One block is emitted per distinct scheme that appears in any of the
//! operation's requirement sets (root-level sets as fallback). Requirement
//! identifiers may be absolute URIs resolving to
//! `#/components/securitySchemes/<name>`; they are canonicalized before
//! matching.

use std::fmt::Write;

use log::warn;

use crate::spec::{canonical_scheme_name, ObjectOrReference, SecurityScheme, Spec};

use super::OpView;

/// Distinct scheme names required by the operation, in requirement order.
fn required_scheme_names<'v>(view: &'v OpView<'_>, spec: &'v Spec) -> Vec<&'v str> {
    let mut names: Vec<&str> = Vec::new();

    for requirement in view.op.effective_security(spec) {
        for identifier in requirement.schemes.keys() {
            let name = canonical_scheme_name(identifier);
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
}

fn resolve_scheme<'s>(spec: &'s Spec, name: &str) -> Option<&'s SecurityScheme> {
    match spec.components.as_ref()?.security_schemes.get(name)? {
        ObjectOrReference::Object(scheme) => Some(scheme),
        _ => None,
    }
}

/// Schemes that inject an API key into the query string.
///
/// These are written inside the query block rather than the security block.
pub(crate) fn query_api_key_schemes<'v>(
    view: &'v OpView<'_>,
    spec: &'v Spec,
) -> impl Iterator<Item = (&'v str, &'v SecurityScheme)> {
    required_scheme_names(view, spec)
        .into_iter()
        .filter_map(|name| resolve_scheme(spec, name).map(|scheme| (name, scheme)))
        .filter(|(_, scheme)| {
            matches!(scheme, SecurityScheme::ApiKey { location, .. } if location == "query")
        })
}

/// Writes the non-query security blocks for the operation.
pub(crate) fn write_security(out: &mut String, view: &OpView<'_>, spec: &Spec) {
    for name in required_scheme_names(view, spec) {
        let Some(scheme) = resolve_scheme(spec, name) else {
            warn!("security requirement {name} has no resolvable scheme");
            continue;
        };

        match scheme {
            SecurityScheme::Http { scheme, .. } if scheme.eq_ignore_ascii_case("basic") => {
                let _ = writeln!(out, "  /* Security: {name} (HTTP basic) */");
                let _ = writeln!(
                    out,
                    "  if (ctx->security.username && ctx->security.password) {{"
                );
                let _ = writeln!(
                    out,
                    "    rc = http_request_set_auth_basic(&req, ctx->security.username, \
                     ctx->security.password);"
                );
                let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                let _ = writeln!(out, "  }}");
            }

            SecurityScheme::Http { .. }
            | SecurityScheme::OAuth2 { .. }
            | SecurityScheme::OpenIdConnect { .. } => {
                let _ = writeln!(out, "  /* Security: {name} (bearer) */");
                let _ = writeln!(out, "  if (ctx->security.bearer_token) {{");
                let _ = writeln!(
                    out,
                    "    rc = http_request_set_auth_bearer(&req, ctx->security.bearer_token);"
                );
                let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                let _ = writeln!(out, "  }}");
            }

            SecurityScheme::ApiKey {
                name: key_name,
                location,
                ..
            } => match location.as_str() {
                "header" => {
                    let _ = writeln!(out, "  /* Security: {name} (API key header) */");
                    let _ = writeln!(out, "  if (ctx->security.api_key) {{");
                    let _ = writeln!(
                        out,
                        "    rc = http_headers_add(&req.headers, \"{key_name}\", \
                         ctx->security.api_key);"
                    );
                    let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                    let _ = writeln!(out, "  }}");
                }
                "cookie" => {
                    let _ = writeln!(out, "  /* Security: {name} (API key cookie) */");
                    let _ = writeln!(out, "  if (ctx->security.api_key) {{");
                    let _ = writeln!(out, "    char cookie_buf[512];");
                    let _ = writeln!(
                        out,
                        "    snprintf(cookie_buf, sizeof cookie_buf, \"{key_name}=%s\", \
                         ctx->security.api_key);"
                    );
                    let _ = writeln!(
                        out,
                        "    rc = http_headers_add(&req.headers, \"Cookie\", cookie_buf);"
                    );
                    let _ = writeln!(out, "    if (rc != 0) goto cleanup;");
                    let _ = writeln!(out, "  }}");
                }
                // Query keys are handled inside the query block.
                "query" => {}
                other => warn!("API key scheme {name} has unsupported location {other}"),
            },

            SecurityScheme::MutualTls { .. } => {
                // Client certificates are transport configuration.
                let _ = writeln!(out, "  /* Security: {name} (mutual TLS via transport) */");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn petstore() -> Spec {
        serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "security": [{ "bearerAuth": [] }],
            "paths": {
                "/open": { "get": { "operationId": "open", "security": [] } },
                "/keyed": {
                    "get": {
                        "operationId": "keyed",
                        "security": [{ "ApiKeyAuth": [] }],
                    },
                },
                "/inherited": { "get": { "operationId": "inherited" } },
            },
            "components": {
                "securitySchemes": {
                    "bearerAuth": { "type": "http", "scheme": "bearer" },
                    "ApiKeyAuth": { "type": "apiKey", "name": "X-Api-Key", "in": "header" },
                },
            },
        }))
        .unwrap()
    }

    fn block_for(spec: &Spec, operation_id: &str) -> String {
        let views = super::super::spec_views(spec);
        let view = views
            .iter()
            .find(|view| view.operation_id == operation_id)
            .unwrap();

        let mut out = String::new();
        write_security(&mut out, view, spec);
        out
    }

    #[test]
    fn operation_security_filters_schemes() {
        let spec = petstore();
        let block = block_for(&spec, "keyed");

        assert!(block.contains("X-Api-Key"));
        assert!(!block.contains("bearer_token"));
    }

    #[test]
    fn empty_security_array_means_no_blocks() {
        let spec = petstore();
        assert_eq!(block_for(&spec, "open"), "");
    }

    #[test]
    fn absent_security_inherits_from_root() {
        let spec = petstore();
        let block = block_for(&spec, "inherited");

        assert!(block.contains("http_request_set_auth_bearer"));
    }

    #[test]
    fn absolute_scheme_uris_are_canonicalized() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "v" },
            "paths": {
                "/x": {
                    "get": {
                        "operationId": "x",
                        "security": [{
                            "https://example.com/api.json#/components/securitySchemes/bearerAuth": []
                        }],
                    },
                },
            },
            "components": {
                "securitySchemes": {
                    "bearerAuth": { "type": "http", "scheme": "bearer" },
                },
            },
        }))
        .unwrap();

        let block = block_for(&spec, "x");
        assert!(block.contains("http_request_set_auth_bearer"));
    }
}
