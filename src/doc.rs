//! Documentation-comment directive parser.
//!
//! Scans block and line comments for `@`-style annotations describing API
//! operations: routes, parameters, responses, security, servers, request
//! bodies, and document-level info fields. Parsing is line-oriented; lines
//! without a directive continue the previous description block, malformed
//! lines are skipped, and unknown directives are ignored for forward
//! compatibility.

use log::warn;

use crate::spec::{ParameterIn, ParameterStyle};

/// A documented parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocParam {
    /// Parameter name.
    pub name: String,
    /// Explicit location, when given via `[in:...]`.
    pub location: Option<ParameterIn>,
    /// Free-text description.
    pub description: Option<String>,
    /// Schema format override.
    pub format: Option<String>,
    /// Explicit required flag.
    pub required: Option<bool>,
    /// Content media type for complex serialization.
    pub content_type: Option<String>,
    /// Example, raw JSON or text.
    pub example: Option<String>,
    /// Explicit deprecation flag.
    pub deprecated: Option<bool>,
    /// Serialization style override.
    pub style: Option<ParameterStyle>,
    /// Explicit explode flag.
    pub explode: Option<bool>,
    /// Explicit allowReserved flag.
    pub allow_reserved: Option<bool>,
    /// Explicit allowEmptyValue flag.
    pub allow_empty_value: Option<bool>,
}

/// A documented response, one per `@return` line.
///
/// The same status code may appear on several lines with different content
/// types; the operation builder merges them into one multi-content response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocResponse {
    /// Status code, e.g. `200` or `default`.
    pub code: String,
    /// Response summary.
    pub summary: Option<String>,
    /// Response description.
    pub description: Option<String>,
    /// Content media type; `application/json` when omitted.
    pub content_type: Option<String>,
    /// Example, raw JSON or text.
    pub example: Option<String>,
}

/// A documented response header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocResponseHeader {
    /// Status code the header belongs to.
    pub code: String,
    /// Header name.
    pub name: String,
    /// Schema type, e.g. `string` or `integer`.
    pub schema_type: Option<String>,
    /// Schema format.
    pub format: Option<String>,
    /// Content media type (Header Object `content` form).
    pub content_type: Option<String>,
    /// Header description.
    pub description: Option<String>,
    /// Example value.
    pub example: Option<String>,
    /// Explicit required flag.
    pub required: Option<bool>,
}

/// A documented response link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocLink {
    /// Status code the link belongs to.
    pub code: String,
    /// Link name.
    pub name: String,
    /// Target operation id.
    pub operation_id: Option<String>,
    /// Target operation reference URI.
    pub operation_ref: Option<String>,
    /// Link summary.
    pub summary: Option<String>,
    /// Link description.
    pub description: Option<String>,
    /// Raw JSON object for the parameters map.
    pub parameters_json: Option<String>,
    /// Raw JSON for the request body expression.
    pub request_body_json: Option<String>,
    /// Server override URL.
    pub server_url: Option<String>,
    /// Server override name.
    pub server_name: Option<String>,
    /// Server override description.
    pub server_description: Option<String>,
}

/// One `@security` requirement: a scheme and its scopes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocSecurity {
    /// Scheme name or absolute scheme URI.
    pub scheme: String,
    /// Required scopes.
    pub scopes: Vec<String>,
}

/// One OAuth2 flow declared on a `@securityScheme`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocOAuthFlow {
    /// Flow kind, e.g. `authorizationCode`.
    pub flow: String,
    /// Authorization endpoint.
    pub authorization_url: Option<String>,
    /// Token endpoint.
    pub token_url: Option<String>,
    /// Refresh endpoint.
    pub refresh_url: Option<String>,
    /// Device authorization endpoint.
    pub device_authorization_url: Option<String>,
    /// Scope names.
    pub scopes: Vec<String>,
}

/// A documented security scheme declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocSecurityScheme {
    /// Scheme name.
    pub name: String,
    /// Scheme type: `apiKey`, `http`, `mutualTLS`, `oauth2`, `openIdConnect`.
    pub scheme_type: Option<String>,
    /// Scheme description.
    pub description: Option<String>,
    /// Explicit deprecation flag.
    pub deprecated: Option<bool>,
    /// API key parameter name.
    pub param_name: Option<String>,
    /// API key location: `query`, `header`, or `cookie`.
    pub location: Option<String>,
    /// HTTP authentication scheme.
    pub http_scheme: Option<String>,
    /// Bearer token format hint.
    pub bearer_format: Option<String>,
    /// OpenID Connect discovery URL.
    pub open_id_connect_url: Option<String>,
    /// OAuth2 authorization server metadata URL.
    pub oauth2_metadata_url: Option<String>,
    /// OAuth2 flows.
    pub flows: Vec<DocOAuthFlow>,
}

/// A documented server variable, attached to the most recent `@server`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocServerVar {
    /// Variable name.
    pub name: String,
    /// Default value.
    pub default: Option<String>,
    /// Enumerated values.
    pub enum_values: Vec<String>,
    /// Variable description.
    pub description: Option<String>,
}

/// A documented server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocServer {
    /// Server URL template.
    pub url: String,
    /// Display name.
    pub name: Option<String>,
    /// Server description.
    pub description: Option<String>,
    /// URL template variables.
    pub variables: Vec<DocServerVar>,
}

/// A documented request body, one per media type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocRequestBody {
    /// Body description.
    pub description: Option<String>,
    /// Explicit required flag.
    pub required: Option<bool>,
    /// Content media type.
    pub content_type: Option<String>,
    /// Example, raw JSON or text.
    pub example: Option<String>,
}

/// Tag metadata from `@tagMeta`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocTagMeta {
    /// Tag name.
    pub name: String,
    /// Tag summary.
    pub summary: Option<String>,
    /// Tag description.
    pub description: Option<String>,
    /// Parent tag name.
    pub parent: Option<String>,
    /// Tag kind.
    pub kind: Option<String>,
    /// External docs URL.
    pub external_docs: Option<String>,
    /// External docs description.
    pub external_docs_description: Option<String>,
}

/// Structured metadata extracted from one documentation comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocMetadata {
    /// Path template from `@route` / `@webhook`.
    pub route: Option<String>,
    /// Uppercased HTTP verb, when one was given.
    pub verb: Option<String>,
    /// The comment used `@webhook` rather than `@route`.
    pub is_webhook: bool,
    /// Explicit operation id.
    pub operation_id: Option<String>,
    /// Operation summary.
    pub summary: Option<String>,
    /// Operation description.
    pub description: Option<String>,
    /// Operation tags.
    pub tags: Vec<String>,
    /// Tag metadata declarations.
    pub tag_meta: Vec<DocTagMeta>,
    /// Explicit deprecation flag.
    pub deprecated: Option<bool>,
    /// External docs URL.
    pub external_docs_url: Option<String>,
    /// External docs description.
    pub external_docs_description: Option<String>,
    /// Documented parameters, in declaration order.
    pub params: Vec<DocParam>,
    /// Documented responses, in declaration order.
    pub returns: Vec<DocResponse>,
    /// Documented response headers.
    pub response_headers: Vec<DocResponseHeader>,
    /// Documented response links.
    pub links: Vec<DocLink>,
    /// Security requirements.
    pub security: Vec<DocSecurity>,
    /// Security scheme declarations.
    pub security_schemes: Vec<DocSecurityScheme>,
    /// Server declarations.
    pub servers: Vec<DocServer>,
    /// Request bodies, one per media type.
    pub request_bodies: Vec<DocRequestBody>,

    /// `@infoTitle`, on file-level comments.
    pub info_title: Option<String>,
    /// `@infoVersion`, on file-level comments.
    pub info_version: Option<String>,
    /// `@infoSummary`, on file-level comments.
    pub info_summary: Option<String>,
    /// `@infoDescription`, on file-level comments.
    pub info_description: Option<String>,
    /// `@termsOfService`, on file-level comments.
    pub terms_of_service: Option<String>,
    /// `@contact [name:...]`.
    pub contact_name: Option<String>,
    /// `@contact [url:...]`.
    pub contact_url: Option<String>,
    /// `@contact [email:...]`.
    pub contact_email: Option<String>,
    /// `@license [name:...]`.
    pub license_name: Option<String>,
    /// `@license [identifier:...]`.
    pub license_identifier: Option<String>,
    /// `@license [url:...]`.
    pub license_url: Option<String>,
}

impl DocMetadata {
    /// Returns `true` when the comment declared an operation route.
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Looks up a documented parameter by name.
    pub fn param(&self, name: &str) -> Option<&DocParam> {
        self.params.iter().find(|param| param.name == name)
    }
}

/// Which block receives continuation text from directive-less lines.
enum Continuation {
    None,
    Description,
    Param,
    Response,
    RequestBody,
}

/// One split directive line: leading words, `[...]` attribute groups, and
/// the free-text tail.
struct DirectiveLine {
    name: String,
    words: Vec<String>,
    groups: Vec<String>,
    tail: String,
}

impl DirectiveLine {
    fn word(&self, idx: usize) -> Option<&str> {
        self.words.get(idx).map(String::as_str)
    }

    /// Value of a `[key:value]` or `[key=value]` group; key match is
    /// case-insensitive.
    fn attr(&self, key: &str) -> Option<String> {
        self.groups.iter().find_map(|group| {
            let (group_key, value) = group.split_once([':', '='])?;
            group_key
                .trim()
                .eq_ignore_ascii_case(key)
                .then(|| value.trim().to_owned())
        })
    }

    /// Boolean attribute: `[key]` alone counts as `true`.
    fn bool_attr(&self, key: &str) -> Option<bool> {
        if let Some(value) = self.attr(key) {
            return Some(value.eq_ignore_ascii_case("true"));
        }
        self.groups
            .iter()
            .any(|group| group.trim().eq_ignore_ascii_case(key))
            .then_some(true)
    }
}

/// Splits `rest` into leading words, bracket groups, and the tail.
///
/// Bracket groups may nest (JSON examples); words stop at the first group.
fn split_directive_args(rest: &str) -> (Vec<String>, Vec<String>, String) {
    let mut words = Vec::new();
    let mut groups = Vec::new();
    let mut chars = rest.char_indices().peekable();

    // Leading words.
    let mut tail_start = rest.len();
    'words: while let Some(&(idx, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch == '[' {
            tail_start = idx;
            break;
        }

        let word_start = idx;
        let mut word_end = rest.len();
        for (idx, ch) in chars.by_ref() {
            if ch.is_whitespace() {
                word_end = idx;
                break;
            }
        }
        words.push(rest[word_start..word_end].to_owned());
        if word_end == rest.len() {
            tail_start = rest.len();
            break 'words;
        }
    }

    // Bracket groups, nesting-aware.
    let bytes = rest.as_bytes();
    let mut idx = tail_start;
    loop {
        while idx < bytes.len() && (bytes[idx] as char).is_whitespace() {
            idx += 1;
        }
        if idx >= bytes.len() || bytes[idx] != b'[' {
            break;
        }

        let group_start = idx + 1;
        let mut depth = 1usize;
        let mut end = None;
        for (offset, byte) in bytes[group_start..].iter().enumerate() {
            match *byte {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(group_start + offset);
                        break;
                    }
                }
                _ => {}
            }
        }

        match end {
            Some(end) => {
                groups.push(rest[group_start..end].to_owned());
                idx = end + 1;
            }
            None => break,
        }
    }

    let tail = rest[idx.min(rest.len())..].trim().to_owned();

    (words, groups, tail)
}

/// Strips comment framing and decorative leaders, yielding content lines.
fn content_lines(comment: &str) -> Vec<String> {
    let trimmed = comment.trim();

    let body = if let Some(body) = trimmed.strip_prefix("/*") {
        body.strip_prefix('*')
            .unwrap_or(body)
            .strip_suffix("*/")
            .unwrap_or(body)
    } else {
        trimmed
    };

    body.lines()
        .map(|line| {
            let line = line.trim_start();
            let line = line
                .strip_prefix("///")
                .or_else(|| line.strip_prefix("//"))
                .unwrap_or(line);
            let line = line.trim_start_matches('*');
            line.strip_prefix(' ').unwrap_or(line).trim_end().to_owned()
        })
        .collect()
}

fn parse_directive(line: &str) -> Option<DirectiveLine> {
    let rest = line.strip_prefix(['@', '\\'])?;
    let name_len = rest
        .bytes()
        .take_while(|byte| byte.is_ascii_alphanumeric())
        .count();

    if name_len == 0 {
        return None;
    }

    let name = rest[..name_len].to_ascii_lowercase();
    let (words, groups, tail) = split_directive_args(&rest[name_len..]);

    Some(DirectiveLine {
        name,
        words,
        groups,
        tail,
    })
}

fn append_text(target: &mut Option<String>, text: &str) {
    if text.is_empty() {
        return;
    }
    match target {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *target = Some(text.to_owned()),
    }
}

fn comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn style_from_str(text: &str) -> Option<ParameterStyle> {
    Some(match text {
        text if text.eq_ignore_ascii_case("form") => ParameterStyle::Form,
        text if text.eq_ignore_ascii_case("simple") => ParameterStyle::Simple,
        text if text.eq_ignore_ascii_case("matrix") => ParameterStyle::Matrix,
        text if text.eq_ignore_ascii_case("label") => ParameterStyle::Label,
        text if text.eq_ignore_ascii_case("spaceDelimited") => ParameterStyle::SpaceDelimited,
        text if text.eq_ignore_ascii_case("pipeDelimited") => ParameterStyle::PipeDelimited,
        text if text.eq_ignore_ascii_case("deepObject") => ParameterStyle::DeepObject,
        text if text.eq_ignore_ascii_case("cookie") => ParameterStyle::Cookie,
        _ => return None,
    })
}

fn location_from_str(text: &str) -> Option<ParameterIn> {
    Some(match text {
        text if text.eq_ignore_ascii_case("path") => ParameterIn::Path,
        text if text.eq_ignore_ascii_case("query") => ParameterIn::Query,
        text if text.eq_ignore_ascii_case("querystring") => ParameterIn::Querystring,
        text if text.eq_ignore_ascii_case("header") => ParameterIn::Header,
        text if text.eq_ignore_ascii_case("cookie") => ParameterIn::Cookie,
        _ => return None,
    })
}

/// Parses one comment's raw text into a [`DocMetadata`] record.
///
/// Never fails: malformed lines are skipped and unknown directives ignored.
pub fn parse_comment(comment: &str) -> DocMetadata {
    let mut doc = DocMetadata::default();
    let mut continuation = Continuation::None;

    for line in content_lines(comment) {
        let Some(directive) = parse_directive(&line) else {
            // Continuation text for the previous description block.
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let target = match continuation {
                Continuation::Description => Some(&mut doc.description),
                Continuation::Param => doc.params.last_mut().map(|p| &mut p.description),
                Continuation::Response => doc.returns.last_mut().map(|r| &mut r.description),
                Continuation::RequestBody => {
                    doc.request_bodies.last_mut().map(|b| &mut b.description)
                }
                Continuation::None => None,
            };
            if let Some(target) = target {
                append_text(target, text);
            }
            continue;
        };

        continuation = Continuation::None;

        match directive.name.as_str() {
            "route" | "webhook" => {
                let Some(first) = directive.word(0) else {
                    warn!("skipping {} directive without arguments", directive.name);
                    continue;
                };

                if first.starts_with('/') {
                    doc.route = Some(first.to_owned());
                } else {
                    doc.verb = Some(first.to_ascii_uppercase());
                    match directive.word(1) {
                        Some(path) => doc.route = Some(path.to_owned()),
                        None => warn!("skipping {} directive without a path", directive.name),
                    }
                }

                doc.is_webhook = directive.name == "webhook";
            }

            "param" => {
                let Some(name) = directive.word(0) else {
                    warn!("skipping @param without a name");
                    continue;
                };

                let mut param = DocParam {
                    name: name.to_owned(),
                    location: directive.attr("in").as_deref().and_then(location_from_str),
                    format: directive.attr("format"),
                    required: directive.bool_attr("required"),
                    content_type: directive.attr("contentType"),
                    example: directive.attr("example"),
                    deprecated: directive.bool_attr("deprecated"),
                    style: directive.attr("style").as_deref().and_then(style_from_str),
                    explode: directive.bool_attr("explode"),
                    allow_reserved: directive.bool_attr("allowReserved"),
                    allow_empty_value: directive.bool_attr("allowEmptyValue"),
                    ..DocParam::default()
                };
                if !directive.tail.is_empty() {
                    param.description = Some(directive.tail.clone());
                }

                doc.params.push(param);
                continuation = Continuation::Param;
            }

            "return" | "returns" => {
                let Some(code) = directive.word(0) else {
                    warn!("skipping @return without a status code");
                    continue;
                };

                doc.returns.push(DocResponse {
                    code: code.to_owned(),
                    summary: directive.attr("summary"),
                    description: (!directive.tail.is_empty()).then(|| directive.tail.clone()),
                    content_type: directive.attr("contentType"),
                    example: directive.attr("example"),
                });
                continuation = Continuation::Response;
            }

            "operationid" => {
                doc.operation_id = directive
                    .word(0)
                    .map(str::to_owned)
                    .or_else(|| (!directive.tail.is_empty()).then(|| directive.tail.clone()));
            }

            "summary" | "brief" => {
                let mut text = directive.words.join(" ");
                if !directive.tail.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&directive.tail);
                }
                doc.summary = Some(text);
            }

            "description" | "details" => {
                let mut text = directive.words.join(" ");
                if !directive.tail.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&directive.tail);
                }
                append_text(&mut doc.description, &text);
                continuation = Continuation::Description;
            }

            "tag" | "tags" => {
                let text = directive.words.join(" ");
                doc.tags.extend(comma_list(&text));
            }

            "tagmeta" => {
                let Some(name) = directive.word(0) else {
                    warn!("skipping @tagMeta without a name");
                    continue;
                };
                doc.tag_meta.push(DocTagMeta {
                    name: name.to_owned(),
                    summary: directive.attr("summary"),
                    description: directive.attr("description"),
                    parent: directive.attr("parent"),
                    kind: directive.attr("kind"),
                    external_docs: directive.attr("externalDocs"),
                    external_docs_description: directive.attr("externalDocsDescription"),
                });
            }

            "deprecated" => {
                doc.deprecated = Some(
                    directive
                        .word(0)
                        .map_or(true, |value| value.eq_ignore_ascii_case("true")),
                );
            }

            "externaldocs" => {
                let Some(url) = directive.word(0) else {
                    warn!("skipping @externalDocs without a URL");
                    continue;
                };
                doc.external_docs_url = Some(url.to_owned());

                let rest = directive.words[1..].join(" ");
                let description = match (!rest.is_empty(), !directive.tail.is_empty()) {
                    (true, true) => Some(format!("{rest} {}", directive.tail)),
                    (true, false) => Some(rest),
                    (false, true) => Some(directive.tail.clone()),
                    (false, false) => None,
                };
                doc.external_docs_description = description;
            }

            "security" => {
                let Some(scheme) = directive.word(0) else {
                    warn!("skipping @security without a scheme");
                    continue;
                };
                doc.security.push(DocSecurity {
                    scheme: scheme.to_owned(),
                    scopes: directive.groups.iter().flat_map(|g| comma_list(g)).collect(),
                });
            }

            "securityscheme" => {
                let Some(name) = directive.word(0) else {
                    warn!("skipping @securityScheme without a name");
                    continue;
                };

                let mut scheme = DocSecurityScheme {
                    name: name.to_owned(),
                    scheme_type: directive.attr("type"),
                    description: directive.attr("description"),
                    deprecated: directive.bool_attr("deprecated"),
                    param_name: directive.attr("paramName"),
                    location: directive.attr("in"),
                    http_scheme: directive.attr("scheme"),
                    bearer_format: directive.attr("bearerFormat"),
                    open_id_connect_url: directive.attr("openIdConnectUrl"),
                    oauth2_metadata_url: directive.attr("oauth2MetadataUrl"),
                    flows: Vec::new(),
                };

                if let Some(flow) = directive.attr("flow") {
                    scheme.flows.push(DocOAuthFlow {
                        flow,
                        authorization_url: directive.attr("authorizationUrl"),
                        token_url: directive.attr("tokenUrl"),
                        refresh_url: directive.attr("refreshUrl"),
                        device_authorization_url: directive.attr("deviceAuthorizationUrl"),
                        scopes: directive
                            .attr("scopes")
                            .map(|scopes| comma_list(&scopes))
                            .unwrap_or_default(),
                    });
                }

                doc.security_schemes.push(scheme);
            }

            "server" => {
                let Some(url) = directive.word(0) else {
                    warn!("skipping @server without a URL");
                    continue;
                };
                doc.servers.push(DocServer {
                    url: url.to_owned(),
                    name: directive.attr("name"),
                    description: directive.attr("description"),
                    variables: Vec::new(),
                });
            }

            "servervar" => {
                let Some(name) = directive.word(0) else {
                    warn!("skipping @serverVar without a name");
                    continue;
                };
                let var = DocServerVar {
                    name: name.to_owned(),
                    default: directive.attr("default"),
                    enum_values: directive
                        .attr("enum")
                        .map(|values| comma_list(&values))
                        .unwrap_or_default(),
                    description: directive.attr("description"),
                };
                match doc.servers.last_mut() {
                    Some(server) => server.variables.push(var),
                    None => warn!("@serverVar {} has no preceding @server", var.name),
                }
            }

            "infotitle" => doc.info_title = join_all(&directive),
            "infoversion" => doc.info_version = join_all(&directive),
            "infosummary" => doc.info_summary = join_all(&directive),
            "infodescription" => doc.info_description = join_all(&directive),
            "termsofservice" => doc.terms_of_service = directive.word(0).map(str::to_owned),

            "contact" => {
                doc.contact_name = directive.attr("name").or(doc.contact_name.take());
                doc.contact_url = directive.attr("url").or(doc.contact_url.take());
                doc.contact_email = directive.attr("email").or(doc.contact_email.take());
            }

            "license" => {
                doc.license_name = directive.attr("name").or(doc.license_name.take());
                doc.license_identifier =
                    directive.attr("identifier").or(doc.license_identifier.take());
                doc.license_url = directive.attr("url").or(doc.license_url.take());
            }

            "requestbody" => {
                doc.request_bodies.push(DocRequestBody {
                    description: (!directive.tail.is_empty()).then(|| directive.tail.clone()),
                    required: directive.bool_attr("required"),
                    content_type: directive.attr("contentType"),
                    example: directive.attr("example"),
                });
                continuation = Continuation::RequestBody;
            }

            "responseheader" => {
                let (Some(code), Some(name)) = (directive.word(0), directive.word(1)) else {
                    warn!("skipping @responseHeader without status and name");
                    continue;
                };
                doc.response_headers.push(DocResponseHeader {
                    code: code.to_owned(),
                    name: name.to_owned(),
                    schema_type: directive.attr("type"),
                    format: directive.attr("format"),
                    content_type: directive.attr("contentType"),
                    description: (!directive.tail.is_empty()).then(|| directive.tail.clone()),
                    example: directive.attr("example"),
                    required: directive.bool_attr("required"),
                });
            }

            "link" => {
                let (Some(code), Some(name)) = (directive.word(0), directive.word(1)) else {
                    warn!("skipping @link without status and name");
                    continue;
                };
                doc.links.push(DocLink {
                    code: code.to_owned(),
                    name: name.to_owned(),
                    operation_id: directive.attr("operationId"),
                    operation_ref: directive.attr("operationRef"),
                    summary: directive.attr("summary"),
                    description: directive
                        .attr("description")
                        .or_else(|| (!directive.tail.is_empty()).then(|| directive.tail.clone())),
                    parameters_json: directive.attr("parameters"),
                    request_body_json: directive.attr("requestBody"),
                    server_url: directive.attr("serverUrl"),
                    server_name: directive.attr("serverName"),
                    server_description: directive.attr("serverDescription"),
                });
            }

            // Unknown directives are ignored for forward compatibility.
            _ => {}
        }
    }

    doc
}

fn join_all(directive: &DirectiveLine) -> Option<String> {
    let mut text = directive.words.join(" ");
    if !directive.tail.is_empty() {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&directive.tail);
    }
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn route_with_verb_and_path() {
        let doc = parse_comment("/** @route GET /user/{id} */");
        assert_eq!(doc.verb.as_deref(), Some("GET"));
        assert_eq!(doc.route.as_deref(), Some("/user/{id}"));
        assert!(!doc.is_webhook);
    }

    #[test]
    fn route_with_leading_slash_leaves_verb_unset() {
        let doc = parse_comment("/** @route /health */");
        assert_eq!(doc.verb, None);
        assert_eq!(doc.route.as_deref(), Some("/health"));
    }

    #[test]
    fn verb_is_uppercased() {
        let doc = parse_comment("/** @route purge /cache */");
        assert_eq!(doc.verb.as_deref(), Some("PURGE"));
    }

    #[test]
    fn webhook_sets_flag() {
        let doc = parse_comment("/** @webhook POST /events/pet */");
        assert!(doc.is_webhook);
        assert_eq!(doc.verb.as_deref(), Some("POST"));
        assert_eq!(doc.route.as_deref(), Some("/events/pet"));
    }

    #[test]
    fn param_attributes() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @param tags [in:query] [style:form] [explode:true] filter by tags
             * @param id [in:path] [required] [format:int64] the pet id
             */
        "#});

        assert_eq!(doc.params.len(), 2);

        let tags = &doc.params[0];
        assert_eq!(tags.name, "tags");
        assert_eq!(tags.location, Some(ParameterIn::Query));
        assert_eq!(tags.style, Some(ParameterStyle::Form));
        assert_eq!(tags.explode, Some(true));
        assert_eq!(tags.description.as_deref(), Some("filter by tags"));

        let id = &doc.params[1];
        assert_eq!(id.location, Some(ParameterIn::Path));
        assert_eq!(id.required, Some(true));
        assert_eq!(id.format.as_deref(), Some("int64"));
    }

    #[test]
    fn repeated_return_status_keeps_both_entries() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @return 200 [contentType:application/json] the pet
             * @return 200 [contentType:application/xml] the pet, as XML
             * @return 404 not found
             */
        "#});

        assert_eq!(doc.returns.len(), 3);
        assert_eq!(doc.returns[0].code, "200");
        assert_eq!(
            doc.returns[0].content_type.as_deref(),
            Some("application/json")
        );
        assert_eq!(
            doc.returns[1].content_type.as_deref(),
            Some("application/xml")
        );
        assert_eq!(doc.returns[2].code, "404");
    }

    #[test]
    fn continuation_lines_extend_descriptions() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @description The first line.
             * And the second line.
             * @param q [in:query] search term
             * spanning two lines.
             */
        "#});

        assert_eq!(
            doc.description.as_deref(),
            Some("The first line.\nAnd the second line.")
        );
        assert_eq!(
            doc.params[0].description.as_deref(),
            Some("search term\nspanning two lines.")
        );
    }

    #[test]
    fn security_scopes_come_from_bracket_group() {
        let doc = parse_comment("/** @security oauth [read:pets, write:pets] */");
        assert_eq!(doc.security.len(), 1);
        assert_eq!(doc.security[0].scheme, "oauth");
        assert_eq!(doc.security[0].scopes, vec!["read:pets", "write:pets"]);
    }

    #[test]
    fn security_scheme_with_flow() {
        let doc = parse_comment(
            "/** @securityScheme petOauth [type:oauth2] [flow:authorizationCode] \
             [authorizationUrl:https://example.com/auth] [tokenUrl:https://example.com/token] \
             [scopes:read,write] */",
        );

        let scheme = &doc.security_schemes[0];
        assert_eq!(scheme.name, "petOauth");
        assert_eq!(scheme.scheme_type.as_deref(), Some("oauth2"));

        let flow = &scheme.flows[0];
        assert_eq!(flow.flow, "authorizationCode");
        assert_eq!(
            flow.authorization_url.as_deref(),
            Some("https://example.com/auth")
        );
        assert_eq!(flow.scopes, vec!["read", "write"]);
    }

    #[test]
    fn server_vars_attach_to_preceding_server() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @server https://{region}.example.com [name=Production]
             * @serverVar region [default:us] [enum:us,eu] [description:data center]
             */
        "#});

        let server = &doc.servers[0];
        assert_eq!(server.url, "https://{region}.example.com");
        assert_eq!(server.name.as_deref(), Some("Production"));
        assert_eq!(server.variables[0].name, "region");
        assert_eq!(server.variables[0].default.as_deref(), Some("us"));
        assert_eq!(server.variables[0].enum_values, vec!["us", "eu"]);
    }

    #[test]
    fn info_and_license_globals() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @infoTitle Pet Store
             * @infoVersion 1.2.3
             * @license [name:MIT] [identifier:MIT]
             * @contact [name:API Team] [email:api@example.com]
             * @termsOfService https://example.com/tos
             */
        "#});

        assert_eq!(doc.info_title.as_deref(), Some("Pet Store"));
        assert_eq!(doc.info_version.as_deref(), Some("1.2.3"));
        assert_eq!(doc.license_name.as_deref(), Some("MIT"));
        assert_eq!(doc.contact_email.as_deref(), Some("api@example.com"));
        assert_eq!(
            doc.terms_of_service.as_deref(),
            Some("https://example.com/tos")
        );
    }

    #[test]
    fn request_body_per_media_type() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @requestBody [required] [contentType:application/json] the pet to add
             * @requestBody [contentType:multipart/form-data] the pet, as a form
             */
        "#});

        assert_eq!(doc.request_bodies.len(), 2);
        assert_eq!(doc.request_bodies[0].required, Some(true));
        assert_eq!(
            doc.request_bodies[1].content_type.as_deref(),
            Some("multipart/form-data")
        );
    }

    #[test]
    fn unknown_directives_are_skipped_silently() {
        let doc = parse_comment("/** @frobnicate everything\n@route GET /x */");
        assert_eq!(doc.route.as_deref(), Some("/x"));
    }

    #[test]
    fn line_comments_are_supported() {
        let doc = parse_comment("// @route DELETE /user/{id}\n// @tag users");
        assert_eq!(doc.verb.as_deref(), Some("DELETE"));
        assert_eq!(doc.tags, vec!["users"]);
    }

    #[test]
    fn nested_brackets_in_example_attribute() {
        let doc = parse_comment("/** @param ids [in:query] [example:[1,2,3]] id filter */");
        assert_eq!(doc.params[0].example.as_deref(), Some("[1,2,3]"));
        assert_eq!(doc.params[0].description.as_deref(), Some("id filter"));
    }

    #[test]
    fn response_header_and_link_directives() {
        let doc = parse_comment(indoc::indoc! {r#"
            /**
             * @responseHeader 200 X-Rate-Limit [type:integer] [format:int32] calls remaining
             * @link 201 GetPetById [operationId:getPet] [parameters:{"id":"$response.body#/id"}]
             */
        "#});

        let header = &doc.response_headers[0];
        assert_eq!(header.code, "200");
        assert_eq!(header.name, "X-Rate-Limit");
        assert_eq!(header.schema_type.as_deref(), Some("integer"));

        let link = &doc.links[0];
        assert_eq!(link.code, "201");
        assert_eq!(link.name, "GetPetById");
        assert_eq!(link.operation_id.as_deref(), Some("getPet"));
        assert_eq!(
            link.parameters_json.as_deref(),
            Some(r#"{"id":"$response.body#/id"}"#)
        );
    }
}
