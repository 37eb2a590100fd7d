//! Operation builder and spec aggregator.
//!
//! Takes a parsed C signature plus its documentation comment and produces a
//! fully-formed [`Operation`]; aggregates per-file operations, type
//! definitions, and document globals into one [`Spec`] in discovery order.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, warn};
use url::Url;

use crate::{
    cst::{CstKind, CstNode},
    doc::{self, DocMetadata, DocOAuthFlow, DocSecurityScheme},
    fields::FieldScalar,
    inspect::{self, TypeDef},
    lex::{self, Keyword, Punct, Token, TokenKind},
    spec::{
        AuthorizationCodeFlow, ClientCredentialsFlow, Components, DeviceAuthorizationFlow,
        ExternalDoc, Flows, ImplicitFlow, Info, Link, MediaType, MediaTypeExamples, ObjectSchema,
        ObjectOrReference, Operation, Parameter, ParameterIn, PasswordFlow, PathItem, RequestBody,
        Response, Schema, SchemaType, SchemaTypeSet, SecurityRequirement, SecurityScheme, Server,
        ServerVariable, Spec, Tag, Header as SpecHeader,
    },
};

/// Header names governed by the framework rather than the caller.
pub const RESERVED_HEADERS: &[&str] = &[
    "accept",
    "content-type",
    "authorization",
    "host",
    "connection",
    "content-length",
    "user-agent",
];

/// Operation-builder options.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Header parameter names dropped during classification; compared
    /// case-insensitively with `_` treated as `-`.
    pub reserved_headers: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            reserved_headers: RESERVED_HEADERS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl BuildOptions {
    fn is_reserved_header(&self, name: &str) -> bool {
        let canonical = name.replace('_', "-");
        self.reserved_headers
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(&canonical))
    }
}

/// Base type of a C declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CBase {
    /// `void`.
    Void,
    /// `bool` / `_Bool`.
    Bool,
    /// `char`.
    Char,
    /// `short`.
    Short,
    /// `int` (and bare `signed`/`unsigned`).
    Int,
    /// `long`.
    Long,
    /// `long long`.
    LongLong,
    /// `float`.
    Float,
    /// `double`.
    Double,
    /// `struct <name>` or `union <name>`.
    Struct(String),
    /// A typedef name, e.g. `size_t`.
    Named(String),
}

/// A C type as it appears in a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CType {
    /// Base type.
    pub base: CBase,
    /// Number of `*` levels.
    pub pointer_depth: usize,
    /// `const` qualifier present.
    pub is_const: bool,
}

impl CType {
    /// Referenced struct name, for `struct X` bases.
    pub fn struct_name(&self) -> Option<&str> {
        match &self.base {
            CBase::Struct(name) => Some(name),
            _ => None,
        }
    }

    /// `char *` (any const-ness) reads as a string.
    pub fn is_string(&self) -> bool {
        self.base == CBase::Char && self.pointer_depth >= 1
    }

    /// OpenAPI (type, format) for scalar bases; `None` for structs, `void`,
    /// and unknown typedef names.
    pub fn scalar(&self) -> Option<(FieldScalar, Option<&'static str>)> {
        if self.is_string() {
            return Some((FieldScalar::String, None));
        }
        Some(match &self.base {
            CBase::Bool => (FieldScalar::Boolean, None),
            CBase::Int | CBase::Short => (FieldScalar::Integer, Some("int32")),
            CBase::Long | CBase::LongLong => (FieldScalar::Integer, Some("int64")),
            CBase::Float => (FieldScalar::Number, Some("float")),
            CBase::Double => (FieldScalar::Number, Some("double")),
            CBase::Named(name) => match name.as_str() {
                "size_t" | "int64_t" | "uint64_t" => (FieldScalar::Integer, Some("int64")),
                "int8_t" | "int16_t" | "int32_t" | "uint8_t" | "uint16_t" | "uint32_t" => {
                    (FieldScalar::Integer, Some("int32"))
                }
                _ => return None,
            },
            _ => return None,
        })
    }
}

/// One argument of a C signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CArg {
    /// Argument name; empty for unnamed prototype arguments.
    pub name: String,
    /// Argument type.
    pub ty: CType,
}

/// A parsed C function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSignature {
    /// Function name.
    pub name: String,
    /// Return type.
    pub return_type: CType,
    /// Arguments in declaration order.
    pub args: Vec<CArg>,
}

fn parse_type_and_name(tokens: &[&Token<'_>]) -> Option<(CType, String)> {
    let mut base: Option<CBase> = None;
    let mut pointer_depth = 0usize;
    let mut is_const = false;
    let mut long_count = 0usize;
    let mut name = String::new();
    let mut pending_ident: Option<String> = None;
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        match token.kind {
            TokenKind::Keyword(Keyword::Const) => is_const = true,
            TokenKind::Keyword(Keyword::Volatile | Keyword::Restrict) => {}
            TokenKind::Keyword(Keyword::Struct | Keyword::Union) => {
                if let Some(next) = iter.peek() {
                    if next.kind == TokenKind::Ident {
                        base = Some(CBase::Struct(next.text.to_owned()));
                        iter.next();
                    }
                }
            }
            TokenKind::Keyword(Keyword::Enum) => {
                if let Some(next) = iter.peek() {
                    if next.kind == TokenKind::Ident {
                        base = Some(CBase::Int);
                        iter.next();
                    }
                }
            }
            TokenKind::Keyword(Keyword::Void) => base = Some(CBase::Void),
            TokenKind::Keyword(Keyword::Bool) => base = Some(CBase::Bool),
            TokenKind::Keyword(Keyword::Char) => base = Some(CBase::Char),
            TokenKind::Keyword(Keyword::Short) => base = Some(CBase::Short),
            TokenKind::Keyword(Keyword::Float) => base = Some(CBase::Float),
            TokenKind::Keyword(Keyword::Double) => base = Some(CBase::Double),
            TokenKind::Keyword(Keyword::Long) => {
                long_count += 1;
                base = Some(if long_count >= 2 {
                    CBase::LongLong
                } else {
                    CBase::Long
                });
            }
            TokenKind::Keyword(Keyword::Int) => {
                if long_count == 0 && !matches!(base, Some(CBase::Short)) {
                    base = Some(CBase::Int);
                }
            }
            TokenKind::Keyword(Keyword::Signed | Keyword::Unsigned) => {
                if base.is_none() {
                    base = Some(CBase::Int);
                }
            }
            TokenKind::Punct(Punct::Star) => pointer_depth += 1,
            TokenKind::Ident => {
                // The last identifier is the declarator name; any earlier
                // one was actually the (typedef) base type.
                if let Some(prev) = pending_ident.take() {
                    base = Some(CBase::Named(prev));
                }
                pending_ident = Some(token.text.to_owned());
            }
            // Trailing `[]` promotes to a pointer.
            TokenKind::Punct(Punct::LBracket) => pointer_depth += 1,
            _ => {}
        }
    }

    if let Some(ident) = pending_ident {
        match base {
            // `struct Pet p` keeps `p`; `size_t len` keeps `len` with the
            // typedef base only when a base was already seen.
            Some(_) => name = ident,
            None => base = Some(CBase::Named(ident)),
        }
    }

    Some((
        CType {
            base: base?,
            pointer_depth,
            is_const,
        },
        name,
    ))
}

/// Extracts `{name, return_type, args}` from a function or prototype node.
///
/// The node's tokens through the argument list's closing `)` are examined;
/// K&R bodies and attributes after the list are ignored.
pub fn parse_signature(tokens: &[Token<'_>], node: &CstNode) -> Option<CSignature> {
    let end = node.body_brace.unwrap_or(node.end);
    let significant: Vec<&Token<'_>> = tokens[node.start..end]
        .iter()
        .filter(|tok| !tok.is_trivia())
        .collect();

    let open = significant
        .iter()
        .position(|tok| tok.kind == TokenKind::Punct(Punct::LParen))?;
    let name_pos = significant[..open]
        .iter()
        .rposition(|tok| tok.kind == TokenKind::Ident)?;
    let name = significant[name_pos].text.to_owned();

    // Return type: everything before the name, storage classes dropped.
    let ret_tokens: Vec<&Token<'_>> = significant[..name_pos]
        .iter()
        .filter(|tok| {
            !matches!(
                tok.kind,
                TokenKind::Keyword(Keyword::Static | Keyword::Extern | Keyword::Inline)
            )
        })
        .copied()
        .collect();
    let (return_type, _) = parse_type_and_name(&ret_tokens)?;

    // Argument list: split at top-level commas up to the matching `)`.
    let mut depth = 0usize;
    let mut close = open;
    for (idx, tok) in significant.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => depth += 1,
            TokenKind::Punct(Punct::RParen) => {
                depth -= 1;
                if depth == 0 {
                    close = idx;
                    break;
                }
            }
            _ => {}
        }
    }

    let mut args = Vec::new();
    let mut current: Vec<&Token<'_>> = Vec::new();
    let mut depth = 0usize;

    for tok in significant[open + 1..close].iter().copied() {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => {
                depth += 1;
                current.push(tok);
            }
            TokenKind::Punct(Punct::RParen) => {
                depth -= 1;
                current.push(tok);
            }
            TokenKind::Punct(Punct::Comma) if depth == 0 => {
                push_arg(&mut args, &current);
                current.clear();
            }
            _ => current.push(tok),
        }
    }
    push_arg(&mut args, &current);

    Some(CSignature {
        name,
        return_type,
        args,
    })
}

fn push_arg(args: &mut Vec<CArg>, tokens: &[&Token<'_>]) {
    if tokens.is_empty() {
        return;
    }
    // `void` and `...` argument lists contribute nothing.
    if tokens.len() == 1
        && matches!(
            tokens[0].kind,
            TokenKind::Keyword(Keyword::Void) | TokenKind::Punct(Punct::Ellipsis)
        )
    {
        return;
    }

    if let Some((ty, name)) = parse_type_and_name(tokens) {
        args.push(CArg { name, ty });
    }
}

/// One operation built from a signature and its documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltOperation {
    /// Path template.
    pub route: String,
    /// Uppercase verb.
    pub verb: String,
    /// Verb is not one of the standard OAS operation fields.
    pub is_additional: bool,
    /// Destined for the `webhooks` map rather than `paths`.
    pub is_webhook: bool,
    /// The assembled operation.
    pub operation: Operation,
}

fn verb_for_segment(segment: &str) -> Option<&'static str> {
    Some(match segment {
        "get" | "list" | "fetch" => "GET",
        "create" | "post" | "add" => "POST",
        "update" | "put" => "PUT",
        "delete" | "remove" => "DELETE",
        "patch" => "PATCH",
        _ => return None,
    })
}

fn infer_verb(name: &str) -> &'static str {
    name.split('_')
        .rev()
        .find_map(verb_for_segment)
        .unwrap_or("GET")
}

fn synthesize_route(name: &str) -> String {
    let segments: Vec<&str> = name
        .split('_')
        .enumerate()
        .filter(|(idx, segment)| {
            !(*idx == 0 && *segment == "api") && verb_for_segment(segment).is_none()
        })
        .map(|(_, segment)| segment)
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", segments.join("/"))
    }
}

const STANDARD_VERBS: &[&str] = &[
    "GET", "PUT", "POST", "DELETE", "OPTIONS", "HEAD", "PATCH", "TRACE", "QUERY",
];

fn scalar_schema(scalar: FieldScalar, format: Option<&str>) -> ObjectSchema {
    let schema_type = match scalar {
        FieldScalar::Integer => SchemaType::Integer,
        FieldScalar::Number => SchemaType::Number,
        FieldScalar::String => SchemaType::String,
        FieldScalar::Boolean => SchemaType::Boolean,
    };
    ObjectSchema {
        schema_type: Some(SchemaTypeSet::Single(schema_type)),
        format: format.map(str::to_owned),
        ..ObjectSchema::default()
    }
}

fn ref_schema(name: &str) -> ObjectSchema {
    ObjectSchema {
        ref_path: Some(format!("#/components/schemas/{name}")),
        ..ObjectSchema::default()
    }
}

fn array_schema(item: ObjectSchema) -> ObjectSchema {
    ObjectSchema {
        schema_type: Some(SchemaTypeSet::Single(SchemaType::Array)),
        items: Some(Box::new(ObjectOrReference::Object(Schema::Object(
            Box::new(item),
        )))),
        ..ObjectSchema::default()
    }
}

fn inline(schema: ObjectSchema) -> ObjectOrReference<Schema> {
    ObjectOrReference::Object(Schema::Object(Box::new(schema)))
}

fn example_value(example: &str) -> serde_json::Value {
    serde_json::from_str(example)
        .unwrap_or_else(|_| serde_json::Value::String(example.to_owned()))
}

/// Output wired into the success response instead of a parameter.
#[derive(Debug, Clone)]
struct OutputParam {
    schema: ObjectSchema,
}

/// Builds a fully-formed operation from `sig` and its documentation.
pub fn build_operation(
    sig: &CSignature,
    doc: Option<&DocMetadata>,
    opts: &BuildOptions,
) -> BuiltOperation {
    let empty = DocMetadata::default();
    let doc = doc.unwrap_or(&empty);

    // 1. Verb.
    let verb = doc
        .verb
        .clone()
        .unwrap_or_else(|| infer_verb(&sig.name).to_owned());
    let is_additional = !STANDARD_VERBS.contains(&verb.as_str());

    // 2. Route.
    let route = doc
        .route
        .clone()
        .unwrap_or_else(|| synthesize_route(&sig.name));

    // 3. Operation id.
    let operation_id = doc.operation_id.clone().unwrap_or_else(|| sig.name.clone());

    let mut op = Operation {
        operation_id: Some(operation_id),
        summary: doc.summary.clone(),
        description: doc.description.clone(),
        tags: doc.tags.clone(),
        deprecated: doc.deprecated.filter(|flag| *flag),
        ..Operation::default()
    };

    if let Some(url) = &doc.external_docs_url {
        match Url::parse(url) {
            Ok(url) => {
                op.external_docs = Some(ExternalDoc {
                    url,
                    description: doc.external_docs_description.clone(),
                    extensions: IndexMap::new(),
                });
            }
            Err(err) => warn!("invalid @externalDocs URL {url}: {err}"),
        }
    }

    // 4. Parameter classification.
    let mut req_body_ref: Option<String> = None;
    let mut outputs: Vec<OutputParam> = Vec::new();
    let mut output_is_array = false;

    let mut idx = 0;
    while idx < sig.args.len() {
        let arg = &sig.args[idx];
        idx += 1;

        // Framework-owned arguments from generated code shapes.
        if arg.name == "ctx" || arg.ty.struct_name() == Some("HttpClient") {
            continue;
        }
        if arg.ty.struct_name() == Some("ApiError") {
            continue;
        }
        if arg.name == "out_len" && arg.ty.pointer_depth == 1 {
            output_is_array = true;
            continue;
        }

        // `T *xs, size_t xs_len` pairs are one array argument.
        let len_follows = sig
            .args
            .get(idx)
            .is_some_and(|next| {
                next.name == format!("{}_len", arg.name)
                    && next.ty.pointer_depth == 0
                    && next.ty.scalar().map(|(scalar, _)| scalar) == Some(FieldScalar::Integer)
            });

        let doc_param = doc.param(&arg.name);

        // Output parameters: double pointers not readable as string arrays.
        let is_array_input = len_follows && (arg.ty.is_string() || arg.ty.pointer_depth <= 1);
        if arg.ty.pointer_depth >= 2 && !is_array_input && doc_param.is_none() {
            let item = match arg.ty.struct_name() {
                Some(name) => ref_schema(name),
                None => match arg.ty.scalar() {
                    Some((scalar, format)) => scalar_schema(scalar, format),
                    None => ObjectSchema::default(),
                },
            };
            if sig
                .args
                .get(idx)
                .is_some_and(|next| next.ty.pointer_depth == 1 && next.name.ends_with("_len"))
            {
                output_is_array = true;
                idx += 1;
            }
            outputs.push(OutputParam { schema: item });
            continue;
        }

        // Request body: a lone `const struct T *` argument.
        if arg.ty.pointer_depth == 1
            && arg.ty.is_const
            && arg.ty.struct_name().is_some()
            && doc_param.is_none()
            && !len_follows
        {
            req_body_ref = arg.ty.struct_name().map(str::to_owned);
            continue;
        }

        // Location: doc wins, then path-template match, then query.
        let location = doc_param
            .and_then(|param| param.location)
            .or_else(|| {
                route
                    .contains(&format!("{{{}}}", arg.name))
                    .then_some(ParameterIn::Path)
            })
            .unwrap_or(ParameterIn::Query);

        if location == ParameterIn::Header && opts.is_reserved_header(&arg.name) {
            debug!("dropping reserved header parameter {}", arg.name);
            if len_follows {
                idx += 1;
            }
            continue;
        }

        // 5. Type mapping.
        let schema = if len_follows {
            idx += 1;
            let item = match arg.ty.struct_name() {
                Some(name) => ref_schema(name),
                None => {
                    let (scalar, format) = arg
                        .ty
                        .scalar()
                        .unwrap_or((FieldScalar::String, None));
                    scalar_schema(scalar, format)
                }
            };
            array_schema(item)
        } else if let Some(name) = arg.ty.struct_name() {
            ref_schema(name)
        } else {
            let (scalar, format) = arg.ty.scalar().unwrap_or((FieldScalar::String, None));
            scalar_schema(scalar, format)
        };

        let mut schema = schema;
        if let Some(param) = doc_param {
            if let Some(format) = &param.format {
                schema.format = Some(format.clone());
            }
        }

        let required = match doc_param.and_then(|param| param.required) {
            Some(explicit) => explicit,
            None => location == ParameterIn::Path,
        };

        let parameter = Parameter {
            name: arg.name.clone(),
            location,
            description: doc_param.and_then(|param| param.description.clone()),
            required: required.then_some(true),
            deprecated: doc_param.and_then(|param| param.deprecated).filter(|d| *d),
            allow_empty_value: doc_param.and_then(|param| param.allow_empty_value),
            style: doc_param.and_then(|param| param.style),
            explode: doc_param.and_then(|param| param.explode),
            allow_reserved: doc_param.and_then(|param| param.allow_reserved),
            schema: match doc_param.and_then(|param| param.content_type.clone()) {
                Some(_) => None,
                None => Some(inline(schema.clone())),
            },
            example: doc_param
                .and_then(|param| param.example.as_deref())
                .map(example_value),
            examples: IndexMap::new(),
            content: doc_param.and_then(|param| param.content_type.clone()).map(
                |content_type| {
                    let mut map = IndexMap::new();
                    map.insert(
                        content_type,
                        MediaType {
                            schema: Some(inline(schema)),
                            ..MediaType::default()
                        },
                    );
                    map
                },
            ),
            extensions: IndexMap::new(),
        };

        op.parameters.push(ObjectOrReference::Object(parameter));
    }

    // 6. Response synthesis.
    let mut responses: IndexMap<String, Response> = IndexMap::new();

    for ret in &doc.returns {
        let response = responses.entry(ret.code.clone()).or_default();
        if response.description.is_none() {
            response.description = ret.description.clone();
        }
        if response.summary.is_none() {
            response.summary = ret.summary.clone();
        }

        let content_type = ret
            .content_type
            .clone()
            .unwrap_or_else(|| "application/json".to_owned());
        let media = MediaType {
            examples: ret.example.as_deref().map(|example| {
                MediaTypeExamples::Example {
                    example: example_value(example),
                }
            }),
            ..MediaType::default()
        };
        response.content.insert(content_type, media);
    }

    if responses.is_empty() {
        let mut ok = Response {
            description: Some("Successful operation".to_owned()),
            ..Response::default()
        };

        let success_schema = outputs
            .last()
            .map(|out| out.schema.clone())
            .or_else(|| semantic_return_schema(&sig.return_type));

        if let Some(schema) = success_schema {
            let schema = if output_is_array {
                array_schema(schema)
            } else {
                schema
            };
            ok.content.insert(
                "application/json".to_owned(),
                MediaType {
                    schema: Some(inline(schema)),
                    ..MediaType::default()
                },
            );
        }

        responses.insert("200".to_owned(), ok);
    } else if let Some(out) = outputs.last() {
        // Declared 2xx responses without a schema pick up the output param.
        for (code, response) in responses.iter_mut() {
            if !code.starts_with('2') {
                continue;
            }
            for media in response.content.values_mut() {
                if media.schema.is_none() {
                    let schema = if output_is_array {
                        array_schema(out.schema.clone())
                    } else {
                        out.schema.clone()
                    };
                    media.schema = Some(inline(schema));
                }
            }
        }
    }

    // Response headers and links attach by status code.
    for header in &doc.response_headers {
        let Some(response) = responses.get_mut(&header.code) else {
            warn!("@responseHeader {} targets undeclared status {}", header.name, header.code);
            continue;
        };

        let schema_type = match header.schema_type.as_deref() {
            Some("integer") => SchemaType::Integer,
            Some("number") => SchemaType::Number,
            Some("boolean") => SchemaType::Boolean,
            _ => SchemaType::String,
        };

        response.headers.insert(
            header.name.clone(),
            ObjectOrReference::Object(SpecHeader {
                description: header.description.clone(),
                required: header.required.filter(|flag| *flag),
                example: header.example.as_deref().map(example_value),
                schema: match &header.content_type {
                    Some(_) => None,
                    None => Some(inline(ObjectSchema {
                        schema_type: Some(SchemaTypeSet::Single(schema_type)),
                        format: header.format.clone(),
                        ..ObjectSchema::default()
                    })),
                },
                content: header.content_type.clone().map(|content_type| {
                    let mut map = IndexMap::new();
                    map.insert(content_type, MediaType::default());
                    map
                }),
                ..SpecHeader::default()
            }),
        );
    }

    for link in &doc.links {
        let Some(response) = responses.get_mut(&link.code) else {
            warn!("@link {} targets undeclared status {}", link.name, link.code);
            continue;
        };

        let server = link.server_url.as_deref().map(|url| Server {
            url: url.to_owned(),
            name: link.server_name.clone(),
            description: link.server_description.clone(),
            ..Server::default()
        });

        response.links.insert(
            link.name.clone(),
            ObjectOrReference::Object(Link {
                operation_id: link.operation_id.clone(),
                operation_ref: link.operation_ref.clone(),
                summary: link.summary.clone(),
                description: link.description.clone(),
                parameters: link
                    .parameters_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str(json).ok())
                    .unwrap_or_default(),
                request_body: link
                    .request_body_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str(json).ok()),
                server,
                extensions: IndexMap::new(),
            }),
        );
    }

    op.responses = Some(
        responses
            .into_iter()
            .map(|(code, response)| (code, ObjectOrReference::Object(response)))
            .collect(),
    );

    // 7. Body, security, servers.
    if !doc.request_bodies.is_empty() || req_body_ref.is_some() {
        let mut content: IndexMap<String, MediaType> = IndexMap::new();
        let mut required = req_body_ref.is_some();

        let body_schema = req_body_ref.as_deref().map(ref_schema);

        if doc.request_bodies.is_empty() {
            content.insert(
                "application/json".to_owned(),
                MediaType {
                    schema: body_schema.clone().map(inline),
                    ..MediaType::default()
                },
            );
        }

        let mut description = None;
        for body in &doc.request_bodies {
            if let Some(explicit) = body.required {
                required = explicit;
            }
            if description.is_none() {
                description = body.description.clone();
            }
            let content_type = body
                .content_type
                .clone()
                .unwrap_or_else(|| "application/json".to_owned());
            content.insert(
                content_type,
                MediaType {
                    schema: body_schema.clone().map(inline),
                    examples: body.example.as_deref().map(|example| {
                        MediaTypeExamples::Example {
                            example: example_value(example),
                        }
                    }),
                    ..MediaType::default()
                },
            );
        }

        op.request_body = Some(ObjectOrReference::Object(RequestBody {
            description,
            content,
            required: required.then_some(true),
            extensions: IndexMap::new(),
        }));
    }

    if !doc.security.is_empty() {
        op.security = Some(
            doc.security
                .iter()
                .map(|requirement| {
                    let mut schemes = IndexMap::new();
                    schemes.insert(requirement.scheme.clone(), requirement.scopes.clone());
                    SecurityRequirement { schemes }
                })
                .collect(),
        );
    }

    op.servers = doc
        .servers
        .iter()
        .map(|server| Server {
            url: server.url.clone(),
            name: server.name.clone(),
            description: server.description.clone(),
            variables: server
                .variables
                .iter()
                .map(|var| {
                    (
                        var.name.clone(),
                        ServerVariable {
                            default: var.default.clone().unwrap_or_default(),
                            substitutions_enum: var.enum_values.clone(),
                            description: var.description.clone(),
                        },
                    )
                })
                .collect(),
            extensions: IndexMap::new(),
        })
        .collect();

    BuiltOperation {
        route,
        verb,
        is_additional,
        is_webhook: doc.is_webhook,
        operation: op,
    }
}

fn semantic_return_schema(return_type: &CType) -> Option<ObjectSchema> {
    if let Some(name) = return_type.struct_name() {
        return Some(ref_schema(name));
    }
    // `int` is the error-code convention, not a payload.
    if matches!(return_type.base, CBase::Void | CBase::Int) {
        return None;
    }
    let (scalar, format) = return_type.scalar()?;
    Some(scalar_schema(scalar, format))
}

/// Everything extracted from one C source file.
#[derive(Debug, Clone, Default)]
pub struct FileScan {
    /// Operations in source order.
    pub operations: Vec<BuiltOperation>,
    /// Type definitions in declaration order.
    pub types: Vec<TypeDef>,
    /// Merged document-level metadata (info, schemes, servers, tag meta).
    pub globals: DocMetadata,
}

/// Scan errors.
pub use crate::lex::Error as ScanError;

/// Scans one file's source text into operations, types, and globals.
///
/// Processing is leaf-first: tokenize, build the CST, then pair each
/// function with its preceding comment block.
pub fn scan_file(src: &str) -> Result<FileScan, ScanError> {
    let tokens = lex::tokenize(src)?;
    let cst = crate::cst::parse(&tokens);

    let mut scan = FileScan {
        types: inspect::scan_types(&tokens, &cst),
        ..FileScan::default()
    };

    let opts = BuildOptions::default();
    let mut consumed_comments: HashSet<usize> = HashSet::new();

    for (node_index, node) in cst.nodes.iter().enumerate() {
        if node.kind != CstKind::Function && node.kind != CstKind::Declaration {
            continue;
        }

        let comment_index = cst.nodes[..node_index]
            .iter()
            .rposition(|prev| prev.kind != CstKind::Whitespace)
            .filter(|prev_index| cst.nodes[*prev_index].kind == CstKind::Comment);

        let doc = comment_index.map(|comment_index| {
            let comment = tokens[cst.nodes[comment_index].start].text;
            (comment_index, doc::parse_comment(comment))
        });

        let Some(sig) = parse_signature(&tokens, node) else {
            continue;
        };

        let built = build_operation(&sig, doc.as_ref().map(|(_, doc)| doc), &opts);

        if let Some((comment_index, doc)) = doc {
            consumed_comments.insert(comment_index);
            merge_globals(&mut scan.globals, &doc);
        }

        scan.operations.push(built);
    }

    // File-level comments (not consumed by a function) contribute globals.
    for (node_index, node) in cst.nodes.iter().enumerate() {
        if node.kind != CstKind::Comment || consumed_comments.contains(&node_index) {
            continue;
        }
        let doc = doc::parse_comment(tokens[node.start].text);
        merge_globals(&mut scan.globals, &doc);
    }

    Ok(scan)
}

fn merge_globals(globals: &mut DocMetadata, doc: &DocMetadata) {
    macro_rules! take_first {
        ($field:ident) => {
            if globals.$field.is_none() {
                globals.$field = doc.$field.clone();
            }
        };
    }

    take_first!(info_title);
    take_first!(info_version);
    take_first!(info_summary);
    take_first!(info_description);
    take_first!(terms_of_service);
    take_first!(contact_name);
    take_first!(contact_url);
    take_first!(contact_email);
    take_first!(license_name);
    take_first!(license_identifier);
    take_first!(license_url);

    globals.security_schemes.extend(doc.security_schemes.iter().cloned());
    globals.tag_meta.extend(doc.tag_meta.iter().cloned());
}

/// Order-preserving aggregation of per-file scans into one spec.
#[derive(Debug)]
pub struct Aggregator {
    spec: Spec,
    seen_operation_ids: HashSet<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Creates an aggregator with an empty OAS 3.2 skeleton.
    pub fn new() -> Self {
        Self {
            spec: Spec {
                openapi: "3.2.0".to_owned(),
                info: Info {
                    title: "API".to_owned(),
                    version: "0.1.0".to_owned(),
                    ..Info::default()
                },
                self_uri: None,
                json_schema_dialect: None,
                servers: Vec::new(),
                paths: Some(IndexMap::new()),
                webhooks: IndexMap::new(),
                components: None,
                security: None,
                tags: Vec::new(),
                external_docs: None,
                extensions: IndexMap::new(),
            },
            seen_operation_ids: HashSet::new(),
        }
    }

    fn components(&mut self) -> &mut Components {
        self.spec.components.get_or_insert_with(Components::default)
    }

    /// Folds one file scan into the spec, preserving discovery order.
    pub fn add_file(&mut self, scan: FileScan) {
        self.apply_globals(&scan.globals);
        self.register_types(&scan.types);

        for built in scan.operations {
            self.add_operation(built);
        }
    }

    fn apply_globals(&mut self, globals: &DocMetadata) {
        let info = &mut self.spec.info;
        if let Some(title) = &globals.info_title {
            info.title = title.clone();
        }
        if let Some(version) = &globals.info_version {
            info.version = version.clone();
        }
        if info.summary.is_none() {
            info.summary = globals.info_summary.clone();
        }
        if info.description.is_none() {
            info.description = globals.info_description.clone();
        }
        if let Some(tos) = &globals.terms_of_service {
            match Url::parse(tos) {
                Ok(url) => info.terms_of_service = Some(url),
                Err(err) => warn!("invalid @termsOfService URL {tos}: {err}"),
            }
        }

        if globals.contact_name.is_some()
            || globals.contact_url.is_some()
            || globals.contact_email.is_some()
        {
            let contact = info.contact.get_or_insert_with(Default::default);
            contact.name = globals.contact_name.clone().or(contact.name.take());
            contact.email = globals.contact_email.clone().or(contact.email.take());
            contact.url = globals
                .contact_url
                .as_deref()
                .and_then(|url| Url::parse(url).ok())
                .or(contact.url.take());
        }

        if let Some(name) = &globals.license_name {
            let license = info.license.get_or_insert_with(Default::default);
            license.name = name.clone();
            license.identifier = globals.license_identifier.clone();
            license.url = globals
                .license_url
                .as_deref()
                .and_then(|url| Url::parse(url).ok());
        }

        for meta in &globals.tag_meta {
            if self.spec.tags.iter().any(|tag| tag.name == meta.name) {
                continue;
            }
            self.spec.tags.push(Tag {
                name: meta.name.clone(),
                summary: meta.summary.clone(),
                description: meta.description.clone(),
                parent: meta.parent.clone(),
                kind: meta.kind.clone(),
                external_docs: meta.external_docs.as_deref().and_then(|url| {
                    Url::parse(url).ok().map(|url| ExternalDoc {
                        url,
                        description: meta.external_docs_description.clone(),
                        extensions: IndexMap::new(),
                    })
                }),
                extensions: IndexMap::new(),
            });
        }

        for scheme in &globals.security_schemes {
            let Some(built) = build_security_scheme(scheme) else {
                continue;
            };
            self.components()
                .security_schemes
                .entry(scheme.name.clone())
                .or_insert(ObjectOrReference::Object(built));
        }
    }

    fn register_types(&mut self, types: &[TypeDef]) {
        for def in types {
            match def {
                TypeDef::Struct(fields) => {
                    if fields.fields.is_empty() {
                        continue;
                    }
                    let schema = Schema::Object(Box::new(fields.to_schema()));
                    self.components()
                        .schemas
                        .entry(fields.name.clone())
                        .or_insert(ObjectOrReference::Object(schema));
                }
                TypeDef::Enum(def) => {
                    let schema = ObjectSchema {
                        schema_type: Some(SchemaTypeSet::Single(SchemaType::String)),
                        description: def.description.clone(),
                        enum_values: def
                            .members
                            .iter()
                            .map(|member| serde_json::Value::String(member.name.clone()))
                            .collect(),
                        ..ObjectSchema::default()
                    };
                    self.components()
                        .schemas
                        .entry(def.name.clone())
                        .or_insert(ObjectOrReference::Object(Schema::Object(Box::new(schema))));
                }
                TypeDef::Alias(_) => {}
            }
        }
    }

    fn add_operation(&mut self, built: BuiltOperation) {
        if let Some(id) = built.operation.operation_id.as_deref() {
            if !self.seen_operation_ids.insert(id.to_owned()) {
                warn!("dropping operation with duplicate operationId {id}");
                return;
            }
        }

        if built.is_webhook {
            let name = built
                .operation
                .operation_id
                .clone()
                .unwrap_or_else(|| built.route.trim_start_matches('/').replace('/', "_"));
            let item = self.spec.webhooks.entry(name).or_default();
            Self::place(item, built);
            return;
        }

        let paths = self.spec.paths.get_or_insert_with(IndexMap::new);
        let item = paths.entry(built.route.clone()).or_default();
        Self::place(item, built);
    }

    fn place(item: &mut PathItem, built: BuiltOperation) {
        if built.is_additional {
            if item.additional_operations.contains_key(&built.verb) {
                warn!("duplicate {} operation on {}", built.verb, built.route);
                return;
            }
            item.additional_operations
                .insert(built.verb, built.operation);
            return;
        }

        let slot = item.operation_slot(&built.verb);
        if slot.is_some() {
            warn!("duplicate {} operation on {}", built.verb, built.route);
            return;
        }
        *slot = Some(built.operation);
    }

    /// Returns the aggregated spec.
    pub fn finish(mut self) -> Spec {
        let paths_empty = self
            .spec
            .paths
            .as_ref()
            .is_some_and(|paths| paths.is_empty());
        if paths_empty && !self.spec.webhooks.is_empty() {
            self.spec.paths = None;
        }
        self.spec
    }
}

fn build_security_scheme(scheme: &DocSecurityScheme) -> Option<SecurityScheme> {
    let built = match scheme.scheme_type.as_deref() {
        Some("apiKey") => SecurityScheme::ApiKey {
            name: scheme
                .param_name
                .clone()
                .unwrap_or_else(|| scheme.name.clone()),
            location: scheme.location.clone().unwrap_or_else(|| "header".to_owned()),
            description: scheme.description.clone(),
        },
        Some("http") => SecurityScheme::Http {
            scheme: scheme
                .http_scheme
                .clone()
                .unwrap_or_else(|| "bearer".to_owned()),
            bearer_format: scheme.bearer_format.clone(),
            description: scheme.description.clone(),
        },
        Some("mutualTLS") => SecurityScheme::MutualTls {
            description: scheme.description.clone(),
        },
        Some("oauth2") => SecurityScheme::OAuth2 {
            flows: Box::new(build_flows(&scheme.flows)?),
            oauth2_metadata_url: scheme
                .oauth2_metadata_url
                .as_deref()
                .and_then(|url| Url::parse(url).ok()),
            description: scheme.description.clone(),
        },
        Some("openIdConnect") => SecurityScheme::OpenIdConnect {
            open_id_connect_url: scheme
                .open_id_connect_url
                .as_deref()
                .and_then(|url| Url::parse(url).ok())?,
            description: scheme.description.clone(),
        },
        other => {
            warn!(
                "skipping @securityScheme {} with unsupported type {:?}",
                scheme.name, other
            );
            return None;
        }
    };

    Some(built)
}

fn scope_map(scopes: &[String]) -> IndexMap<String, String> {
    scopes
        .iter()
        .map(|scope| (scope.clone(), String::new()))
        .collect()
}

fn build_flows(flows: &[DocOAuthFlow]) -> Option<Flows> {
    let mut built = Flows::default();

    for flow in flows {
        let parse = |url: &Option<String>| url.as_deref().and_then(|url| Url::parse(url).ok());
        let refresh = parse(&flow.refresh_url);

        match flow.flow.as_str() {
            "implicit" => {
                built.implicit = Some(ImplicitFlow {
                    authorization_url: parse(&flow.authorization_url)?,
                    refresh_url: refresh,
                    scopes: scope_map(&flow.scopes),
                });
            }
            "password" => {
                built.password = Some(PasswordFlow {
                    token_url: parse(&flow.token_url)?,
                    refresh_url: refresh,
                    scopes: scope_map(&flow.scopes),
                });
            }
            "clientCredentials" => {
                built.client_credentials = Some(ClientCredentialsFlow {
                    token_url: parse(&flow.token_url)?,
                    refresh_url: refresh,
                    scopes: scope_map(&flow.scopes),
                });
            }
            "authorizationCode" => {
                built.authorization_code = Some(AuthorizationCodeFlow {
                    authorization_url: parse(&flow.authorization_url)?,
                    token_url: parse(&flow.token_url)?,
                    refresh_url: refresh,
                    scopes: scope_map(&flow.scopes),
                });
            }
            "deviceAuthorization" => {
                built.device_authorization = Some(DeviceAuthorizationFlow {
                    device_authorization_url: parse(&flow.device_authorization_url)?,
                    token_url: parse(&flow.token_url)?,
                    refresh_url: refresh,
                    scopes: scope_map(&flow.scopes),
                });
            }
            other => warn!("skipping unknown OAuth2 flow kind {other}"),
        }
    }

    Some(built)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn signature(src: &str) -> CSignature {
        let tokens = lex::tokenize(src).unwrap();
        let cst = crate::cst::parse(&tokens);
        parse_signature(&tokens, &cst.nodes[0]).unwrap()
    }

    #[test]
    fn parses_signature_shapes() {
        let sig = signature("int api_pet_update(struct HttpClient *ctx, long id, const struct Pet *pet);");
        assert_eq!(sig.name, "api_pet_update");
        assert_eq!(sig.return_type.base, CBase::Int);
        assert_eq!(sig.args.len(), 3);
        assert_eq!(sig.args[0].ty.struct_name(), Some("HttpClient"));
        assert_eq!(sig.args[1].ty.base, CBase::Long);
        assert_eq!(sig.args[2].name, "pet");
        assert!(sig.args[2].ty.is_const);
        assert_eq!(sig.args[2].ty.pointer_depth, 1);
    }

    #[test]
    fn void_argument_list_is_empty() {
        let sig = signature("int ping(void);");
        assert!(sig.args.is_empty());
    }

    #[test]
    fn get_with_path_parameter() {
        let sig = signature("int api_user_get(int id);");
        let doc = doc::parse_comment("/** @route GET /user/{id} */");
        let built = build_operation(&sig, Some(&doc), &BuildOptions::default());

        assert_eq!(built.verb, "GET");
        assert_eq!(built.route, "/user/{id}");
        assert!(!built.is_additional);

        let op = &built.operation;
        assert_eq!(op.operation_id.as_deref(), Some("api_user_get"));
        assert_eq!(op.parameters.len(), 1);
        assert_matches!(&op.parameters[0], ObjectOrReference::Object(param) => {
            assert_eq!(param.name, "id");
            assert_eq!(param.location, ParameterIn::Path);
            assert_eq!(param.required, Some(true));
            assert_matches!(&param.schema, Some(ObjectOrReference::Object(Schema::Object(obj))) => {
                assert_eq!(
                    obj.schema_type,
                    Some(SchemaTypeSet::Single(SchemaType::Integer))
                );
            });
        });
    }

    #[test]
    fn post_body_inference_without_doc() {
        let sig = signature("int api_pet_create(const struct Pet *p);");
        let built = build_operation(&sig, None, &BuildOptions::default());

        assert_eq!(built.verb, "POST");
        assert_eq!(built.route, "/pet");
        assert!(built.operation.parameters.is_empty());

        assert_matches!(
            &built.operation.request_body,
            Some(ObjectOrReference::Object(body)) => {
                assert_eq!(body.required, Some(true));
                let media = body.content.get("application/json").unwrap();
                assert_matches!(
                    &media.schema,
                    Some(ObjectOrReference::Object(Schema::Object(obj))) => {
                        assert_eq!(obj.ref_name().as_deref(), Some("Pet"));
                    }
                );
            }
        );
    }

    #[test]
    fn array_argument_with_len_pair() {
        let sig = signature(
            "int list(const char **tags, size_t tags_len);",
        );
        let doc = doc::parse_comment(
            "/** @route GET /list\n@param tags [in:query] [style:form] [explode:true] */",
        );
        let built = build_operation(&sig, Some(&doc), &BuildOptions::default());

        assert_eq!(built.operation.parameters.len(), 1);
        assert_matches!(&built.operation.parameters[0], ObjectOrReference::Object(param) => {
            assert_eq!(param.name, "tags");
            assert_eq!(param.explode, Some(true));
            assert_matches!(&param.schema, Some(ObjectOrReference::Object(Schema::Object(obj))) => {
                assert!(obj.is_array());
            });
        });
    }

    #[test]
    fn double_pointer_output_feeds_default_response() {
        let sig = signature(
            "int api_pet_get(struct HttpClient *ctx, long id, struct Pet **out, struct ApiError **api_error);",
        );
        let doc = doc::parse_comment("/** @route GET /pet/{id} */");
        let built = build_operation(&sig, Some(&doc), &BuildOptions::default());

        // Only `id` remains a parameter.
        assert_eq!(built.operation.parameters.len(), 1);

        let responses = built.operation.responses.unwrap();
        let ok = responses.get("200").unwrap();
        assert_matches!(ok, ObjectOrReference::Object(response) => {
            let media = response.content.get("application/json").unwrap();
            assert_matches!(
                &media.schema,
                Some(ObjectOrReference::Object(Schema::Object(obj))) => {
                    assert_eq!(obj.ref_name().as_deref(), Some("Pet"));
                }
            );
        });
    }

    #[test]
    fn reserved_headers_are_dropped() {
        let sig = signature("int fetch(const char *authorization, const char *x_request_id);");
        let doc = doc::parse_comment(
            "/** @route GET /fetch\n@param authorization [in:header]\n@param x_request_id [in:header] */",
        );
        let built = build_operation(&sig, Some(&doc), &BuildOptions::default());

        let names: Vec<_> = built
            .operation
            .parameters
            .iter()
            .filter_map(|oor| match oor {
                ObjectOrReference::Object(param) => Some(param.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["x_request_id".to_owned()]);
    }

    #[test]
    fn multi_content_responses_merge_by_status() {
        let sig = signature("int api_pet_get(long id);");
        let doc = doc::parse_comment(indoc::indoc! {r#"
            /**
             * @route GET /pet/{id}
             * @return 200 [contentType:application/json] a pet
             * @return 200 [contentType:application/xml] a pet, as XML
             */
        "#});
        let built = build_operation(&sig, Some(&doc), &BuildOptions::default());

        let responses = built.operation.responses.unwrap();
        assert_eq!(responses.len(), 1);
        assert_matches!(responses.get("200").unwrap(), ObjectOrReference::Object(response) => {
            assert_eq!(response.content.len(), 2);
            assert!(response.content.contains_key("application/json"));
            assert!(response.content.contains_key("application/xml"));
        });
    }

    #[test]
    fn unknown_verb_is_additional_and_preserved() {
        let sig = signature("int cache_flush(void);");
        let doc = doc::parse_comment("/** @route PURGE /cache */");
        let built = build_operation(&sig, Some(&doc), &BuildOptions::default());

        assert!(built.is_additional);
        assert_eq!(built.verb, "PURGE");
    }

    #[test]
    fn verb_and_route_inference_from_name() {
        let sig = signature("int api_user_list(void);");
        let built = build_operation(&sig, None, &BuildOptions::default());
        assert_eq!(built.verb, "GET");
        assert_eq!(built.route, "/user");

        let sig = signature("int api_order_remove(long id);");
        let built = build_operation(&sig, None, &BuildOptions::default());
        assert_eq!(built.verb, "DELETE");
        assert_eq!(built.route, "/order");
    }

    #[test]
    fn aggregator_preserves_discovery_order_and_rejects_duplicates() {
        let scan = scan_file(indoc::indoc! {r#"
            /** @route GET /pet/{id} */
            int api_pet_get(long id);

            /** @route DELETE /pet/{id} */
            int api_pet_delete(long id);

            /** @route GET /pet/{id}
             * @operationId api_pet_get
             */
            int api_pet_get_again(long id);
        "#})
        .unwrap();

        let mut agg = Aggregator::new();
        agg.add_file(scan);
        let spec = agg.finish();

        let paths = spec.paths.as_ref().unwrap();
        assert_eq!(paths.len(), 1);

        let item = paths.get("/pet/{id}").unwrap();
        assert!(item.get.is_some());
        assert!(item.delete.is_some());
        // The duplicate operationId was dropped.
        assert_eq!(spec.operations().len(), 2);
    }

    #[test]
    fn webhooks_land_in_the_webhooks_map() {
        let scan = scan_file(indoc::indoc! {r#"
            /** @webhook POST /events/pet
             * @operationId petEvent
             */
            int on_pet_event(const struct Pet *event);
        "#})
        .unwrap();

        let mut agg = Aggregator::new();
        agg.add_file(scan);
        let spec = agg.finish();

        assert!(spec.paths.is_none());
        assert!(spec.webhooks.get("petEvent").unwrap().post.is_some());
    }

    #[test]
    fn file_globals_feed_info_and_components() {
        let scan = scan_file(indoc::indoc! {r#"
            /**
             * @infoTitle Pet Store
             * @infoVersion 2.0.0
             * @securityScheme bearerAuth [type:http] [scheme:bearer] [bearerFormat:JWT]
             * @license [name:MIT] [identifier:MIT]
             */

            /** @route GET /pet/{id} */
            int api_pet_get(long id);
        "#})
        .unwrap();

        let mut agg = Aggregator::new();
        agg.add_file(scan);
        let spec = agg.finish();

        assert_eq!(spec.info.title, "Pet Store");
        assert_eq!(spec.info.version, "2.0.0");
        assert_eq!(spec.info.license.as_ref().unwrap().name, "MIT");

        let components = spec.components.as_ref().unwrap();
        assert_matches!(
            components.security_schemes.get("bearerAuth"),
            Some(ObjectOrReference::Object(SecurityScheme::Http { scheme, .. })) if scheme == "bearer"
        );
    }

    #[test]
    fn struct_types_register_as_component_schemas() {
        let scan = scan_file(indoc::indoc! {r#"
            struct Pet {
                long id;
                const char *name;
            };

            /** @route GET /pet/{id} */
            int api_pet_get(long id, struct Pet **out, struct ApiError **api_error);
        "#})
        .unwrap();

        let mut agg = Aggregator::new();
        agg.add_file(scan);
        let spec = agg.finish();

        let components = spec.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("Pet"));
    }
}
