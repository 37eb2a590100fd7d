//! Type inspector: scans a file's CST and emits a type-definition list in
//! declaration order, normalized into the [`StructFields`] form.
//!
//! Supports bitfields, nested references by name, array members (fixed-size
//! or pointer-plus-`_len` pairs), and enum members with explicit values.
//! Descriptions are lifted from the preceding comment block.

use log::warn;

use crate::{
    cst::{Cst, CstKind, CstNode},
    doc,
    fields::{FieldConstraints, FieldScalar, FieldShape, StructField, StructFields},
    lex::{Keyword, Punct, Token, TokenKind},
};

/// One enum member, with its explicit value where present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Explicit integer value, when written.
    pub value: Option<i64>,
}

/// A scanned C enum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumDef {
    /// Enum tag or typedef name.
    pub name: String,
    /// Description from the preceding comment.
    pub description: Option<String>,
    /// Members in declaration order.
    pub members: Vec<EnumMember>,
}

/// A scanned typedef alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasDef {
    /// New type name.
    pub name: String,
    /// Aliased type, as written.
    pub target: String,
}

/// One scanned type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// A struct, in normal form.
    Struct(StructFields),
    /// An enum.
    Enum(EnumDef),
    /// A plain typedef alias.
    Alias(AliasDef),
}

impl TypeDef {
    /// Defined type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(def) => &def.name,
            Self::Enum(def) => &def.name,
            Self::Alias(def) => &def.name,
        }
    }
}

/// Collected type tokens of one struct member declaration.
#[derive(Debug, Default)]
struct MemberType {
    keywords: Vec<Keyword>,
    idents: Vec<String>,
    aggregate: Option<String>,
    pointer_depth: usize,
    array_len: Option<u64>,
}

impl MemberType {
    fn has(&self, kw: Keyword) -> bool {
        self.keywords.contains(&kw)
    }

    fn scalar(&self) -> Option<(FieldScalar, Option<String>)> {
        if self.has(Keyword::Bool) {
            return Some((FieldScalar::Boolean, None));
        }
        if self.has(Keyword::Double) {
            return Some((FieldScalar::Number, Some("double".to_owned())));
        }
        if self.has(Keyword::Float) {
            return Some((FieldScalar::Number, Some("float".to_owned())));
        }
        if self.has(Keyword::Char) {
            // `char *` and `char buf[N]` are strings; a bare `char` is a
            // one-byte integer.
            if self.pointer_depth > 0 || self.array_len.is_some() {
                return Some((FieldScalar::String, None));
            }
            return Some((FieldScalar::Integer, Some("int32".to_owned())));
        }
        if self.has(Keyword::Long) {
            return Some((FieldScalar::Integer, Some("int64".to_owned())));
        }
        if self.has(Keyword::Int) || self.has(Keyword::Short) || self.has(Keyword::Signed) ||
            self.has(Keyword::Unsigned)
        {
            return Some((FieldScalar::Integer, Some("int32".to_owned())));
        }
        if self
            .idents
            .iter()
            .any(|ident| matches!(ident.as_str(), "size_t" | "uint64_t" | "int64_t"))
        {
            return Some((FieldScalar::Integer, Some("int64".to_owned())));
        }
        if self.idents.iter().any(|ident| {
            matches!(
                ident.as_str(),
                "uint8_t" | "uint16_t" | "uint32_t" | "int8_t" | "int16_t" | "int32_t"
            )
        }) {
            return Some((FieldScalar::Integer, Some("int32".to_owned())));
        }
        None
    }

    fn shape(&self) -> Option<(FieldShape, Option<String>)> {
        if let Some(name) = &self.aggregate {
            return Some((FieldShape::Ref(name.clone()), None));
        }

        let (scalar, format) = self.scalar()?;

        // A char string is not an array of strings even when written as a
        // buffer; other fixed-size members are arrays.
        if self.array_len.is_some() && scalar != FieldScalar::String {
            return Some((FieldShape::Array(scalar), format));
        }

        Some((FieldShape::Scalar(scalar), format))
    }
}

struct Inspector<'a, 'src> {
    tokens: &'a [Token<'src>],
}

impl Inspector<'_, '_> {
    fn significant(&self, range: std::ops::Range<usize>) -> Vec<usize> {
        range
            .filter(|idx| !self.tokens[*idx].is_trivia())
            .collect()
    }

    fn text(&self, idx: usize) -> &str {
        self.tokens[idx].text
    }

    fn kind(&self, idx: usize) -> TokenKind {
        self.tokens[idx].kind
    }

    /// Parses struct members between `open` and its matching brace.
    fn struct_fields(&self, indices: &[usize], open_pos: usize) -> Vec<StructField> {
        let mut fields = Vec::new();
        let mut depth = 1usize;
        let mut member: Vec<usize> = Vec::new();
        let mut pos = open_pos + 1;

        while pos < indices.len() && depth > 0 {
            let idx = indices[pos];
            match self.kind(idx) {
                TokenKind::Punct(Punct::LBrace) => {
                    depth += 1;
                    member.push(idx);
                }
                TokenKind::Punct(Punct::RBrace) => {
                    depth -= 1;
                    if depth > 0 {
                        member.push(idx);
                    }
                }
                TokenKind::Punct(Punct::Semi) if depth == 1 => {
                    if let Some(field) = self.member_field(&member) {
                        fields.push(field);
                    }
                    member.clear();
                }
                _ => member.push(idx),
            }
            pos += 1;
        }

        merge_len_pairs(fields)
    }

    /// Parses one member declaration into a field.
    fn member_field(&self, member: &[usize]) -> Option<StructField> {
        if member.is_empty() {
            return None;
        }

        // Anonymous nested aggregates have no normal form.
        if member
            .iter()
            .any(|idx| matches!(self.kind(*idx), TokenKind::Punct(Punct::LBrace)))
        {
            warn!("skipping nested anonymous aggregate member");
            return None;
        }

        let mut ty = MemberType::default();
        let mut name: Option<String> = None;
        let mut iter = member.iter().copied().peekable();

        while let Some(idx) = iter.next() {
            match self.kind(idx) {
                TokenKind::Keyword(kw @ (Keyword::Struct | Keyword::Enum | Keyword::Union)) => {
                    // `struct X` names a reference; enums degrade to ints.
                    if let Some(&next) = iter.peek() {
                        if self.kind(next) == TokenKind::Ident {
                            iter.next();
                            if kw == Keyword::Struct || kw == Keyword::Union {
                                ty.aggregate = Some(self.text(next).to_owned());
                            } else {
                                ty.idents.push("int32_t".to_owned());
                            }
                        }
                    }
                }
                TokenKind::Keyword(Keyword::Const | Keyword::Volatile) => {}
                TokenKind::Keyword(kw) => ty.keywords.push(kw),
                TokenKind::Punct(Punct::Star) => ty.pointer_depth += 1,
                TokenKind::Ident => {
                    // The last identifier before `[`, `:`, or end is the
                    // field name; earlier ones are type names.
                    if let Some(prev) = name.take() {
                        ty.idents.push(prev);
                    }
                    name = Some(self.text(idx).to_owned());
                }
                TokenKind::Punct(Punct::LBracket) => {
                    // Fixed-size array: `type name[N]`.
                    if let Some(&len_idx) = iter.peek() {
                        if let TokenKind::Number(crate::lex::Number::Int { value, .. }) =
                            self.kind(len_idx)
                        {
                            ty.array_len = Some(value);
                        }
                    }
                    for idx in iter.by_ref() {
                        if self.kind(idx) == TokenKind::Punct(Punct::RBracket) {
                            break;
                        }
                    }
                }
                TokenKind::Punct(Punct::Colon) => {
                    // Bitfield width; the value range is not modeled.
                    iter.next();
                }
                _ => {}
            }
        }

        let name = name?;
        let (shape, format) = ty.shape()?;

        let mut constraints = FieldConstraints::default();
        if let (Some(len), FieldShape::Array(_)) = (ty.array_len, &shape) {
            constraints.max_items = Some(len);
        }

        Some(StructField {
            name,
            shape,
            format,
            description: None,
            default: None,
            required: false,
            constraints,
        })
    }

    fn parse_struct(&self, node: &CstNode) -> Option<TypeDef> {
        let indices = self.significant(node.start..node.end);

        let struct_pos = indices
            .iter()
            .position(|idx| self.kind(*idx) == TokenKind::Keyword(Keyword::Struct))?;

        let open_pos = indices
            .iter()
            .position(|idx| self.kind(*idx) == TokenKind::Punct(Punct::LBrace));

        // Tag name directly after `struct`, or the typedef name after the
        // closing brace for `typedef struct { ... } Name;`.
        let tag = indices
            .get(struct_pos + 1)
            .filter(|idx| self.kind(**idx) == TokenKind::Ident)
            .map(|idx| self.text(*idx).to_owned());

        let name = tag.or_else(|| {
            let close_pos = indices
                .iter()
                .rposition(|idx| self.kind(*idx) == TokenKind::Punct(Punct::RBrace))?;
            indices
                .get(close_pos + 1)
                .filter(|idx| self.kind(**idx) == TokenKind::Ident)
                .map(|idx| self.text(*idx).to_owned())
        })?;

        let fields = match open_pos {
            Some(open_pos) => self.struct_fields(&indices, open_pos),
            // Forward declaration.
            None => Vec::new(),
        };

        Some(TypeDef::Struct(StructFields {
            name,
            description: None,
            fields,
        }))
    }

    fn parse_enum(&self, node: &CstNode) -> Option<TypeDef> {
        let indices = self.significant(node.start..node.end);

        let enum_pos = indices
            .iter()
            .position(|idx| self.kind(*idx) == TokenKind::Keyword(Keyword::Enum))?;

        let tag = indices
            .get(enum_pos + 1)
            .filter(|idx| self.kind(**idx) == TokenKind::Ident)
            .map(|idx| self.text(*idx).to_owned());

        let open_pos = indices
            .iter()
            .position(|idx| self.kind(*idx) == TokenKind::Punct(Punct::LBrace));

        let name = tag.or_else(|| {
            let close_pos = indices
                .iter()
                .rposition(|idx| self.kind(*idx) == TokenKind::Punct(Punct::RBrace))?;
            indices
                .get(close_pos + 1)
                .filter(|idx| self.kind(**idx) == TokenKind::Ident)
                .map(|idx| self.text(*idx).to_owned())
        })?;

        let mut members = Vec::new();

        if let Some(open_pos) = open_pos {
            let mut pos = open_pos + 1;
            while pos < indices.len() {
                let idx = indices[pos];
                match self.kind(idx) {
                    TokenKind::Punct(Punct::RBrace) => break,
                    TokenKind::Ident => {
                        let name = self.text(idx).to_owned();
                        let mut value = None;

                        // `NAME = <int>` with an optional unary minus.
                        if indices
                            .get(pos + 1)
                            .is_some_and(|idx| self.kind(*idx) == TokenKind::Punct(Punct::Assign))
                        {
                            let mut value_pos = pos + 2;
                            let mut negative = false;
                            if indices.get(value_pos).is_some_and(|idx| {
                                self.kind(*idx) == TokenKind::Punct(Punct::Minus)
                            }) {
                                negative = true;
                                value_pos += 1;
                            }
                            if let Some(&value_idx) = indices.get(value_pos) {
                                if let TokenKind::Number(crate::lex::Number::Int {
                                    value: magnitude,
                                    ..
                                }) = self.kind(value_idx)
                                {
                                    let magnitude = magnitude as i64;
                                    value =
                                        Some(if negative { -magnitude } else { magnitude });
                                    pos = value_pos;
                                }
                            }
                        }

                        members.push(EnumMember { name, value });
                    }
                    _ => {}
                }
                pos += 1;
            }
        }

        Some(TypeDef::Enum(EnumDef {
            name,
            description: None,
            members,
        }))
    }

    fn parse_typedef(&self, node: &CstNode) -> Option<TypeDef> {
        let indices = self.significant(node.start..node.end);

        // `typedef struct { ... } Name;` defines a struct, not an alias.
        if indices
            .iter()
            .any(|idx| self.kind(*idx) == TokenKind::Punct(Punct::LBrace))
        {
            if indices
                .iter()
                .any(|idx| self.kind(*idx) == TokenKind::Keyword(Keyword::Enum))
            {
                return self.parse_enum(node);
            }
            return self.parse_struct(node);
        }

        // `typedef <target tokens> Name;`
        let semi_pos = indices
            .iter()
            .rposition(|idx| self.kind(*idx) == TokenKind::Punct(Punct::Semi))?;
        let name_idx = *indices.get(semi_pos.checked_sub(1)?)?;
        if self.kind(name_idx) != TokenKind::Ident {
            return None;
        }

        let target = indices[1..semi_pos - 1]
            .iter()
            .map(|idx| self.text(*idx))
            .collect::<Vec<_>>()
            .join(" ");

        Some(TypeDef::Alias(AliasDef {
            name: self.text(name_idx).to_owned(),
            target,
        }))
    }
}

/// Merges `T *items; size_t items_len;` pairs into one array field.
fn merge_len_pairs(fields: Vec<StructField>) -> Vec<StructField> {
    let mut merged: Vec<StructField> = Vec::new();

    for field in fields {
        let is_len_for_prev = merged.last().is_some_and(|prev| {
            field.name == format!("{}_len", prev.name)
                && matches!(field.shape, FieldShape::Scalar(FieldScalar::Integer))
        });

        if is_len_for_prev {
            let prev = merged.last_mut().unwrap();
            prev.shape = match prev.shape.clone() {
                FieldShape::Scalar(scalar) => FieldShape::Array(scalar),
                FieldShape::Ref(name) => FieldShape::ArrayRef(name),
                shape => shape,
            };
            continue;
        }

        merged.push(field);
    }

    merged
}

/// Description text from the comment node immediately preceding `node`.
fn preceding_description(tokens: &[Token<'_>], cst: &Cst, node_index: usize) -> Option<String> {
    let preceding = cst.nodes[..node_index]
        .iter()
        .rev()
        .find(|prev| prev.kind != CstKind::Whitespace)?;

    if preceding.kind != CstKind::Comment {
        return None;
    }

    let comment = tokens[preceding.start].text;
    let doc = doc::parse_comment(comment);

    doc.description.or(doc.summary).or_else(|| {
        // A plain comment without directives is itself the description.
        let text = comment
            .trim_start_matches('/')
            .trim_start_matches('*')
            .trim_end_matches('/')
            .trim_end_matches('*')
            .trim();
        (!text.is_empty() && !text.contains('@')).then(|| text.to_owned())
    })
}

/// Scans a file's CST and returns its type definitions in declaration order.
pub fn scan_types(tokens: &[Token<'_>], cst: &Cst) -> Vec<TypeDef> {
    let inspector = Inspector { tokens };
    let mut defs = Vec::new();

    for (node_index, node) in cst.nodes.iter().enumerate() {
        let parsed = match node.kind {
            CstKind::Struct => inspector.parse_struct(node),
            CstKind::Enum => inspector.parse_enum(node),
            CstKind::Typedef => inspector.parse_typedef(node),
            _ => None,
        };

        let Some(mut def) = parsed else { continue };

        if let Some(description) = preceding_description(tokens, cst, node_index) {
            match &mut def {
                TypeDef::Struct(inner) => inner.description = Some(description),
                TypeDef::Enum(inner) => inner.description = Some(description),
                TypeDef::Alias(_) => {}
            }
        }

        defs.push(def);
    }

    defs
}
