//! Shallow concrete-syntax tree over the token stream.
//!
//! One walk of the tokens produces a flat, ordered sequence of top-level
//! constructs. No semantic analysis is performed; nesting is implied by
//! containment of token ranges.

use derive_more::derive::{Display, Error};

use crate::lex::{Keyword, Punct, Token, TokenKind};

/// CST errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// Unbalanced braces or parentheses at end of input.
    #[display("source truncated inside a construct")]
    Truncated,
}

/// Kind of a top-level construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CstKind {
    /// Function definition with a `{...}` body.
    Function,
    /// `struct` declaration, anonymous and forward forms included.
    Struct,
    /// `enum` declaration.
    Enum,
    /// `union` declaration.
    Union,
    /// `typedef` declaration.
    Typedef,
    /// Preprocessor directive.
    Preprocessor,
    /// Block or line comment.
    Comment,
    /// Whitespace run.
    Whitespace,
    /// Any other declaration (variables, prototypes, stray semicolons).
    Declaration,
}

/// A half-open token range `[start, end)` tagged with a construct kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CstNode {
    /// Construct kind.
    pub kind: CstKind,
    /// Index of the first token.
    pub start: usize,
    /// Index one past the last token.
    pub end: usize,
    /// For functions, the token index of the opening body brace.
    pub body_brace: Option<usize>,
}

/// Parsed flat construct sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cst {
    /// Constructs in source order.
    pub nodes: Vec<CstNode>,
    /// Input ended inside a construct; `nodes` holds the parsed prefix.
    pub truncated: bool,
}

impl Cst {
    /// Fails with [`Error::Truncated`] when the input ended mid-construct.
    pub fn check(&self) -> Result<(), Error> {
        if self.truncated {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Function nodes in source order.
    pub fn functions(&self) -> impl Iterator<Item = &CstNode> {
        self.nodes
            .iter()
            .filter(|node| node.kind == CstKind::Function)
    }
}

fn is_type_ish(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::Keyword(
                Keyword::Void
                    | Keyword::Char
                    | Keyword::Short
                    | Keyword::Int
                    | Keyword::Long
                    | Keyword::Float
                    | Keyword::Double
                    | Keyword::Signed
                    | Keyword::Unsigned
                    | Keyword::Bool
                    | Keyword::Const
                    | Keyword::Volatile
                    | Keyword::Struct
                    | Keyword::Enum
                    | Keyword::Union
            )
            | TokenKind::Punct(
                Punct::Star | Punct::Comma | Punct::Semi | Punct::LBracket | Punct::RBracket
            )
            | TokenKind::Number(_)
    )
}

struct Walker<'a, 'src> {
    tokens: &'a [Token<'src>],
    idx: usize,
}

impl Walker<'_, '_> {
    fn kind(&self, idx: usize) -> Option<TokenKind> {
        self.tokens.get(idx).map(|tok| tok.kind)
    }

    /// Scans one declaration-or-function construct starting at `self.idx`.
    ///
    /// Returns `None` when the input ends mid-construct.
    fn construct(&mut self) -> Option<CstNode> {
        let start = self.idx;
        let mut paren_depth = 0usize;
        let mut brace_depth = 0usize;
        let mut seen_paren_group = false;
        let mut saw_typedef = false;
        let mut idx = start;

        loop {
            let kind = self.kind(idx)?;

            match kind {
                TokenKind::Keyword(Keyword::Typedef) => saw_typedef = true,

                TokenKind::Punct(Punct::LParen) => paren_depth += 1,
                TokenKind::Punct(Punct::RParen) => {
                    paren_depth = paren_depth.checked_sub(1)?;
                    if paren_depth == 0 {
                        seen_paren_group = true;
                    }
                }

                TokenKind::Punct(Punct::LBrace) if paren_depth == 0 => {
                    if seen_paren_group && !saw_typedef && brace_depth == 0 {
                        // Function body: match braces through nested blocks.
                        let body_brace = idx;
                        let end = self.match_braces(idx)?;
                        self.idx = end;
                        return Some(CstNode {
                            kind: CstKind::Function,
                            start,
                            end,
                            body_brace: Some(body_brace),
                        });
                    }
                    brace_depth += 1;
                }
                TokenKind::Punct(Punct::RBrace) if paren_depth == 0 => {
                    brace_depth = brace_depth.checked_sub(1)?;
                }

                TokenKind::Punct(Punct::Semi) if paren_depth == 0 && brace_depth == 0 => {
                    if seen_paren_group && !saw_typedef {
                        // Possible K&R parameter declarations between the
                        // argument list and the body.
                        if let Some(body_start) = self.knr_lookahead(idx + 1) {
                            idx = body_start;
                            continue;
                        }
                    }

                    self.idx = idx + 1;
                    return Some(self.classify(start, idx + 1, saw_typedef));
                }

                _ => {}
            }

            idx += 1;
        }
    }

    /// Returns the token index of a `{` reachable from `idx` through K&R
    /// parameter declarations only.
    fn knr_lookahead(&self, mut idx: usize) -> Option<usize> {
        loop {
            let kind = self.kind(idx)?;

            if matches!(kind, TokenKind::Punct(Punct::LBrace)) {
                return Some(idx);
            }

            let trivia = self.tokens[idx].is_trivia();
            if !trivia && !is_type_ish(kind) {
                return None;
            }

            idx += 1;
        }
    }

    /// Returns the index one past the brace matching `open`.
    fn match_braces(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut idx = open;

        loop {
            match self.kind(idx)? {
                TokenKind::Punct(Punct::LBrace) => depth += 1,
                TokenKind::Punct(Punct::RBrace) => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx + 1);
                    }
                }
                _ => {}
            }
            idx += 1;
        }
    }

    fn classify(&self, start: usize, end: usize, saw_typedef: bool) -> CstNode {
        let node = |kind| CstNode {
            kind,
            start,
            end,
            body_brace: None,
        };

        if saw_typedef {
            return node(CstKind::Typedef);
        }

        let mut significant = self.tokens[start..end].iter().filter(|tok| !tok.is_trivia());

        let kind = match significant.next().map(|tok| tok.kind) {
            Some(TokenKind::Keyword(agg @ (Keyword::Struct | Keyword::Enum | Keyword::Union))) => {
                // `struct X {...};`, `struct {...} x;`, and `struct X;` are
                // aggregate declarations; `struct X *p;` is a plain one.
                let next = significant
                    .find(|tok| tok.kind != TokenKind::Ident)
                    .map(|tok| tok.kind);
                match next {
                    Some(TokenKind::Punct(Punct::LBrace | Punct::Semi)) => match agg {
                        Keyword::Struct => CstKind::Struct,
                        Keyword::Enum => CstKind::Enum,
                        _ => CstKind::Union,
                    },
                    _ => CstKind::Declaration,
                }
            }
            _ => CstKind::Declaration,
        };

        node(kind)
    }
}

/// Walks the token stream once and produces the flat construct sequence.
pub fn parse(tokens: &[Token<'_>]) -> Cst {
    let mut walker = Walker { tokens, idx: 0 };
    let mut nodes = Vec::new();

    while walker.idx < tokens.len() {
        let idx = walker.idx;
        let token = &tokens[idx];

        let node = match token.kind {
            TokenKind::Whitespace => {
                walker.idx += 1;
                CstNode {
                    kind: CstKind::Whitespace,
                    start: idx,
                    end: idx + 1,
                    body_brace: None,
                }
            }
            TokenKind::BlockComment | TokenKind::LineComment => {
                walker.idx += 1;
                CstNode {
                    kind: CstKind::Comment,
                    start: idx,
                    end: idx + 1,
                    body_brace: None,
                }
            }
            TokenKind::Preprocessor => {
                walker.idx += 1;
                CstNode {
                    kind: CstKind::Preprocessor,
                    start: idx,
                    end: idx + 1,
                    body_brace: None,
                }
            }
            _ => match walker.construct() {
                Some(node) => node,
                None => {
                    return Cst {
                        nodes,
                        truncated: true,
                    }
                }
            },
        };

        nodes.push(node);
    }

    Cst {
        nodes,
        truncated: false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lex::tokenize;

    fn kinds(src: &str) -> Vec<CstKind> {
        let tokens = tokenize(src).unwrap();
        parse(&tokens)
            .nodes
            .into_iter()
            .map(|node| node.kind)
            .filter(|kind| !matches!(kind, CstKind::Whitespace))
            .collect()
    }

    #[test]
    fn function_with_nested_braces() {
        let src = indoc::indoc! {r#"
            int f(int a) {
                if (a) { return 1; }
                return 0;
            }
        "#};

        let tokens = tokenize(src).unwrap();
        let cst = parse(&tokens);
        assert!(!cst.truncated);

        let func = cst.functions().next().unwrap();
        assert_eq!(tokens[func.body_brace.unwrap()].text, "{");
        assert_eq!(tokens[func.end - 1].text, "}");
    }

    #[test]
    fn prototypes_are_declarations_not_functions() {
        assert_eq!(
            kinds("int f(void);\nint g(int x) { return x; }"),
            vec![CstKind::Declaration, CstKind::Function]
        );
    }

    #[test]
    fn aggregates_and_typedefs() {
        assert_eq!(
            kinds(indoc::indoc! {r#"
                struct Pet { int id; char *name; };
                enum Color { RED, GREEN = 3 };
                union U { int i; float f; };
                typedef struct Pet PetAlias;
                struct Pet *global;
            "#}),
            vec![
                CstKind::Struct,
                CstKind::Enum,
                CstKind::Union,
                CstKind::Typedef,
                CstKind::Declaration,
            ]
        );
    }

    #[test]
    fn forward_declaration_is_an_aggregate() {
        assert_eq!(kinds("struct Pet;"), vec![CstKind::Struct]);
    }

    #[test]
    fn typedef_function_pointer_is_a_typedef() {
        assert_eq!(
            kinds("typedef int (*callback)(void *ctx);"),
            vec![CstKind::Typedef]
        );
    }

    #[test]
    fn knr_parameter_declarations_stay_in_the_function_span() {
        let src = "int add(a, b) int a; int b; { return a + b; }";
        let tokens = tokenize(src).unwrap();
        let cst = parse(&tokens);

        assert_eq!(cst.nodes.len(), 1);
        assert_eq!(cst.nodes[0].kind, CstKind::Function);
        assert_eq!(cst.nodes[0].end, tokens.len());
    }

    #[test]
    fn trivia_nodes_pass_through_in_order() {
        assert_eq!(
            kinds("/* c */\n#define X 1\nint a;"),
            vec![CstKind::Comment, CstKind::Preprocessor, CstKind::Declaration]
        );
    }

    #[test]
    fn unbalanced_input_reports_truncation_with_prefix() {
        let tokens = tokenize("int a;\nint f(int x) { if (x) {").unwrap();
        let cst = parse(&tokens);

        assert!(cst.truncated);
        assert_eq!(cst.nodes.first().map(|node| node.kind), Some(CstKind::Declaration));
        assert!(cst.check().is_err());
    }

    #[test]
    fn empty_patchable_constructs_round_trip() {
        let src = "static const struct Pet DEFAULT_PET = {0, \"rex\"};";
        assert_eq!(kinds(src), vec![CstKind::Declaration]);
    }
}
