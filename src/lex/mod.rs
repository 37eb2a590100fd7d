//! C tokenizer.
//!
//! Single pass, greedy longest-match, context-free (no preprocessor
//! evaluation). All trivia is preserved so that downstream patching can
//! reproduce the source exactly: concatenating every token's bytes yields
//! the input, and no two tokens overlap.

use derive_more::derive::{Display, Error};

pub mod number;

pub use self::number::Number;

/// Tokenizer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// A `/* ... */` comment ran past end of input.
    #[display("unterminated block comment at offset {offset}")]
    UnterminatedBlockComment {
        /// Byte offset the comment opened at.
        offset: usize,
    },

    /// A string literal ran past end of line or input.
    #[display("unterminated string literal at offset {offset}")]
    UnterminatedString {
        /// Byte offset the literal opened at.
        offset: usize,
    },

    /// A character literal ran past end of line or input.
    #[display("unterminated character literal at offset {offset}")]
    UnterminatedChar {
        /// Byte offset the literal opened at.
        offset: usize,
    },
}

/// Reserved words recognized by the keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Keyword {
    Auto,
    Bool,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Do,
    Double,
    Else,
    Enum,
    Extern,
    Float,
    For,
    Goto,
    If,
    Inline,
    Int,
    Long,
    Register,
    Restrict,
    Return,
    Short,
    Signed,
    Sizeof,
    Static,
    Struct,
    Switch,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
}

fn keyword(ident: &str) -> Option<Keyword> {
    Some(match ident {
        "auto" => Keyword::Auto,
        "bool" | "_Bool" => Keyword::Bool,
        "break" => Keyword::Break,
        "case" => Keyword::Case,
        "char" => Keyword::Char,
        "const" => Keyword::Const,
        "continue" => Keyword::Continue,
        "default" => Keyword::Default,
        "do" => Keyword::Do,
        "double" => Keyword::Double,
        "else" => Keyword::Else,
        "enum" => Keyword::Enum,
        "extern" => Keyword::Extern,
        "float" => Keyword::Float,
        "for" => Keyword::For,
        "goto" => Keyword::Goto,
        "if" => Keyword::If,
        "inline" => Keyword::Inline,
        "int" => Keyword::Int,
        "long" => Keyword::Long,
        "register" => Keyword::Register,
        "restrict" => Keyword::Restrict,
        "return" => Keyword::Return,
        "short" => Keyword::Short,
        "signed" => Keyword::Signed,
        "sizeof" => Keyword::Sizeof,
        "static" => Keyword::Static,
        "struct" => Keyword::Struct,
        "switch" => Keyword::Switch,
        "typedef" => Keyword::Typedef,
        "union" => Keyword::Union,
        "unsigned" => Keyword::Unsigned,
        "void" => Keyword::Void,
        "volatile" => Keyword::Volatile,
        "while" => Keyword::While,
        _ => return None,
    })
}

/// Punctuation tokens, multi-character operators included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Arrow,
    Ellipsis,
    Colon,
    Question,
    Assign,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    ShlAssign,
    ShrAssign,
    AndAnd,
    OrOr,
    Not,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
}

/// Multi-character operators, longest first so greedy matching works.
const MULTI_PUNCT: &[(&str, Punct)] = &[
    ("...", Punct::Ellipsis),
    ("<<=", Punct::ShlAssign),
    (">>=", Punct::ShrAssign),
    ("==", Punct::Eq),
    ("!=", Punct::Ne),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("<<", Punct::Shl),
    (">>", Punct::Shr),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("->", Punct::Arrow),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("%=", Punct::PercentAssign),
    ("&=", Punct::AmpAssign),
    ("|=", Punct::PipeAssign),
    ("^=", Punct::CaretAssign),
];

fn single_punct(byte: u8) -> Option<Punct> {
    Some(match byte {
        b'(' => Punct::LParen,
        b')' => Punct::RParen,
        b'{' => Punct::LBrace,
        b'}' => Punct::RBrace,
        b'[' => Punct::LBracket,
        b']' => Punct::RBracket,
        b';' => Punct::Semi,
        b',' => Punct::Comma,
        b'.' => Punct::Dot,
        b':' => Punct::Colon,
        b'?' => Punct::Question,
        b'=' => Punct::Assign,
        b'<' => Punct::Lt,
        b'>' => Punct::Gt,
        b'!' => Punct::Not,
        b'&' => Punct::Amp,
        b'|' => Punct::Pipe,
        b'^' => Punct::Caret,
        b'~' => Punct::Tilde,
        b'+' => Punct::Plus,
        b'-' => Punct::Minus,
        b'*' => Punct::Star,
        b'/' => Punct::Slash,
        b'%' => Punct::Percent,
        _ => return None,
    })
}

/// Token kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Whitespace run, newlines included.
    Whitespace,
    /// `/* ... */` comment.
    BlockComment,
    /// `// ...` comment.
    LineComment,
    /// `#...` directive, line continuations included.
    Preprocessor,
    /// Identifier that is not a reserved word.
    Ident,
    /// Reserved word.
    Keyword(Keyword),
    /// Integer or floating literal.
    Number(Number),
    /// String literal, prefix and quotes included.
    Str,
    /// Character literal, prefix and quotes included.
    CharLit,
    /// Punctuation or operator.
    Punct(Punct),
    /// A byte no other rule claims.
    Unknown,
}

/// A typed lexeme borrowing its bytes from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    /// Kind of the lexeme.
    pub kind: TokenKind,
    /// Byte offset into the source.
    pub offset: usize,
    /// The lexeme's bytes.
    pub text: &'a str,
}

impl Token<'_> {
    /// Byte length of the lexeme.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True for zero-length tokens (never produced by [`tokenize`]).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// End offset (exclusive) of the lexeme.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Whitespace, comments, and preprocessor directives.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace
                | TokenKind::BlockComment
                | TokenKind::LineComment
                | TokenKind::Preprocessor
        )
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn take(&mut self, kind: TokenKind, len: usize) -> Token<'a> {
        let offset = self.pos;
        self.pos += len;
        Token {
            kind,
            offset,
            text: &self.src[offset..self.pos],
        }
    }

    fn whitespace(&mut self) -> Token<'a> {
        let len = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_whitespace)
            .count();
        self.take(TokenKind::Whitespace, len)
    }

    fn block_comment(&mut self) -> Result<Token<'a>, Error> {
        match self.rest()[2..].find("*/") {
            Some(inner) => Ok(self.take(TokenKind::BlockComment, 2 + inner + 2)),
            None => Err(Error::UnterminatedBlockComment { offset: self.pos }),
        }
    }

    fn line_comment(&mut self) -> Token<'a> {
        let len = self.rest().find('\n').unwrap_or(self.rest().len());
        self.take(TokenKind::LineComment, len)
    }

    fn preprocessor(&mut self) -> Token<'a> {
        let bytes = self.rest().as_bytes();
        let mut idx = 1;

        while idx < bytes.len() {
            if bytes[idx] == b'\n' {
                // A backslash immediately before the newline (optionally with
                // a carriage return between) continues the directive.
                let before = if idx >= 1 && bytes[idx - 1] == b'\r' {
                    idx.checked_sub(2).map(|i| bytes[i])
                } else {
                    idx.checked_sub(1).map(|i| bytes[i])
                };
                if before == Some(b'\\') {
                    idx += 1;
                    continue;
                }
                break;
            }
            idx += 1;
        }

        self.take(TokenKind::Preprocessor, idx)
    }

    fn quoted(&mut self, prefix_len: usize, quote: u8) -> Result<Token<'a>, Error> {
        let bytes = self.rest().as_bytes();
        let mut idx = prefix_len + 1;

        while idx < bytes.len() {
            match bytes[idx] {
                b'\\' => idx += 2,
                b'\n' => break,
                byte if byte == quote => {
                    let kind = if quote == b'"' {
                        TokenKind::Str
                    } else {
                        TokenKind::CharLit
                    };
                    return Ok(self.take(kind, idx + 1));
                }
                _ => idx += 1,
            }
        }

        Err(if quote == b'"' {
            Error::UnterminatedString { offset: self.pos }
        } else {
            Error::UnterminatedChar { offset: self.pos }
        })
    }

    fn ident(&mut self) -> Token<'a> {
        let len = self
            .rest()
            .bytes()
            .take_while(|byte| byte.is_ascii_alphanumeric() || *byte == b'_')
            .count();
        let text = &self.rest()[..len];

        match keyword(text) {
            Some(kw) => self.take(TokenKind::Keyword(kw), len),
            None => self.take(TokenKind::Ident, len),
        }
    }
}

/// Literal prefix before a quote, if any: `u8`, `u`, `U`, or `L`.
fn literal_prefix_len(rest: &str) -> Option<(usize, u8)> {
    let bytes = rest.as_bytes();

    for prefix_len in [2usize, 1, 0] {
        let prefix = &bytes[..bytes.len().min(prefix_len)];
        let valid = match prefix {
            b"u8" => true,
            b"u" | b"U" | b"L" => true,
            b"" => true,
            _ => false,
        };
        if !valid || bytes.len() <= prefix_len {
            continue;
        }
        let quote = bytes[prefix_len];
        if quote == b'"' || quote == b'\'' {
            return Some((prefix_len, quote));
        }
    }

    None
}

/// Transforms a byte span of C source into an ordered token stream.
///
/// Fails only on unterminated string, character, or block-comment literals;
/// all other inputs tokenize, with bytes no rule claims yielding explicit
/// [`TokenKind::Unknown`] tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, Error> {
    let mut cursor = Cursor { src, pos: 0 };
    let mut tokens = Vec::new();

    while cursor.pos < src.len() {
        let first = cursor.peek(0).unwrap();

        let token = if first.is_ascii_whitespace() {
            cursor.whitespace()
        } else if cursor.starts_with("/*") {
            cursor.block_comment()?
        } else if cursor.starts_with("//") {
            cursor.line_comment()
        } else if first == b'#' {
            cursor.preprocessor()
        } else if let Some((prefix_len, quote)) = literal_prefix_len(cursor.rest()) {
            cursor.quoted(prefix_len, quote)?
        } else if first.is_ascii_digit()
            || (first == b'.' && cursor.peek(1).is_some_and(|byte| byte.is_ascii_digit()))
        {
            match number::scan(cursor.rest()) {
                Ok(scan) => cursor.take(TokenKind::Number(scan.number), scan.len),
                // Malformed numerics degrade to an unknown token covering the
                // first byte so tokenization stays total.
                Err(_) => cursor.take(TokenKind::Unknown, 1),
            }
        } else if first.is_ascii_alphabetic() || first == b'_' {
            cursor.ident()
        } else if let Some(&(op, punct)) = MULTI_PUNCT
            .iter()
            .find(|(op, _)| cursor.starts_with(op))
        {
            cursor.take(TokenKind::Punct(punct), op.len())
        } else if let Some(punct) = single_punct(first) {
            cursor.take(TokenKind::Punct(punct), 1)
        } else {
            let len = cursor.rest().chars().next().map_or(1, char::len_utf8);
            cursor.take(TokenKind::Unknown, len)
        };

        tokens.push(token);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn reassemble(tokens: &[Token<'_>]) -> String {
        tokens.iter().map(|tok| tok.text).collect()
    }

    #[test]
    fn totality_and_disjointness() {
        let src = indoc::indoc! {r#"
            /* header */
            #include <stdio.h>
            static int add(int a, long b) {
                return a + (int)b; // sum
            }
        "#};

        let tokens = tokenize(src).unwrap();
        assert_eq!(reassemble(&tokens), src);

        for pair in tokens.windows(2) {
            assert_eq!(pair[0].end(), pair[1].offset);
        }
    }

    #[test]
    fn keywords_are_distinguished_from_identifiers() {
        let tokens = tokenize("static interned int intx")
            .unwrap()
            .into_iter()
            .filter(|tok| !tok.is_trivia())
            .collect::<Vec<_>>();

        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Static));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[2].kind, TokenKind::Keyword(Keyword::Int));
        assert_eq!(tokens[3].kind, TokenKind::Ident);
    }

    #[test]
    fn multi_char_operators_match_greedily() {
        let tokens = tokenize("a <<= b >> c ... d->e")
            .unwrap()
            .into_iter()
            .filter_map(|tok| match tok.kind {
                TokenKind::Punct(punct) => Some(punct),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(
            tokens,
            vec![
                Punct::ShlAssign,
                Punct::Shr,
                Punct::Ellipsis,
                Punct::Arrow,
            ]
        );
    }

    #[test]
    fn string_prefixes_and_escapes() {
        let src = r#"L"wide" u8"utf \"quoted\"" '\''"#;
        let tokens = tokenize(src)
            .unwrap()
            .into_iter()
            .filter(|tok| !tok.is_trivia())
            .collect::<Vec<_>>();

        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, r#"L"wide""#);
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[2].kind, TokenKind::CharLit);
        assert_eq!(tokens[2].text, r"'\''");
    }

    #[test]
    fn preprocessor_honors_line_continuation() {
        let src = "#define MAX(a, b) \\\n  ((a) > (b) ? (a) : (b))\nint x;";
        let tokens = tokenize(src).unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Preprocessor);
        assert!(tokens[0].text.contains("(a) : (b))"));
        assert_eq!(reassemble(&tokens), src);
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        assert_matches!(
            tokenize("int a; /* oops"),
            Err(Error::UnterminatedBlockComment { offset: 7 })
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_matches!(
            tokenize("char *s = \"oops;\nint x;"),
            Err(Error::UnterminatedString { .. })
        );
    }

    #[test]
    fn junk_bytes_become_unknown_tokens() {
        let tokens = tokenize("int a; @ $")
            .unwrap()
            .into_iter()
            .filter(|tok| tok.kind == TokenKind::Unknown)
            .count();
        assert_eq!(tokens, 2);
    }

    #[test]
    fn numbers_carry_base_and_suffix() {
        let tokens = tokenize("0xFFul + 1.5e3")
            .unwrap()
            .into_iter()
            .filter_map(|tok| match tok.kind {
                TokenKind::Number(num) => Some(num),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_matches!(
            tokens[0],
            Number::Int {
                base: number::Base::Hex,
                value: 255,
                suffix,
                ..
            } if suffix.unsigned && suffix.long
        );
        assert_matches!(tokens[1], Number::Float { has_exponent: true, .. });
    }
}
