//! In-place synchronization of existing C sources against a spec.
//!
//! Rewrites function signatures, query blocks, header-parameter blocks,
//! and URL construction to match the spec's current shape without touching
//! surrounding code. The engine computes non-overlapping token-range
//! patches and applies them in one pass; a file with nothing to update is
//! returned byte-exact.

use std::{fs, io, path::Path};

use derive_more::derive::{Display, Error as DeriveError, From};
use log::{debug, warn};

use crate::{
    codegen::{self, GenConfig},
    cst::{self, Cst, CstNode},
    lex::{self, Punct, Token, TokenKind},
    patch::{Patch, PatchSet},
    spec::Spec,
};

/// Synchronization errors.
#[derive(Debug, Display, DeriveError, From)]
pub enum Error {
    /// Source failed to tokenize.
    #[display("Tokenizer error")]
    Lex(lex::Error),

    /// Source ended mid-construct.
    #[display("CST error")]
    Cst(cst::Error),

    /// Internal patch conflict; the target file is left untouched.
    #[display("Patch error")]
    Patch(crate::patch::Error),

    /// Reading or replacing the target file failed.
    #[display("I/O error")]
    Io(io::Error),
}

/// Result of synchronizing one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Functions that matched an operation by name.
    pub functions_matched: usize,
    /// Patches that were applied.
    pub patches_applied: usize,
    /// The rewritten source.
    pub output: String,
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct FnTokens<'a, 'src> {
    tokens: &'a [Token<'src>],
    node: &'a CstNode,
}

impl FnTokens<'_, '_> {
    fn kind(&self, idx: usize) -> Option<TokenKind> {
        self.tokens.get(idx).map(|tok| tok.kind)
    }

    fn next_significant(&self, mut idx: usize, limit: usize) -> Option<usize> {
        while idx < limit {
            if !self.tokens[idx].is_trivia() {
                return Some(idx);
            }
            idx += 1;
        }
        None
    }

    /// Token index one past the brace matching the opening brace at `open`.
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

    /// Index of the `)` closing the function's argument list.
    fn arg_list_close(&self) -> Option<usize> {
        let mut depth = 0usize;
        for idx in self.node.start..self.node.end {
            match self.kind(idx)? {
                TokenKind::Punct(Punct::LParen) => depth += 1,
                TokenKind::Punct(Punct::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Extends `end` (one past a `;`) over a `if (rc != 0) goto cleanup;`
    /// statement when one immediately follows.
    fn extend_over_error_check(&self, end: usize) -> usize {
        let expected = ["if", "(", "rc", "!=", "0", ")", "goto", "cleanup", ";"];
        let mut idx = end;
        let mut last = end;

        for token_text in expected {
            let Some(significant) = self.next_significant(idx, self.node.end) else {
                return end;
            };
            if self.tokens[significant].text != token_text {
                return end;
            }
            last = significant + 1;
            idx = significant + 1;
        }

        last
    }

    /// Token range `[start, end)` of the statement containing `idx`.
    ///
    /// The statement runs from after the previous `;`/`{`/`}` through its
    /// own `;` (brace-matched when a block opens first).
    fn statement_range(&self, idx: usize) -> Option<(usize, usize)> {
        let mut start = idx;
        while start > self.node.start {
            match self.kind(start - 1)? {
                TokenKind::Punct(Punct::Semi | Punct::LBrace | Punct::RBrace) => break,
                _ => start -= 1,
            }
        }
        let start = self.next_significant(start, self.node.end)?;

        let mut cursor = idx;
        loop {
            match self.kind(cursor)? {
                TokenKind::Punct(Punct::Semi) => return Some((start, cursor + 1)),
                TokenKind::Punct(Punct::LBrace) => {
                    return Some((start, self.match_braces(cursor)?));
                }
                _ => cursor += 1,
            }
        }
    }

    /// Range of the construct following an anchor comment: a block, an
    /// `if` with a block or statement, or a plain statement.
    fn anchored_construct(&self, after: usize) -> Option<(usize, usize)> {
        let first = self.next_significant(after, self.node.end)?;

        match self.kind(first)? {
            TokenKind::Punct(Punct::LBrace) => Some((first, self.match_braces(first)?)),
            _ => {
                let (_, end) = self.statement_range(first)?;
                Some((first, self.extend_over_error_check(end)))
            }
        }
    }
}

fn byte_range(tokens: &[Token<'_>], start: usize, end: usize) -> std::ops::Range<usize> {
    tokens[start].offset..tokens[end - 1].end()
}

/// Computes the patch list for one matched function.
fn patch_function(
    set: &mut PatchSet,
    tokens: &[Token<'_>],
    node: &CstNode,
    view: &codegen::OpView<'_>,
    spec: &Spec,
    cfg: &GenConfig,
) -> Result<usize, crate::patch::Error> {
    let fn_tokens = FnTokens { tokens, node };
    let mut applied = 0;

    // Signature patch.
    if let Some(close) = fn_tokens.arg_list_close() {
        let sig_start = fn_tokens
            .next_significant(node.start, node.end)
            .unwrap_or(node.start);
        let range = byte_range(tokens, sig_start, close + 1);
        let current_text: String = tokens[sig_start..=close]
            .iter()
            .map(|tok| tok.text)
            .collect();
        let expected = codegen::signature::expected_signature(view, cfg);

        if collapse_ws(&current_text) != collapse_ws(&expected) {
            set.push(Patch::new(range, expected))?;
            applied += 1;
        }
    }

    let Some(body_open) = node.body_brace else {
        return Ok(applied);
    };

    // Query-block patch.
    let init_idx = (body_open..node.end).find(|idx| {
        tokens[*idx].kind == TokenKind::Ident && tokens[*idx].text == "url_query_init"
    });
    let build_idx = (body_open..node.end).find(|idx| {
        tokens[*idx].kind == TokenKind::Ident && tokens[*idx].text == "url_query_build"
    });

    if let (Some(init_idx), Some(build_idx)) = (init_idx, build_idx) {
        if let (Some((init_start, _)), Some((_, build_end))) = (
            fn_tokens.statement_range(init_idx),
            fn_tokens.statement_range(build_idx),
        ) {
            let end = fn_tokens.extend_over_error_check(build_end);
            let range = byte_range(tokens, init_start, end);

            let mut expected = String::new();
            codegen::url::write_query_block(&mut expected, view, spec);
            let expected = expected.trim().to_owned();

            let current_text: String = tokens[init_start..end].iter().map(|tok| tok.text).collect();
            if collapse_ws(&current_text) != collapse_ws(&expected) {
                set.push(Patch::new(range, expected))?;
                applied += 1;
            }
        }
    }

    // Header-block patches, one per anchor comment.
    for idx in body_open..node.end {
        let token = &tokens[idx];
        if token.kind != TokenKind::BlockComment {
            continue;
        }
        let Some(name) = token
            .text
            .strip_prefix("/* Header Parameter: ")
            .and_then(|rest| rest.strip_suffix(" */"))
        else {
            continue;
        };

        let Some((_, construct_end)) = fn_tokens.anchored_construct(idx + 1) else {
            continue;
        };
        let range = token.offset..tokens[construct_end - 1].end();

        let param = view
            .params_in(crate::spec::ParameterIn::Header)
            .find(|param| param.name() == name);

        match param {
            Some(param) => {
                let mut expected = String::new();
                codegen::body::write_header_param(&mut expected, param);
                let expected = expected.trim().to_owned();

                let current_text: String = tokens
                    .iter()
                    .skip_while(|tok| tok.offset < range.start)
                    .take_while(|tok| tok.end() <= range.end)
                    .map(|tok| tok.text)
                    .collect();

                if collapse_ws(&current_text) != collapse_ws(&expected) {
                    set.push(Patch::new(range, expected))?;
                    applied += 1;
                }
            }
            None => {
                // The parameter is gone from the spec; drop the block.
                set.push(Patch::new(range, String::new()))?;
                applied += 1;
            }
        }
    }

    // URL-build patch: the first asprintf/snprintf assigning the URL
    // variable.
    let url_var: &str = if codegen::url::needs_query_block(view, spec) {
        "path_str"
    } else {
        &cfg.url_variable
    };

    for idx in body_open..node.end {
        let token = &tokens[idx];
        if token.kind != TokenKind::Ident
            || (token.text != "asprintf" && token.text != "snprintf")
        {
            continue;
        }

        // The first argument must name the configured variable.
        let assigns_url = tokens[idx..node.end.min(idx + 6)]
            .iter()
            .any(|tok| tok.kind == TokenKind::Ident && tok.text == url_var);
        if !assigns_url {
            continue;
        }

        let Some((stmt_start, stmt_end)) = fn_tokens.statement_range(idx) else {
            break;
        };
        let range = byte_range(tokens, stmt_start, stmt_end);

        let mut expected = String::new();
        codegen::url::write_url_builder(&mut expected, view, url_var, "ctx->base_url");
        let expected = expected.trim().to_owned();

        let current_text: String = tokens[stmt_start..stmt_end]
            .iter()
            .map(|tok| tok.text)
            .collect();
        if collapse_ws(&current_text) != collapse_ws(&expected) {
            set.push(Patch::new(range, expected))?;
            applied += 1;
        }

        break;
    }

    Ok(applied)
}

/// Synchronizes `src` against `spec`, returning the rewritten text.
///
/// Functions are matched to operations by their full generated name.
/// Tokens outside every patch range appear verbatim in the output; when
/// nothing needs updating the output equals the input byte-exact.
pub fn sync_source(src: &str, spec: &Spec, cfg: &GenConfig) -> Result<SyncOutcome, Error> {
    let tokens = lex::tokenize(src)?;
    let tree: Cst = cst::parse(&tokens);
    tree.check()?;

    let views = codegen::spec_views(spec);
    let mut set = PatchSet::new();
    let mut functions_matched = 0;
    let mut patches_applied = 0;

    for node in tree.functions() {
        let Some(sig) = crate::build::parse_signature(&tokens, node) else {
            continue;
        };

        let Some(view) = views
            .iter()
            .find(|view| codegen::function_name(view, cfg) == sig.name)
        else {
            debug!("function {} matches no operation", sig.name);
            continue;
        };

        functions_matched += 1;
        patches_applied += patch_function(&mut set, &tokens, node, view, spec, cfg)?;
    }

    if functions_matched == 0 {
        warn!("no functions matched any spec operation");
    }

    Ok(SyncOutcome {
        functions_matched,
        patches_applied,
        output: set.apply(src)?,
    })
}

/// Synchronizes a file on disk.
///
/// The result is written to a temporary sibling and renamed over the
/// original, so failures leave the target untouched.
pub fn sync_file(path: &Path, spec: &Spec, cfg: &GenConfig) -> Result<SyncOutcome, Error> {
    let src = fs::read_to_string(path)?;
    let outcome = sync_source(&src, spec, cfg)?;

    if outcome.output != src {
        let tmp = path.with_extension("sync.tmp");
        fs::write(&tmp, &outcome.output)?;
        fs::rename(&tmp, path)?;
    }

    Ok(outcome)
}
