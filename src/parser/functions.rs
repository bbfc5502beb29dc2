//! Local helper function extraction.
//!
//! A transition clause may defer its next-state decision to a separately
//! defined `def`. This pass collects every such definition with its ordered
//! branch list so the resolver can splice one level of indirection back into
//! the transition clauses. Three body shapes are recognized:
//!
//! - `x match { case <literal> => action ... }` (literal branch tags)
//! - `if (cond) { action } else { action }` (tags `true`/`false`)
//! - a single unconditional action
//!
//! Anything else is recorded with no branches and degrades to an unresolved
//! call at resolution time.

use crate::parser::lexer::{Token, TokenKind, find_matching};
use crate::parser::transitions::{ActionRef, case_splits, next_significant, parse_action};
use std::collections::HashMap;

/// A helper referenced by `CallLocal`, with its condition-labeled actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFunctionDef {
    pub name: String,
    /// `(condition label, action)` pairs in source order. The label is absent
    /// for a single unconditional action.
    pub branches: Vec<(Option<String>, ActionRef)>,
}

/// Extract every `def name(...) = body` in the source. Tolerant: definitions
/// that do not fit any recognized shape simply yield no branches.
pub fn extract_functions(tokens: &[Token<'_>], src: &str) -> HashMap<String, LocalFunctionDef> {
    let mut defs = HashMap::new();
    let mut i = 0;
    while i < tokens.len() {
        if !tokens[i].is_ident("def") {
            i += 1;
            continue;
        }
        let Some(name) = tokens.get(i + 1).and_then(|t| t.ident()) else {
            i += 1;
            continue;
        };
        let Some((body_start, body_end)) = find_body(tokens, i + 2) else {
            i += 2;
            continue;
        };
        let branches = parse_branches(&tokens[body_start..body_end], src);
        defs.insert(
            name.to_string(),
            LocalFunctionDef {
                name: name.to_string(),
                branches,
            },
        );
        i = body_end;
    }
    defs
}

/// Locate the definition body: everything after `=` up to the first newline
/// at delimiter depth 0. Parameter lists and return types are skipped.
/// `None` when no `=` appears before the line ends (an abstract def).
fn find_body(tokens: &[Token<'_>], mut idx: usize) -> Option<(usize, usize)> {
    // Skip the parameter list if present.
    if let Some((paren_idx, p)) = next_significant(tokens, idx)
        && p.is_punct('(')
    {
        idx = find_matching(tokens, paren_idx)? + 1;
    }
    // Scan for `=` before the statement ends.
    let mut eq = None;
    for (j, token) in tokens.iter().enumerate().skip(idx) {
        match token.kind {
            TokenKind::Punct('=') => {
                eq = Some(j);
                break;
            }
            TokenKind::Newline | TokenKind::Punct('{') | TokenKind::Eof => break,
            _ => {}
        }
    }
    let start = eq? + 1;
    let mut depth = 0usize;
    for (j, token) in tokens.iter().enumerate().skip(start) {
        match token.kind {
            TokenKind::Punct('{') | TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
            TokenKind::Punct('}') | TokenKind::Punct(')') | TokenKind::Punct(']') => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Newline | TokenKind::Eof if depth == 0 => return Some((start, j)),
            _ => {}
        }
    }
    Some((start, tokens.len()))
}

/// Parse a definition body into its condition-labeled actions.
fn parse_branches(body: &[Token<'_>], src: &str) -> Vec<(Option<String>, ActionRef)> {
    let body = strip_outer_braces(body);

    if let Some(block) = match_block(body) {
        let mut branches = Vec::new();
        for (start, end) in case_splits(block) {
            let clause = &block[start..end];
            let Some(arrow) = clause.iter().position(|t| t.kind == TokenKind::FatArrow) else {
                continue;
            };
            let label = branch_label(&clause[1..arrow]);
            if let Some(action) = parse_action(&clause[arrow + 1..], src) {
                branches.push((label, action));
            }
        }
        return branches;
    }

    if let Some((then_part, else_part)) = if_else_parts(body) {
        let mut branches = Vec::new();
        if let Some(action) = parse_action(then_part, src) {
            branches.push((Some("true".to_string()), action));
        }
        if let Some(action) = else_part.and_then(|p| parse_action(p, src)) {
            branches.push((Some("false".to_string()), action));
        }
        return branches;
    }

    match parse_action(body, src) {
        Some(action) => vec![(None, action)],
        None => Vec::new(),
    }
}

/// Peel `{ ... }` when the braces enclose the whole body.
fn strip_outer_braces<'t, 'a>(body: &'t [Token<'a>]) -> &'t [Token<'a>] {
    let Some((open_idx, open)) = next_significant(body, 0) else {
        return body;
    };
    if !open.is_punct('{') {
        return body;
    }
    let Some(close_idx) = find_matching(body, open_idx) else {
        return body;
    };
    let trailing = body[close_idx + 1..]
        .iter()
        .all(|t| matches!(t.kind, TokenKind::Newline | TokenKind::Eof));
    if trailing {
        &body[open_idx + 1..close_idx]
    } else {
        body
    }
}

/// The inner tokens of `<expr> match { ... }` at depth 0, if present.
fn match_block<'t, 'a>(body: &'t [Token<'a>]) -> Option<&'t [Token<'a>]> {
    let mut depth = 0usize;
    for (j, token) in body.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('{') | TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
            TokenKind::Punct('}') | TokenKind::Punct(')') | TokenKind::Punct(']') => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Ident("match") if depth == 0 => {
                let (open_idx, open) = next_significant(body, j + 1)?;
                if !open.is_punct('{') {
                    return None;
                }
                let close = find_matching(body, open_idx)?;
                return Some(&body[open_idx + 1..close]);
            }
            _ => {}
        }
    }
    None
}

/// Split `if (cond) <then> [else <otherwise>]` at depth 0.
fn if_else_parts<'t, 'a>(body: &'t [Token<'a>]) -> Option<(&'t [Token<'a>], Option<&'t [Token<'a>]>)> {
    let (if_idx, tok) = next_significant(body, 0)?;
    if !tok.is_ident("if") {
        return None;
    }
    let (cond_open, p) = next_significant(body, if_idx + 1)?;
    if !p.is_punct('(') {
        return None;
    }
    let cond_close = find_matching(body, cond_open)?;

    // Then-branch: a brace block, or everything up to a depth-0 `else`.
    let (then_start, t) = next_significant(body, cond_close + 1)?;
    let (then_part, after_then) = if t.is_punct('{') {
        let close = find_matching(body, then_start)?;
        (&body[then_start + 1..close], close + 1)
    } else {
        let else_idx = depth0_ident(body, then_start, "else").unwrap_or(body.len());
        (&body[then_start..else_idx], else_idx)
    };

    let else_part = match next_significant(body, after_then) {
        Some((else_idx, e)) if e.is_ident("else") => {
            match next_significant(body, else_idx + 1) {
                Some((block_start, b)) if b.is_punct('{') => {
                    let close = find_matching(body, block_start)?;
                    Some(&body[block_start + 1..close])
                }
                Some((expr_start, _)) => Some(&body[expr_start..]),
                None => None,
            }
        }
        _ => None,
    };
    Some((then_part, else_part))
}

fn depth0_ident(tokens: &[Token<'_>], from: usize, name: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (j, token) in tokens.iter().enumerate().skip(from) {
        match token.kind {
            TokenKind::Punct('{') | TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
            TokenKind::Punct('}') | TokenKind::Punct(')') | TokenKind::Punct(']') => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Ident(s) if depth == 0 && s == name => return Some(j),
            _ => {}
        }
    }
    None
}

/// Literal branch tag of a `case <pattern>` clause: booleans, strings and
/// numbers label the branch; anything else leaves it unlabeled.
fn branch_label(pattern: &[Token<'_>]) -> Option<String> {
    let (_, tok) = next_significant(pattern, 0)?;
    match tok.kind {
        TokenKind::Ident(s @ ("true" | "false")) => Some(s.to_string()),
        TokenKind::Str(s) => Some(s.to_string()),
        TokenKind::Number(s) => Some(s.to_string()),
        _ => None,
    }
}
