//! Guarded-transition block extraction.
//!
//! Scans for `when(<state-ref>) { ... }` blocks and pulls one
//! [`TransitionClause`] out of every `case Event(Label, _) => action` clause.
//! Four action shapes are recognized textually; any other call is recorded as
//! a [`ActionRef::CallLocal`] for the resolver to chase. Anything that does
//! not match a recognized pattern is skipped as insignificant text.

use crate::error::{Error, Result};
use crate::parser::declarations::DeclTable;
use crate::parser::lexer::{Token, TokenKind, find_matching};

/// Ordinary vs. failure termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Success,
    Failure,
}

/// What a transition clause produces, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRef {
    /// Explicit next-state directive, optionally carrying a payload expression.
    Goto {
        target: String,
        payload: Option<String>,
    },
    /// No state change.
    Stay,
    /// Terminal directive.
    Stop(StopKind),
    /// A bare call to a local helper; resolved one level deep later.
    CallLocal(String),
    /// Marker for an action that could not be resolved. Only produced by the
    /// resolver, never by extraction.
    Unknown,
}

/// One event-matching clause inside a guarded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionClause {
    /// Qualified source state id, or the raw reference when it matched no
    /// declaration (dropped with a warning at graph build).
    pub source: String,
    pub event: String,
    pub action: ActionRef,
}

/// Extraction output: clauses in source order, plus every block's source
/// state in source order (feeds the entry-state choice).
#[derive(Debug, Default)]
pub struct Transitions {
    pub clauses: Vec<TransitionClause>,
    pub block_sources: Vec<String>,
}

/// Extract all guarded-transition blocks from a token stream.
pub fn extract_transitions(
    tokens: &[Token<'_>],
    src: &str,
    table: &DeclTable,
) -> Result<Transitions> {
    let mut out = Transitions::default();
    let mut i = 0;
    while i < tokens.len() {
        if !tokens[i].is_ident("when") {
            i += 1;
            continue;
        }
        let Some((paren_idx, _)) = next_significant(tokens, i + 1) else {
            break;
        };
        if !tokens[paren_idx].is_punct('(') {
            i += 1;
            continue;
        }
        let Some(paren_close) = find_matching(tokens, paren_idx) else {
            return Err(Error::parse("unbalanced block", tokens[paren_idx].span.start));
        };
        let Some((source_raw, _)) = read_state_ref(tokens, paren_idx + 1) else {
            i = paren_close + 1;
            continue;
        };
        // Extra arguments such as `stateTimeout = 5 seconds` are skipped by
        // jumping straight to the matching close.
        let Some((brace_idx, brace)) = next_significant(tokens, paren_close + 1) else {
            break;
        };
        if !brace.is_punct('{') {
            i = paren_close + 1;
            continue;
        }
        let Some(brace_close) = find_matching(tokens, brace_idx) else {
            return Err(Error::parse("unbalanced block", brace.span.start));
        };

        let source = match table.resolve(&source_raw)? {
            Some(decl) => decl.qualified_id.clone(),
            None => source_raw,
        };
        out.block_sources.push(source.clone());
        extract_clauses(
            &tokens[brace_idx + 1..brace_close],
            src,
            &source,
            &mut out.clauses,
        );
        i = brace_close + 1;
    }
    Ok(out)
}

/// Clause ranges of a block body: one `(start, end)` per `case` keyword at
/// relative delimiter depth 0.
pub(crate) fn case_splits(block: &[Token<'_>]) -> Vec<(usize, usize)> {
    let mut starts = Vec::new();
    let mut depth = 0usize;
    for (i, token) in block.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('{') | TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
            TokenKind::Punct('}') | TokenKind::Punct(')') | TokenKind::Punct(']') => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Ident("case") if depth == 0 => starts.push(i),
            _ => {}
        }
    }
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| (start, starts.get(n + 1).copied().unwrap_or(block.len())))
        .collect()
}

/// Split a block body into `case ... =>` clauses and parse each one.
fn extract_clauses(
    block: &[Token<'_>],
    src: &str,
    source: &str,
    clauses: &mut Vec<TransitionClause>,
) {
    for (start, end) in case_splits(block) {
        let clause = &block[start..end];
        let Some((event, body)) = split_event_clause(clause) else {
            continue;
        };
        let Some(action) = parse_action(body, src) else {
            continue;
        };
        clauses.push(TransitionClause {
            source: source.to_string(),
            event,
            action,
        });
    }
}

/// Match `case Event(<label>, ...) => <body>`; returns the event label and
/// the body tokens after the arrow.
fn split_event_clause<'t, 'a>(clause: &'t [Token<'a>]) -> Option<(String, &'t [Token<'a>])> {
    let (ev_idx, ev) = next_significant(clause, 1)?;
    if !ev.is_ident("Event") {
        return None;
    }
    let (paren_idx, paren) = next_significant(clause, ev_idx + 1)?;
    if !paren.is_punct('(') {
        return None;
    }
    let paren_close = find_matching(clause, paren_idx)?;
    let (_, label_tok) = next_significant(clause, paren_idx + 1)?;
    let event = match label_tok.kind {
        TokenKind::Ident(s) => s.to_string(),
        TokenKind::Str(s) => s.to_string(),
        _ => return None,
    };
    let arrow = (paren_close + 1..clause.len())
        .find(|&i| clause[i].kind == TokenKind::FatArrow)?;
    Some((event, &clause[arrow + 1..]))
}

/// Recognize the action of a clause or helper body.
///
/// First match of `goto(...)`, `stay`, `stop(...)` (or its `stopSuccess`/
/// `stopFailure` shorthands) or an `.enter(...)`
/// direct-dispatch wins; otherwise the first plain call becomes a
/// `CallLocal`. `None` when nothing actionable appears.
pub(crate) fn parse_action(body: &[Token<'_>], src: &str) -> Option<ActionRef> {
    let mut first_call: Option<String> = None;
    let mut j = 0;
    while j < body.len() {
        let token = &body[j];
        match token.kind {
            TokenKind::Ident("goto") => {
                if let Some((paren_idx, p)) = next_significant(body, j + 1)
                    && p.is_punct('(')
                {
                    return parse_goto_args(body, src, paren_idx);
                }
            }
            TokenKind::Ident("stay") => return Some(ActionRef::Stay),
            // Terminal shorthands that tell the outcome in the name.
            TokenKind::Ident("stopSuccess") => return Some(ActionRef::Stop(StopKind::Success)),
            TokenKind::Ident("stopFailure") => return Some(ActionRef::Stop(StopKind::Failure)),
            TokenKind::Ident("stop") => {
                let kind = match next_significant(body, j + 1) {
                    Some((paren_idx, p)) if p.is_punct('(') => {
                        let close = find_matching(body, paren_idx)?;
                        if body[paren_idx..close].iter().any(|t| t.is_ident("Failure")) {
                            StopKind::Failure
                        } else {
                            StopKind::Success
                        }
                    }
                    _ => StopKind::Success,
                };
                return Some(ActionRef::Stop(kind));
            }
            TokenKind::Ident("enter")
                if j >= 2
                    && body[j - 1].is_punct('.')
                    && body[j - 2].ident().is_some()
                    && body.get(j + 1).is_some_and(|t| t.is_punct('(')) =>
            {
                // `Target.enter(State.X, data)` issues a next state directly.
                return parse_goto_args(body, src, j + 1);
            }
            TokenKind::Ident(name) => {
                if first_call.is_none()
                    && body.get(j + 1).is_some_and(|t| t.is_punct('('))
                    && !matches!(name, "Event" | "if" | "match" | "while" | "for")
                {
                    first_call = Some(name.to_string());
                }
            }
            _ => {}
        }
        j += 1;
    }
    first_call.map(ActionRef::CallLocal)
}

/// Parse `(<state-ref>[, payload...])` starting at the open paren, plus a
/// trailing `using <expr>` payload for the `goto` form.
fn parse_goto_args(body: &[Token<'_>], src: &str, paren_idx: usize) -> Option<ActionRef> {
    let close = find_matching(body, paren_idx)?;
    let (target, after) = read_state_ref(body, paren_idx + 1)?;

    // Payload: second argument of the enter form, or a `using` clause after.
    let mut payload = None;
    if let Some((comma_idx, t)) = next_significant(body, after)
        && t.is_punct(',')
        && comma_idx < close
    {
        payload = slice_text(body, src, comma_idx + 1, close);
    }
    if payload.is_none() {
        for k in close + 1..body.len() {
            if body[k].is_ident("using") {
                payload = slice_text(body, src, k + 1, body.len());
                break;
            }
            if !matches!(body[k].kind, TokenKind::Newline) {
                break;
            }
        }
    }
    Some(ActionRef::Goto { target, payload })
}

/// Verbatim source text covered by a token range, trimmed of surrounding
/// newlines. `None` when the range holds nothing significant.
fn slice_text(tokens: &[Token<'_>], src: &str, from: usize, to: usize) -> Option<String> {
    let significant: Vec<&Token<'_>> = tokens[from..to.min(tokens.len())]
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
        .collect();
    let first = significant.first()?;
    let last = significant.last()?;
    let text = src[first.span.start.byte..last.span.end.byte].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Read `Ident('.' Ident)*` as a dotted state reference.
pub(crate) fn read_state_ref(tokens: &[Token<'_>], idx: usize) -> Option<(String, usize)> {
    let (mut j, tok) = next_significant(tokens, idx)?;
    let mut name = tok.ident()?.to_string();
    j += 1;
    while tokens.get(j).is_some_and(|t| t.is_punct('.')) {
        let Some(seg) = tokens.get(j + 1).and_then(|t| t.ident()) else {
            break;
        };
        name.push('.');
        name.push_str(seg);
        j += 2;
    }
    Some((name, j))
}

/// Next non-newline token at or after `idx`.
pub(crate) fn next_significant<'t, 'a>(
    tokens: &'t [Token<'a>],
    idx: usize,
) -> Option<(usize, &'t Token<'a>)> {
    tokens[idx.min(tokens.len())..]
        .iter()
        .enumerate()
        .map(|(off, t)| (idx + off, t))
        .find(|(_, t)| !matches!(t.kind, TokenKind::Newline))
}
