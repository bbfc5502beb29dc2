//! Tolerant lexer for the actor-FSM source dialect.
//!
//! The dialect has no enforced grammar in this tool's context, so the lexer
//! classifies almost everything as a token: identifiers, string and number
//! literals, the `=>` arrow, and single punctuation characters. Comments and
//! horizontal whitespace are skipped. Newlines are emitted as tokens because
//! brace-less definitions end at the line break. The only hard failure is an
//! unterminated block comment; structural problems such as unbalanced
//! delimiters are detected downstream via [`check_balance`].

use crate::error::{Error, Result};

/// A location in the source text, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
    pub byte: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            col: 1,
            byte: 0,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Ident(&'a str),
    Str(&'a str),
    Number(&'a str),
    FatArrow,
    Punct(char),
    Newline,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// The identifier text, if this token is an identifier.
    pub fn ident(&self) -> Option<&'a str> {
        match self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn is_ident(&self, s: &str) -> bool {
        self.kind == TokenKind::Ident(s)
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    idx: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            idx: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>> {
        let mut out = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            out.push(token);
            if is_eof {
                break;
            }
        }
        Ok(out)
    }

    fn next_token(&mut self) -> Result<Token<'a>> {
        self.skip_insignificant()?;
        let start = self.position();
        if self.idx >= self.bytes.len() {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
        }
        let b = self.bytes[self.idx];
        if b == b'\n' {
            self.advance_byte();
            return Ok(Token {
                kind: TokenKind::Newline,
                span: Span::new(start, self.position()),
            });
        }
        if b == b'\r' {
            self.advance_byte();
            if self.bytes.get(self.idx) == Some(&b'\n') {
                self.advance_byte();
            }
            return Ok(Token {
                kind: TokenKind::Newline,
                span: Span::new(start, self.position()),
            });
        }
        if b == b'"' {
            return Ok(self.lex_string(start));
        }
        if b.is_ascii_digit() {
            return Ok(self.lex_number(start));
        }
        if b == b'=' && self.bytes.get(self.idx + 1) == Some(&b'>') {
            self.advance_byte();
            self.advance_byte();
            return Ok(Token {
                kind: TokenKind::FatArrow,
                span: Span::new(start, self.position()),
            });
        }
        if is_ident_start(b) {
            return Ok(self.lex_identifier(start));
        }
        if b.is_ascii() {
            self.advance_byte();
            return Ok(Token {
                kind: TokenKind::Punct(b as char),
                span: Span::new(start, self.position()),
            });
        }
        // Non-ASCII: advance one full character so the stream stays valid UTF-8.
        let ch = self.input[self.idx..].chars().next().unwrap_or('\u{fffd}');
        for _ in 0..ch.len_utf8() {
            self.advance_byte();
        }
        Ok(Token {
            kind: TokenKind::Punct(ch),
            span: Span::new(start, self.position()),
        })
    }

    /// Skip spaces, tabs, and both comment forms. Block comments nest.
    fn skip_insignificant(&mut self) -> Result<()> {
        loop {
            match self.bytes.get(self.idx) {
                Some(b' ') | Some(b'\t') => self.advance_byte(),
                Some(b'/') if self.bytes.get(self.idx + 1) == Some(&b'/') => {
                    while self.idx < self.bytes.len() && self.bytes[self.idx] != b'\n' {
                        self.advance_byte();
                    }
                }
                Some(b'/') if self.bytes.get(self.idx + 1) == Some(&b'*') => {
                    let open = self.position();
                    self.advance_byte();
                    self.advance_byte();
                    let mut depth = 1usize;
                    while depth > 0 {
                        match (self.bytes.get(self.idx), self.bytes.get(self.idx + 1)) {
                            (Some(b'*'), Some(b'/')) => {
                                depth -= 1;
                                self.advance_byte();
                                self.advance_byte();
                            }
                            (Some(b'/'), Some(b'*')) => {
                                depth += 1;
                                self.advance_byte();
                                self.advance_byte();
                            }
                            (Some(_), _) => self.advance_byte(),
                            (None, _) => {
                                return Err(Error::lex("unterminated block comment", open));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_string(&mut self, start: Position) -> Token<'a> {
        self.advance_byte();
        let content_start = self.idx;
        while self.idx < self.bytes.len() {
            let b = self.bytes[self.idx];
            if b == b'"' {
                let content = &self.input[content_start..self.idx];
                self.advance_byte();
                return Token {
                    kind: TokenKind::Str(content),
                    span: Span::new(start, self.position()),
                };
            }
            if b == b'\\' {
                self.advance_byte();
                if self.idx < self.bytes.len() {
                    self.advance_byte();
                }
                continue;
            }
            if b == b'\n' || b == b'\r' {
                break;
            }
            self.advance_byte();
        }
        // Unterminated string: tolerate, take what we have up to the line end.
        Token {
            kind: TokenKind::Str(&self.input[content_start..self.idx]),
            span: Span::new(start, self.position()),
        }
    }

    fn lex_number(&mut self, start: Position) -> Token<'a> {
        let start_idx = self.idx;
        while self.idx < self.bytes.len() {
            let b = self.bytes[self.idx];
            if !b.is_ascii_digit() && b != b'.' {
                break;
            }
            self.advance_byte();
        }
        Token {
            kind: TokenKind::Number(&self.input[start_idx..self.idx]),
            span: Span::new(start, self.position()),
        }
    }

    fn lex_identifier(&mut self, start: Position) -> Token<'a> {
        let start_idx = self.idx;
        self.advance_byte();
        while self.idx < self.bytes.len() && is_ident_continue(self.bytes[self.idx]) {
            self.advance_byte();
        }
        Token {
            kind: TokenKind::Ident(&self.input[start_idx..self.idx]),
            span: Span::new(start, self.position()),
        }
    }

    fn advance_byte(&mut self) {
        if self.idx >= self.bytes.len() {
            return;
        }
        let b = self.bytes[self.idx];
        self.idx += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if b & 0xc0 != 0x80 {
            // UTF-8 continuation bytes do not start a new column.
            self.col += 1;
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
            byte: self.idx,
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Tokenize a full source snapshot.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(input).tokenize()
}

/// Verify that `{}`, `()` and `[]` all pair up across the token stream.
///
/// Any unmatched open or stray close is fatal: the extractors rely on
/// matching delimiters to find block boundaries.
pub fn check_balance(tokens: &[Token<'_>]) -> Result<()> {
    let mut stack: Vec<(char, Position)> = Vec::new();
    for token in tokens {
        let TokenKind::Punct(c) = token.kind else {
            continue;
        };
        match c {
            '{' | '(' | '[' => stack.push((c, token.span.start)),
            '}' | ')' | ']' => {
                let expected = match c {
                    '}' => '{',
                    ')' => '(',
                    _ => '[',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => return Err(Error::parse("unbalanced block", token.span.start)),
                }
            }
            _ => {}
        }
    }
    if let Some((_, position)) = stack.first() {
        return Err(Error::parse("unbalanced block", *position));
    }
    Ok(())
}

/// Given the index of an opening delimiter token, find the index of its
/// matching close. Returns `None` if the stream ends first.
pub fn find_matching(tokens: &[Token<'_>], open_idx: usize) -> Option<usize> {
    let TokenKind::Punct(open) = tokens[open_idx].kind else {
        return None;
    };
    let close = match open {
        '{' => '}',
        '(' => ')',
        '[' => ']',
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open_idx) {
        if token.is_punct(open) {
            depth += 1;
        } else if token.is_punct(close) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_transition_clause() {
        let tokens = kinds("case Event(PlaceOrder, _) => goto(State.PaymentPending)");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("case"),
                TokenKind::Ident("Event"),
                TokenKind::Punct('('),
                TokenKind::Ident("PlaceOrder"),
                TokenKind::Punct(','),
                TokenKind::Ident("_"),
                TokenKind::Punct(')'),
                TokenKind::FatArrow,
                TokenKind::Ident("goto"),
                TokenKind::Punct('('),
                TokenKind::Ident("State"),
                TokenKind::Punct('.'),
                TokenKind::Ident("PaymentPending"),
                TokenKind::Punct(')'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("// Events\nidle /* a /* nested */ comment */ done");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Newline,
                TokenKind::Ident("idle"),
                TokenKind::Ident("done"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_and_number_literals() {
        let tokens = kinds(r#"OrderInfo("ORDER-123", 99.99)"#);
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("OrderInfo"),
                TokenKind::Punct('('),
                TokenKind::Str("ORDER-123"),
                TokenKind::Punct(','),
                TokenKind::Number("99.99"),
                TokenKind::Punct(')'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_lex_error() {
        let err = tokenize("object State { /* oops").unwrap_err();
        assert!(err.to_string().starts_with("Parse error: unterminated block comment"));
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = tokenize("a\n  b").unwrap();
        assert_eq!(tokens[0].span.start.line, 1);
        assert_eq!(tokens[2].span.start.line, 2);
        assert_eq!(tokens[2].span.start.col, 3);
    }

    #[test]
    fn test_columns_count_chars_not_bytes() {
        // "é" is two bytes but one column.
        let tokens = tokenize("é x\n\"né\" y").unwrap();
        let x = tokens.iter().find(|t| t.is_ident("x")).unwrap();
        assert_eq!(x.span.start.col, 3);
        let y = tokens.iter().find(|t| t.is_ident("y")).unwrap();
        assert_eq!(y.span.start.line, 2);
        assert_eq!(y.span.start.col, 6);
    }

    #[test]
    fn test_check_balance_accepts_matched() {
        let tokens = tokenize("when(State.Idle) { case Event(Go, _) => stay() }").unwrap();
        assert!(check_balance(&tokens).is_ok());
    }

    #[test]
    fn test_check_balance_rejects_unmatched_open() {
        let tokens = tokenize("this is not valid scala code {{{").unwrap();
        let err = check_balance(&tokens).unwrap_err();
        assert!(err.to_string().starts_with("Parse error: unbalanced block"));
    }

    #[test]
    fn test_check_balance_rejects_stray_close() {
        let tokens = tokenize("object State }").unwrap();
        assert!(check_balance(&tokens).is_err());
    }

    #[test]
    fn test_find_matching_brace() {
        let tokens = tokenize("{ a { b } c }").unwrap();
        assert_eq!(find_matching(&tokens, 0), Some(tokens.len() - 2));
    }
}
