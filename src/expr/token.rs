//! Expression lexer
//!
//! Token stream for the expression language: literals, identifiers,
//! operators, and backtick-delimited pointer back-references.

use super::errors::{ExprError, ExprResult};

/// One lexed token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal (single- or double-quoted)
    Str(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// Identifier
    Ident(String),
    /// Backtick-delimited pointer back-reference
    Pointer(String),

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Bang,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
}

/// Tokenize an expression source string.
///
/// Returns tokens paired with their byte offsets, for parse-error
/// reporting.
pub fn tokenize(source: &str) -> ExprResult<Vec<(usize, Token)>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let b = bytes[i];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
            }
            b'(' => {
                tokens.push((start, Token::LParen));
                i += 1;
            }
            b')' => {
                tokens.push((start, Token::RParen));
                i += 1;
            }
            b'[' => {
                tokens.push((start, Token::LBracket));
                i += 1;
            }
            b']' => {
                tokens.push((start, Token::RBracket));
                i += 1;
            }
            b',' => {
                tokens.push((start, Token::Comma));
                i += 1;
            }
            b'.' => {
                tokens.push((start, Token::Dot));
                i += 1;
            }
            b'?' => {
                tokens.push((start, Token::Question));
                i += 1;
            }
            b':' => {
                tokens.push((start, Token::Colon));
                i += 1;
            }
            b'+' => {
                tokens.push((start, Token::Plus));
                i += 1;
            }
            b'-' => {
                tokens.push((start, Token::Minus));
                i += 1;
            }
            b'*' => {
                tokens.push((start, Token::Star));
                i += 1;
            }
            b'/' => {
                tokens.push((start, Token::Slash));
                i += 1;
            }
            b'%' => {
                tokens.push((start, Token::Percent));
                i += 1;
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((start, Token::BangEq));
                    i += 2;
                } else {
                    tokens.push((start, Token::Bang));
                    i += 1;
                }
            }
            b'=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((start, Token::EqEq));
                    i += 2;
                } else {
                    return Err(ExprError::parse(start, "assignment is not supported"));
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((start, Token::LtEq));
                    i += 2;
                } else {
                    tokens.push((start, Token::Lt));
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((start, Token::GtEq));
                    i += 2;
                } else {
                    tokens.push((start, Token::Gt));
                    i += 1;
                }
            }
            b'&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push((start, Token::AndAnd));
                    i += 2;
                } else {
                    return Err(ExprError::parse(start, "expected '&&'"));
                }
            }
            b'|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push((start, Token::OrOr));
                    i += 2;
                } else {
                    return Err(ExprError::parse(start, "expected '||'"));
                }
            }
            b'`' => {
                let (pointer, next) = lex_delimited(source, i, '`')?;
                tokens.push((start, Token::Pointer(pointer)));
                i = next;
            }
            b'\'' | b'"' => {
                let (text, next) = lex_string(source, i, b as char)?;
                tokens.push((start, Token::Str(text)));
                i = next;
            }
            b'0'..=b'9' => {
                let (token, next) = lex_number(source, i)?;
                tokens.push((start, token));
                i = next;
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                let mut end = i + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let word = &source[i..end];
                let token = match word {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word.to_string()),
                };
                tokens.push((start, token));
                i = end;
            }
            _ => {
                return Err(ExprError::parse(
                    start,
                    format!("unexpected character '{}'", &source[i..].chars().next().unwrap_or('?')),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Lex a backtick-delimited pointer token (no escapes inside).
fn lex_delimited(source: &str, start: usize, delim: char) -> ExprResult<(String, usize)> {
    let inner_start = start + delim.len_utf8();
    match source[inner_start..].find(delim) {
        Some(rel_end) => {
            let end = inner_start + rel_end;
            Ok((source[inner_start..end].to_string(), end + delim.len_utf8()))
        }
        None => Err(ExprError::parse(start, "unterminated pointer reference")),
    }
}

/// Lex a quoted string literal with backslash escapes.
fn lex_string(source: &str, start: usize, quote: char) -> ExprResult<(String, usize)> {
    let mut out = String::new();
    let mut chars = source[start + 1..].char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            c if c == quote => {
                return Ok((out, start + 1 + offset + c.len_utf8()));
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            c => out.push(c),
        }
    }
    Err(ExprError::parse(start, "unterminated string literal"))
}

/// Lex a numeric literal (integer or float, optional exponent).
fn lex_number(source: &str, start: usize) -> ExprResult<(Token, usize)> {
    let bytes = source.as_bytes();
    let mut end = start;
    let mut is_float = false;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' && bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit()) {
        is_float = true;
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            is_float = true;
            end = exp_end;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }

    let text = &source[start..end];
    if is_float {
        let value: f64 = text
            .parse()
            .map_err(|_| ExprError::parse(start, format!("invalid number '{}'", text)))?;
        Ok((Token::Float(value), end))
    } else {
        let value: i64 = text
            .parse()
            .map_err(|_| ExprError::parse(start, format!("invalid number '{}'", text)))?;
        Ok((Token::Int(value), end))
    }
}
