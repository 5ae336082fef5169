//! Primitives over string input: literals, anchored regex patterns and the
//! newline family.
//!
//! Positions are byte offsets. Every primitive here uses boundary-safe
//! access, so probing at an arbitrary offset (as the searching helpers do)
//! fails cleanly instead of slicing mid-character.

use regex::Regex;

use crate::parser::Parser;
use crate::result::{failure, success};

/// Matches `value` exactly, consuming its length and yielding it.
///
/// The empty literal matches anywhere, consuming nothing.
pub fn literal(value: impl Into<String>) -> Parser<str, String> {
    let value = value.into();
    Parser::new(move |input: &str, index, _state| match input.as_bytes().get(index..) {
        Some(rest) if rest.starts_with(value.as_bytes()) => {
            success(index + value.len(), value.clone())
        }
        _ => failure(index),
    })
}

/// Matches a regular expression anchored at the current position, yielding
/// the matched text.
///
/// The expression is compiled once, wrapped as `^(?: ... )`, so it can only
/// match a prefix of the remaining input. Panics at construction time if
/// `source` is not a valid expression.
pub fn pattern(source: &str) -> Parser<str, String> {
    let regex = match Regex::new(&format!("^(?:{source})")) {
        Ok(regex) => regex,
        Err(error) => panic!("invalid pattern /{source}/: {error}"),
    };
    Parser::new(move |input: &str, index, _state| match input.get(index..) {
        Some(rest) => match regex.find(rest) {
            Some(found) => success(index + found.end(), found.as_str().to_string()),
            None => failure(index),
        },
        None => failure(index),
    })
}

/// Matches any single character.
pub fn any_char() -> Parser<str, char> {
    Parser::new(|input: &str, index, _state| {
        match input.get(index..).and_then(|rest| rest.chars().next()) {
            Some(ch) => success(index + ch.len_utf8(), ch),
            None => failure(index),
        }
    })
}

/// Matches a carriage return.
pub fn cr() -> Parser<str, String> {
    literal("\r")
}

/// Matches a line feed.
pub fn lf() -> Parser<str, String> {
    literal("\n")
}

/// Matches a carriage return directly followed by a line feed.
pub fn crlf() -> Parser<str, String> {
    literal("\r\n")
}

/// Matches any of the three newline forms, longest first.
pub fn newline() -> Parser<str, String> {
    crate::combinators::choice(vec![crlf(), cr(), lf()])
}

/// Zero-width match at the start of the input or directly after a newline
/// byte.
pub fn line_begin() -> Parser<str, ()> {
    Parser::new(|input: &str, index, _state| {
        if index == 0 {
            return success(index, ());
        }
        match input.as_bytes().get(index - 1) {
            Some(&b'\r') | Some(&b'\n') => success(index, ()),
            _ => failure(index),
        }
    })
}

/// Zero-width match at the end of the input or directly before a newline
/// byte.
pub fn line_end() -> Parser<str, ()> {
    Parser::new(|input: &str, index, _state| {
        if index >= input.len() {
            return success(index, ());
        }
        match input.as_bytes().get(index) {
            Some(&b'\r') | Some(&b'\n') => success(index, ()),
            _ => failure(index),
        }
    })
}
