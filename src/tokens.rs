//! Primitives over pre-tokenized input.
//!
//! The atomic unit is one element of a slice; positions are element
//! indexes. The same combinator surface as string parsing applies on top,
//! including span capture (which yields a `Vec` of the covered tokens).

use regex::Regex;

use crate::parser::Parser;
use crate::result::{failure, success};

/// Matches one unit equal to `value`, yielding the matched unit.
pub fn token<U: Clone + PartialEq + 'static>(value: U) -> Parser<[U], U> {
    Parser::new(move |input: &[U], index, _state| match input.get(index) {
        Some(unit) if *unit == value => success(index + 1, unit.clone()),
        _ => failure(index),
    })
}

/// Matches one unit accepted by `predicate`.
pub fn token_if<U: Clone + 'static>(
    predicate: impl Fn(&U) -> bool + 'static,
) -> Parser<[U], U> {
    Parser::new(move |input: &[U], index, _state| match input.get(index) {
        Some(unit) if predicate(unit) => success(index + 1, unit.clone()),
        _ => failure(index),
    })
}

/// Matches any single unit.
pub fn any_token<U: Clone + 'static>() -> Parser<[U], U> {
    Parser::new(|input: &[U], index, _state| match input.get(index) {
        Some(unit) => success(index + 1, unit.clone()),
        None => failure(index),
    })
}

/// Matches one string token in its entirety against a regular expression.
///
/// The expression is compiled once, wrapped as `^(?: ... )$`. Panics at
/// construction time if `source` is not a valid expression.
pub fn token_pattern(source: &str) -> Parser<[String], String> {
    let regex = match Regex::new(&format!("^(?:{source})$")) {
        Ok(regex) => regex,
        Err(error) => panic!("invalid token pattern /{source}/: {error}"),
    };
    Parser::new(move |input: &[String], index, _state| match input.get(index) {
        Some(unit) if regex.is_match(unit) => success(index + 1, unit.clone()),
        _ => failure(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ParseState;

    fn lex(source: &str) -> Vec<String> {
        source.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_token_matches_by_equality() {
        let tokens = lex("if ( x )");
        let parser = token("if".to_string());
        let mut state = ParseState::new();
        assert_eq!(
            parser.exec(&tokens, 0, &mut state),
            success(1, "if".to_string())
        );
        assert_eq!(parser.exec(&tokens, 1, &mut state), failure(1));
    }

    #[test]
    fn test_token_if_uses_predicate() {
        let tokens = vec![3i64, 15, 8];
        let parser = token_if(|n: &i64| *n < 10);
        let mut state = ParseState::new();
        assert_eq!(parser.exec(&tokens, 0, &mut state), success(1, 3));
        assert_eq!(parser.exec(&tokens, 1, &mut state), failure(1));
    }

    #[test]
    fn test_any_token_fails_only_at_end() {
        let tokens = lex("a b");
        let parser = any_token::<String>();
        let mut state = ParseState::new();
        assert!(parser.exec(&tokens, 1, &mut state).is_success());
        assert_eq!(parser.exec(&tokens, 2, &mut state), failure(2));
    }

    #[test]
    fn test_token_pattern_matches_whole_token() {
        let tokens = lex("x42 42");
        let parser = token_pattern("[0-9]+");
        let mut state = ParseState::new();
        // "x42" contains digits but is not made of digits only.
        assert_eq!(parser.exec(&tokens, 0, &mut state), failure(0));
        assert_eq!(parser.exec(&tokens, 1, &mut state), success(2, "42".to_string()));
    }

    #[test]
    fn test_token_sequences_compose_with_core_combinators() {
        let tokens = lex("( x )");
        let inner = token_pattern("[a-z]+");
        let parser = token("(".to_string())
            .skip_left(&inner)
            .skip(&token(")".to_string()));
        assert_eq!(parser.parse(&tokens), success(3, "x".to_string()));
    }
}
