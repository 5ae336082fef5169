//! The outcome type threaded through every match attempt.
//!
//! A parser either succeeds, reporting the position it consumed up to and the
//! produced value, or fails, reporting how far the failing attempt reached.
//! Failure carries no partial value and implies no consumption; the index is
//! diagnostic information only.

use thiserror::Error;

/// Result of running a parser at some start position.
///
/// `Success.index` is exclusive: the match consumed input from the attempt's
/// start up to (not including) `index`, so `index >= start` always holds.
/// `Failure.index` records the furthest position the failing sub-match
/// reached and is never used for recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult<T> {
    Success { index: usize, value: T },
    Failure { index: usize },
}

/// Builds a success result.
pub fn success<T>(index: usize, value: T) -> ParseResult<T> {
    ParseResult::Success { index, value }
}

/// Builds a failure result.
pub fn failure<T>(index: usize) -> ParseResult<T> {
    ParseResult::Failure { index }
}

impl<T> ParseResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ParseResult::Failure { .. })
    }

    /// Position reached by this result, for success and failure alike.
    pub fn index(&self) -> usize {
        match self {
            ParseResult::Success { index, .. } => *index,
            ParseResult::Failure { index } => *index,
        }
    }

    /// Consumes the result, returning the value if it is a success.
    pub fn value(self) -> Option<T> {
        match self {
            ParseResult::Success { value, .. } => Some(value),
            ParseResult::Failure { .. } => None,
        }
    }

    /// Applies `f` to the success value, passing failures through unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U> {
        match self {
            ParseResult::Success { index, value } => success(index, f(value)),
            ParseResult::Failure { index } => failure(index),
        }
    }

    /// Bridges into `std::result::Result` so callers can use `?`.
    pub fn into_result(self) -> Result<T, ParseFailure> {
        match self {
            ParseResult::Success { value, .. } => Ok(value),
            ParseResult::Failure { index } => Err(ParseFailure { offset: index }),
        }
    }
}

/// A match failure lifted into an error value.
///
/// The offset is a unit offset into the input (a byte offset for string
/// input, an element index for token input). Rendering a human-readable
/// message from it is up to the caller; see [`crate::diagnostics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parse failed at offset {offset}")]
pub struct ParseFailure {
    pub offset: usize,
}
