//! Free-function combinators: sequencing, ordered choice, lookahead,
//! state-gated parsers and the input-generic endpoints.
//!
//! Everything here is a pure function from parsers to a new parser; nothing
//! mutates its inputs. The n-ary combinators (`seq`, `choice`, `sep`) are
//! homogeneous over one value type; heterogeneous composition goes through
//! the typed pair adapters on [`Parser`] (`then`, `skip`, `skip_left`).

use crate::input::Input;
use crate::parser::Parser;
use crate::result::{failure, success, ParseResult};
use crate::state::ParseState;

/// Always succeeds with a clone of `value`, consuming nothing.
pub fn succeed<I: Input + ?Sized, T: Clone + 'static>(value: T) -> Parser<I, T> {
    Parser::new(move |_input, index, _state| success(index, value.clone()))
}

/// Matches every parser in order, each starting where the previous one
/// stopped, and collects their values.
///
/// The first failing child aborts the sequence immediately, propagating that
/// child's failure index; there is no backtracking past an already-succeeded
/// child.
pub fn seq<I: Input + ?Sized, T: 'static>(parsers: Vec<Parser<I, T>>) -> Parser<I, Vec<T>> {
    let children = parsers.iter().map(Parser::node).collect();
    Parser::strict(
        move |input, index, state| {
            let mut values = Vec::with_capacity(parsers.len());
            let mut latest = index;
            for parser in &parsers {
                match parser.exec(input, latest, state) {
                    ParseResult::Success { index, value } => {
                        latest = index;
                        values.push(value);
                    }
                    ParseResult::Failure { index } => return failure(index),
                }
            }
            success(latest, values)
        },
        children,
        None,
    )
}

/// Like [`seq`], keeping only the value at `select`.
///
/// Panics at construction time if `select` is out of bounds.
pub fn seq_select<I: Input + ?Sized, T: 'static>(
    parsers: Vec<Parser<I, T>>,
    select: usize,
) -> Parser<I, T> {
    assert!(
        select < parsers.len(),
        "selector index {select} is out of bounds for {} parsers",
        parsers.len()
    );
    seq(parsers).map(move |mut values| values.swap_remove(select))
}

/// Ordered choice: tries every parser at the same start position and commits
/// to the first success.
///
/// Earlier alternatives shadow later ones even if a later one would match
/// more input. When every alternative fails, the failure is reported at the
/// original start position, not at the deepest sub-failure.
pub fn choice<I: Input + ?Sized, T: 'static>(parsers: Vec<Parser<I, T>>) -> Parser<I, T> {
    let children = parsers.iter().map(Parser::node).collect();
    Parser::strict(
        move |input, index, state| {
            for parser in &parsers {
                let result = parser.exec(input, index, state);
                if result.is_success() {
                    return result;
                }
            }
            failure(index)
        },
        children,
        None,
    )
}

/// Positive lookahead: succeeds with the child's value but consumes nothing.
///
/// Failure is reported at the lookahead's own position, not at whatever
/// depth the child reached.
pub fn peek<I: Input + ?Sized, T: 'static>(parser: &Parser<I, T>) -> Parser<I, T> {
    let inner = parser.clone();
    Parser::strict(
        move |input, index, state| match inner.exec(input, index, state) {
            ParseResult::Success { value, .. } => success(index, value),
            ParseResult::Failure { .. } => failure(index),
        },
        vec![parser.node()],
        None,
    )
}

/// Negative lookahead: succeeds, consuming nothing, iff the child fails.
pub fn not<I: Input + ?Sized, T: 'static>(parser: &Parser<I, T>) -> Parser<I, ()> {
    let inner = parser.clone();
    Parser::strict(
        move |input, index, state| {
            if inner.exec(input, index, state).is_success() {
                failure(index)
            } else {
                success(index, ())
            }
        },
        vec![parser.node()],
        None,
    )
}

/// Zero-width assertion on the state: succeeds iff `predicate` holds.
pub fn cond<I: Input + ?Sized>(
    predicate: impl Fn(&ParseState) -> bool + 'static,
) -> Parser<I, ()> {
    Parser::new(move |_input, index, state| {
        if predicate(state) {
            success(index, ())
        } else {
            failure(index)
        }
    })
}

/// Runs `parser` only while `predicate` holds on the state, failing at the
/// current position otherwise.
pub fn when<I: Input + ?Sized, T: 'static>(
    predicate: impl Fn(&ParseState) -> bool + 'static,
    parser: &Parser<I, T>,
) -> Parser<I, T> {
    let inner = parser.clone();
    Parser::strict(
        move |input, index, state| {
            if predicate(state) {
                inner.exec(input, index, state)
            } else {
                failure(index)
            }
        },
        vec![parser.node()],
        None,
    )
}

/// One item followed by any number of (separator, item) pairs, requiring at
/// least `min` items in total.
///
/// Panics at construction time if `min` is zero.
pub fn sep<I: Input + ?Sized, T: 'static, S: 'static>(
    item: &Parser<I, T>,
    separator: &Parser<I, S>,
    min: usize,
) -> Parser<I, Vec<T>> {
    assert!(min >= 1, "sep requires a minimum of at least one item");
    let rest = separator.skip_left(item).many(min - 1);
    item.then(&rest).map(|(first, mut rest)| {
        let mut items = Vec::with_capacity(rest.len() + 1);
        items.push(first);
        items.append(&mut rest);
        items
    })
}

/// Free-function form of [`Parser::lazy`].
pub fn lazy<I: Input + ?Sized, T: 'static>(
    thunk: impl FnOnce() -> Parser<I, T> + 'static,
) -> Parser<I, T> {
    Parser::lazy(thunk)
}

/// Matches only at the end of the input, consuming nothing.
pub fn eof<I: Input + ?Sized>() -> Parser<I, ()> {
    Parser::new(|input: &I, index, _state| {
        if index >= input.len() {
            success(index, ())
        } else {
            failure(index)
        }
    })
}

/// Matches only at the start of the input, consuming nothing.
pub fn sof<I: Input + ?Sized>() -> Parser<I, ()> {
    Parser::new(|_input, index, _state| {
        if index == 0 {
            success(index, ())
        } else {
            failure(index)
        }
    })
}
