//! The parser node: the opaque, composable unit the whole engine is built
//! from.
//!
//! ## Node model
//!
//! A [`Parser`] is a cheap-to-clone handle onto a shared node. A node is
//! either *strict* (a pure handler from input, position and state to a
//! [`ParseResult`], plus child handles kept for introspection and an optional
//! tag used by tracing) or *lazy* (a thunk producing a parser, resolved and
//! memoized on first evaluation). Laziness is what makes cyclic grammars
//! possible: a rule can reference another rule that does not exist yet, as
//! long as nothing forces the thunk during construction.
//!
//! Nodes are immutable once built. Grammars are assembled once, up front,
//! and reused for every parse call; running a parser allocates results and
//! state frames, never grammar structure.
//!
//! ## Tracing
//!
//! When `state.trace` is set and a node carries a tag, evaluation prints
//! `enter`, `match` and `fail` lines with the current position. The wrapper
//! is transparent to results and can only be bypassed by omitting the tag.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::combinators;
use crate::input::Input;
use crate::result::{failure, success, ParseResult};
use crate::state::{ParseState, StateValue};

// ============================================================================
// NODE STRUCTURE
// ============================================================================

type Handler<I, T> = dyn Fn(&I, usize, &mut ParseState) -> ParseResult<T>;
type Thunk<I, T> = dyn FnOnce() -> Parser<I, T>;

/// A composable parser over input `I` producing values of type `T`.
///
/// Handles share their node, so cloning is cheap and combinator methods take
/// `&self`. Sharing uses `Rc`: the engine is single-threaded by design and
/// parsers are intentionally not `Send`.
pub struct Parser<I: Input + ?Sized, T> {
    node: Rc<Node<I, T>>,
}

struct Node<I: Input + ?Sized, T> {
    tag: Option<String>,
    kind: Kind<I, T>,
}

enum Kind<I: Input + ?Sized, T> {
    Strict {
        handler: Rc<Handler<I, T>>,
        children: Vec<NodeRef<I>>,
    },
    Lazy {
        thunk: RefCell<Option<Box<Thunk<I, T>>>>,
        resolved: OnceCell<Parser<I, T>>,
    },
}

impl<I: Input + ?Sized, T> Clone for Parser<I, T> {
    fn clone(&self) -> Self {
        Parser {
            node: Rc::clone(&self.node),
        }
    }
}

impl<I: Input + ?Sized, T> fmt::Debug for Parser<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("tag", &self.node.tag)
            .finish_non_exhaustive()
    }
}

/// A match located by [`Parser::find`] or [`Parser::find_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found<T> {
    pub start: usize,
    pub end: usize,
    pub value: T,
}

/// Parser over string input; positions are byte offsets.
pub type StringParser<T> = Parser<str, T>;

/// Parser over pre-tokenized input; positions are element indexes.
pub type TokenParser<U, T> = Parser<[U], T>;

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl<I: Input + ?Sized, T: 'static> Parser<I, T> {
    /// Wraps a raw handler function as a parser.
    ///
    /// The handler receives the whole input, the position to start matching
    /// at, and the mutable state, and must uphold the result contract: a
    /// success index never precedes the start position, and the input is
    /// never mutated.
    pub fn new(handler: impl Fn(&I, usize, &mut ParseState) -> ParseResult<T> + 'static) -> Self {
        Self::strict(handler, Vec::new(), None)
    }

    pub(crate) fn strict(
        handler: impl Fn(&I, usize, &mut ParseState) -> ParseResult<T> + 'static,
        children: Vec<NodeRef<I>>,
        tag: Option<String>,
    ) -> Self {
        Parser {
            node: Rc::new(Node {
                tag,
                kind: Kind::Strict {
                    handler: Rc::new(handler),
                    children,
                },
            }),
        }
    }

    /// Defers construction until first evaluation, memoizing the result.
    ///
    /// The thunk must not be forced during its own construction; a thunk
    /// that (transitively) evaluates its own parser while building it
    /// panics instead of diverging.
    pub fn lazy(thunk: impl FnOnce() -> Parser<I, T> + 'static) -> Self {
        Self::lazy_tagged(thunk, None)
    }

    pub(crate) fn lazy_tagged(
        thunk: impl FnOnce() -> Parser<I, T> + 'static,
        tag: Option<String>,
    ) -> Self {
        Parser {
            node: Rc::new(Node {
                tag,
                kind: Kind::Lazy {
                    thunk: RefCell::new(Some(Box::new(thunk))),
                    resolved: OnceCell::new(),
                },
            }),
        }
    }

    /// Returns a parser identical to this one but carrying `name` as its
    /// diagnostic tag, making it visible to tracing.
    pub fn tag(&self, name: impl Into<String>) -> Parser<I, T> {
        let inner = self.clone();
        Parser::strict(
            move |input, index, state| inner.exec(input, index, state),
            vec![self.node()],
            Some(name.into()),
        )
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

impl<I: Input + ?Sized, T: 'static> Parser<I, T> {
    /// Evaluates this parser at `index`, resolving lazy nodes on demand.
    ///
    /// This is the low-level entry point: it matches a prefix and reports
    /// how far it got, without requiring the input to be fully consumed.
    pub fn exec(&self, input: &I, index: usize, state: &mut ParseState) -> ParseResult<T> {
        match &self.node.tag {
            Some(tag) if state.trace => {
                println!("{:<6}enter {}", index, tag);
                let result = self.dispatch(input, index, state);
                match &result {
                    ParseResult::Success { index: end, .. } => {
                        println!("{:<6}match {}", format!("{}:{}", index, end), tag);
                    }
                    ParseResult::Failure { .. } => {
                        println!("{:<6}fail {}", index, tag);
                    }
                }
                result
            }
            _ => self.dispatch(input, index, state),
        }
    }

    fn dispatch(&self, input: &I, index: usize, state: &mut ParseState) -> ParseResult<T> {
        match &self.node.kind {
            Kind::Strict { handler, .. } => handler(input, index, state),
            Kind::Lazy { thunk, resolved } => {
                let parser = resolved.get_or_init(|| {
                    let build = thunk
                        .borrow_mut()
                        .take()
                        .expect("lazy parser was forced during its own resolution");
                    build()
                });
                parser.exec(input, index, state)
            }
        }
    }

    /// Matches against the whole input with a fresh state, failing if the
    /// parser succeeds but leaves unconsumed input.
    pub fn parse(&self, input: &I) -> ParseResult<T> {
        let mut state = ParseState::new();
        self.parse_with_state(input, &mut state)
    }

    /// Like [`Parser::parse`], with a caller-seeded state. Needed when the
    /// grammar reads state entries (for example through `cond` or `when`),
    /// or to turn tracing on.
    pub fn parse_with_state(&self, input: &I, state: &mut ParseState) -> ParseResult<T> {
        self.skip(&combinators::eof()).exec(input, 0, state)
    }

    /// Scans forward from the start of the input and returns the first
    /// position where this parser matches.
    pub fn find(&self, input: &I) -> Option<Found<T>> {
        self.find_with_state(input, &ParseState::new())
    }

    /// Like [`Parser::find`], cloning `state` for each attempt so attempts
    /// cannot observe one another's mutations.
    pub fn find_with_state(&self, input: &I, state: &ParseState) -> Option<Found<T>> {
        for start in 0..input.len() {
            let mut attempt = state.clone();
            if let ParseResult::Success { index, value } = self.exec(input, start, &mut attempt) {
                return Some(Found {
                    start,
                    end: index,
                    value,
                });
            }
        }
        None
    }

    /// Collects every non-overlapping match in the input, resuming after
    /// each match's end (or one unit forward when a match is empty or an
    /// attempt fails).
    pub fn find_all(&self, input: &I) -> Vec<Found<T>> {
        self.find_all_with_state(input, &ParseState::new())
    }

    pub fn find_all_with_state(&self, input: &I, state: &ParseState) -> Vec<Found<T>> {
        let mut found = Vec::new();
        let mut start = 0;
        while start < input.len() {
            let mut attempt = state.clone();
            match self.exec(input, start, &mut attempt) {
                ParseResult::Success { index, value } => {
                    found.push(Found {
                        start,
                        end: index,
                        value,
                    });
                    start = if index > start { index } else { start + 1 };
                }
                ParseResult::Failure { .. } => start += 1,
            }
        }
        found
    }
}

// ============================================================================
// METHOD COMBINATORS
// ============================================================================

impl<I: Input + ?Sized, T: 'static> Parser<I, T> {
    /// Applies a pure function to the matched value. Failures pass through
    /// untouched, so `p.map(|v| v)` behaves exactly like `p`.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Parser<I, U> {
        let inner = self.clone();
        Parser::strict(
            move |input, index, state| inner.exec(input, index, state).map(|value| f(value)),
            vec![self.node()],
            None,
        )
    }

    /// Discards the structured value and yields the raw input slice covered
    /// by the match instead.
    pub fn text(&self) -> Parser<I, I::Slice> {
        let inner = self.clone();
        Parser::strict(
            move |input, index, state| match inner.exec(input, index, state) {
                ParseResult::Success { index: end, .. } => success(end, input.slice(index, end)),
                ParseResult::Failure { index } => failure(index),
            },
            vec![self.node()],
            None,
        )
    }

    /// Greedy repetition requiring at least `min` matches.
    ///
    /// Repetition stops at the first failing attempt; that failure is not an
    /// error, but accumulating fewer than `min` values is. An iteration that
    /// succeeds without consuming input ends the repetition instead of
    /// looping forever; its value is discarded.
    pub fn many(&self, min: usize) -> Parser<I, Vec<T>> {
        self.repeat_impl(min, None, None)
    }

    /// Repetition with inclusive bounds: fails if fewer than `min` or more
    /// than `max` values were accumulated.
    pub fn many_bounded(&self, min: usize, max: usize) -> Parser<I, Vec<T>> {
        self.repeat_impl(min, Some(max), None)
    }

    /// Repetition guarded by a terminator: before each iteration the
    /// terminator is probed (zero-width), and the repetition stops cleanly
    /// at it without consuming it.
    pub fn many_until<U: 'static>(
        &self,
        min: usize,
        terminator: &Parser<I, U>,
    ) -> Parser<I, Vec<T>> {
        let probe = combinators::peek(terminator).map(|_| ());
        self.repeat_impl(min, None, Some(probe))
    }

    fn repeat_impl(
        &self,
        min: usize,
        max: Option<usize>,
        terminator: Option<Parser<I, ()>>,
    ) -> Parser<I, Vec<T>> {
        let mut children = vec![self.node()];
        if let Some(probe) = &terminator {
            children.push(probe.node());
        }
        let item = self.clone();
        Parser::strict(
            move |input, index, state| {
                let mut accum = Vec::new();
                let mut latest = index;
                while latest < input.len() {
                    if let Some(probe) = &terminator {
                        if probe.exec(input, latest, state).is_success() {
                            break;
                        }
                    }
                    match item.exec(input, latest, state) {
                        ParseResult::Success { index: next, value } => {
                            if next == latest {
                                break;
                            }
                            accum.push(value);
                            latest = next;
                        }
                        ParseResult::Failure { .. } => break,
                    }
                }
                if accum.len() < min {
                    return failure(latest);
                }
                if max.is_some_and(|max| accum.len() > max) {
                    return failure(latest);
                }
                success(latest, accum)
            },
            children,
            None,
        )
    }

    /// Makes the match optional: yields `Some(value)` on success and `None`
    /// at the original position when the child fails.
    pub fn option(&self) -> Parser<I, Option<T>> {
        let inner = self.clone();
        Parser::strict(
            move |input, start, state| match inner.exec(input, start, state) {
                ParseResult::Success { index, value } => success(index, Some(value)),
                ParseResult::Failure { .. } => success(start, None),
            },
            vec![self.node()],
            None,
        )
    }

    /// Runs this parser with a scoped state entry: `compute` derives the new
    /// value from the current state, the value is installed at `key` for the
    /// duration of the sub-parse, and the previous entry (present or absent)
    /// is restored afterwards, on success and on failure alike.
    pub fn with_state(
        &self,
        key: impl Into<String>,
        compute: impl Fn(&ParseState) -> StateValue + 'static,
    ) -> Parser<I, T> {
        let inner = self.clone();
        let key = key.into();
        Parser::strict(
            move |input, index, state| {
                let value = compute(state);
                state.scoped(&key, value, |state| inner.exec(input, index, state))
            },
            vec![self.node()],
            None,
        )
    }

    /// Sequences two parsers, pairing their values.
    pub fn then<U: 'static>(&self, other: &Parser<I, U>) -> Parser<I, (T, U)> {
        let first = self.clone();
        let second = other.clone();
        Parser::strict(
            move |input, index, state| match first.exec(input, index, state) {
                ParseResult::Success { index: mid, value: a } => {
                    match second.exec(input, mid, state) {
                        ParseResult::Success { index: end, value: b } => success(end, (a, b)),
                        ParseResult::Failure { index } => failure(index),
                    }
                }
                ParseResult::Failure { index } => failure(index),
            },
            vec![self.node(), other.node()],
            None,
        )
    }

    /// Sequences two parsers, keeping the left value.
    pub fn skip<U: 'static>(&self, other: &Parser<I, U>) -> Parser<I, T> {
        self.then(other).map(|(a, _)| a)
    }

    /// Sequences two parsers, keeping the right value.
    pub fn skip_left<U: 'static>(&self, other: &Parser<I, U>) -> Parser<I, U> {
        self.then(other).map(|(_, b)| b)
    }
}

// ============================================================================
// INTROSPECTION
// ============================================================================

/// A type-erased handle to a parser node, exposing the structure a grammar
/// was assembled from.
pub struct NodeRef<I: Input + ?Sized> {
    node: Rc<dyn NodeInfo<I>>,
}

impl<I: Input + ?Sized> Clone for NodeRef<I> {
    fn clone(&self) -> Self {
        NodeRef {
            node: Rc::clone(&self.node),
        }
    }
}

impl<I: Input + ?Sized> NodeRef<I> {
    pub fn tag(&self) -> Option<&str> {
        self.node.tag()
    }

    /// Child nodes this node was built from. A lazy node reports its
    /// resolution's children, or none if it has not been evaluated yet.
    pub fn children(&self) -> Vec<NodeRef<I>> {
        self.node.children()
    }
}

impl<I: Input + ?Sized> fmt::Debug for NodeRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("tag", &self.tag())
            .finish_non_exhaustive()
    }
}

trait NodeInfo<I: Input + ?Sized> {
    fn tag(&self) -> Option<&str>;
    fn children(&self) -> Vec<NodeRef<I>>;
}

impl<I: Input + ?Sized, T: 'static> NodeInfo<I> for Node<I, T> {
    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn children(&self) -> Vec<NodeRef<I>> {
        match &self.kind {
            Kind::Strict { children, .. } => children.clone(),
            Kind::Lazy { resolved, .. } => resolved
                .get()
                .map(|parser| parser.children())
                .unwrap_or_default(),
        }
    }
}

impl<I: Input + ?Sized, T: 'static> Parser<I, T> {
    /// Type-erased handle to this parser's node.
    pub fn node(&self) -> NodeRef<I> {
        NodeRef {
            node: Rc::clone(&self.node) as Rc<dyn NodeInfo<I>>,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.node.tag.as_deref()
    }

    pub fn children(&self) -> Vec<NodeRef<I>> {
        self.node.children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::literal;

    #[test]
    fn test_map_transforms_value() {
        let parser = literal("7").map(|digits| digits.parse::<i64>().unwrap());
        assert_eq!(parser.exec("7!", 0, &mut ParseState::new()), success(1, 7));
    }

    #[test]
    fn test_text_captures_covered_slice() {
        let parser = literal("a").then(&literal("b")).text();
        assert_eq!(
            parser.exec("xab", 1, &mut ParseState::new()),
            success(3, "ab".to_string())
        );
    }

    #[test]
    fn test_many_is_greedy_and_checks_min() {
        let parser = literal("a").many(1);
        let mut state = ParseState::new();
        assert_eq!(
            parser.exec("aaa", 0, &mut state),
            success(3, vec!["a".to_string(), "a".to_string(), "a".to_string()])
        );
        assert_eq!(parser.exec("b", 0, &mut state), failure(0));
    }

    #[test]
    fn test_many_bounded_rejects_overflow() {
        let parser = literal("a").many_bounded(1, 2);
        let mut state = ParseState::new();
        assert_eq!(parser.exec("aaa", 0, &mut state), failure(3));
        assert!(parser.exec("aa", 0, &mut state).is_success());
    }

    #[test]
    fn test_many_until_leaves_terminator_unconsumed() {
        let item = crate::text::any_char().map(String::from);
        let parser = item.many_until(1, &literal(";"));
        assert_eq!(
            parser.exec("ab;c", 0, &mut ParseState::new()),
            success(2, vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_many_stops_on_empty_match() {
        let empty = crate::combinators::succeed::<str, ()>(());
        let parser = empty.many(0);
        assert_eq!(
            parser.exec("abc", 0, &mut ParseState::new()),
            success(0, Vec::new())
        );
    }

    #[test]
    fn test_option_never_fails() {
        let parser = literal("a").option();
        let mut state = ParseState::new();
        assert_eq!(
            parser.exec("a", 0, &mut state),
            success(1, Some("a".to_string()))
        );
        assert_eq!(parser.exec("b", 0, &mut state), success(0, None));
    }

    #[test]
    fn test_parse_requires_full_consumption() {
        let parser = literal("ab");
        assert_eq!(parser.parse("ab"), success(2, "ab".to_string()));
        assert_eq!(parser.parse("abc"), failure(2));
    }

    #[test]
    fn test_find_locates_first_match() {
        let parser = literal("b");
        let found = parser.find("aabba");
        assert_eq!(
            found,
            Some(Found {
                start: 2,
                end: 3,
                value: "b".to_string()
            })
        );
    }

    #[test]
    fn test_find_all_resumes_after_matches() {
        let parser = literal("ab");
        let found = parser.find_all("abxab");
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start, found[0].end), (0, 2));
        assert_eq!((found[1].start, found[1].end), (3, 5));
    }

    #[test]
    fn test_lazy_resolves_once_on_first_use() {
        let parser: Parser<str, String> = Parser::lazy(|| literal("x"));
        let mut state = ParseState::new();
        assert_eq!(parser.exec("x", 0, &mut state), success(1, "x".to_string()));
        assert_eq!(parser.exec("y", 0, &mut state), failure(0));
    }

    #[test]
    fn test_trace_wrapper_is_transparent() {
        let parser = literal("a").tag("letter");
        let mut traced = ParseState::new();
        traced.trace = true;
        let mut silent = ParseState::new();
        assert_eq!(
            parser.exec("ab", 0, &mut traced),
            parser.exec("ab", 0, &mut silent)
        );
        assert_eq!(
            parser.exec("b", 0, &mut traced),
            parser.exec("b", 0, &mut silent)
        );
    }

    #[test]
    fn test_node_introspection_sees_children_and_tags() {
        let parser = literal("a").then(&literal("b")).tag("pair");
        assert_eq!(parser.tag_name(), Some("pair"));
        let node = parser.node();
        assert_eq!(node.tag(), Some("pair"));
        let children = node.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].children().len(), 2);
    }

    #[test]
    fn test_skip_and_skip_left_select_sides() {
        let left = literal("a").skip(&literal("b"));
        let right = literal("a").skip_left(&literal("b"));
        let mut state = ParseState::new();
        assert_eq!(left.exec("ab", 0, &mut state), success(2, "a".to_string()));
        assert_eq!(right.exec("ab", 0, &mut state), success(2, "b".to_string()));
    }
}
