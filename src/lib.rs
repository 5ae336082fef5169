//! kireji: a parser-combinator engine with a precedence-climbing
//! expression builder.
//!
//! Grammars are assembled as graphs of [`Parser`] nodes using the
//! combinators in this crate, then run against string or pre-tokenized
//! input. See [`language()`] for mutually recursive rule sets and
//! [`expr::PrattBuilder`] for expression grammars.

pub mod combinators;
pub mod diagnostics;
pub mod expr;
pub mod input;
pub mod language;
pub mod parser;
pub mod result;
pub mod state;
pub mod text;
pub mod tokens;

pub use crate::combinators::{
    choice, cond, eof, lazy, not, peek, sep, seq, seq_select, sof, succeed, when,
};
pub use crate::input::Input;
pub use crate::language::{language, LanguageBuilder, RuleSet};
pub use crate::parser::{Found, NodeRef, Parser, StringParser, TokenParser};
pub use crate::result::{failure, success, ParseFailure, ParseResult};
pub use crate::state::{ParseState, StateValue};
