//! The ambient key/value context threaded through every match attempt.
//!
//! Grammars become context-sensitive by reading and scoping entries in a
//! [`ParseState`]: a sub-grammar can be enabled only inside parentheses, or a
//! minimum binding power can be threaded through an expression climb. The
//! state is an explicit parameter, never a global, so sibling branches of an
//! ordered choice cannot observe one another's scoped entries.

use std::collections::HashMap;

/// A value stored in the state map.
///
/// `Null` is a present-but-empty entry and is distinct from an absent key.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl StateValue {
    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            StateValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            StateValue::Float(x) => Some(*x),
            StateValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Int(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        StateValue::Float(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Text(value)
    }
}

/// The mutable context passed alongside the input to every parser.
///
/// Cloning is a full snapshot; searching helpers clone a template state per
/// attempt so attempts stay independent. The `trace` flag turns on the
/// diagnostic enter/match/fail lines for tagged parsers.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    entries: HashMap<String, StateValue>,
    pub trace: bool,
}

impl ParseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Runs `run` with `value` installed at `key`, then restores the previous
    /// entry (present or absent), whatever `run` returned.
    ///
    /// Nested scopes on the same key stack and unstack in LIFO order. This is
    /// the primitive behind [`crate::parser::Parser::with_state`] and the
    /// expression builder's minimum-power threading.
    pub fn scoped<R>(
        &mut self,
        key: &str,
        value: StateValue,
        run: impl FnOnce(&mut ParseState) -> R,
    ) -> R {
        let saved = self.entries.get(key).cloned();
        self.entries.insert(key.to_string(), value);
        let out = run(self);
        match saved {
            Some(previous) => {
                self.entries.insert(key.to_string(), previous);
            }
            None => {
                self.entries.remove(key);
            }
        }
        out
    }
}
