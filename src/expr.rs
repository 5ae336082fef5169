//! Precedence-climbing expression parsing over declared operator tables.
//!
//! A [`PrattBuilder`] takes an atom parser and groups of prefix, infix and
//! postfix operators, declared tightest-binding first, and compiles them
//! into one parser node for the whole expression grammar. Precedence and
//! associativity are encoded as numeric binding powers derived from the
//! declaration order; the minimum power in force at each point of the climb
//! is threaded through the parse state, so the climb composes with every
//! other combinator, including inside its own atom (parenthesized
//! sub-expressions reset the minimum naturally).

use std::rc::Rc;

use crate::input::Input;
use crate::parser::Parser;
use crate::result::{failure, success, ParseResult};
use crate::state::{ParseState, StateValue};

/// State key carrying the minimum binding power during a climb.
pub const MIN_POWER_KEY: &str = "_min_bp";

/// Associativity of an infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

// Combiners with the matched operator value already applied; matching an
// operator yields the closure that folds its operands.
type Combine1<E> = Rc<dyn Fn(E) -> E>;
type Combine2<E> = Rc<dyn Fn(E, E) -> E>;

// ============================================================================
// OPERATOR DECLARATION
// ============================================================================

/// Builds an expression parser from an atom and ordered operator groups.
///
/// Groups declared first bind tightest. Within a group, operators are tried
/// in declaration order, so overlapping matchers (for example `**` and `*`)
/// should be declared longest first.
///
/// ```
/// use kireji::expr::{Assoc, PrattBuilder};
/// use kireji::success;
/// use kireji::text::{literal, pattern};
///
/// let number = pattern("[0-9]+").map(|digits| digits.parse::<i64>().unwrap());
/// let mut builder = PrattBuilder::new(&number);
/// builder.group().infix(&literal("*"), Assoc::Left, |_, a, b| a * b);
/// builder.group().infix(&literal("+"), Assoc::Left, |_, a, b| a + b);
/// let expr = builder.build();
///
/// assert_eq!(expr.parse("12+34*5+67"), success(10, 249));
/// ```
pub struct PrattBuilder<I: Input + ?Sized, E> {
    atom: Parser<I, E>,
    groups: Vec<OperatorGroup<I, E>>,
}

/// One precedence band of operator declarations.
pub struct OperatorGroup<I: Input + ?Sized, E> {
    prefix: Vec<Parser<I, Combine1<E>>>,
    infix: Vec<(Parser<I, Combine2<E>>, Assoc)>,
    postfix: Vec<Parser<I, Combine1<E>>>,
}

impl<I: Input + ?Sized, E: 'static> PrattBuilder<I, E> {
    /// Starts a builder around the parser for the grammar's atoms (numbers,
    /// identifiers, parenthesized sub-expressions and so on).
    pub fn new(atom: &Parser<I, E>) -> Self {
        PrattBuilder {
            atom: atom.clone(),
            groups: Vec::new(),
        }
    }

    /// Appends a group binding looser than every group before it and
    /// returns it for operator declarations.
    pub fn group(&mut self) -> &mut OperatorGroup<I, E> {
        self.groups.push(OperatorGroup::new());
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Inserts a group at `position` in the precedence order.
    ///
    /// Panics if `position` is past the end of the current group list.
    pub fn insert_group(&mut self, position: usize) -> &mut OperatorGroup<I, E> {
        assert!(
            position <= self.groups.len(),
            "group position {position} is out of bounds for {} groups",
            self.groups.len()
        );
        self.groups.insert(position, OperatorGroup::new());
        &mut self.groups[position]
    }

    /// Compiles the declared operators into an expression parser.
    ///
    /// The returned parser resets the minimum binding power to zero for the
    /// duration of each top-level entry, so nesting a built expression
    /// parser inside another grammar (or inside its own atom) behaves.
    pub fn build(&self) -> Parser<I, E> {
        let table = Rc::new(self.compile());
        Parser::strict(
            move |input, index, state| {
                state.scoped(MIN_POWER_KEY, StateValue::Int(0), |state| {
                    climb(&table, input, index, state)
                })
            },
            vec![self.atom.node()],
            Some("expr".to_string()),
        )
    }

    fn compile(&self) -> OperatorTable<I, E> {
        let mut prefix = Vec::new();
        let mut infix = Vec::new();
        let mut postfix = Vec::new();
        let mut power = (self.groups.len() as i64) * 2;
        for group in &self.groups {
            for matcher in &group.prefix {
                prefix.push(PrefixOp {
                    power,
                    matcher: matcher.clone(),
                });
            }
            for (matcher, assoc) in &group.infix {
                let (left_power, right_power) = match assoc {
                    Assoc::Left => (power, power + 1),
                    Assoc::Right => (power + 1, power),
                };
                infix.push(InfixOp {
                    left_power,
                    right_power,
                    matcher: matcher.clone(),
                });
            }
            for matcher in &group.postfix {
                postfix.push(PostfixOp {
                    power,
                    matcher: matcher.clone(),
                });
            }
            power -= 2;
        }
        OperatorTable {
            atom: self.atom.clone(),
            prefix,
            infix,
            postfix,
        }
    }
}

impl<I: Input + ?Sized, E: 'static> OperatorGroup<I, E> {
    fn new() -> Self {
        OperatorGroup {
            prefix: Vec::new(),
            infix: Vec::new(),
            postfix: Vec::new(),
        }
    }

    /// Declares a prefix operator in this band. `apply` receives the
    /// matcher's value and the operand, so one matcher can cover several
    /// spellings and dispatch on what it matched.
    pub fn prefix<M: Clone + 'static>(
        &mut self,
        matcher: &Parser<I, M>,
        apply: impl Fn(M, E) -> E + 'static,
    ) -> &mut Self {
        let apply = Rc::new(apply);
        self.prefix.push(matcher.map(move |op| {
            let apply = Rc::clone(&apply);
            Rc::new(move |operand| apply(op.clone(), operand)) as Combine1<E>
        }));
        self
    }

    /// Declares an infix operator in this band with the given associativity.
    /// `apply` receives the matcher's value and both operands.
    pub fn infix<M: Clone + 'static>(
        &mut self,
        matcher: &Parser<I, M>,
        assoc: Assoc,
        apply: impl Fn(M, E, E) -> E + 'static,
    ) -> &mut Self {
        let apply = Rc::new(apply);
        let entry = matcher.map(move |op| {
            let apply = Rc::clone(&apply);
            Rc::new(move |left, right| apply(op.clone(), left, right)) as Combine2<E>
        });
        self.infix.push((entry, assoc));
        self
    }

    /// Declares a postfix operator in this band. `apply` receives the
    /// matcher's value and the operand.
    pub fn postfix<M: Clone + 'static>(
        &mut self,
        matcher: &Parser<I, M>,
        apply: impl Fn(M, E) -> E + 'static,
    ) -> &mut Self {
        let apply = Rc::new(apply);
        self.postfix.push(matcher.map(move |op| {
            let apply = Rc::clone(&apply);
            Rc::new(move |operand| apply(op.clone(), operand)) as Combine1<E>
        }));
        self
    }

    /// Removes every operator declared in this band.
    pub fn clear(&mut self) -> &mut Self {
        self.prefix.clear();
        self.infix.clear();
        self.postfix.clear();
        self
    }
}

// ============================================================================
// COMPILED TABLE AND CLIMB
// ============================================================================

struct OperatorTable<I: Input + ?Sized, E> {
    atom: Parser<I, E>,
    prefix: Vec<PrefixOp<I, E>>,
    infix: Vec<InfixOp<I, E>>,
    postfix: Vec<PostfixOp<I, E>>,
}

struct PrefixOp<I: Input + ?Sized, E> {
    power: i64,
    matcher: Parser<I, Combine1<E>>,
}

struct InfixOp<I: Input + ?Sized, E> {
    left_power: i64,
    right_power: i64,
    matcher: Parser<I, Combine2<E>>,
}

struct PostfixOp<I: Input + ?Sized, E> {
    power: i64,
    matcher: Parser<I, Combine1<E>>,
}

fn current_min_power(state: &ParseState) -> i64 {
    state
        .get(MIN_POWER_KEY)
        .and_then(StateValue::as_int)
        .unwrap_or(0)
}

// The climb itself follows the shape described in matklad's article:
// https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html
//
// One deliberate wrinkle: when a postfix operator matches below the minimum
// power, the whole loop stops, without giving infix operators a try.
fn climb<I: Input + ?Sized, E: 'static>(
    table: &Rc<OperatorTable<I, E>>,
    input: &I,
    index: usize,
    state: &mut ParseState,
) -> ParseResult<E> {
    let min_power = current_min_power(state);
    let mut latest = index;
    let mut left;

    match try_prefix(table, input, latest, state) {
        Some((next, power, apply)) => {
            latest = next;
            let operand = state.scoped(MIN_POWER_KEY, StateValue::Int(power), |state| {
                climb(table, input, latest, state)
            });
            match operand {
                ParseResult::Success { index, value } => {
                    left = apply(value);
                    latest = index;
                }
                ParseResult::Failure { index } => return failure(index),
            }
        }
        None => match table.atom.exec(input, latest, state) {
            ParseResult::Success { index, value } => {
                left = value;
                latest = index;
            }
            ParseResult::Failure { index } => return failure(index),
        },
    }

    while latest < input.len() {
        if let Some((next, power, apply)) = try_postfix(table, input, latest, state) {
            if power < min_power {
                break;
            }
            left = apply(left);
            latest = next;
            continue;
        }
        match try_infix(table, input, latest, state) {
            Some((next, left_power, right_power, apply)) => {
                if left_power < min_power {
                    break;
                }
                latest = next;
                let right = state.scoped(MIN_POWER_KEY, StateValue::Int(right_power), |state| {
                    climb(table, input, latest, state)
                });
                match right {
                    ParseResult::Success { index, value } => {
                        left = apply(left, value);
                        latest = index;
                    }
                    ParseResult::Failure { index } => return failure(index),
                }
            }
            None => break,
        }
    }

    success(latest, left)
}

type PrefixHit<E> = (usize, i64, Combine1<E>);
type InfixHit<E> = (usize, i64, i64, Combine2<E>);

fn try_prefix<I: Input + ?Sized, E: 'static>(
    table: &OperatorTable<I, E>,
    input: &I,
    index: usize,
    state: &mut ParseState,
) -> Option<PrefixHit<E>> {
    for op in &table.prefix {
        if let ParseResult::Success { index: next, value } = op.matcher.exec(input, index, state) {
            return Some((next, op.power, value));
        }
    }
    None
}

fn try_infix<I: Input + ?Sized, E: 'static>(
    table: &OperatorTable<I, E>,
    input: &I,
    index: usize,
    state: &mut ParseState,
) -> Option<InfixHit<E>> {
    for op in &table.infix {
        if let ParseResult::Success { index: next, value } = op.matcher.exec(input, index, state) {
            return Some((next, op.left_power, op.right_power, value));
        }
    }
    None
}

fn try_postfix<I: Input + ?Sized, E: 'static>(
    table: &OperatorTable<I, E>,
    input: &I,
    index: usize,
    state: &mut ParseState,
) -> Option<PrefixHit<E>> {
    for op in &table.postfix {
        if let ParseResult::Success { index: next, value } = op.matcher.exec(input, index, state) {
            return Some((next, op.power, value));
        }
    }
    None
}
