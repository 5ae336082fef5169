//! Named, mutually-referencing grammar rules without forward declarations.
//!
//! Each rule is wrapped in a lazy node keyed by its name. A rule's
//! constructor runs on first evaluation and receives the full rule table, so
//! it may reference any rule, including itself and ones declared later, as
//! long as it only embeds them structurally (inside `seq`, `choice` and
//! friends) and never evaluates them while constructing.
//!
//! Rule graphs intentionally form reference cycles; build a language once
//! and reuse it for the life of the program.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::input::Input;
use crate::parser::Parser;

type RuleInit<I, T> = Box<dyn Fn(&RuleSet<I, T>) -> Parser<I, T>>;
type RuleTable<I, T> = HashMap<String, Parser<I, T>>;

/// Starts collecting rule definitions for a language.
///
/// ```
/// use kireji::text::literal;
/// use kireji::{choice, language, success};
///
/// let lang = language::<str, String>()
///     .rule("item", |r| choice(vec![literal("x"), r.get("group")]))
///     .rule("group", |r| {
///         literal("(")
///             .skip_left(&r.get("item"))
///             .skip(&literal(")"))
///             .map(|inner| format!("[{inner}]"))
///     })
///     .build();
///
/// assert_eq!(lang.get("item").parse("((x))"), success(5, "[[x]]".to_string()));
/// ```
pub fn language<I: Input + ?Sized, T: 'static>() -> LanguageBuilder<I, T> {
    LanguageBuilder { defs: Vec::new() }
}

/// Accumulates `(name, constructor)` pairs until [`LanguageBuilder::build`].
pub struct LanguageBuilder<I: Input + ?Sized, T> {
    defs: Vec<(String, RuleInit<I, T>)>,
}

impl<I: Input + ?Sized, T: 'static> LanguageBuilder<I, T> {
    /// Adds a named rule. The constructor is deferred until the rule is
    /// first evaluated.
    pub fn rule(
        mut self,
        name: impl Into<String>,
        init: impl Fn(&RuleSet<I, T>) -> Parser<I, T> + 'static,
    ) -> Self {
        self.defs.push((name.into(), Box::new(init)));
        self
    }

    /// Wraps every rule in a lazy node tagged with its name and wires the
    /// shared rule table the constructors will see.
    ///
    /// Panics if two rules share a name.
    pub fn build(self) -> RuleSet<I, T> {
        let mut inits: HashMap<String, RuleInit<I, T>> = HashMap::new();
        for (name, init) in self.defs {
            let previous = inits.insert(name.clone(), init);
            assert!(previous.is_none(), "duplicate rule name: {name}");
        }
        let inits = Rc::new(inits);

        // The table the thunks capture is filled in right after the lazy
        // nodes are created; no thunk can run before `build` returns.
        let slot: Rc<RefCell<Option<Rc<RuleTable<I, T>>>>> = Rc::new(RefCell::new(None));
        let mut rules = RuleTable::new();
        for name in inits.keys() {
            let thunk = {
                let inits = Rc::clone(&inits);
                let slot = Rc::clone(&slot);
                let name = name.clone();
                move || {
                    let table = slot
                        .borrow()
                        .clone()
                        .expect("rule table is populated before any rule can run");
                    let set = RuleSet { rules: table };
                    let init = &inits[name.as_str()];
                    init(&set)
                }
            };
            rules.insert(name.clone(), Parser::lazy_tagged(thunk, Some(name.clone())));
        }
        let rules = Rc::new(rules);
        *slot.borrow_mut() = Some(Rc::clone(&rules));
        RuleSet { rules }
    }
}

/// The read-only table of a language's rules.
pub struct RuleSet<I: Input + ?Sized, T> {
    rules: Rc<RuleTable<I, T>>,
}

impl<I: Input + ?Sized, T> Clone for RuleSet<I, T> {
    fn clone(&self) -> Self {
        RuleSet {
            rules: Rc::clone(&self.rules),
        }
    }
}

impl<I: Input + ?Sized, T: 'static> RuleSet<I, T> {
    /// Returns the named rule. Panics on an unknown name; referencing a rule
    /// that was never defined is a construction error, not a parse failure.
    pub fn get(&self, name: &str) -> Parser<I, T> {
        match self.rules.get(name) {
            Some(rule) => rule.clone(),
            None => panic!("unknown rule: {name}"),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}
