//! Compiled rule tables.
//!
//! A `Program` maps `(state, symbol)` to a `Transition`, with an optional wildcard
//! transition per state that applies to any symbol without an exact entry. Programs
//! are immutable once compiled and can be shared across threads behind an `Arc`.

use crate::types::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// The symbol a rule matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Read {
    Symbol(char),
    /// Matches any symbol without an exact rule for the same state.
    Any,
}

/// The symbol a rule writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Write {
    Symbol(char),
    /// Writes back whatever was read.
    Same,
}

impl Write {
    pub fn resolve(self, read: char) -> char {
        match self {
            Self::Symbol(symbol) => symbol,
            Self::Same => read,
        }
    }
}

/// The right-hand side of a rule: what to write, where to move, and the next state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub write: Write,
    pub direction: Direction,
    pub next: Arc<str>,
}

impl Transition {
    /// Produces the concrete action for this transition applied to `read`.
    pub fn concretize(&self, read: char) -> Action {
        Action::Apply {
            write: self.write.resolve(read),
            direction: self.direction,
            next: Arc::clone(&self.next),
        }
    }
}

/// The resolved outcome of looking up a state and symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Apply {
        write: char,
        direction: Direction,
        next: Arc<str>,
    },
    Halt,
}

/// A compiled Turing machine program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    exact: FxHashMap<Arc<str>, FxHashMap<char, Transition>>,
    wildcards: FxHashMap<Arc<str>, Transition>,
    names: FxHashSet<Arc<str>>,
}

impl Program {
    /// Creates a program with no rules; it halts on every input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, replacing any earlier rule for the same state and read symbol.
    pub fn insert(
        &mut self,
        state: &str,
        read: Read,
        write: Write,
        direction: Direction,
        next: &str,
    ) {
        let state = self.intern(state);
        let transition = Transition {
            write,
            direction,
            next: self.intern(next),
        };

        match read {
            Read::Symbol(symbol) => {
                self.exact
                    .entry(state)
                    .or_default()
                    .insert(symbol, transition);
            }
            Read::Any => {
                self.wildcards.insert(state, transition);
            }
        }
    }

    /// Returns the shared name for `state`, registering it if unseen.
    fn intern(&mut self, state: &str) -> Arc<str> {
        if let Some(name) = self.names.get(state) {
            return Arc::clone(name);
        }

        let name: Arc<str> = Arc::from(state);
        self.names.insert(Arc::clone(&name));
        name
    }

    /// The exact-match transition for `state` reading `symbol`.
    pub fn exact(&self, state: &str, symbol: char) -> Option<&Transition> {
        self.exact.get(state).and_then(|rules| rules.get(&symbol))
    }

    /// The wildcard transition for `state`.
    pub fn wildcard(&self, state: &str) -> Option<&Transition> {
        self.wildcards.get(state)
    }

    /// Resolves `state` reading `symbol`: exact rules win over the wildcard, and a
    /// missing rule means halt.
    pub fn action(&self, state: &str, symbol: char) -> Action {
        self.exact(state, symbol)
            .or_else(|| self.wildcard(state))
            .map_or(Action::Halt, |transition| transition.concretize(symbol))
    }

    /// Number of distinct rules, wildcards included.
    pub fn rule_count(&self) -> usize {
        self.exact.values().map(|rules| rules.len()).sum::<usize>() + self.wildcards.len()
    }

    /// Every state named by the program, sorted.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self.names.iter().map(|name| &**name).collect();
        states.sort_unstable();
        states
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }
}
