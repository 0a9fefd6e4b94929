//! This module defines the `Machine` struct, which executes a compiled `Program` against a
//! sparse tape. It handles the machine's state, head movement, the step budget, wildcard
//! memoization, and zooming across runs of identical symbols.

use crate::program::{Action, Program};
use crate::tape::Tape;
use crate::types::{
    Budget, Direction, ExecutionOptions, RunOutcome, Status, StepBudgetExceeded, StepOutcome,
    DEFAULT_START_STATE,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A single-tape Turing machine.
///
/// The program is shared and never mutated; everything a run changes (tape, head, state,
/// step counter, resolved wildcard rules) lives in the machine itself, so any number of
/// machines can execute the same `Arc<Program>` concurrently.
#[derive(Debug, Clone)]
pub struct Machine {
    program: Arc<Program>,
    options: ExecutionOptions,
    budget: Budget,
    state: Arc<str>,
    head: i64,
    tape: Tape,
    steps: f64,
    status: Status,
    /// Wildcard rules already resolved for a concrete symbol, keyed by state.
    resolved: FxHashMap<Arc<str>, FxHashMap<char, Action>>,
    start_state: Arc<str>,
    start_head: i64,
    start_tape: Tape,
}

impl Machine {
    /// Creates a machine in the default start state with its head at position 0.
    pub fn new(program: impl Into<Arc<Program>>, tape: Tape) -> Self {
        let state: Arc<str> = Arc::from(DEFAULT_START_STATE);
        Self {
            program: program.into(),
            options: ExecutionOptions::default(),
            budget: Budget::Unlimited,
            state: Arc::clone(&state),
            head: 0,
            tape: tape.clone(),
            steps: 0.0,
            status: Status::Running,
            resolved: FxHashMap::default(),
            start_state: state,
            start_head: 0,
            start_tape: tape,
        }
    }

    /// Creates a machine whose tape holds `input` from position 0.
    pub fn from_input(program: impl Into<Arc<Program>>, input: &str) -> Self {
        Self::new(program, Tape::from_symbols(input.chars(), 0))
    }

    /// Creates a machine whose tape holds `count` tally symbols from position 0.
    pub fn from_tally(program: impl Into<Arc<Program>>, count: usize) -> Self {
        Self::new(program, Tape::tally(count))
    }

    /// Places the head at `head` instead of 0.
    ///
    /// A move past either end of the `i64` range leaves the head on the last position.
    pub fn with_head(mut self, head: i64) -> Self {
        self.head = head;
        self.start_head = head;
        self
    }

    /// Starts in `state` instead of the default start state.
    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Arc::from(state);
        self.start_state = Arc::clone(&self.state);
        self
    }

    /// Sets the budget enforced by `step`.
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options.sanitized();
        self
    }

    /// Executes a single step.
    ///
    /// The budget is checked before anything else, so an overrun is reported on the
    /// first attempt after the counter reaches the limit.
    ///
    /// # Returns
    ///
    /// * `Ok(StepOutcome::Continued)` if a rule was applied.
    /// * `Ok(StepOutcome::Halted)` if no rule matches; the machine stays halted.
    /// * `Err(StepBudgetExceeded)` once the budget is spent; the machine stays inspectable.
    pub fn step(&mut self) -> Result<StepOutcome, StepBudgetExceeded> {
        match self.status {
            Status::Halted => return Ok(StepOutcome::Halted),
            Status::BudgetExceeded => return Err(self.overrun()),
            Status::Running => {}
        }

        if self.budget.is_exhausted(self.steps) {
            self.status = Status::BudgetExceeded;
            log::debug!(
                "budget exhausted after {:.2} steps in state {}",
                self.steps,
                self.state
            );
            return Err(self.overrun());
        }

        let read = self.tape.read(self.head);
        let (write, direction, next) = match self.fetch(read) {
            Action::Apply {
                write,
                direction,
                next,
            } => (write, direction, next),
            Action::Halt => {
                self.status = Status::Halted;
                log::debug!(
                    "halted after {:.2} steps in state {} reading {:?}",
                    self.steps,
                    self.state,
                    read
                );
                return Ok(StepOutcome::Halted);
            }
        };

        let cost = if self.options.zoom && direction != Direction::Stay && next == self.state {
            self.zoom(direction, read, write)
        } else {
            self.tape.write(self.head, write);
            self.head = self.head.saturating_add(direction.offset());
            self.state = next;
            1.0
        };

        self.steps += cost;
        Ok(StepOutcome::Continued)
    }

    /// Runs until the machine halts or the step counter reaches `budget`.
    pub fn run(&mut self, budget: Budget) -> RunOutcome {
        self.run_traced(budget, |_| {})
    }

    /// Like `run`, but calls `trace` with the machine before every attempted step.
    pub fn run_traced<F>(&mut self, budget: Budget, mut trace: F) -> RunOutcome
    where
        F: FnMut(&Machine),
    {
        self.budget = budget;

        loop {
            trace(self);

            match self.step() {
                Ok(StepOutcome::Continued) => continue,
                Ok(StepOutcome::Halted) => return RunOutcome::HaltedNormally,
                Err(overrun) => return RunOutcome::BudgetExceeded(overrun),
            }
        }
    }

    /// Finds the action for the current state reading `symbol`.
    ///
    /// Exact rules come from the program. A wildcard match is concretized once and then
    /// served from `resolved` for every later visit to the same state and symbol.
    fn fetch(&mut self, symbol: char) -> Action {
        if let Some(transition) = self.program.exact(&self.state, symbol) {
            return transition.concretize(symbol);
        }

        if let Some(action) = self
            .resolved
            .get(&*self.state)
            .and_then(|actions| actions.get(&symbol))
        {
            return action.clone();
        }

        match self.program.wildcard(&self.state) {
            Some(transition) => {
                let action = transition.concretize(symbol);
                self.resolved
                    .entry(Arc::clone(&self.state))
                    .or_default()
                    .insert(symbol, action.clone());
                action
            }
            None => Action::Halt,
        }
    }

    /// Applies a state-preserving move across the whole run of `read` symbols starting
    /// at the head, leaving the head on the first cell that differs. Returns the cost.
    fn zoom(&mut self, direction: Direction, read: char, write: char) -> f64 {
        let offset = direction.offset();
        let limit = self.options.zoom_limit;
        let mut run = 0u64;

        while run < limit && self.tape.read(self.head) == read {
            if write != read {
                self.tape.write(self.head, write);
            }
            run += 1;

            let Some(head) = self.head.checked_add(offset) else {
                log::warn!(
                    "zoom in state {} stopped at the end of the tape (head {})",
                    self.state,
                    self.head
                );
                return run as f64 * self.options.zoom_cost;
            };
            self.head = head;
        }

        if self.tape.read(self.head) == read {
            log::warn!(
                "zoom in state {} stopped at the {} cell limit (head {})",
                self.state,
                limit,
                self.head
            );
        }
        log::trace!("zoomed {} cells {:?} to head {}", run, direction, self.head);

        run as f64 * self.options.zoom_cost
    }

    fn overrun(&self) -> StepBudgetExceeded {
        StepBudgetExceeded {
            steps: self.steps,
            budget: self.budget.limit().unwrap_or(u64::MAX),
            state: self.state.to_string(),
            head: self.head,
        }
    }

    /// Restores the initial tape, head and state, and clears the step counter.
    pub fn reset(&mut self) {
        self.state = Arc::clone(&self.start_state);
        self.head = self.start_head;
        self.tape = self.start_tape.clone();
        self.steps = 0.0;
        self.status = Status::Running;
        self.resolved.clear();
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// Returns the step counter. Zoomed cells count fractionally.
    pub fn steps(&self) -> f64 {
        self.steps
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Number of wildcard rules resolved for a concrete symbol so far.
    pub fn resolved_wildcards(&self) -> usize {
        self.resolved.values().map(|actions| actions.len()).sum()
    }

    /// The cells around the head; the head cell is at index `options.context`.
    pub fn window(&self) -> Vec<char> {
        self.tape.render(self.head, self.options.context)
    }

    /// The head-centred window as a space-separated string.
    pub fn show_tape(&self) -> String {
        self.tape.show(self.head, self.options.context)
    }

    pub fn to_string_trimmed(&self) -> String {
        self.tape.to_string_trimmed()
    }

    /// Counts the consecutive `tally` symbols at the left end of the tape.
    pub fn count(&self, tally: char) -> usize {
        self.tape.count_leading(tally)
    }
}
