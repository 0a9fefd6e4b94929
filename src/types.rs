//! This module defines the shared vocabulary of the simulator: reserved symbols and
//! tunable constants, head directions, step and run outcomes, step budgets,
//! execution options, and the error types for each phase (compilation, execution, loading).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::Rule;

/// The symbol held by every tape cell that has never been written.
pub const BLANK: char = '_';
/// The unary counting symbol used by tally inputs and `count`.
pub const TALLY: char = '1';
/// Rule-table token matching any symbol (read position) or echoing it (write position).
pub const WILDCARD: char = '*';
/// The state a machine starts in unless told otherwise.
pub const DEFAULT_START_STATE: &str = "0";
/// Number of cells shown on each side of the head when the tape is viewed.
pub const CONTEXT: usize = 15;
/// Longest run a single zoom may cover before it stops at the boundary.
pub const ZOOM_LIMIT: u64 = 99_999;
/// Step-counter cost of one zoomed cell, relative to one dispatched step.
pub const ZOOM_COST: f64 = 1.0 / 3.0;
/// The maximum allowed size for a rule table in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Recognizes a direction token from a rule table.
    ///
    /// Right: `r R 1 → » >`, left: `l L -1 ← « <`, stay: `x X 0`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "r" | "R" | "1" | "→" | "»" | ">" => Some(Self::Right),
            "l" | "L" | "-1" | "←" | "«" | "<" => Some(Self::Left),
            "x" | "X" | "0" => Some(Self::Stay),
            _ => None,
        }
    }

    /// The change in head position caused by this direction.
    pub fn offset(self) -> i64 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
            Self::Stay => 0,
        }
    }
}

/// Lifecycle of a machine. `Halted` and `BudgetExceeded` are terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Running,
    Halted,
    BudgetExceeded,
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A rule was applied and the machine can keep going.
    Continued,
    /// No rule matched the current state and symbol.
    Halted,
}

/// Represents the outcome of running a machine until it stops.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The machine reached a state/symbol pair with no rule.
    HaltedNormally,
    /// The step counter reached the budget first.
    BudgetExceeded(StepBudgetExceeded),
}

impl RunOutcome {
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::HaltedNormally)
    }

    /// Treats a budget overrun as an error, for callers that expect termination.
    pub fn into_result(self) -> Result<(), StepBudgetExceeded> {
        match self {
            Self::HaltedNormally => Ok(()),
            Self::BudgetExceeded(e) => Err(e),
        }
    }
}

/// Upper bound on the step counter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    #[default]
    Unlimited,
    Steps(u64),
}

impl Budget {
    /// Whether a counter at `steps` may not attempt another step.
    pub fn is_exhausted(self, steps: f64) -> bool {
        match self {
            Self::Unlimited => false,
            Self::Steps(limit) => steps >= limit as f64,
        }
    }

    pub fn limit(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Steps(limit) => Some(limit),
        }
    }
}

impl From<u64> for Budget {
    fn from(limit: u64) -> Self {
        Self::Steps(limit)
    }
}

impl From<Option<u64>> for Budget {
    fn from(limit: Option<u64>) -> Self {
        limit.map_or(Self::Unlimited, Self::Steps)
    }
}

/// Execution tuning knobs. Every field falls back to its default when omitted
/// from a serialized configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Collapse runs of state-preserving moves into a single scan.
    pub zoom: bool,
    /// Maximum cells covered by one zoom.
    pub zoom_limit: u64,
    /// Counter cost of each zoomed cell.
    pub zoom_cost: f64,
    /// Cells shown on each side of the head by `Machine::window`.
    pub context: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            zoom: true,
            zoom_limit: ZOOM_LIMIT,
            zoom_cost: ZOOM_COST,
            context: CONTEXT,
        }
    }
}

impl ExecutionOptions {
    /// Options with zooming turned off: every cell is a dispatched step.
    pub fn single_step() -> Self {
        Self {
            zoom: false,
            ..Self::default()
        }
    }

    /// Clamps values that would stop a zoom from advancing the head or the counter.
    pub fn sanitized(mut self) -> Self {
        self.zoom_limit = self.zoom_limit.max(1);
        self.zoom_cost = if self.zoom_cost > 0.0 {
            self.zoom_cost.min(1.0)
        } else {
            ZOOM_COST
        };
        self
    }
}

/// Errors raised while compiling a rule table. Each names the 1-based source line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeError {
    #[error("too few fields ({count}) on line {line}")]
    TooFewFields { count: usize, line: usize },
    #[error("too many fields ({count}) on line {line}")]
    TooManyFields { count: usize, line: usize },
    #[error("invalid direction '{token}' on line {line}")]
    InvalidDirection { token: String, line: usize },
    #[error("symbol '{token}' is not a single character on line {line}")]
    InvalidSymbol { token: String, line: usize },
    #[error("rule table syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
}

impl CodeError {
    /// The source line the error was raised on, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::TooFewFields { line, .. }
            | Self::TooManyFields { line, .. }
            | Self::InvalidDirection { line, .. }
            | Self::InvalidSymbol { line, .. } => Some(*line),
            Self::Syntax(e) => match e.line_col {
                pest::error::LineColLocation::Pos((line, _))
                | pest::error::LineColLocation::Span((line, _), _) => Some(line),
            },
        }
    }
}

/// The step counter reached the caller's budget. The machine stays inspectable.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("step budget of {budget} exhausted after {steps:.2} steps (state {state}, head {head})")]
pub struct StepBudgetExceeded {
    pub steps: f64,
    pub budget: u64,
    pub state: String,
    pub head: i64,
}

/// Errors raised while loading rule tables or the embedded sample suite.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("program is {size} bytes, larger than the {MAX_PROGRAM_SIZE} byte limit")]
    TooLarge { size: usize },
    #[error("invalid program: {0}")]
    Code(#[from] CodeError),
    #[error("invalid suite table: {0}")]
    Suite(#[from] serde_json::Error),
    #[error("program '{0}' not found")]
    NotFound(String),
    #[error("sample registry lock poisoned")]
    Lock,
}
