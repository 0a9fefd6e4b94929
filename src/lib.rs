//! This crate provides the core of a single-tape Turing machine simulator.
//! It compiles line-oriented quintuple rule tables (`state0 read write direction state1`)
//! into programs, executes them on a sparse two-way tape with run-length "zooming" over
//! repeated symbols, and enforces a step budget for programs that never halt.

pub mod loader;
pub mod machine;
pub mod parser;
pub mod program;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::{LoadedProgram, ProgramLoader};
/// Re-exports the `Machine` struct from the machine module.
pub use machine::Machine;
/// Re-exports the `compile` function from the parser module.
pub use parser::compile;
/// Re-exports the compiled rule table types from the program module.
pub use program::{Action, Program, Read, Transition, Write};
/// Re-exports the sample registry and harness from the programs module.
pub use programs::{run_case, Case, Expected, Input, Observed, ProgramManager, PROGRAMS};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the shared types, constants and errors from the types module.
pub use types::{
    Budget, CodeError, Direction, ExecutionOptions, LoadError, RunOutcome, Status,
    StepBudgetExceeded, StepOutcome, BLANK, DEFAULT_START_STATE, MAX_PROGRAM_SIZE, TALLY,
    WILDCARD,
};
