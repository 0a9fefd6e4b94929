//! Built-in sample programs and the harness that checks them against their expectation
//! tables. Inputs are either a tally count (the harness compares the tally count left on
//! the tape) or a literal tape (the harness compares the trimmed tape).

use crate::machine::Machine;
use crate::parser::compile;
use crate::program::Program;
use crate::types::{Budget, LoadError, RunOutcome, TALLY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Step budget used when checking samples. Enough for every sample that halts.
pub const SUITE_STEP_LIMIT: u64 = 999_999;

// Default embedded programs
const PROGRAM_TEXTS: [(&str, &str); 7] = [
    ("two-ones", include_str!("../programs/two-ones.tm")),
    ("double", include_str!("../programs/double.tm")),
    ("double-with-0", include_str!("../programs/double-with-0.tm")),
    ("switch", include_str!("../programs/switch.tm")),
    ("halt-iff-0", include_str!("../programs/halt-iff-0.tm")),
    ("unary-to-binary", include_str!("../programs/unary-to-binary.tm")),
    ("mark-end", include_str!("../programs/mark-end.tm")),
];

const SUITE_TABLE: &str = include_str!("../programs/suite.json");

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Sample>> = RwLock::new(Vec::new());
}

/// A machine input: a number of tallies or a literal tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input {
    Tally(usize),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    BudgetExceeded,
}

/// What a case should produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    Tally(usize),
    Tape(String),
    Outcome { outcome: ExpectedOutcome },
}

/// What a run actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Tally(usize),
    Tape(String),
    BudgetExceeded,
}

impl PartialEq<Observed> for Expected {
    fn eq(&self, observed: &Observed) -> bool {
        match (self, observed) {
            (Self::Tally(a), Observed::Tally(b)) => a == b,
            (Self::Tape(a), Observed::Tape(b)) => a == b,
            (
                Self::Outcome {
                    outcome: ExpectedOutcome::BudgetExceeded,
                },
                Observed::BudgetExceeded,
            ) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub input: Input,
    pub expect: Expected,
}

/// A case whose observation differed from its expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub case: Case,
    pub observed: Observed,
}

/// A compiled sample with its source and expectation table.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: &'static str,
    pub source: &'static str,
    pub program: Arc<Program>,
    pub cases: Vec<Case>,
}

/// Runs `program` on a fresh machine built from `input`.
pub fn run_case(program: &Arc<Program>, input: &Input, budget: Budget) -> Observed {
    let mut machine = match input {
        Input::Tally(count) => Machine::from_tally(Arc::clone(program), *count),
        Input::Text(text) => Machine::from_input(Arc::clone(program), text),
    };

    if let RunOutcome::BudgetExceeded(_) = machine.run(budget) {
        return Observed::BudgetExceeded;
    }

    match input {
        Input::Tally(_) => Observed::Tally(machine.count(TALLY)),
        Input::Text(_) => Observed::Tape(machine.to_string_trimmed()),
    }
}

/// Runs every case and returns the ones that did not match.
pub fn check_cases(program: &Arc<Program>, cases: &[Case], budget: Budget) -> Vec<Failure> {
    cases
        .iter()
        .filter_map(|case| {
            let observed = run_case(program, &case.input, budget);
            (case.expect != observed).then(|| Failure {
                case: case.clone(),
                observed,
            })
        })
        .collect()
}

pub struct ProgramManager;

impl ProgramManager {
    /// Compile the embedded samples and their expectation tables into `PROGRAMS`.
    pub fn load() -> Result<(), LoadError> {
        let mut tables: BTreeMap<String, Vec<Case>> = serde_json::from_str(SUITE_TABLE)?;

        let mut samples = Vec::with_capacity(PROGRAM_TEXTS.len());
        for (name, source) in PROGRAM_TEXTS {
            samples.push(Sample {
                name,
                source,
                program: Arc::new(compile(source)?),
                cases: tables.remove(name).unwrap_or_default(),
            });
        }

        let mut guard = PROGRAMS.write().map_err(|_| LoadError::Lock)?;
        *guard = samples;

        Ok(())
    }

    /// Loads the samples on first use.
    fn ensure_loaded() -> Result<(), LoadError> {
        let loaded = PROGRAMS
            .read()
            .map(|samples| !samples.is_empty())
            .map_err(|_| LoadError::Lock)?;

        if loaded {
            Ok(())
        } else {
            Self::load()
        }
    }

    fn with_sample<T>(name: &str, f: impl FnOnce(&Sample) -> T) -> Result<T, LoadError> {
        Self::ensure_loaded()?;

        PROGRAMS
            .read()
            .map_err(|_| LoadError::Lock)?
            .iter()
            .find(|sample| sample.name == name)
            .map(f)
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }

    /// List all sample names in registration order
    pub fn list_program_names() -> Vec<String> {
        if let Err(e) = Self::ensure_loaded() {
            log::warn!("failed to load samples: {}", e);
        }

        PROGRAMS
            .read()
            .map(|samples| {
                samples
                    .iter()
                    .map(|sample| sample.name.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get a compiled sample by its name
    pub fn get_program_by_name(name: &str) -> Result<Arc<Program>, LoadError> {
        Self::with_sample(name, |sample| Arc::clone(&sample.program))
    }

    /// Get the original text of a sample by its name
    pub fn get_program_text(name: &str) -> Result<&'static str, LoadError> {
        Self::with_sample(name, |sample| sample.source)
    }

    pub fn get_cases(name: &str) -> Result<Vec<Case>, LoadError> {
        Self::with_sample(name, |sample| sample.cases.clone())
    }

    /// Runs a sample's expectation table and returns the failing cases.
    pub fn check(name: &str) -> Result<Vec<Failure>, LoadError> {
        let (program, cases) =
            Self::with_sample(name, |sample| (Arc::clone(&sample.program), sample.cases.clone()))?;

        Ok(check_cases(
            &program,
            &cases,
            Budget::Steps(SUITE_STEP_LIMIT),
        ))
    }
}
