use clap::Parser;
use std::error::Error;
use std::io::{self, Read};
use std::iter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tapeworm::{
    Budget, ExecutionOptions, Machine, Program, ProgramLoader, ProgramManager, RunOutcome, Tape,
    DEFAULT_START_STATE, TALLY,
};

/// Runs a quintuple Turing machine rule table and prints the final tape.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tapeworm-cli programs/double.tm -n 3
  tapeworm-cli programs/switch.tm -i 1010 -d
  cat programs/switch.tm | tapeworm-cli -i 0110
  tapeworm-cli --sample unary-to-binary -n 19
  tapeworm-cli --check")]
struct Cli {
    /// Rule table file. Read from stdin when omitted and stdin is piped.
    program: Option<PathBuf>,

    /// Run a built-in sample program instead of a file
    #[clap(long, conflicts_with = "program")]
    sample: Option<String>,

    /// Initial tape contents, written from the head position onwards
    #[clap(short, long, conflicts_with = "tallies")]
    input: Option<String>,

    /// Start with this many tally symbols and print the tally count
    #[clap(short = 'n', long)]
    tallies: Option<usize>,

    /// Initial head position
    #[clap(long, default_value_t = 0, allow_hyphen_values = true)]
    head: i64,

    /// Initial state
    #[clap(short, long, default_value = DEFAULT_START_STATE)]
    state: String,

    /// Step budget (unlimited when omitted)
    #[clap(short, long)]
    limit: Option<u64>,

    /// Dispatch every cell separately instead of zooming over runs
    #[clap(long)]
    no_zoom: bool,

    /// Print the tape around the head before each step
    #[clap(short = 'd', long)]
    debug: bool,

    /// Check every built-in sample against its expectation table
    #[clap(long, exclusive = true)]
    check: bool,

    /// List the built-in samples
    #[clap(long, exclusive = true)]
    list: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for name in ProgramManager::list_program_names() {
            println!("{name}");
        }
        return ExitCode::SUCCESS;
    }

    if cli.check {
        return check_samples();
    }

    let program = match load_program(&cli) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    let tape = match (&cli.input, cli.tallies) {
        (_, Some(count)) => Tape::from_symbols(iter::repeat(TALLY).take(count), cli.head),
        (Some(input), None) => Tape::from_symbols(input.chars(), cli.head),
        (None, None) => Tape::new(),
    };

    let options = if cli.no_zoom {
        ExecutionOptions::single_step()
    } else {
        ExecutionOptions::default()
    };

    let mut machine = Machine::new(program, tape)
        .with_head(cli.head)
        .with_state(&cli.state)
        .with_options(options);
    let budget = Budget::from(cli.limit);

    let outcome = if cli.debug {
        machine.run_traced(budget, |m| {
            println!("{:>10.2} {:>8} | {}", m.steps(), m.state(), m.show_tape());
        })
    } else {
        machine.run(budget)
    };

    if cli.tallies.is_some() {
        println!("{}", machine.count(TALLY));
    } else {
        println!("{}", machine.to_string_trimmed());
    }

    match outcome {
        RunOutcome::HaltedNormally => ExitCode::SUCCESS,
        RunOutcome::BudgetExceeded(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Loads the rule table named on the command line.
///
/// It tries a built-in sample, then a file path, then stdin when it is piped.
fn load_program(cli: &Cli) -> Result<Arc<Program>, Box<dyn Error>> {
    let program = if let Some(name) = &cli.sample {
        ProgramManager::get_program_by_name(name)?
    } else if let Some(path) = &cli.program {
        Arc::new(ProgramLoader::load_program(path)?)
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Arc::new(ProgramLoader::load_program_from_string(&buffer)?)
    } else {
        return Err(
            "no program given: pass a file, --sample NAME, or pipe a rule table on stdin".into(),
        );
    };

    log::debug!(
        "loaded {} rules over {} states",
        program.rule_count(),
        program.states().len()
    );

    Ok(program)
}

/// Runs every sample's expectation table and prints one line per sample.
fn check_samples() -> ExitCode {
    let mut failed = false;

    for name in ProgramManager::list_program_names() {
        match ProgramManager::check(&name) {
            Ok(failures) if failures.is_empty() => println!("ok      {name}"),
            Ok(failures) => {
                failed = true;
                println!("FAILED  {name}");
                for failure in failures {
                    println!(
                        "        input {:?}: expected {:?}, got {:?}",
                        failure.case.input, failure.case.expect, failure.observed
                    );
                }
            }
            Err(e) => {
                failed = true;
                eprintln!("Error: {name}: {e}");
            }
        }
    }

    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
