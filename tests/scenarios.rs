//! End-to-end scenarios: compile a rule table, run it, read the tape.

use tapeworm::{
    compile, Budget, CodeError, Machine, ProgramManager, RunOutcome, Status, Tape, BLANK, TALLY,
};

const DOUBLE: &str = "
# double a string of 1s
0 1 0 l 1
1 _ 1 r 2
1 1 1 l 1
2 0 1 r 0
2 1 1 r 2
";

#[test]
fn double_three_tallies() {
    let mut machine = Machine::from_tally(compile(DOUBLE).unwrap(), 3);

    assert_eq!(machine.run(Budget::Steps(10_000)), RunOutcome::HaltedNormally);
    assert_eq!(machine.count(TALLY), 6);
}

#[test]
fn switch_bits() {
    let program = ProgramManager::get_program_by_name("switch").unwrap();
    let mut machine = Machine::from_input(program, "1010");

    assert!(machine.run(Budget::Unlimited).is_halted());
    assert_eq!(machine.to_string_trimmed(), "0101");
}

#[test]
fn self_loop_exceeds_budget_on_zero() {
    let mut machine = Machine::from_input(compile("0 0 0 x 0").unwrap(), "0");

    let outcome = machine.run(Budget::Steps(1_000));
    assert!(matches!(outcome, RunOutcome::BudgetExceeded(_)));
    assert_eq!(machine.status(), Status::BudgetExceeded);

    // The machine is still inspectable after the overrun.
    assert_eq!(machine.to_string_trimmed(), "0");
    assert_eq!(machine.state(), "0");
}

#[test]
fn self_loop_halts_without_zero_at_head() {
    let program = compile("0 0 0 x 0").unwrap();

    for input in ["", "1", "10", "_0"] {
        let mut machine = Machine::from_input(program.clone(), input);
        assert!(
            machine.run(Budget::Steps(1_000)).is_halted(),
            "input {input:?} should halt"
        );
    }
}

#[test]
fn three_fields_on_line_one() {
    let error = compile("0 1 0\n").unwrap_err();

    assert_eq!(error, CodeError::TooFewFields { count: 3, line: 1 });
    assert_eq!(error.to_string(), "too few fields (3) on line 1");
}

#[test]
fn invalid_direction_reports_token_and_line() {
    let source = "# header\n\n0 1 1 r 0\n0 0 0 q 0\n";
    let error = compile(source).unwrap_err();

    assert_eq!(
        error,
        CodeError::InvalidDirection {
            token: "q".into(),
            line: 4
        }
    );
}

#[test]
fn head_start_and_custom_state() {
    let program = compile("s _ 1 r s\ns 1 1 x done").unwrap();
    let tape = Tape::from_symbols("1".chars(), 3);
    let mut machine = Machine::new(program, tape).with_head(-2).with_state("s");

    assert!(machine.run(Budget::Unlimited).is_halted());
    assert_eq!(machine.state(), "done");
    assert_eq!(machine.head(), 3);
    assert_eq!(machine.to_string_trimmed(), "111111");
}

#[test]
fn trace_sees_every_step_without_changing_the_run() {
    let program = compile(DOUBLE).unwrap();

    let mut traced = Machine::from_tally(program.clone(), 4);
    let mut lines = Vec::new();
    traced.run_traced(Budget::Unlimited, |m| lines.push(m.show_tape()));

    let mut plain = Machine::from_tally(program, 4);
    plain.run(Budget::Unlimited);

    assert!(!lines.is_empty());
    assert_eq!(traced.to_string_trimmed(), plain.to_string_trimmed());
    assert_eq!(traced.steps(), plain.steps());
    assert!(lines[0].split(' ').all(|cell| cell.chars().count() == 1));
    assert_eq!(lines[0].split(' ').filter(|&c| c == BLANK.to_string()).count(), 26);
}

#[test]
fn every_sample_matches_its_table() {
    for name in ProgramManager::list_program_names() {
        let failures = ProgramManager::check(&name).unwrap();
        assert!(failures.is_empty(), "{name}: {failures:?}");
    }
}
