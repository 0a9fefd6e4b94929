//! This module compiles rule-table source text into a `Program`, utilizing the `pest` crate.
//! The grammar in `grammar.pest` splits the source into lines and whitespace-separated
//! fields with comments removed; this module checks each line's shape and builds the table.

use crate::{
    program::{Program, Read, Write},
    types::{CodeError, Direction, WILDCARD},
};
use pest::{iterators::Pair, Parser as PestParser};
use pest_derive::Parser as PestParser;

/// Number of fields in a rule: `state0 read write direction state1`.
const FIELD_COUNT: usize = 5;

/// Derives a `PestParser` for the rule-table grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct RuleTableParser;

/// Compiles rule-table source text into a `Program`.
///
/// Lines are numbered from 1. Blank and comment-only lines are skipped; the first
/// malformed line aborts compilation. A later rule for the same state and read
/// symbol replaces an earlier one.
///
/// # Returns
///
/// * `Ok(Program)` if every non-blank line is a valid rule.
/// * `Err(CodeError)` naming the first offending line otherwise.
pub fn compile(source: &str) -> Result<Program, CodeError> {
    let tables = RuleTableParser::parse(Rule::table, source).map_err(Box::new)?;
    let lines = tables
        .flat_map(|table| table.into_inner())
        .filter(|pair| pair.as_rule() == Rule::line);

    let mut program = Program::new();
    for (index, line) in lines.enumerate() {
        if let Some(rule) = parse_line(line, index + 1)? {
            program.insert(
                &rule.state,
                rule.read,
                rule.write,
                rule.direction,
                &rule.next,
            );
        }
    }

    log::debug!(
        "compiled {} rules over {} states",
        program.rule_count(),
        program.states().len()
    );

    Ok(program)
}

/// Parses one source line. Returns `Ok(None)` for lines without fields.
fn parse_line(pair: Pair<Rule>, line: usize) -> Result<Option<ParsedRule>, CodeError> {
    let fields: Vec<&str> = pair.into_inner().map(|field| field.as_str()).collect();

    if fields.is_empty() {
        return Ok(None);
    }

    let [state, read, write, direction, next] = fields.as_slice() else {
        let count = fields.len();
        return Err(if count < FIELD_COUNT {
            CodeError::TooFewFields { count, line }
        } else {
            CodeError::TooManyFields { count, line }
        });
    };

    Ok(Some(ParsedRule {
        state: unescape(state),
        read: parse_read(read, line)?,
        write: parse_write(write, line)?,
        direction: parse_direction(direction, line)?,
        next: unescape(next),
    }))
}

/// Parses a direction token.
fn parse_direction(token: &str, line: usize) -> Result<Direction, CodeError> {
    Direction::from_token(token).ok_or_else(|| CodeError::InvalidDirection {
        token: token.to_string(),
        line,
    })
}

/// Parses the read field. A bare wildcard matches any symbol.
fn parse_read(token: &str, line: usize) -> Result<Read, CodeError> {
    if is_wildcard(token) {
        return Ok(Read::Any);
    }
    parse_symbol(token, line).map(Read::Symbol)
}

/// Parses the write field. A bare wildcard writes back the symbol that was read.
fn parse_write(token: &str, line: usize) -> Result<Write, CodeError> {
    if is_wildcard(token) {
        return Ok(Write::Same);
    }
    parse_symbol(token, line).map(Write::Symbol)
}

fn is_wildcard(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next() == Some(WILDCARD) && chars.next().is_none()
}

/// Parses a single-character symbol, resolving escapes first.
fn parse_symbol(token: &str, line: usize) -> Result<char, CodeError> {
    let symbol = unescape(token);
    let mut chars = symbol.chars();

    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CodeError::InvalidSymbol {
            token: token.to_string(),
            line,
        }),
    }
}

/// Drops the backslash in front of escaped characters (`\#` reads as `#`).
fn unescape(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next().unwrap_or('\\')),
            _ => out.push(c),
        }
    }

    out
}

/// A helper struct to temporarily hold a parsed rule.
struct ParsedRule {
    state: String,
    read: Read,
    write: Write,
    direction: Direction,
    next: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Action;
    use std::sync::Arc;

    fn apply(write: char, direction: Direction, next: &str) -> Action {
        Action::Apply {
            write,
            direction,
            next: Arc::from(next),
        }
    }

    #[test]
    fn test_compile_simple_program() {
        let program = compile("0 1 0 l 1\n1 _ 1 r 2\n").unwrap();

        assert_eq!(program.rule_count(), 2);
        assert_eq!(program.action("0", '1'), apply('0', Direction::Left, "1"));
        assert_eq!(program.action("1", '_'), apply('1', Direction::Right, "2"));
        assert_eq!(program.action("2", '_'), Action::Halt);
    }

    #[test]
    fn test_compile_empty_source() {
        let program = compile("").unwrap();
        assert!(program.is_empty());

        let program = compile("\n\n   \n\t\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_comments_are_stripped() {
        let input = r#"
# full-line comment
; another one
    # indented comment
0 1 0 r 0 # trailing comment
0 _ _ x 1; trailing with no space
"#;
        let program = compile(input).unwrap();

        assert_eq!(program.rule_count(), 2);
        assert_eq!(program.action("0", '_'), apply('_', Direction::Stay, "1"));
    }

    #[test]
    fn test_comment_hides_fields() {
        // Only three fields remain once the comment is removed.
        let result = compile("0 1 0 # r 0");
        assert_eq!(result.unwrap_err(), CodeError::TooFewFields { count: 3, line: 1 });
    }

    #[test]
    fn test_escaped_comment_character() {
        let program = compile(r"0 \# \; r 0").unwrap();
        assert_eq!(program.action("0", '#'), apply(';', Direction::Right, "0"));
    }

    #[test]
    fn test_whitespace_runs_and_tabs() {
        let program = compile("  0\t\t1   0 \t r    1  \r\n").unwrap();
        assert_eq!(program.action("0", '1'), apply('0', Direction::Right, "1"));
    }

    #[test]
    fn test_lone_carriage_return_is_whitespace() {
        let error = compile("0 1 0 r 0\r0 1 0\n").unwrap_err();
        assert_eq!(error, CodeError::TooManyFields { count: 8, line: 1 });

        let error = compile("0 1 0 r 0\r\n0 1 0\r\n").unwrap_err();
        assert_eq!(error, CodeError::TooFewFields { count: 3, line: 2 });
    }

    #[test]
    fn test_too_few_fields() {
        let error = compile("0 1 0\n").unwrap_err();

        assert_eq!(error, CodeError::TooFewFields { count: 3, line: 1 });
        assert!(error.to_string().ends_with("on line 1"));
    }

    #[test]
    fn test_too_many_fields() {
        let error = compile("0 1 0 r 1\n0 _ 1 r 1 extra\n").unwrap_err();
        assert_eq!(error, CodeError::TooManyFields { count: 6, line: 2 });
    }

    #[test]
    fn test_error_line_counts_blank_and_comment_lines() {
        let input = "\n# comment\n0 1 1 r 0\n\n; more\n0 _ 1 r\n0 0 0 r 0";
        let error = compile(input).unwrap_err();

        assert_eq!(error, CodeError::TooFewFields { count: 4, line: 6 });
        assert_eq!(error.line(), Some(6));
    }

    #[test]
    fn test_invalid_direction() {
        let error = compile("0 1 1 r 0\n0 0 1 q 0").unwrap_err();

        assert_eq!(
            error,
            CodeError::InvalidDirection {
                token: "q".into(),
                line: 2
            }
        );
        assert!(error.to_string().contains("'q'"));
    }

    #[test]
    fn test_direction_aliases() {
        let input = "a 1 1 R a\nb 1 1 -1 b\nc 1 1 0 c\nd 1 1 → d\ne 1 1 « e\nf 1 1 X f";
        let program = compile(input).unwrap();

        assert_eq!(program.exact("a", '1').unwrap().direction, Direction::Right);
        assert_eq!(program.exact("b", '1').unwrap().direction, Direction::Left);
        assert_eq!(program.exact("c", '1').unwrap().direction, Direction::Stay);
        assert_eq!(program.exact("d", '1').unwrap().direction, Direction::Right);
        assert_eq!(program.exact("e", '1').unwrap().direction, Direction::Left);
        assert_eq!(program.exact("f", '1').unwrap().direction, Direction::Stay);
    }

    #[test]
    fn test_multi_character_symbol() {
        let error = compile("0 11 1 r 0").unwrap_err();
        assert_eq!(
            error,
            CodeError::InvalidSymbol {
                token: "11".into(),
                line: 1
            }
        );
    }

    #[test]
    fn test_duplicate_rule_last_wins() {
        let program = compile("0 1 a r 0\n0 1 b l 1\n").unwrap();

        assert_eq!(program.rule_count(), 1);
        assert_eq!(program.action("0", '1'), apply('b', Direction::Left, "1"));
    }

    #[test]
    fn test_wildcard_rules() {
        let program = compile("0 * * r 0\n0 _ 1 x done\n1 * x l 1\n").unwrap();

        assert_eq!(program.wildcard("0").unwrap().write, Write::Same);
        assert_eq!(program.action("0", 'q'), apply('q', Direction::Right, "0"));
        assert_eq!(program.action("0", '_'), apply('1', Direction::Stay, "done"));
        assert_eq!(program.action("1", '0'), apply('x', Direction::Left, "1"));
    }

    #[test]
    fn test_escaped_wildcard_is_literal() {
        let program = compile(r"0 \* 1 r 0").unwrap();

        assert!(program.wildcard("0").is_none());
        assert_eq!(program.action("0", '*'), apply('1', Direction::Right, "0"));
        assert_eq!(program.action("0", '1'), Action::Halt);
    }

    #[test]
    fn test_multi_character_states() {
        let program = compile("start 1 1 r scan\nscan _ 1 x halt").unwrap();
        assert_eq!(program.states(), vec!["halt", "scan", "start"]);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let input = "0 1 0 r\n";
        assert_eq!(compile(input).unwrap_err(), compile(input).unwrap_err());
    }
}
