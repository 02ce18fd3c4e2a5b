#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A reader for the DIMACS CNF format.
//!
//! - Lines starting with `c` are comments.
//! - The problem line `p cnf <variables> <clauses>` is optional; when present it must
//!   name the `cnf` format and declare at most `i32::MAX` variables. Counts that
//!   disagree with the body are only logged. Nothing is sized from the header:
//!   declared variables that never occur are don't-cares in a model.
//! - Clauses are whitespace-separated literals terminated by `0` and may span lines.
//!   A final clause missing its `0` is accepted at end of input.
//! - A line starting with `%` ends the body.

use crate::sat::cnf::Cnf;
use crate::sat::error::ParseError;
use crate::sat::targets;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    vars: usize,
    clauses: usize,
}

fn parse_header(line: &str, number: usize) -> Result<Header, ParseError> {
    let mut parts = line.split_whitespace().skip(1);
    let format = parts.next().ok_or(ParseError::InvalidHeader { line: number })?;
    if format != "cnf" {
        return Err(ParseError::UnsupportedFormat {
            line: number,
            format: format.to_string(),
        });
    }

    let mut count = || {
        parts
            .next()
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or(ParseError::InvalidHeader { line: number })
    };
    let vars = count()?;
    let clauses = count()?;
    if i32::try_from(vars).is_err() {
        return Err(ParseError::InvalidHeader { line: number });
    }
    Ok(Header { vars, clauses })
}

/// Reads a formula from DIMACS text.
///
/// # Errors
///
/// A [`ParseError`] on I/O failure, a malformed or non-`cnf` problem line, a token
/// that is not an integer, a `0` that terminates no literals, or a formula that
/// [`Cnf::new`] rejects.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, ParseError> {
    let mut header = None;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let trimmed = line.trim_start();

        if trimmed.starts_with('%') {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('p') {
            header = Some(parse_header(trimmed, number)?);
            continue;
        }

        for token in trimmed.split_whitespace() {
            let value: i32 = token.parse().map_err(|_| ParseError::InvalidToken {
                line: number,
                token: token.to_string(),
            })?;
            if value != 0 {
                current.push(value);
            } else if current.is_empty() {
                return Err(ParseError::DuplicateZero { line: number });
            } else {
                clauses.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        clauses.push(current);
    }

    let mut cnf = Cnf::new(clauses)?;
    if let Some(Header { vars, clauses }) = header {
        if cnf.num_vars > vars {
            warn!(
                target: targets::PARSER,
                "problem line declares {vars} variables but variable {} occurs",
                cnf.num_vars
            );
        }
        if cnf.len() != clauses {
            warn!(
                target: targets::PARSER,
                "problem line declares {clauses} clauses but {} were read",
                cnf.len()
            );
        }
        cnf = cnf.with_declared_vars(vars);
    }

    debug!(
        target: targets::PARSER,
        "read {} clauses over {} variables",
        cnf.len(),
        cnf.num_vars
    );
    Ok(cnf)
}

/// Reads a DIMACS file.
///
/// # Errors
///
/// See [`parse_dimacs`]; also fails if the file cannot be opened.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Cnf, ParseError> {
    let file = File::open(path)?;
    parse_dimacs(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::error::FormulaError;
    use crate::sat::literal::Literal;

    fn parse(text: &str) -> Result<Cnf, ParseError> {
        parse_dimacs(text.as_bytes())
    }

    fn lits(v: &[i32]) -> Vec<Literal> {
        v.iter().map(|&l| Literal::from_i32(l)).collect()
    }

    #[test]
    fn test_parse_basic() {
        let cnf = parse("c example\np cnf 4 2\n1 -2 0\n2 3 -1 0\n").unwrap();
        assert_eq!(cnf.clauses, vec![lits(&[1, -2]), lits(&[2, 3, -1])]);
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf.total_vars(), 4);
    }

    #[test]
    fn test_clauses_span_lines() {
        let cnf = parse("p cnf 3 2\n1 2\n-3 0 3\n-1 0\n").unwrap();
        assert_eq!(cnf.clauses, vec![lits(&[1, 2, -3]), lits(&[3, -1])]);
    }

    #[test]
    fn test_trailing_clause_and_percent() {
        let cnf = parse("1 -2 0\n3\n").unwrap();
        assert_eq!(cnf.len(), 2);

        let cnf = parse("1 0\n%\n0\n").unwrap();
        assert_eq!(cnf.len(), 1);
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(
            parse("p dnf 3 1\n1 0\n"),
            Err(ParseError::UnsupportedFormat { line: 1, .. })
        ));
        assert!(matches!(
            parse("c\np cnf x 1\n1 0\n"),
            Err(ParseError::InvalidHeader { line: 2 })
        ));
        assert!(matches!(parse("p\n1 0\n"), Err(ParseError::InvalidHeader { line: 1 })));
    }

    #[test]
    fn test_token_errors() {
        assert!(matches!(
            parse("1 two 0\n"),
            Err(ParseError::InvalidToken { line: 1, ref token }) if token == "two"
        ));
        assert!(matches!(parse("1 0 0\n"), Err(ParseError::DuplicateZero { line: 1 })));
        assert!(matches!(parse("0\n"), Err(ParseError::DuplicateZero { line: 1 })));
    }

    #[test]
    fn test_formula_errors() {
        assert!(matches!(
            parse("c nothing\n"),
            Err(ParseError::Formula(FormulaError::Empty))
        ));
        assert!(matches!(
            parse("-2147483648 0\n"),
            Err(ParseError::Formula(FormulaError::VariableOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_count_mismatch_is_accepted() {
        let cnf = parse("p cnf 2 5\n1 2 3 0\n").unwrap();
        assert_eq!(cnf.len(), 1);
        assert_eq!(cnf.num_vars, 3);
    }

    #[test]
    fn test_display_round_trips() {
        let cnf = parse("p cnf 3 2\n1 -3 0\n2 0\n").unwrap();
        assert_eq!(parse(&cnf.to_string()).unwrap(), cnf);
    }

    #[test]
    fn test_oversized_header_is_not_allocated() {
        use crate::sat::cdcl::Cdcl;
        use crate::sat::solver::{Solver, SolverConfig};

        let cnf = parse("p cnf 2147483647 1\n1 0\n").unwrap();
        assert_eq!(cnf.num_vars, 1);
        assert_eq!(cnf.declared_vars, 2_147_483_647);

        let mut solver = Cdcl::new(&cnf, SolverConfig::default());
        assert_eq!(solver.state().vars().num_vars(), 1);
        let verdict = solver.solve();
        let model = verdict.solutions().unwrap();
        assert_eq!(model.num_vars(), 2_147_483_647);
        assert_eq!(model.value(1), Some(true));
        assert_eq!(model.value(2_147_483_647), None);
        assert!(cnf.verify(model));
    }

    #[test]
    fn test_header_beyond_literal_range() {
        assert!(matches!(
            parse("p cnf 2147483648 1\n1 0\n"),
            Err(ParseError::InvalidHeader { line: 1 })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_file("/nonexistent/formula.cnf"),
            Err(ParseError::Io(_))
        ));
    }
}
