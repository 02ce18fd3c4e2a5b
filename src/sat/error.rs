//! Errors surfaced to callers before any search state is built.
//!
//! Conflicts and timeouts are not errors; they are handled inside the search loop
//! and reported through [`Verdict`](crate::sat::solver::Verdict).

use std::io;
use thiserror::Error;

/// A formula that the engine refuses to ingest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// A clause contained the literal `0`, which names no variable.
    #[error("clause {clause} contains the literal 0")]
    ZeroLiteral {
        /// Zero-based index of the offending clause.
        clause: usize,
    },

    /// The clause list itself was empty.
    #[error("formula contains no clauses")]
    Empty,

    /// The literal has no representable negation.
    #[error("literal {literal} is out of range")]
    VariableOutOfRange {
        /// The offending literal.
        literal: i32,
    },
}

/// Failure to read a DIMACS CNF document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying reader failed.
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// The `p` line could not be parsed.
    #[error("line {line}: malformed problem line")]
    InvalidHeader {
        /// One-based line number.
        line: usize,
    },

    /// The `p` line names a format other than `cnf`.
    #[error("line {line}: unsupported format `{format}`, expected `cnf`")]
    UnsupportedFormat {
        /// One-based line number.
        line: usize,
        /// The format named on the problem line.
        format: String,
    },

    /// A clause token was not an integer.
    #[error("line {line}: `{token}` is not a literal")]
    InvalidToken {
        /// One-based line number.
        line: usize,
        /// The token that failed to parse.
        token: String,
    },

    /// A `0` terminated a clause with no literals.
    #[error("line {line}: clause terminator without literals")]
    DuplicateZero {
        /// One-based line number.
        line: usize,
    },

    /// The clauses were read but do not form a valid formula.
    #[error(transparent)]
    Formula(#[from] FormulaError),
}
