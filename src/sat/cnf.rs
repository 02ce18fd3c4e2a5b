#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The input formula, as handed to an engine.
//!
//! A [`Cnf`] is validated on construction: every literal is non-zero and the clause
//! list is non-empty. Clauses themselves may be empty (an unconditional
//! contradiction), tautological, or contain repeated literals; engines cope with all
//! three.

use crate::sat::assignment::Solutions;
use crate::sat::error::FormulaError;
use crate::sat::literal::Literal;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    pub clauses: Vec<Vec<Literal>>,
    /// Highest variable id that occurs. Engines are sized by this.
    pub num_vars: usize,
    /// Variable count declared by a problem line, if any. Declared variables that
    /// never occur are don't-cares in a model.
    pub declared_vars: usize,
}

impl Index<usize> for Cnf {
    type Output = Vec<Literal>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl Cnf {
    /// Validates raw DIMACS clauses.
    ///
    /// # Errors
    ///
    /// [`FormulaError::Empty`] for an empty clause list, [`FormulaError::ZeroLiteral`] if
    /// any clause contains `0` and [`FormulaError::VariableOutOfRange`] for `i32::MIN`.
    pub fn new<I, J>(clauses: I) -> Result<Self, FormulaError>
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = i32>,
    {
        let mut num_vars = 0;
        let mut out = Vec::new();

        for (i, clause) in clauses.into_iter().enumerate() {
            let mut lits = Vec::new();
            for value in clause {
                match value {
                    0 => return Err(FormulaError::ZeroLiteral { clause: i }),
                    i32::MIN => return Err(FormulaError::VariableOutOfRange { literal: value }),
                    _ => {
                        num_vars = num_vars.max(value.unsigned_abs() as usize);
                        lits.push(Literal::from_i32(value));
                    }
                }
            }
            out.push(lits);
        }

        if out.is_empty() {
            return Err(FormulaError::Empty);
        }

        Ok(Self {
            clauses: out,
            num_vars,
            declared_vars: 0,
        })
    }

    /// Records a declared variable count, e.g. from a DIMACS header.
    #[must_use]
    pub const fn with_declared_vars(mut self, declared: usize) -> Self {
        self.declared_vars = declared;
        self
    }

    /// Size of the variable range a model must cover.
    #[must_use]
    pub fn total_vars(&self) -> usize {
        self.num_vars.max(self.declared_vars)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<Literal>> {
        self.clauses.iter()
    }

    #[must_use]
    pub fn literal_count(&self) -> usize {
        self.clauses.iter().map(Vec::len).sum()
    }

    /// Whether `solutions` satisfies every clause. Don't-care variables satisfy nothing.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|&lit| solutions.literal_value(lit) == Some(true))
        })
    }
}

impl TryFrom<Vec<Vec<i32>>> for Cnf {
    type Error = FormulaError;

    fn try_from(value: Vec<Vec<i32>>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.total_vars(), self.clauses.len())?;
        for clause in &self.clauses {
            if clause.is_empty() {
                writeln!(f, "0")?;
            } else {
                writeln!(f, "{} 0", clause.iter().join(" "))?;
            }
        }
        Ok(())
    }
}
