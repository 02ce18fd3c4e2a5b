#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

/// Variables are numbered from 1, as in DIMACS.
pub type Variable = u32;

/// A variable with a polarity, stored in the DIMACS signed convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(i32);

impl Literal {
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn new(var: Variable, polarity: bool) -> Self {
        debug_assert!(var > 0 && var <= i32::MAX as u32);
        let var = var as i32;
        if polarity { Self(var) } else { Self(-var) }
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        debug_assert!(value != 0 && value != i32::MIN);
        Self(value)
    }

    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    /// `true` for a positive literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Dense index with both polarities of a variable next to each other, for tables
    /// keyed by literal.
    #[must_use]
    pub const fn index(self) -> usize {
        let var = self.variable() as usize;
        if self.polarity() { var * 2 } else { var * 2 + 1 }
    }

    /// Whether this literal is true under `value` for its variable.
    #[must_use]
    pub const fn is_satisfied_by(self, value: bool) -> bool {
        self.polarity() == value
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl From<Literal> for i32 {
    fn from(lit: Literal) -> Self {
        lit.0
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
