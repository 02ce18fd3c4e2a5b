#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A clause as stored in the clause arena.
//!
//! Besides its literals, every clause carries the incremental bookkeeping used by
//! propagation: the set of variables that are still free, the set of variables whose
//! current value satisfies it, and up to two watched literals.

use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};
use std::ops::Index;

/// Stable index of a clause in the [`ClauseDb`](crate::sat::clause_storage::ClauseDb).
pub type ClauseRef = usize;

pub type Literals = SmallVec<[Literal; 8]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClauseKind {
    #[default]
    Original,
    Learned,
}

/// Result of cleaning up a raw literal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalised {
    /// Distinct variables, in order of first appearance.
    Literals(Literals),
    /// Some variable appears with both polarities.
    Tautology,
}

/// Collapses repeated literals and detects tautologies.
pub fn normalise<I: IntoIterator<Item = Literal>>(literals: I) -> Normalised {
    let mut out = Literals::new();
    for lit in literals {
        if out.contains(&lit) {
            continue;
        }
        if out.contains(&lit.negated()) {
            return Normalised::Tautology;
        }
        out.push(lit);
    }
    Normalised::Literals(out)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clause {
    literals: Literals,
    pub(crate) free_literals: FxHashSet<Variable>,
    pub(crate) satisfied_by: FxHashSet<Variable>,
    pub(crate) watched: [Option<Literal>; 2],
    pub kind: ClauseKind,
    pub activity: f64,
    pub(crate) deleted: bool,
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl Clause {
    /// A clause with every variable free. Literals must already be normalised.
    #[must_use]
    pub fn new(literals: Literals, kind: ClauseKind) -> Self {
        debug_assert!(literals.iter().map(|l| l.variable()).all_unique());
        Self {
            free_literals: literals.iter().map(|l| l.variable()).collect(),
            satisfied_by: FxHashSet::default(),
            watched: [None, None],
            kind,
            activity: 0.0,
            deleted: false,
            literals,
        }
    }

    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn positive(&self) -> impl Iterator<Item = Variable> + '_ {
        self.iter().filter(|l| l.polarity()).map(|l| l.variable())
    }

    pub fn negative(&self) -> impl Iterator<Item = Variable> + '_ {
        self.iter().filter(|l| !l.polarity()).map(|l| l.variable())
    }

    /// The literal of `var` in this clause, if it occurs.
    #[must_use]
    pub fn literal_of(&self, var: Variable) -> Option<Literal> {
        self.iter().copied().find(|l| l.variable() == var)
    }

    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_literals.len()
    }

    #[must_use]
    pub fn is_free(&self, var: Variable) -> bool {
        self.free_literals.contains(&var)
    }

    /// Free literals in clause order.
    pub fn free_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.iter()
            .copied()
            .filter(|l| self.free_literals.contains(&l.variable()))
    }

    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        !self.satisfied_by.is_empty()
    }

    pub fn satisfied_by(&self) -> impl Iterator<Item = Variable> + '_ {
        self.satisfied_by.iter().copied()
    }

    #[must_use]
    pub const fn watched(&self) -> [Option<Literal>; 2] {
        self.watched
    }

    #[must_use]
    pub fn is_watching(&self, lit: Literal) -> bool {
        self.watched.contains(&Some(lit))
    }

    #[must_use]
    pub fn is_learned(&self) -> bool {
        self.kind == ClauseKind::Learned
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Swaps watcher `old` for `new`.
    pub(crate) fn replace_watch(&mut self, old: Literal, new: Literal) {
        if let Some(slot) = self.watched.iter_mut().find(|w| **w == Some(old)) {
            *slot = Some(new);
        }
    }

    /// Puts `lit` in an empty watcher slot. Returns `false` if both slots are taken
    /// or `lit` is already watched.
    pub(crate) fn fill_watch(&mut self, lit: Literal) -> bool {
        if self.is_watching(lit) {
            return false;
        }
        match self.watched.iter_mut().find(|w| w.is_none()) {
            Some(slot) => {
                *slot = Some(lit);
                true
            }
            None => false,
        }
    }

    pub(crate) fn bump_activity(&mut self, amount: f64) {
        self.activity += amount;
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.iter().join(" ∨ "))
    }
}
