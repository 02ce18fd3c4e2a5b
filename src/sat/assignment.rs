#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The variable arena: per-variable assignment state, implication data, occurrence
//! lists and branching activity, plus the [`Solutions`] handed back to callers.
//!
//! The `reason` of a variable is only meaningful while the variable is assigned. It
//! is left in place when the variable is unassigned and is overwritten by the next
//! assignment (forced assignments write their clause, decisions clear it). Conflict
//! analysis runs before any backtracking, so it only ever reads reasons of assigned
//! variables.

use crate::sat::clause::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(b),
            Self::Unassigned => None,
        }
    }
}

/// Everything the engine tracks about one variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableData {
    pub state: VarState,
    /// Clause that forced the current value; `None` for decisions and pure literals.
    pub reason: Option<ClauseRef>,
    /// Decision level of the current assignment, `None` while free.
    pub decision_level: Option<usize>,
    pub positive_occurrences: Vec<ClauseRef>,
    pub negative_occurrences: Vec<ClauseRef>,
    pub activity: f64,
    /// Bumps since the last decay, folded into `activity` by [`VariableStore::decay_activities`].
    pub bumps: u32,
    pub eliminated: bool,
}

/// Arena of [`VariableData`] indexed by [`Variable`]. Slot 0 is unused.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableStore(Vec<VariableData>);

impl Index<Variable> for VariableStore {
    type Output = VariableData;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl VariableStore {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VariableData::default(); num_vars + 1])
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// All variable ids in ascending order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn variables(&self) -> impl Iterator<Item = Variable> + use<> {
        1..=self.num_vars() as Variable
    }

    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self[var].state.value()
    }

    /// Truth value of `lit` under the current assignment.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.value(lit.variable()).map(|v| lit.is_satisfied_by(v))
    }

    #[must_use]
    pub fn is_free(&self, var: Variable) -> bool {
        self[var].state.is_unassigned()
    }

    /// Free and still part of the formula, so a heuristic may branch on it.
    #[must_use]
    pub fn is_decidable(&self, var: Variable) -> bool {
        let data = &self[var];
        data.state.is_unassigned() && !data.eliminated
    }

    #[must_use]
    pub fn decision_level(&self, var: Variable) -> Option<usize> {
        self[var].decision_level
    }

    #[must_use]
    pub fn reason(&self, var: Variable) -> Option<ClauseRef> {
        self[var].reason
    }

    #[must_use]
    pub fn is_eliminated(&self, var: Variable) -> bool {
        self[var].eliminated
    }

    /// Clauses in which `lit` occurs with its own polarity.
    #[must_use]
    pub fn occurrences(&self, lit: Literal) -> &[ClauseRef] {
        let data = &self[lit.variable()];
        if lit.polarity() {
            &data.positive_occurrences
        } else {
            &data.negative_occurrences
        }
    }

    #[must_use]
    pub fn activity(&self, var: Variable) -> f64 {
        self[var].activity
    }

    fn data_mut(&mut self, var: Variable) -> &mut VariableData {
        &mut self.0[var as usize]
    }

    pub(crate) fn set(&mut self, var: Variable, value: bool, level: usize) {
        let data = self.data_mut(var);
        data.state = VarState::Assigned(value);
        data.decision_level = Some(level);
    }

    /// Frees `var`. The reason is kept, see the module docs.
    pub(crate) fn clear(&mut self, var: Variable) {
        let data = self.data_mut(var);
        data.state = VarState::Unassigned;
        data.decision_level = None;
    }

    pub(crate) fn set_reason(&mut self, var: Variable, reason: Option<ClauseRef>) {
        self.data_mut(var).reason = reason;
    }

    pub(crate) fn add_occurrence(&mut self, lit: Literal, clause: ClauseRef) {
        let data = self.data_mut(lit.variable());
        if lit.polarity() {
            data.positive_occurrences.push(clause);
        } else {
            data.negative_occurrences.push(clause);
        }
    }

    pub(crate) fn remove_occurrence(&mut self, lit: Literal, clause: ClauseRef) {
        let data = self.data_mut(lit.variable());
        let list = if lit.polarity() {
            &mut data.positive_occurrences
        } else {
            &mut data.negative_occurrences
        };
        list.retain(|&c| c != clause);
    }

    pub(crate) fn bump(&mut self, var: Variable) {
        let data = self.data_mut(var);
        data.bumps = data.bumps.saturating_add(1);
    }

    pub(crate) fn set_activity(&mut self, var: Variable, activity: f64) {
        self.data_mut(var).activity = activity;
    }

    /// `activity = activity * factor + bumps` for every variable, then clears the bumps.
    pub(crate) fn decay_activities(&mut self, factor: f64) {
        for data in self.0.iter_mut().skip(1) {
            data.activity = data.activity.mul_add(factor, f64::from(data.bumps));
            data.bumps = 0;
        }
    }

    pub(crate) fn mark_eliminated(&mut self, var: Variable) {
        self.data_mut(var).eliminated = true;
    }

    /// Current values of every variable; free ones are reported as `None`.
    #[must_use]
    pub fn solutions(&self) -> Solutions {
        Solutions {
            values: self.0.iter().map(|d| d.state.value()).collect(),
            num_vars: self.num_vars(),
        }
    }
}

/// A (possibly partial) model over variables `1..=num_vars`. `None` marks a
/// variable whose value does not matter.
///
/// Only variables up to the highest one ever set take storage; the rest of the
/// range is reported as don't-care.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions {
    values: Vec<Option<bool>>,
    num_vars: usize,
}

impl Solutions {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: vec![None; num_vars + 1],
            num_vars,
        }
    }

    /// Builds a model from DIMACS literals, sized to hold `num_vars` variables.
    #[must_use]
    pub fn from_literals(num_vars: usize, literals: &[i32]) -> Self {
        let mut solutions = Self::new(num_vars);
        for &l in literals {
            let lit = Literal::from_i32(l);
            solutions.set(lit.variable(), lit.polarity());
        }
        solutions
    }

    /// Extends the range to `num_vars` without allocating for the new variables.
    #[must_use]
    pub fn with_declared_vars(mut self, num_vars: usize) -> Self {
        self.num_vars = self.num_vars.max(num_vars);
        self
    }

    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.values.get(var as usize).copied().flatten()
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.value(lit.variable()).map(|v| lit.is_satisfied_by(v))
    }

    pub fn set(&mut self, var: Variable, value: bool) {
        let idx = var as usize;
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
        self.num_vars = self.num_vars.max(idx);
    }

    /// `(variable, value)` for every variable, including don't-cares.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (Variable, Option<bool>)> + '_ {
        (1..=self.num_vars).map(|i| (i as Variable, self.value(i as Variable)))
    }

    /// The model as DIMACS literals, skipping don't-cares.
    #[allow(clippy::cast_possible_truncation)]
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, value)| value.map(|b| Literal::new(i as Variable, b)))
    }
}

impl Display for Solutions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.literals().join(" "))
    }
}
