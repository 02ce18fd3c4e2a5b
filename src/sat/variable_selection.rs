#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Branching heuristics.
//!
//! A heuristic proposes the next decision as `(variable, polarity)`, or `None` once
//! no decidable variable is left. Heuristics read occurrence data from the variable
//! store and satisfaction data from the clause database; only VSIDS writes back, to
//! fold accumulated bumps into activities.
//!
//! - [`Vsids`]: highest activity first, activities decayed periodically.
//! - [`Mom`]: maximum occurrences in the shortest unsatisfied clauses.
//! - [`FixedOrder`]: smallest free variable.
//!
//! All three choose polarity by comparing live positive and negative occurrences
//! (occurrences in clauses not yet satisfied), preferring `true` on a tie. `Mom`
//! counts only within the shortest clauses.

use crate::sat::assignment::VariableStore;
use crate::sat::clause_storage::ClauseDb;
use crate::sat::literal::{Literal, Variable};
use crate::sat::targets;
use bit_vec::BitVec;
use clap::ValueEnum;
use log::debug;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::{Debug, Display};

pub trait BranchingHeuristic: Debug {
    /// Picks the next decision, never returning an assigned or eliminated variable.
    fn select(&mut self, vars: &mut VariableStore, clauses: &ClauseDb)
    -> Option<(Variable, bool)>;

    /// Called after backtracking with the variables that became free.
    fn on_unassign(&mut self, _vars: &VariableStore, _unassigned: &[Variable]) {}
}

/// Occurrences of `lit` in clauses that are not yet satisfied.
#[must_use]
pub fn live_occurrences(vars: &VariableStore, clauses: &ClauseDb, lit: Literal) -> usize {
    vars.occurrences(lit)
        .iter()
        .filter(|&&c| !clauses[c].is_satisfied())
        .count()
}

/// `true` unless `var` has more live negative than positive occurrences.
#[must_use]
pub fn preferred_polarity(vars: &VariableStore, clauses: &ClauseDb, var: Variable) -> bool {
    live_occurrences(vars, clauses, Literal::new(var, true))
        >= live_occurrences(vars, clauses, Literal::new(var, false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    activity: OrderedFloat<f64>,
    var: Reverse<Variable>,
}

/// Variable state independent decaying sum.
///
/// Conflict analysis bumps variables in the store; every `period` decisions the bumps
/// are folded into the activities (`activity * decay + bumps`) and the ordering is
/// rebuilt. Between rebuilds the ordering is a lazy max-heap: assigned variables are
/// discarded when popped and pushed back when backtracking frees them.
#[derive(Debug, Clone)]
pub struct Vsids {
    heap: BinaryHeap<Candidate>,
    in_heap: BitVec,
    decay: f64,
    period: usize,
    decisions: usize,
}

impl Vsids {
    /// Seeds every activity with the variable's occurrence count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(vars: &mut VariableStore, decay: f64, period: usize) -> Self {
        for var in vars.variables() {
            let data = &vars[var];
            let occurrences = data.positive_occurrences.len() + data.negative_occurrences.len();
            vars.set_activity(var, occurrences as f64);
        }

        let mut vsids = Self {
            heap: BinaryHeap::with_capacity(vars.num_vars()),
            in_heap: BitVec::from_elem(vars.num_vars() + 1, false),
            decay,
            period,
            decisions: 0,
        };
        vsids.rebuild(vars);
        vsids
    }

    fn push(&mut self, vars: &VariableStore, var: Variable) {
        self.heap.push(Candidate {
            activity: OrderedFloat(vars.activity(var)),
            var: Reverse(var),
        });
        self.in_heap.set(var as usize, true);
    }

    fn rebuild(&mut self, vars: &VariableStore) {
        self.heap.clear();
        self.in_heap.clear();
        for var in vars.variables().filter(|&v| vars.is_decidable(v)) {
            self.push(vars, var);
        }
    }
}

impl BranchingHeuristic for Vsids {
    fn select(
        &mut self,
        vars: &mut VariableStore,
        clauses: &ClauseDb,
    ) -> Option<(Variable, bool)> {
        self.decisions += 1;
        if self.period > 0 && self.decisions % self.period == 0 {
            vars.decay_activities(self.decay);
            self.rebuild(vars);
            debug!(target: targets::SEARCH, "vsids decay after {} decisions", self.decisions);
        }

        while let Some(Candidate { var: Reverse(var), .. }) = self.heap.pop() {
            self.in_heap.set(var as usize, false);
            if vars.is_decidable(var) {
                return Some((var, preferred_polarity(vars, clauses, var)));
            }
        }
        None
    }

    fn on_unassign(&mut self, vars: &VariableStore, unassigned: &[Variable]) {
        for &var in unassigned {
            if !self.in_heap[var as usize] && vars.is_decidable(var) {
                self.push(vars, var);
            }
        }
    }
}

/// Maximum occurrences in clauses of minimum size.
///
/// Looks only at the unsatisfied clauses with the fewest free literals and picks the
/// variable maximising `(f(x) + f(!x)) * 2 + f(x) * f(!x)` there, where `f` counts
/// occurrences. The polarity is `true` iff `f(x) >= f(!x)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mom;

impl BranchingHeuristic for Mom {
    fn select(
        &mut self,
        vars: &mut VariableStore,
        clauses: &ClauseDb,
    ) -> Option<(Variable, bool)> {
        let open = || {
            clauses
                .iter()
                .map(|(_, c)| c)
                .filter(|c| !c.is_satisfied() && c.free_count() > 0)
        };
        let Some(min_width) = open().map(|c| c.free_count()).min() else {
            return FixedOrder.select(vars, clauses);
        };

        let mut counts: FxHashMap<Literal, usize> = FxHashMap::default();
        for clause in open().filter(|c| c.free_count() == min_width) {
            for lit in clause.free_literals() {
                *counts.entry(lit).or_default() += 1;
            }
        }

        let count = |lit: Literal| counts.get(&lit).copied().unwrap_or(0);
        counts
            .keys()
            .map(|lit| lit.variable())
            .filter(|&v| vars.is_decidable(v))
            .map(|v| {
                let pos = count(Literal::new(v, true));
                let neg = count(Literal::new(v, false));
                ((pos + neg) * 2 + pos * neg, Reverse(v), pos >= neg)
            })
            .max()
            .map(|(_, Reverse(v), polarity)| (v, polarity))
    }
}

/// The smallest decidable variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrder;

impl BranchingHeuristic for FixedOrder {
    fn select(
        &mut self,
        vars: &mut VariableStore,
        clauses: &ClauseDb,
    ) -> Option<(Variable, bool)> {
        vars.variables()
            .find(|&v| vars.is_decidable(v))
            .map(|v| (v, preferred_polarity(vars, clauses, v)))
    }
}

/// Closed set of heuristics selectable at run time.
#[derive(Debug, Clone)]
pub enum HeuristicImpls {
    Vsids(Vsids),
    Mom(Mom),
    Fixed(FixedOrder),
}

impl BranchingHeuristic for HeuristicImpls {
    fn select(
        &mut self,
        vars: &mut VariableStore,
        clauses: &ClauseDb,
    ) -> Option<(Variable, bool)> {
        match self {
            Self::Vsids(h) => h.select(vars, clauses),
            Self::Mom(h) => h.select(vars, clauses),
            Self::Fixed(h) => h.select(vars, clauses),
        }
    }

    fn on_unassign(&mut self, vars: &VariableStore, unassigned: &[Variable]) {
        match self {
            Self::Vsids(h) => h.on_unassign(vars, unassigned),
            Self::Mom(h) => h.on_unassign(vars, unassigned),
            Self::Fixed(h) => h.on_unassign(vars, unassigned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum HeuristicType {
    #[default]
    Vsids,
    Mom,
    Fixed,
}

impl Display for HeuristicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vsids => write!(f, "vsids"),
            Self::Mom => write!(f, "mom"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl HeuristicType {
    /// Builds the heuristic for the formula currently in `vars`.
    #[must_use]
    pub fn to_impl(self, vars: &mut VariableStore, decay: f64, period: usize) -> HeuristicImpls {
        match self {
            Self::Vsids => HeuristicImpls::Vsids(Vsids::new(vars, decay, period)),
            Self::Mom => HeuristicImpls::Mom(Mom),
            Self::Fixed => HeuristicImpls::Fixed(FixedOrder),
        }
    }
}
