#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Simplifications applied before and during search.
//!
//! Formula-level preprocessors implement [`Preprocessor`] and map one [`Cnf`] to an
//! equisatisfiable one. Engine-level steps work on a loaded [`State`] at decision level
//! 0 and leave every invariant of the watch scheme intact:
//!
//! - [`State::force_unit_clauses`] assigns the literal of every width-one clause.
//! - [`State::eliminate_pure_literals`] assigns variables that occur with one polarity.
//! - [`State::eliminate_variables`] removes variables by resolution, recording what is
//!   needed to extend a model to them afterwards.
//!
//! Every step is idempotent.

use crate::sat::assignment::Solutions;
use crate::sat::clause::{normalise, ClauseKind, ClauseRef, Literals, Normalised};
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use crate::sat::state::State;
use crate::sat::targets;
use crate::sat::variable_selection::live_occurrences;
use log::{debug, trace};

/// Maximum number of live occurrences of a variable considered for elimination.
const ELIMINATION_OCCURRENCE_LIMIT: usize = 16;

/// The formula was shown to be unsatisfiable while simplifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsat;

pub trait Preprocessor {
    fn preprocess(&self, cnf: &Cnf) -> Cnf;
}

/// Drops tautological clauses and collapses repeated literals.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TautologyElimination;

impl Preprocessor for TautologyElimination {
    fn preprocess(&self, cnf: &Cnf) -> Cnf {
        let clauses = cnf
            .iter()
            .filter_map(|clause| match normalise(clause.iter().copied()) {
                Normalised::Literals(lits) => Some(lits.to_vec()),
                Normalised::Tautology => None,
            })
            .collect();
        Cnf {
            clauses,
            num_vars: cnf.num_vars,
            declared_vars: cnf.declared_vars,
        }
    }
}

/// A variable removed by resolution, with the clauses it was removed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elimination {
    pub var: Variable,
    pub clauses: Vec<Vec<Literal>>,
}

impl Elimination {
    /// Gives `var` a value satisfying all its removed clauses, assuming the other
    /// variables already satisfy the resolvents.
    pub fn reconstruct(&self, solutions: &mut Solutions) {
        let positive = Literal::new(self.var, true);
        let needs_true = self
            .clauses
            .iter()
            .filter(|clause| clause.contains(&positive))
            .any(|clause| {
                !clause
                    .iter()
                    .any(|&l| l.variable() != self.var && solutions.literal_value(l) == Some(true))
            });
        solutions.set(self.var, needs_true);
    }
}

impl State {
    /// Assigns the literal of every width-one clause at level 0, then propagates.
    ///
    /// # Errors
    ///
    /// `Unsat` if some width-one clause is already falsified or propagation conflicts.
    pub fn force_unit_clauses(&mut self) -> Result<usize, Unsat> {
        debug_assert_eq!(self.decision_level, 0);
        if self.unsat {
            return Err(Unsat);
        }

        let units: Vec<ClauseRef> = self
            .clauses
            .iter()
            .filter(|(_, c)| c.is_unit())
            .map(|(c, _)| c)
            .collect();

        let mut forced = 0;
        for c in units {
            let lit = self.clauses[c][0];
            match self.vars.literal_value(lit) {
                Some(true) => {}
                Some(false) => {
                    debug!(target: targets::PREPROCESSING, "unit clause #{c} ({lit}) is falsified");
                    self.unsat = true;
                    return Err(Unsat);
                }
                None => {
                    self.vars.set_reason(lit.variable(), Some(c));
                    self.stats.propagations += 1;
                    self.assign(lit, true);
                    forced += 1;
                }
            }
        }

        if self.propagate().is_some() {
            self.unsat = true;
            return Err(Unsat);
        }
        debug!(target: targets::PREPROCESSING, "forced {forced} unit clauses");
        Ok(forced)
    }

    /// Assigns every decidable variable whose live occurrences all have the same
    /// polarity, repeating until none is left. Variables without live occurrences are
    /// left alone.
    pub fn eliminate_pure_literals(&mut self) -> usize {
        let mut total = 0;
        loop {
            let pures: Vec<Literal> = self
                .vars
                .variables()
                .filter(|&v| self.vars.is_decidable(v))
                .filter_map(|v| {
                    let pos = live_occurrences(&self.vars, &self.clauses, Literal::new(v, true));
                    let neg = live_occurrences(&self.vars, &self.clauses, Literal::new(v, false));
                    match (pos, neg) {
                        (0, 0) => None,
                        (_, 0) => Some(Literal::new(v, true)),
                        (0, _) => Some(Literal::new(v, false)),
                        _ => None,
                    }
                })
                .collect();
            if pures.is_empty() {
                break;
            }

            for lit in pures {
                self.vars.set_reason(lit.variable(), None);
                self.assign(lit, true);
                total += 1;
            }
        }

        if total > 0 {
            debug!(
                target: targets::PREPROCESSING,
                "assigned {total} pure literals at level {}", self.decision_level
            );
        }
        total
    }

    /// Bounded variable elimination.
    ///
    /// A decidable variable with at most `ELIMINATION_OCCURRENCE_LIMIT` live
    /// occurrences is replaced by the non-tautological resolvents of its positive and
    /// negative clauses, provided there are no more resolvents than clauses removed.
    /// Passes repeat until one eliminates nothing. Only runs at level 0 before any
    /// clause has been learned.
    ///
    /// # Errors
    ///
    /// `Unsat` if a resolvent is empty or forcing the unit resolvents conflicts.
    pub fn eliminate_variables(&mut self) -> Result<usize, Unsat> {
        debug_assert_eq!(self.decision_level, 0);
        debug_assert_eq!(self.clauses.learned(), 0);
        if self.unsat {
            return Err(Unsat);
        }

        let mut eliminated = 0;
        loop {
            let pass = self.elimination_pass()?;
            if pass == 0 {
                break;
            }
            eliminated += pass;
        }

        self.stats.eliminated_variables += eliminated;
        debug!(
            target: targets::PREPROCESSING,
            "eliminated {eliminated} variables, {} clauses left",
            self.clauses.len()
        );
        Ok(eliminated)
    }

    fn elimination_pass(&mut self) -> Result<usize, Unsat> {
        let mut eliminated = 0;
        for var in self.vars.variables() {
            if !self.vars.is_decidable(var) {
                continue;
            }
            let Some(resolvents) = self.resolvents(var) else {
                continue;
            };

            let removed: Vec<ClauseRef> = [true, false]
                .into_iter()
                .flat_map(|p| self.live_clauses(Literal::new(var, p)))
                .collect();
            let clauses = removed.iter().map(|&c| self.clauses[c].literals().to_vec()).collect();
            for &c in &removed {
                self.delete_clause(c);
            }
            self.vars.mark_eliminated(var);
            self.eliminations.push(Elimination { var, clauses });
            eliminated += 1;
            trace!(
                target: targets::PREPROCESSING,
                "eliminated {var}: {} clauses -> {} resolvents",
                removed.len(),
                resolvents.len()
            );

            for resolvent in resolvents {
                if resolvent.is_empty() {
                    self.unsat = true;
                    return Err(Unsat);
                }
                let c = self.insert_clause(resolvent, ClauseKind::Original);
                self.attach(c);
            }
            if self.propagate().is_some() {
                self.unsat = true;
                return Err(Unsat);
            }
        }

        Ok(eliminated)
    }

    fn live_clauses(&self, lit: Literal) -> Vec<ClauseRef> {
        self.vars
            .occurrences(lit)
            .iter()
            .copied()
            .filter(|&c| !self.clauses[c].is_satisfied())
            .collect()
    }

    /// The resolvents on `var`, restricted to free literals, or `None` if the variable
    /// should be kept.
    fn resolvents(&self, var: Variable) -> Option<Vec<Literals>> {
        let positive = self.live_clauses(Literal::new(var, true));
        let negative = self.live_clauses(Literal::new(var, false));
        let occurrences = positive.len() + negative.len();
        if occurrences == 0 || occurrences > ELIMINATION_OCCURRENCE_LIMIT {
            return None;
        }

        let mut resolvents = Vec::new();
        for &p in &positive {
            for &n in &negative {
                let lits = self.clauses[p]
                    .free_literals()
                    .chain(self.clauses[n].free_literals())
                    .filter(|l| l.variable() != var);
                if let Normalised::Literals(resolvent) = normalise(lits) {
                    resolvents.push(resolvent);
                    if resolvents.len() > occurrences {
                        return None;
                    }
                }
            }
        }
        Some(resolvents)
    }
}
