#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Davis-Putnam-Logemann-Loveland search.
//!
//! Runs on the same [`State`] as the CDCL engine but learns nothing. On a conflict
//! it backtracks chronologically: the most recent decision whose other branch has
//! not been tried is undone, and its negation is asserted at a fresh level. Pure
//! literals are assigned before every branch.

use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use crate::sat::preprocessing::{Preprocessor, TautologyElimination, Unsat};
use crate::sat::solver::{SolutionStats, Solver, SolverConfig, Verdict};
use crate::sat::state::State;
use crate::sat::targets;
use crate::sat::variable_selection::{BranchingHeuristic, HeuristicImpls, HeuristicType};
use log::debug;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Dpll {
    state: State,
    config: SolverConfig,
    heuristic: HeuristicImpls,
    /// One entry per open level: the literal it was opened with and whether it is
    /// already the second branch.
    branches: Vec<(Literal, bool)>,
}

impl Dpll {
    fn build(cnf: &Cnf, config: SolverConfig) -> Self {
        let mut state = State::new(&TautologyElimination.preprocess(cnf));
        let heuristic = config.heuristic.unwrap_or(HeuristicType::Mom).to_impl(
            &mut state.vars,
            config.vsids_decay,
            config.vsids_period,
        );
        Self {
            state,
            config,
            heuristic,
            branches: Vec::new(),
        }
    }

    fn preprocess(&mut self) -> Result<(), Unsat> {
        self.state.force_unit_clauses()?;
        if self.config.variable_elimination {
            self.state.eliminate_variables()?;
        }
        Ok(())
    }

    fn backtrack_to(&mut self, level: usize) {
        self.state.backtrack_to(level);
        self.heuristic.on_unassign(&self.state.vars, &self.state.unassigned);
    }

    /// Flips the most recent untried branch. Returns `false` once every branch has
    /// been tried.
    fn flip(&mut self) -> bool {
        while let Some((lit, flipped)) = self.branches.pop() {
            if flipped {
                continue;
            }
            self.backtrack_to(self.branches.len());
            let flip = !lit;
            debug!(
                target: targets::BACKJUMP,
                "flip {lit} -> {flip} at level {}",
                self.branches.len() + 1
            );
            self.state.open_level(flip);
            self.state.vars.set_reason(flip.variable(), None);
            self.state.assign(flip, true);
            self.branches.push((flip, true));
            return true;
        }
        false
    }
}

impl Solver for Dpll {
    fn new(cnf: &Cnf, config: SolverConfig) -> Self {
        Self::build(cnf, config)
    }

    fn load(&mut self, cnf: &Cnf) {
        *self = Self::build(cnf, self.config.clone());
    }

    fn solve(&mut self) -> Verdict {
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        if self.state.decision_level() > 0 {
            self.backtrack_to(0);
            self.branches.clear();
        }
        if self.state.is_unsat() || self.preprocess().is_err() {
            return Verdict::Unsatisfiable;
        }

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(target: targets::SEARCH, "time budget exhausted");
                return Verdict::Unknown;
            }

            if self.state.propagate().is_some() {
                self.state.stats.conflicts += 1;
                if !self.flip() {
                    debug!(target: targets::SEARCH, "search space exhausted");
                    self.state.unsat = true;
                    return Verdict::Unsatisfiable;
                }
                continue;
            }

            if self.config.pure_literals {
                self.state.eliminate_pure_literals();
            }

            let Some((var, polarity)) =
                self.heuristic.select(&mut self.state.vars, &self.state.clauses)
            else {
                debug_assert!(self.state.is_complete());
                debug_assert!(self.state.clauses.all_satisfied());
                return Verdict::Satisfiable(self.state.model());
            };
            let lit = Literal::new(var, polarity);
            debug!(target: targets::SEARCH, "branch on {lit} at level {}", self.branches.len() + 1);
            self.branches.push((lit, false));
            self.state.decide(lit);
        }
    }

    fn stats(&self) -> SolutionStats {
        self.state.stats()
    }

    fn state(&self) -> &State {
        &self.state
    }
}
