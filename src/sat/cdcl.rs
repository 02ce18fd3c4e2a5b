#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning.
//!
//! The search alternates between propagation and decisions. Each conflict is
//! analysed into a learned clause; the engine jumps back to the clause's assertion
//! level, adds it and lets propagation force its asserting literal. A conflict at
//! level 0 proves the formula unsatisfiable; running out of decidable variables
//! without a conflict yields a model.

use crate::sat::clause::{ClauseKind, ClauseRef};
use crate::sat::clause_management::{ClauseManagement, ClauseManagementImpls};
use crate::sat::cnf::Cnf;
use crate::sat::conflict_analysis::{analyse_conflict, Conflict};
use crate::sat::literal::Literal;
use crate::sat::preprocessing::{Preprocessor, TautologyElimination, Unsat};
use crate::sat::restarter::{Restarter, RestarterImpls};
use crate::sat::solver::{SolutionStats, Solver, SolverConfig, Verdict};
use crate::sat::state::State;
use crate::sat::targets;
use crate::sat::variable_selection::{BranchingHeuristic, HeuristicImpls, HeuristicType};
use log::debug;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Cdcl {
    state: State,
    config: SolverConfig,
    heuristic: HeuristicImpls,
    restarter: RestarterImpls,
    clause_management: ClauseManagementImpls,
    /// Set by a conflict, carried out at the next decision.
    restart_pending: bool,
}

impl Cdcl {
    fn build(cnf: &Cnf, config: SolverConfig) -> Self {
        let mut state = State::new(&TautologyElimination.preprocess(cnf));
        let heuristic = config.heuristic.unwrap_or(HeuristicType::Vsids).to_impl(
            &mut state.vars,
            config.vsids_decay,
            config.vsids_period,
        );
        Self {
            state,
            heuristic,
            restarter: config.restarts.to_impl(config.luby_unit),
            clause_management: config.clause_management.to_impl(config.max_learned),
            restart_pending: false,
            config,
        }
    }

    fn preprocess(&mut self) -> Result<(), Unsat> {
        self.state.force_unit_clauses()?;
        if self.config.variable_elimination && self.state.clauses.learned() == 0 {
            self.state.eliminate_variables()?;
        }
        if self.config.pure_literals {
            self.state.eliminate_pure_literals();
        }
        Ok(())
    }

    /// Learns from the conflict in `cref` and backjumps. Returns `false` if the
    /// conflict proves the formula unsatisfiable.
    fn resolve_conflict(&mut self, cref: ClauseRef) -> bool {
        self.state.stats.conflicts += 1;
        let (conflict, to_bump) = analyse_conflict(&self.state, cref);
        let Conflict::Learned(learned) = conflict else {
            debug!(target: targets::SEARCH, "conflict #{cref} at level 0");
            self.state.unsat = true;
            return false;
        };

        for var in to_bump {
            self.state.vars.bump(var);
        }
        self.clause_management.on_conflict(&mut self.state, &learned.resolved);
        if self.restarter.should_restart() {
            self.restart_pending = true;
        }

        debug!(
            target: targets::BACKJUMP,
            "backjump {} -> {} asserting {}",
            learned.conflict_level,
            learned.assertion_level,
            learned.asserting()
        );
        self.backtrack_to(learned.assertion_level);

        if self.clause_management.should_clean(self.state.clauses.learned()) {
            self.clause_management.clean(&mut self.state);
        }
        let c = self.state.insert_clause(learned.literals, ClauseKind::Learned);
        self.state.stats.learnt_clauses += 1;
        self.state.attach(c);
        true
    }

    fn backtrack_to(&mut self, level: usize) {
        self.state.backtrack_to(level);
        self.heuristic.on_unassign(&self.state.vars, &self.state.unassigned);
    }

    fn restart(&mut self) {
        self.restart_pending = false;
        self.state.stats.restarts += 1;
        debug!(
            target: targets::SEARCH,
            "restart #{} after {} conflicts",
            self.state.stats.restarts,
            self.state.stats.conflicts
        );
        self.backtrack_to(0);
    }
}

impl Solver for Cdcl {
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
        }
        if self.state.is_unsat() || self.preprocess().is_err() {
            return Verdict::Unsatisfiable;
        }

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(target: targets::SEARCH, "time budget exhausted");
                return Verdict::Unknown;
            }

            if let Some(cref) = self.state.propagate() {
                if !self.resolve_conflict(cref) {
                    return Verdict::Unsatisfiable;
                }
                continue;
            }

            if self.restart_pending {
                self.restart();
                continue;
            }

            let Some((var, polarity)) =
                self.heuristic.select(&mut self.state.vars, &self.state.clauses)
            else {
                debug_assert!(self.state.is_complete());
                debug_assert!(self.state.clauses.all_satisfied());
                return Verdict::Satisfiable(self.state.model());
            };
            let lit = Literal::new(var, polarity);
            debug!(target: targets::SEARCH, "decide {lit} at level {}", self.state.decision_level() + 1);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause_management::ClauseManagementType;
    use crate::sat::restarter::RestarterType;
    use crate::sat::solver::tests::{brute_force_sat, check_verdict, random_cnf};
    use std::time::Duration;

    fn cnf(clauses: Vec<Vec<i32>>) -> Cnf {
        Cnf::new(clauses).unwrap()
    }

    fn solve(clauses: Vec<Vec<i32>>) -> Verdict {
        Cdcl::new(&cnf(clauses), SolverConfig::default()).solve()
    }

    #[test]
    fn test_small_satisfiable() {
        let verdict = solve(vec![vec![1, 2], vec![-1, 2], vec![1, -2]]);
        let model = verdict.solutions().unwrap();
        assert_eq!(model.value(1), Some(true));
        assert_eq!(model.value(2), Some(true));
    }

    #[test]
    fn test_contradictory_units() {
        assert_eq!(solve(vec![vec![1], vec![-1]]), Verdict::Unsatisfiable);
    }

    #[test]
    fn test_empty_clause() {
        assert_eq!(solve(vec![vec![1, 2], vec![]]), Verdict::Unsatisfiable);
    }

    #[test]
    fn test_learns_and_backjumps() {
        let formula = cnf(vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-1, -3],
            vec![-2, -3],
            vec![1, -2],
            vec![2, -3],
        ]);
        let config = SolverConfig::default()
            .with_heuristic(HeuristicType::Fixed)
            .with_pure_literals(false);
        let mut cdcl = Cdcl::new(&formula, config);

        cdcl.state.decide(Literal::from_i32(-1));
        let conflict = cdcl.state.propagate().unwrap();
        assert!(cdcl.resolve_conflict(conflict));

        assert_eq!(cdcl.state.decision_level(), 0);
        assert_eq!(cdcl.state.vars().value(1), Some(true));
        assert_eq!(cdcl.state.clauses().learned(), 1);
        assert!(cdcl.state.watches_hold());

        let verdict = cdcl.solve();
        check_verdict(&formula, &verdict);
        assert!(verdict.is_sat());
    }

    #[test]
    fn test_learned_clause_is_unit_after_backjump() {
        let formula = cnf(vec![vec![-1, -2, 3], vec![-1, -2, -3], vec![4, 5]]);
        let mut cdcl = Cdcl::new(&formula, SolverConfig::default().with_pure_literals(false));
        for d in [1, 4, 2] {
            assert_eq!(cdcl.state.propagate(), None);
            cdcl.state.decide(Literal::from_i32(d));
        }
        let conflict = cdcl.state.propagate().unwrap();
        assert!(cdcl.resolve_conflict(conflict));

        assert_eq!(cdcl.state.decision_level(), 1);
        let (c, learned) = cdcl.state.clauses().learned_clauses().next().unwrap();
        assert_eq!(learned.free_count(), 1);
        assert!(learned.is_free(2));

        assert_eq!(cdcl.state.propagate(), None);
        assert_eq!(cdcl.state.vars().value(2), Some(false));
        assert_eq!(cdcl.state.vars().reason(2), Some(c));
        assert_eq!(cdcl.state.vars().decision_level(2), Some(1));
    }

    #[test]
    fn test_pigeonhole_is_unsat() {
        // Four pigeons, three holes; p(i, j) = 3 * i + j + 1.
        let p = |i: i32, j: i32| 3 * i + j + 1;
        let mut clauses: Vec<Vec<i32>> = (0..4).map(|i| (0..3).map(|j| p(i, j)).collect()).collect();
        for j in 0..3 {
            for a in 0..4 {
                for b in a + 1..4 {
                    clauses.push(vec![-p(a, j), -p(b, j)]);
                }
            }
        }
        let verdict = solve(clauses);
        assert_eq!(verdict, Verdict::Unsatisfiable);
    }

    #[test]
    fn test_zero_timeout_is_unknown() {
        let formula = cnf(vec![vec![1, 2, 3], vec![-1, -2, 3], vec![1, -3, 2]]);
        let mut cdcl = Cdcl::new(&formula, SolverConfig::default().with_timeout(Some(Duration::ZERO)));
        assert_eq!(cdcl.solve(), Verdict::Unknown);
    }

    #[test]
    fn test_random_formulas_are_solved_soundly() {
        let configs = [
            SolverConfig::default(),
            SolverConfig::default().with_heuristic(HeuristicType::Fixed),
            SolverConfig::default().with_heuristic(HeuristicType::Mom).with_pure_literals(false),
            SolverConfig::default().with_restarts(RestarterType::Luby).with_luby_unit(1),
            SolverConfig::default()
                .with_clause_management(ClauseManagementType::Activity)
                .with_max_learned(4),
            SolverConfig::default().with_vsids(0.5, 1),
            SolverConfig::default().with_variable_elimination(true),
        ];

        let mut rng = fastrand::Rng::with_seed(42);
        for round in 0..60 {
            let n = rng.usize(4..=12);
            let m = n * 43 / 10 + rng.usize(0..=3);
            let formula = random_cnf(&mut rng, n, m, 3);
            for config in &configs {
                let mut cdcl = Cdcl::new(&formula, config.clone());
                let verdict = cdcl.solve();
                check_verdict(&formula, &verdict);
                assert!(cdcl.state().trail().is_monotone(), "round {round}");
                if verdict.is_sat() {
                    assert!(cdcl.state().watches_hold(), "round {round}");
                }
            }
        }
    }

    #[test]
    fn test_learned_clauses_and_watches_while_stepping() {
        let mut rng = fastrand::Rng::with_seed(2024);
        for round in 0..150 {
            let n = rng.usize(4..=12);
            let m = n * 43 / 10 + rng.usize(0..=3);
            let formula = random_cnf(&mut rng, n, m, 3);
            let mut cdcl = Cdcl::new(&formula, SolverConfig::default().with_pure_literals(false));
            if cdcl.preprocess().is_err() {
                assert!(!brute_force_sat(&formula), "round {round}");
                continue;
            }

            loop {
                let Some(cref) = cdcl.state.propagate() else {
                    assert!(cdcl.state.watches_hold(), "round {round}");
                    let next = cdcl.heuristic.select(&mut cdcl.state.vars, &cdcl.state.clauses);
                    let Some((var, polarity)) = next else {
                        assert!(formula.verify(&cdcl.state.model()), "round {round}");
                        break;
                    };
                    cdcl.state.decide(Literal::new(var, polarity));
                    continue;
                };

                let level = cdcl.state.decision_level();
                let (Conflict::Learned(learned), _) = analyse_conflict(&cdcl.state, cref) else {
                    assert!(!brute_force_sat(&formula), "round {round}");
                    break;
                };
                let vars = cdcl.state.vars();
                assert_eq!(learned.conflict_level, level);
                assert!(learned.assertion_level < level);
                assert!(learned
                    .literals
                    .iter()
                    .all(|&l| vars.literal_value(l) == Some(false)));
                let at_conflict_level = learned
                    .literals
                    .iter()
                    .filter(|l| vars.decision_level(l.variable()) == Some(level))
                    .count();
                assert_eq!(at_conflict_level, 1, "round {round}");

                assert!(cdcl.resolve_conflict(cref));
                assert_eq!(cdcl.state.decision_level(), learned.assertion_level);
                let asserting = learned.asserting();
                let (_, clause) = cdcl.state.clauses().learned_clauses().last().unwrap();
                if clause.is_unit() {
                    assert_eq!(cdcl.state.vars().literal_value(asserting), Some(true));
                } else {
                    assert_eq!(clause.free_count(), 1, "round {round}");
                    assert!(clause.is_free(asserting.variable()));
                }
            }
        }
    }

    #[test]
    fn test_resolve_twice() {
        let formula = cnf(vec![vec![1, 2], vec![-1, 3], vec![-3, -2]]);
        let mut cdcl = Cdcl::new(&formula, SolverConfig::default());
        let first = cdcl.solve();
        let second = cdcl.solve();
        check_verdict(&formula, &first);
        check_verdict(&formula, &second);
    }

    #[test]
    fn test_stats_are_counted() {
        let p = |i: i32, j: i32| 2 * i + j + 1;
        let mut clauses: Vec<Vec<i32>> = (0..3).map(|i| vec![p(i, 0), p(i, 1)]).collect();
        for j in 0..2 {
            for a in 0..3 {
                for b in a + 1..3 {
                    clauses.push(vec![-p(a, j), -p(b, j)]);
                }
            }
        }
        let mut cdcl = Cdcl::new(&cnf(clauses), SolverConfig::default());
        assert!(cdcl.solve().is_unsat());

        let stats = cdcl.stats();
        assert!(stats.conflicts > 0);
        assert!(stats.decisions > 0);
        assert!(stats.propagations > 0);
        assert_eq!(stats.learnt_clauses + 1, stats.conflicts);
    }
}
