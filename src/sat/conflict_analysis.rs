#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First unique implication point learning.
//!
//! Starting from the variables of the conflicting clause, the trail is walked from the
//! top. Each cut variable met on the way is replaced by the other variables of its
//! reason clause, until exactly one cut variable belongs to the conflict level. The
//! learned clause negates the current values of the cut; the variable at the
//! conflict level comes first, then the rest by descending level, so the second
//! literal fixes the assertion level.

use crate::sat::clause::{ClauseRef, Literals};
use crate::sat::literal::{Literal, Variable};
use crate::sat::state::State;
use crate::sat::targets;
use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashSet;
use std::cmp::Reverse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedClause {
    pub literals: Literals,
    /// Level to backjump to; the clause is unit there.
    pub assertion_level: usize,
    /// Level at which the conflict happened.
    pub conflict_level: usize,
    /// The conflicting clause and every reason resolved on.
    pub resolved: Vec<ClauseRef>,
}

impl LearnedClause {
    /// The literal that becomes unit after backjumping.
    #[must_use]
    pub fn asserting(&self) -> Literal {
        self.literals[0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// No decision to retract: the formula is unsatisfiable.
    Ground,
    Learned(LearnedClause),
}

/// Analyses the conflict in `cref`. Also returns every variable that entered the cut,
/// for activity bumping.
#[must_use]
pub fn analyse_conflict(state: &State, cref: ClauseRef) -> (Conflict, Vec<Variable>) {
    let level = state.decision_level();
    if level == 0 || state.level_literals.is_empty() {
        return (Conflict::Ground, Vec::new());
    }

    let vars = state.vars();
    let clauses = state.clauses();
    let trail = state.trail();
    let at_level = |v: Variable| vars.decision_level(v) == Some(level);

    let mut cut = FxHashSet::default();
    let mut to_bump = Vec::new();
    let mut current = 0_usize;
    for lit in clauses[cref].iter() {
        let var = lit.variable();
        if cut.insert(var) {
            to_bump.push(var);
            current += usize::from(at_level(var));
        }
    }

    let mut resolved = vec![cref];
    let mut i = trail.len();
    while current > 1 && i > 0 {
        i -= 1;
        let step = trail[i];
        let var = step.lit.variable();
        if !cut.contains(&var) {
            continue;
        }
        if !step.is_forced {
            break;
        }
        let Some(reason) = vars.reason(var) else {
            unreachable!("forced variable {var} at level {level} has no reason");
        };

        cut.remove(&var);
        current -= usize::from(at_level(var));
        for lit in clauses[reason].iter() {
            let v = lit.variable();
            if v != var && cut.insert(v) {
                to_bump.push(v);
                current += usize::from(at_level(v));
            }
        }
        resolved.push(reason);
    }
    debug_assert_eq!(current, 1, "cut is not asserting");

    let mut literals: Literals = cut
        .iter()
        .filter_map(|&v| vars.value(v).map(|value| Literal::new(v, !value)))
        .collect();
    literals.sort_unstable_by_key(|l| (Reverse(vars.decision_level(l.variable())), l.variable()));

    let assertion_level = literals
        .get(1)
        .and_then(|l| vars.decision_level(l.variable()))
        .unwrap_or(0);

    debug!(
        target: targets::ANALYSIS,
        "conflict #{cref} at level {level}: learned ({}) asserting at {assertion_level}",
        literals.iter().join(" ")
    );

    (
        Conflict::Learned(LearnedClause {
            literals,
            assertion_level,
            conflict_level: level,
            resolved,
        }),
        to_bump,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;

    fn lit(v: i32) -> Literal {
        Literal::from_i32(v)
    }

    fn conflicted(clauses: Vec<Vec<i32>>, decisions: &[i32]) -> (State, ClauseRef) {
        let mut state = State::new(&Cnf::new(clauses).unwrap());
        for &d in decisions {
            assert_eq!(state.propagate(), None);
            state.decide(lit(d));
        }
        let conflict = state.propagate().unwrap();
        (state, conflict)
    }

    #[test]
    fn test_conflict_at_level_zero_is_ground() {
        let mut state = State::new(&Cnf::new(vec![vec![1, 2], vec![1, -2]]).unwrap());
        state.assign(lit(-1), true);
        let conflict = state.propagate().unwrap();

        assert_eq!(analyse_conflict(&state, conflict).0, Conflict::Ground);
    }

    #[test]
    fn test_learns_unit_at_first_uip() {
        let (state, conflict) = conflicted(
            vec![
                vec![1, 2, 3],
                vec![-1, -2],
                vec![-1, -3],
                vec![-2, -3],
                vec![1, -2],
                vec![2, -3],
            ],
            &[-1],
        );

        let (Conflict::Learned(learned), bumped) = analyse_conflict(&state, conflict) else {
            panic!("expected a learned clause");
        };
        assert_eq!(learned.literals.as_slice(), &[lit(1)]);
        assert_eq!(learned.assertion_level, 0);
        assert_eq!(learned.conflict_level, 1);
        assert!(learned.assertion_level < learned.conflict_level);
        assert!(bumped.contains(&1));
    }

    #[test]
    fn test_backjump_level_is_second_highest() {
        // Level 1 decides 1, level 2 decides 2; 3 and -3 are both implied at level 2
        // from 1 and 2.
        let (state, conflict) = conflicted(
            vec![vec![-1, -2, 3], vec![-1, -2, -3], vec![4, 5]],
            &[1, 4, 2],
        );

        let (Conflict::Learned(learned), _) = analyse_conflict(&state, conflict) else {
            panic!("expected a learned clause");
        };
        assert_eq!(learned.literals.as_slice(), &[lit(-2), lit(-1)]);
        assert_eq!(learned.asserting(), lit(-2));
        assert_eq!(learned.conflict_level, 3);
        assert_eq!(learned.assertion_level, 1);

        for l in &learned.literals {
            assert_eq!(state.vars().literal_value(*l), Some(false));
        }
    }

    #[test]
    fn test_stops_at_first_uip_not_decision() {
        // Deciding 1 forces 2, which forces 3 and 4, which clash on 5.
        let (state, conflict) = conflicted(
            vec![vec![-1, 2], vec![-2, 3], vec![-2, 4], vec![-3, -4, 5], vec![-3, -4, -5]],
            &[1],
        );

        let (Conflict::Learned(learned), _) = analyse_conflict(&state, conflict) else {
            panic!("expected a learned clause");
        };
        assert_eq!(learned.literals.as_slice(), &[lit(-2)]);
        assert!(learned.resolved.len() >= 3);
    }
}
