#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Learned clause database management.
//!
//! Every conflict adds a learned clause, so without pruning the database only grows.
//! A `ClauseManagement` strategy is told about each conflict (to keep clause activities
//! current) and is asked, before each learned clause is added, whether the database
//! should be cleaned.
//!
//! - `NoClauseManagement`: keeps everything. The default.
//! - `ActivityClauseManagement`: once the learned clause count reaches a ceiling,
//!   deletes the less active half of the learned clauses that are not the reason of a
//!   current assignment.
//!
//! Deleted clauses are tombstoned, so clause references held elsewhere stay valid.

use crate::sat::clause::ClauseRef;
use crate::sat::state::State;
use crate::sat::targets;
use clap::ValueEnum;
use log::debug;
use std::fmt::{Debug, Display};

/// Factor by which the bump increment grows after each conflict, so that older bumps
/// weigh less.
const DECAY_FACTOR: f64 = 0.95;

/// Activities are rescaled when the increment passes this bound.
const RESCALE_LIMIT: f64 = 1e100;

/// Interface for clause database strategies.
pub trait ClauseManagement: Debug {
    /// Called once per conflict with the clauses that took part in the resolution.
    fn on_conflict(&mut self, state: &mut State, resolved: &[ClauseRef]);

    /// Whether the database should be cleaned before another learned clause is added.
    fn should_clean(&self, learned: usize) -> bool;

    /// Deletes learned clauses. Returns how many were removed.
    ///
    /// Must only be called while the unit queue is empty.
    fn clean(&mut self, state: &mut State) -> usize;
}

/// Keeps every learned clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoClauseManagement;

impl ClauseManagement for NoClauseManagement {
    fn on_conflict(&mut self, _state: &mut State, _resolved: &[ClauseRef]) {}

    fn should_clean(&self, _learned: usize) -> bool {
        false
    }

    fn clean(&mut self, _state: &mut State) -> usize {
        0
    }
}

/// Activity-based halving of the learned clauses.
///
/// Learned clauses taking part in a conflict are bumped by an increment that grows by
/// `1 / DECAY_FACTOR` per conflict. The ceiling grows by a tenth after every clean so
/// that a database full of locked clauses is not cleaned on every conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityClauseManagement {
    max_learned: usize,
    increment: f64,
    num_removed: usize,
}

impl ActivityClauseManagement {
    #[must_use]
    pub const fn new(max_learned: usize) -> Self {
        Self {
            max_learned,
            increment: 1.0,
            num_removed: 0,
        }
    }

    #[must_use]
    pub const fn num_removed(&self) -> usize {
        self.num_removed
    }

    fn rescale(&mut self, state: &mut State) {
        let learned: Vec<ClauseRef> = state.clauses.learned_clauses().map(|(c, _)| c).collect();
        for c in learned {
            state.clauses[c].activity /= RESCALE_LIMIT;
        }
        self.increment /= RESCALE_LIMIT;
    }
}

impl Default for ActivityClauseManagement {
    fn default() -> Self {
        Self::new(20_000)
    }
}

impl ClauseManagement for ActivityClauseManagement {
    fn on_conflict(&mut self, state: &mut State, resolved: &[ClauseRef]) {
        for &c in resolved {
            let clause = &mut state.clauses[c];
            if clause.is_learned() && !clause.is_deleted() {
                clause.bump_activity(self.increment);
            }
        }
        self.increment /= DECAY_FACTOR;
        if self.increment > RESCALE_LIMIT {
            self.rescale(state);
        }
    }

    fn should_clean(&self, learned: usize) -> bool {
        learned >= self.max_learned
    }

    fn clean(&mut self, state: &mut State) -> usize {
        debug_assert!(state.queue.is_empty());
        let mut candidates: Vec<(ClauseRef, f64)> = state
            .clauses
            .learned_clauses()
            .filter(|&(c, _)| !state.is_locked(c))
            .map(|(c, clause)| (c, clause.activity))
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let doomed = candidates.len() / 2;
        for &(c, _) in &candidates[..doomed] {
            state.delete_clause(c);
        }
        self.num_removed += doomed;
        self.max_learned += (self.max_learned / 10).max(1);

        debug!(
            target: targets::CLAUSE_DB,
            "removed {doomed} of {} unlocked learned clauses, {} left, next clean at {}",
            candidates.len(),
            state.clauses.learned(),
            self.max_learned
        );
        doomed
    }
}

#[derive(Debug, Clone)]
pub enum ClauseManagementImpls {
    None(NoClauseManagement),
    Activity(ActivityClauseManagement),
}

impl ClauseManagement for ClauseManagementImpls {
    fn on_conflict(&mut self, state: &mut State, resolved: &[ClauseRef]) {
        match self {
            Self::None(m) => m.on_conflict(state, resolved),
            Self::Activity(m) => m.on_conflict(state, resolved),
        }
    }

    fn should_clean(&self, learned: usize) -> bool {
        match self {
            Self::None(m) => m.should_clean(learned),
            Self::Activity(m) => m.should_clean(learned),
        }
    }

    fn clean(&mut self, state: &mut State) -> usize {
        match self {
            Self::None(m) => m.clean(state),
            Self::Activity(m) => m.clean(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum ClauseManagementType {
    #[default]
    None,
    Activity,
}

impl Display for ClauseManagementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Activity => write!(f, "activity"),
        }
    }
}

impl ClauseManagementType {
    #[must_use]
    pub const fn to_impl(self, max_learned: usize) -> ClauseManagementImpls {
        match self {
            Self::None => ClauseManagementImpls::None(NoClauseManagement),
            Self::Activity => {
                ClauseManagementImpls::Activity(ActivityClauseManagement::new(max_learned))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::ClauseKind;
    use crate::sat::cnf::Cnf;
    use crate::sat::literal::Literal;

    fn learned(state: &mut State, lits: &[i32]) -> ClauseRef {
        state.insert_clause(
            lits.iter().map(|&l| Literal::from_i32(l)).collect(),
            ClauseKind::Learned,
        )
    }

    #[test]
    fn test_no_management_never_cleans() {
        let mut m = ClauseManagementType::None.to_impl(1);
        assert!(!m.should_clean(usize::MAX));
        let mut state = State::new(&Cnf::new(vec![vec![1, 2]]).unwrap());
        assert_eq!(m.clean(&mut state), 0);
    }

    #[test]
    fn test_bumps_only_learned_clauses() {
        let mut state = State::new(&Cnf::new(vec![vec![1, 2, 3]]).unwrap());
        let a = learned(&mut state, &[-1, 2]);
        let mut m = ActivityClauseManagement::new(10);

        m.on_conflict(&mut state, &[0, a]);
        m.on_conflict(&mut state, &[a]);

        assert!(state.clauses()[0].activity.abs() < f64::EPSILON);
        assert!(state.clauses()[a].activity > 2.0);
    }

    #[test]
    fn test_clean_removes_less_active_unlocked_half() {
        let mut state = State::new(&Cnf::new(vec![vec![1, 2, 3, 4, 5]]).unwrap());
        let refs: Vec<ClauseRef> = [[-1, 2], [-2, 3], [-3, 4], [-4, 5]]
            .iter()
            .map(|l| learned(&mut state, l))
            .collect();
        let mut m = ActivityClauseManagement::new(4);
        m.on_conflict(&mut state, &refs[2..]);
        assert!(m.should_clean(state.clauses().learned()));

        assert_eq!(m.clean(&mut state), 2);
        assert!(state.clauses()[refs[0]].is_deleted());
        assert!(state.clauses()[refs[1]].is_deleted());
        assert!(!state.clauses()[refs[2]].is_deleted());
        assert_eq!(state.clauses().learned(), 2);
        assert_eq!(state.stats().removed_clauses, 2);
        assert!(!m.should_clean(state.clauses().learned()));
        assert!(state.watches_hold());
    }

    #[test]
    fn test_locked_clauses_survive() {
        let mut state = State::new(&Cnf::new(vec![vec![1, 2, 3]]).unwrap());
        let reason = learned(&mut state, &[-1, 2]);
        let other = learned(&mut state, &[-1, 3]);
        state.decide(Literal::from_i32(1));
        assert_eq!(state.propagate(), None);
        assert!(state.is_locked(reason));
        assert!(state.is_locked(other));

        let mut m = ActivityClauseManagement::new(1);
        assert_eq!(m.clean(&mut state), 0);
        assert_eq!(m.num_removed(), 0);
    }
}
