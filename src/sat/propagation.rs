#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Assignment, unassignment and unit propagation over watched literals.
//!
//! Every assignment updates the free and satisfied sets of all clauses mentioning
//! the variable. Only clauses *watching* the falsified literal are then examined:
//!
//! 1. no free literal left: the clause is the conflict;
//! 2. exactly one free literal: it is queued with the clause as its reason;
//! 3. otherwise the watcher moves to a free literal that is not already watched.
//!
//! A clause of width two or more only ever becomes unit or conflicting when one of
//! its watchers is falsified, so no other clause needs to be looked at.

use crate::sat::clause::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use crate::sat::state::State;
use crate::sat::targets;
use log::trace;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::ops::ControlFlow;

/// Literals waiting to be forced, each with the clause that became unit on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropagationQueue(VecDeque<(Literal, ClauseRef)>);

impl PropagationQueue {
    pub fn push(&mut self, lit: Literal, reason: ClauseRef) {
        self.0.push_back((lit, reason));
    }

    pub fn pop(&mut self) -> Option<(Literal, ClauseRef)> {
        self.0.pop_front()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl State {
    /// Makes `lit` true at the current level. Does nothing if its variable already has
    /// a value, so a literal may safely be queued more than once.
    pub(crate) fn assign(&mut self, lit: Literal, is_forced: bool) {
        let var = lit.variable();
        if !self.vars.is_free(var) {
            return;
        }

        self.vars.set(var, lit.polarity(), self.decision_level);
        self.trail.push(lit, self.decision_level, is_forced);
        trace!(
            target: targets::PROPAGATION,
            "{lit} @{}{}",
            self.decision_level,
            if is_forced { " forced" } else { "" }
        );

        for &c in self.vars.occurrences(lit) {
            let clause = &mut self.clauses[c];
            clause.free_literals.remove(&var);
            clause.satisfied_by.insert(var);
        }
        let falsified = !lit;
        for &c in self.vars.occurrences(falsified) {
            self.clauses[c].free_literals.remove(&var);
        }

        let mut watching = self.watches.take(falsified);
        let mut i = 0;
        while i < watching.len() {
            let c = watching[i];
            if self.clauses[c].is_satisfied() {
                i += 1;
                continue;
            }
            match self.update_watch(c, falsified) {
                ControlFlow::Break(_) => break,
                ControlFlow::Continue(true) => {
                    watching.remove(i);
                }
                ControlFlow::Continue(false) => i += 1,
            }
        }
        self.watches.restore(falsified, watching);
    }

    /// Applies the watch rule to `c`, whose watcher `falsified` just became false.
    /// Continues with `true` if the clause stopped watching `falsified`; the caller
    /// owns that watch list for the duration.
    fn update_watch(&mut self, c: ClauseRef, falsified: Literal) -> ControlFlow<ClauseRef, bool> {
        let clause = &self.clauses[c];
        match clause.free_count() {
            0 => {
                trace!(target: targets::PROPAGATION, "conflict in #{c} {clause}");
                self.conflict.get_or_insert(c);
                ControlFlow::Break(c)
            }
            1 => {
                if let Some(unit) = clause.free_literals().next() {
                    self.queue.push(unit, c);
                }
                ControlFlow::Continue(false)
            }
            _ => {
                let replacement = clause.free_literals().find(|l| !clause.is_watching(*l));
                let moved = replacement.is_some();
                if let Some(next) = replacement {
                    self.clauses[c].replace_watch(falsified, next);
                    self.watches.add(next, c);
                    trace!(target: targets::PROPAGATION, "#{c} watch {falsified} -> {next}");
                }
                self.establish_watches(c);
                ControlFlow::Continue(moved)
            }
        }
    }

    /// Fills the empty watcher slots of a clause of width two or more with free
    /// literals in clause order.
    pub(crate) fn establish_watches(&mut self, c: ClauseRef) {
        let clause = &self.clauses[c];
        if clause.len() < 2 {
            return;
        }
        let missing = clause.watched().iter().filter(|w| w.is_none()).count();
        let picks: SmallVec<[Literal; 2]> = clause
            .free_literals()
            .filter(|l| !clause.is_watching(*l))
            .take(missing)
            .collect();

        for lit in picks {
            if self.clauses[c].fill_watch(lit) {
                self.watches.add(lit, c);
            }
        }
    }

    /// Reverses [`State::assign`] for `var`. Clauses with an empty watcher slot pick
    /// up the freed literal.
    pub(crate) fn unassign(&mut self, var: Variable) {
        let Some(value) = self.vars.value(var) else {
            return;
        };
        let lit = Literal::new(var, value);
        self.vars.clear(var);

        for &c in self.vars.occurrences(lit) {
            let clause = &mut self.clauses[c];
            clause.satisfied_by.remove(&var);
            clause.free_literals.insert(var);
            if clause.len() >= 2 && clause.fill_watch(lit) {
                self.watches.add(lit, c);
            }
        }
        let falsified = !lit;
        for &c in self.vars.occurrences(falsified) {
            let clause = &mut self.clauses[c];
            clause.free_literals.insert(var);
            if clause.len() >= 2 && clause.fill_watch(falsified) {
                self.watches.add(falsified, c);
            }
        }
    }

    /// Handles a clause inserted while some variables already have values: a
    /// falsified clause becomes the conflict, a unit one is propagated. Width-one
    /// clauses are forced immediately since nothing watches them.
    pub(crate) fn attach(&mut self, c: ClauseRef) {
        let clause = &self.clauses[c];
        if clause.is_satisfied() {
            return;
        }
        match clause.free_count() {
            0 => {
                self.conflict.get_or_insert(c);
            }
            1 => {
                let Some(unit) = clause.free_literals().next() else {
                    return;
                };
                if clause.is_unit() {
                    self.vars.set_reason(unit.variable(), Some(c));
                    self.stats.propagations += 1;
                    self.assign(unit, true);
                } else {
                    self.queue.push(unit, c);
                }
            }
            _ => {}
        }
    }

    /// Drains the unit queue until it is empty or a conflict is found. Returns the
    /// conflicting clause.
    pub(crate) fn propagate(&mut self) -> Option<ClauseRef> {
        while self.conflict.is_none() {
            let Some((lit, reason)) = self.queue.pop() else {
                break;
            };
            if !self.vars.is_free(lit.variable()) {
                continue;
            }
            self.vars.set_reason(lit.variable(), Some(reason));
            self.stats.propagations += 1;
            self.assign(lit, true);
        }
        self.conflict
    }

    /// Opens a new level anchored at `lit`.
    pub(crate) fn open_level(&mut self, lit: Literal) {
        self.decision_level += 1;
        self.level_literals.push(lit);
    }

    /// Branches on `lit`.
    pub(crate) fn decide(&mut self, lit: Literal) {
        self.open_level(lit);
        self.vars.set_reason(lit.variable(), None);
        self.stats.decisions += 1;
        self.assign(lit, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;

    fn state(clauses: Vec<Vec<i32>>) -> State {
        State::new(&Cnf::new(clauses).unwrap())
    }

    fn lit(v: i32) -> Literal {
        Literal::from_i32(v)
    }

    #[test]
    fn test_propagation_queue_is_fifo() {
        let mut q = PropagationQueue::default();
        q.push(lit(1), 0);
        q.push(lit(-2), 1);
        q.push(lit(3), 2);

        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some((lit(1), 0)));
        assert_eq!(q.pop(), Some((lit(-2), 1)));
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn test_assign_updates_every_occurrence() {
        let mut s = state(vec![vec![1, 2, 3], vec![-1, 2, 3], vec![1, -2]]);
        s.decide(lit(1));

        assert!(s.clauses[0].is_satisfied());
        assert!(s.clauses[2].is_satisfied());
        assert!(!s.clauses[1].is_satisfied());
        assert_eq!(s.clauses[1].free_count(), 2);
        assert_eq!(s.clauses[0].free_count(), 2);
    }

    #[test]
    fn test_double_assignment_is_a_no_op() {
        let mut s = state(vec![vec![1, 2, 3], vec![-1, 2]]);
        s.assign(lit(1), false);
        s.assign(lit(1), true);
        s.assign(lit(-1), true);

        assert_eq!(s.trail().len(), 1);
        assert_eq!(s.vars().value(1), Some(true));
        assert_eq!(s.clauses[1].free_count(), 1);
        assert_eq!(s.clauses[0].satisfied_by().count(), 1);
        assert_eq!(s.queue.len(), 1);
    }

    #[test]
    fn test_watch_moves_to_free_literal() {
        let mut s = state(vec![vec![1, 2, 3]]);
        s.decide(lit(-1));

        assert_eq!(s.clauses[0].watched(), [Some(lit(3)), Some(lit(2))]);
        assert!(s.watches[lit(3)].contains(&0));
        assert!(!s.watches[lit(1)].contains(&0));
        assert!(s.queue.is_empty());
        assert!(s.watches_hold());
    }

    #[test]
    fn test_unit_clause_is_queued_with_reason() {
        let mut s = state(vec![vec![1, 2], vec![-2, 3]]);
        s.decide(lit(-1));
        assert_eq!(s.queue.pop(), Some((lit(2), 0)));
    }

    #[test]
    fn test_propagate_chains_and_records_reasons() {
        let mut s = state(vec![vec![1, 2], vec![-2, 3], vec![-3, 4]]);
        s.decide(lit(-1));

        assert_eq!(s.propagate(), None);
        assert_eq!(s.vars().value(4), Some(true));
        assert_eq!(s.vars().reason(3), Some(1));
        assert_eq!(s.vars().decision_level(4), Some(1));
        assert_eq!(s.stats().propagations, 3);
        assert!(s.watches_hold());
    }

    #[test]
    fn test_conflict_is_reported() {
        let mut s = state(vec![vec![1, 2], vec![1, -2]]);
        s.decide(lit(-1));

        let conflict = s.propagate();
        assert!(conflict.is_some());
        assert_eq!(s.conflict(), conflict);
        assert!(s.watches_hold());
    }

    #[test]
    fn test_unassign_restores_sets() {
        let mut s = state(vec![vec![1, 2, 3], vec![-1, 2]]);
        s.decide(lit(1));
        s.unassign(1);

        assert!(s.vars().is_free(1));
        assert!(!s.clauses[0].is_satisfied());
        assert_eq!(s.clauses[0].free_count(), 3);
        assert_eq!(s.clauses[1].free_count(), 2);
    }

    #[test]
    fn test_unassign_fills_empty_watch_slot() {
        let mut s = state(vec![vec![5]]);
        s.decide(lit(1));
        s.decide(lit(2));
        let c = s.insert_clause(
            [lit(-2), lit(-1)].into_iter().collect(),
            crate::sat::clause::ClauseKind::Learned,
        );
        assert_eq!(s.clauses[c].watched(), [None, None]);

        s.backtrack_to(1);
        assert_eq!(s.clauses[c].watched(), [Some(lit(-2)), None]);
        s.backtrack_to(0);
        assert_eq!(s.clauses[c].watched(), [Some(lit(-2)), Some(lit(-1))]);
        assert!(s.watches[lit(-1)].contains(&c));
    }

    #[test]
    fn test_attach_forces_width_one_immediately() {
        let mut s = state(vec![vec![1, 2]]);
        let c = s.insert_clause([lit(-1)].into_iter().collect(), crate::sat::clause::ClauseKind::Learned);
        s.attach(c);
        assert_eq!(s.vars().value(1), Some(false));
        assert_eq!(s.vars().reason(1), Some(c));

        let d = s.insert_clause([lit(1)].into_iter().collect(), crate::sat::clause::ClauseKind::Learned);
        s.attach(d);
        assert_eq!(s.conflict(), Some(d));
    }
}
