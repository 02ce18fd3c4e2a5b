#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The engine context shared by both search controllers.
//!
//! A [`State`] owns every arena and every piece of search state for one formula:
//! the variable store, the clause database, the watch lists, the trail, the unit
//! queue and the level bookkeeping. Nothing lives outside it, so solving another
//! formula is a matter of [`State::load`].

use crate::sat::assignment::{Solutions, VariableStore};
use crate::sat::clause::{normalise, Clause, ClauseKind, ClauseRef, Literals, Normalised};
use crate::sat::clause_storage::ClauseDb;
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use crate::sat::preprocessing::Elimination;
use crate::sat::propagation::PropagationQueue;
use crate::sat::solver::SolutionStats;
use crate::sat::targets;
use crate::sat::trail::{Trail, TrailEntry};
use crate::sat::watch::WatchLists;
use itertools::Itertools;
use log::{debug, trace};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct State {
    pub(crate) vars: VariableStore,
    pub(crate) clauses: ClauseDb,
    pub(crate) watches: WatchLists,
    pub(crate) trail: Trail,
    pub(crate) queue: PropagationQueue,
    pub(crate) decision_level: usize,
    /// The literal that opened each level; `level_literals[d - 1]` opened level `d`.
    pub(crate) level_literals: Vec<Literal>,
    /// First conflicting clause found since the last backtrack.
    pub(crate) conflict: Option<ClauseRef>,
    /// Set once the formula is known to be unsatisfiable at level 0.
    pub(crate) unsat: bool,
    /// Variables freed by the most recent [`State::backtrack_to`].
    pub(crate) unassigned: Vec<Variable>,
    pub(crate) eliminations: Vec<Elimination>,
    /// Range a model covers; may exceed the variables that occur.
    pub(crate) declared_vars: usize,
    pub(crate) stats: SolutionStats,
}

impl State {
    #[must_use]
    pub fn new(cnf: &Cnf) -> Self {
        let mut state = Self {
            vars: VariableStore::new(cnf.num_vars),
            watches: WatchLists::new(cnf.num_vars),
            trail: Trail::with_capacity(cnf.num_vars),
            declared_vars: cnf.total_vars(),
            ..Self::default()
        };

        for clause in cnf.iter() {
            state.add_original_clause(clause.iter().copied());
        }

        debug!(
            target: targets::CLAUSE_DB,
            "loaded {} clauses over {} variables{}",
            state.clauses.len(),
            cnf.num_vars,
            if state.unsat { " (contains an empty clause)" } else { "" }
        );
        state
    }

    /// Drops everything and ingests `cnf` afresh.
    pub fn load(&mut self, cnf: &Cnf) {
        *self = Self::new(cnf);
    }

    /// Releases all owned state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds a clause of the input formula. Tautologies are dropped; an empty clause
    /// makes the formula unsatisfiable.
    pub(crate) fn add_original_clause<I: IntoIterator<Item = Literal>>(
        &mut self,
        literals: I,
    ) -> Option<ClauseRef> {
        match normalise(literals) {
            Normalised::Tautology => {
                trace!(target: targets::CLAUSE_DB, "dropping tautological clause");
                None
            }
            Normalised::Literals(lits) if lits.is_empty() => {
                self.unsat = true;
                None
            }
            Normalised::Literals(lits) => Some(self.insert_clause(lits, ClauseKind::Original)),
        }
    }

    /// Puts a normalised clause in the arena, derives its free and satisfied sets from
    /// the current assignment, links its occurrences and picks its watchers.
    pub(crate) fn insert_clause(&mut self, literals: Literals, kind: ClauseKind) -> ClauseRef {
        let mut clause = Clause::new(literals, kind);
        for i in 0..clause.len() {
            let lit = clause[i];
            if let Some(value) = self.vars.value(lit.variable()) {
                clause.free_literals.remove(&lit.variable());
                if lit.is_satisfied_by(value) {
                    clause.satisfied_by.insert(lit.variable());
                }
            }
        }

        let c = self.clauses.push(clause);
        for &lit in self.clauses[c].literals() {
            self.vars.add_occurrence(lit, c);
        }
        self.establish_watches(c);
        trace!(target: targets::CLAUSE_DB, "#{c} {}", self.clauses[c]);
        c
    }

    /// Unlinks a clause from every list and tombstones it.
    pub(crate) fn delete_clause(&mut self, c: ClauseRef) {
        let clause = &self.clauses[c];
        for &lit in clause.literals() {
            self.vars.remove_occurrence(lit, c);
        }
        for lit in clause.watched().into_iter().flatten() {
            self.watches.remove(lit, c);
        }
        self.clauses.tombstone(c);
        self.stats.removed_clauses += 1;
    }

    /// Whether some assigned variable names `c` as its reason.
    #[must_use]
    pub fn is_locked(&self, c: ClauseRef) -> bool {
        self.clauses[c].iter().any(|lit| {
            let var = lit.variable();
            !self.vars.is_free(var) && self.vars.reason(var) == Some(c)
        })
    }

    /// Unassigns every trail entry above `level`, most recent first, and clears the
    /// conflict and the unit queue. The freed variables are left in `unassigned`.
    pub(crate) fn backtrack_to(&mut self, level: usize) {
        self.unassigned.clear();
        while let Some(step) = self.trail.last().copied() {
            if step.decision_level <= level {
                break;
            }
            self.trail.pop();
            let var = step.lit.variable();
            self.unassign(var);
            self.unassigned.push(var);
        }
        trace!(
            target: targets::BACKJUMP,
            "{} -> {level}, freed {}",
            self.decision_level,
            self.unassigned.len()
        );
        self.level_literals.truncate(level);
        self.decision_level = level;
        self.conflict = None;
        self.queue.clear();
    }

    /// Current values with eliminated variables reconstructed.
    #[must_use]
    pub fn model(&self) -> Solutions {
        let mut solutions = self.vars.solutions().with_declared_vars(self.declared_vars);
        for elimination in self.eliminations.iter().rev() {
            elimination.reconstruct(&mut solutions);
        }
        solutions
    }

    #[must_use]
    pub const fn vars(&self) -> &VariableStore {
        &self.vars
    }

    #[must_use]
    pub const fn clauses(&self) -> &ClauseDb {
        &self.clauses
    }

    #[must_use]
    pub const fn trail(&self) -> &Trail {
        &self.trail
    }

    #[must_use]
    pub const fn decision_level(&self) -> usize {
        self.decision_level
    }

    #[must_use]
    pub const fn conflict(&self) -> Option<ClauseRef> {
        self.conflict
    }

    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        self.unsat
    }

    #[must_use]
    pub const fn stats(&self) -> SolutionStats {
        self.stats
    }

    /// Whether every decidable variable has a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.vars.variables().all(|v| !self.vars.is_decidable(v))
    }

    #[must_use]
    pub fn trail_snapshot(&self) -> Vec<TrailEntry> {
        self.trail
            .iter()
            .map(|&step| TrailEntry {
                step,
                reason: if step.is_forced {
                    self.vars.reason(step.lit.variable())
                } else {
                    None
                },
            })
            .collect()
    }

    #[must_use]
    pub fn clause_snapshot(&self) -> Vec<ClauseSnapshot> {
        self.clauses
            .iter()
            .map(|(id, c)| ClauseSnapshot {
                id,
                literals: c.literals().to_vec(),
                learned: c.is_learned(),
                satisfied: c.is_satisfied(),
                free: c.free_count(),
                watched: c.watched(),
            })
            .collect()
    }

    /// Every unsatisfied clause of width two or more, other than the recorded conflict,
    /// has a free watcher, and every watcher is registered in its watch list.
    #[must_use]
    pub fn watches_hold(&self) -> bool {
        self.clauses.iter().all(|(c, clause)| {
            let registered = clause
                .watched()
                .into_iter()
                .flatten()
                .all(|w| self.watches[w].contains(&c));
            let live = clause.len() < 2
                || clause.is_satisfied()
                || self.conflict == Some(c)
                || clause
                    .watched()
                    .into_iter()
                    .flatten()
                    .any(|w| self.vars.is_free(w.variable()));
            registered && live
        })
    }
}

/// Read-only view of one clause for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseSnapshot {
    pub id: ClauseRef,
    pub literals: Vec<Literal>,
    pub learned: bool,
    pub satisfied: bool,
    pub free: usize,
    pub watched: [Option<Literal>; 2],
}

impl Display for ClauseSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let watch = |w: Option<Literal>| w.map_or_else(|| "-".to_string(), |l| l.to_string());
        write!(
            f,
            "#{} ({}){}{} free={} watch=[{},{}]",
            self.id,
            self.literals.iter().join(" ∨ "),
            if self.learned { " learned" } else { "" },
            if self.satisfied { " sat" } else { "" },
            self.free,
            watch(self.watched[0]),
            watch(self.watched[1]),
        )
    }
}
