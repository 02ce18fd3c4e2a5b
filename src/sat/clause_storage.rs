#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause arena.
//!
//! Clauses are addressed by [`ClauseRef`] and never move. Deleting a clause leaves a
//! tombstone in its slot so that indices held elsewhere (occurrence lists, watch lists,
//! reasons) can never point at a different clause.

use crate::sat::clause::{Clause, ClauseRef};
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClauseDb {
    clauses: Vec<Clause>,
    learned: usize,
    deleted: usize,
}

impl Index<ClauseRef> for ClauseDb {
    type Output = Clause;

    fn index(&self, index: ClauseRef) -> &Self::Output {
        &self.clauses[index]
    }
}

impl IndexMut<ClauseRef> for ClauseDb {
    fn index_mut(&mut self, index: ClauseRef) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

impl ClauseDb {
    pub fn push(&mut self, clause: Clause) -> ClauseRef {
        if clause.is_learned() {
            self.learned += 1;
        }
        self.clauses.push(clause);
        self.clauses.len() - 1
    }

    /// Marks the clause deleted and drops its bookkeeping. Unlinking it from occurrence
    /// and watch lists is the caller's job.
    pub(crate) fn tombstone(&mut self, c: ClauseRef) {
        let clause = &mut self.clauses[c];
        if clause.deleted {
            return;
        }
        if clause.is_learned() {
            self.learned -= 1;
        }
        clause.deleted = true;
        clause.watched = [None, None];
        clause.free_literals.clear();
        clause.satisfied_by.clear();
        self.deleted += 1;
    }

    /// Number of slots, tombstones included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.clauses.len()
    }

    /// Number of live clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len() - self.deleted
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live learned clauses.
    #[must_use]
    pub const fn learned(&self) -> usize {
        self.learned
    }

    /// Live clauses with their references.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseRef, &Clause)> {
        self.clauses.iter().enumerate().filter(|(_, c)| !c.deleted)
    }

    pub fn learned_clauses(&self) -> impl Iterator<Item = (ClauseRef, &Clause)> {
        self.iter().filter(|(_, c)| c.is_learned())
    }

    #[must_use]
    pub fn all_satisfied(&self) -> bool {
        self.iter().all(|(_, c)| c.is_satisfied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::ClauseKind;
    use crate::sat::literal::Literal;
    use smallvec::smallvec;

    fn clause(kind: ClauseKind) -> Clause {
        Clause::new(smallvec![Literal::from_i32(1), Literal::from_i32(2)], kind)
    }

    #[test]
    fn test_tombstone_keeps_indices_stable() {
        let mut db = ClauseDb::default();
        let a = db.push(clause(ClauseKind::Original));
        let b = db.push(clause(ClauseKind::Learned));
        let c = db.push(clause(ClauseKind::Learned));
        assert_eq!(db.learned(), 2);

        db.tombstone(b);
        db.tombstone(b);

        assert_eq!(db.len(), 2);
        assert_eq!(db.capacity(), 3);
        assert_eq!(db.learned(), 1);
        assert!(db[b].is_deleted());
        assert_eq!(db.iter().map(|(i, _)| i).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(db.learned_clauses().count(), 1);
    }
}
