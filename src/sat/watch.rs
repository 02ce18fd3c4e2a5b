#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::ClauseRef;
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::Index;

pub type WatchList = SmallVec<[ClauseRef; 6]>;

/// For every literal, the clauses watching it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchLists(Vec<WatchList>);

impl WatchLists {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![SmallVec::new(); (num_vars + 1) * 2])
    }

    pub(crate) fn add(&mut self, lit: Literal, clause: ClauseRef) {
        let list = &mut self.0[lit.index()];
        debug_assert!(!list.contains(&clause));
        list.push(clause);
    }

    pub(crate) fn remove(&mut self, lit: Literal, clause: ClauseRef) {
        self.0[lit.index()].retain(|c| *c != clause);
    }

    /// Moves the list of `lit` out, leaving it empty until [`WatchLists::restore`].
    pub(crate) fn take(&mut self, lit: Literal) -> WatchList {
        std::mem::take(&mut self.0[lit.index()])
    }

    pub(crate) fn restore(&mut self, lit: Literal, list: WatchList) {
        let slot = &mut self.0[lit.index()];
        debug_assert!(slot.is_empty());
        *slot = list;
    }
}

impl Index<Literal> for WatchLists {
    type Output = WatchList;

    fn index(&self, index: Literal) -> &Self::Output {
        &self.0[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarities_are_separate() {
        let mut watches = WatchLists::new(3);
        let a = Literal::from_i32(2);
        watches.add(a, 0);
        watches.add(a, 4);
        watches.add(!a, 1);

        assert_eq!(watches[a].as_slice(), &[0, 4]);
        assert_eq!(watches[!a].as_slice(), &[1]);

        watches.remove(a, 0);
        assert_eq!(watches[a].as_slice(), &[4]);

        let taken = watches.take(!a);
        assert!(watches[!a].is_empty());
        watches.restore(!a, taken);
        assert_eq!(watches[!a].as_slice(), &[1]);
    }
}
