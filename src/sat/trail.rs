#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::clause::ClauseRef;
use crate::sat::literal::Literal;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::ops::Index;

/// One assignment in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Step {
    /// The literal made true.
    pub lit: Literal,
    pub decision_level: usize,
    /// `false` for decisions.
    pub is_forced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail(Vec<Step>);

impl Index<usize> for Trail {
    type Output = Step;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Trail {
    #[must_use]
    pub fn with_capacity(num_vars: usize) -> Self {
        Self(Vec::with_capacity(num_vars))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.0.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Step> {
        self.0.last()
    }

    pub(crate) fn push(&mut self, lit: Literal, decision_level: usize, is_forced: bool) {
        debug_assert!(self.last().is_none_or(|s| s.decision_level <= decision_level));
        self.0.push(Step {
            lit,
            decision_level,
            is_forced,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<Step> {
        self.0.pop()
    }

    /// Levels never decrease from bottom to top.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        self.0
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.decision_level <= b.decision_level)
    }
}

/// A trail step together with the clause that forced it, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailEntry {
    pub step: Step,
    pub reason: Option<ClauseRef>,
}

impl Display for TrailEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Step {
            lit,
            decision_level,
            is_forced,
        } = self.step;
        write!(
            f,
            "[{}|{}|{}]",
            lit.variable(),
            u8::from(lit.polarity()),
            if is_forced { 'f' } else { 'd' }
        )?;
        if f.alternate() {
            write!(f, "@{decision_level}")?;
            if let Some(c) = self.reason {
                write!(f, "<-{c}")?;
            }
        }
        Ok(())
    }
}
