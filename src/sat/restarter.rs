#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Restart strategies.
//!
//! A restart abandons every decision and resumes the search from level 0, keeping the
//! learned clauses and the variable activities. The strategy is consulted once per
//! conflict; the search carries out a requested restart at its next branching point.
//!
//! - `Never`: the default, never restarts.
//! - `Luby`: restarts after `unit * luby(i)` conflicts, where the Luby sequence runs
//!   1, 1, 2, 1, 1, 2, 4, 1, 1, 2, ...

use clap::ValueEnum;
use std::fmt::{Debug, Display};

/// Interface for restart strategies.
pub trait Restarter: Debug {
    /// Records one conflict. Returns `true` when the search should restart.
    fn should_restart(&mut self) -> bool;
}

/// Never requests a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Never;

impl Restarter for Never {
    fn should_restart(&mut self) -> bool {
        false
    }
}

/// Restarts on the Luby schedule scaled by `unit` conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Luby {
    unit: usize,
    restarts: usize,
    /// Conflicts left before the next restart.
    restarts_in: usize,
}

impl Luby {
    #[must_use]
    pub fn new(unit: usize) -> Self {
        let unit = unit.max(1);
        Self {
            unit,
            restarts: 0,
            restarts_in: unit * Self::luby(1),
        }
    }

    /// The `x`-th element (1-based) of the Luby sequence.
    #[must_use]
    pub const fn luby(mut x: usize) -> usize {
        loop {
            let mut k = 1_u32;
            while (1_usize << k) - 1 < x {
                k += 1;
            }
            if x == (1_usize << k) - 1 {
                return 1 << (k - 1);
            }
            x -= (1 << (k - 1)) - 1;
        }
    }
}

impl Restarter for Luby {
    fn should_restart(&mut self) -> bool {
        self.restarts_in = self.restarts_in.saturating_sub(1);
        if self.restarts_in > 0 {
            return false;
        }
        self.restarts += 1;
        self.restarts_in = self.unit * Self::luby(self.restarts + 1);
        true
    }
}

#[derive(Debug, Clone)]
pub enum RestarterImpls {
    Never(Never),
    Luby(Luby),
}

impl Restarter for RestarterImpls {
    fn should_restart(&mut self) -> bool {
        match self {
            Self::Never(r) => r.should_restart(),
            Self::Luby(r) => r.should_restart(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum RestarterType {
    #[default]
    Never,
    Luby,
}

impl Display for RestarterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Luby => write!(f, "luby"),
        }
    }
}

impl RestarterType {
    #[must_use]
    pub fn to_impl(self, unit: usize) -> RestarterImpls {
        match self {
            Self::Never => RestarterImpls::Never(Never),
            Self::Luby => RestarterImpls::Luby(Luby::new(unit)),
        }
    }
}
