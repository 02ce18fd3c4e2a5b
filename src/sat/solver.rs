#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The common surface of the search engines.
//!
//! Both engines are built from a [`Cnf`] and a [`SolverConfig`], answer with a
//! [`Verdict`] and expose their [`State`] and [`SolutionStats`] for inspection.
//! [`SolverType`] selects an engine at run time and [`SolverImpls`] dispatches to it.

use crate::sat::assignment::Solutions;
use crate::sat::cdcl::Cdcl;
use crate::sat::clause_management::ClauseManagementType;
use crate::sat::cnf::Cnf;
use crate::sat::dpll::Dpll;
use crate::sat::restarter::RestarterType;
use crate::sat::state::State;
use crate::sat::variable_selection::HeuristicType;
use clap::ValueEnum;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Counters collected during one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolutionStats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub restarts: usize,
    pub learnt_clauses: usize,
    pub removed_clauses: usize,
    pub eliminated_variables: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A model covering every variable of the formula. Variables that do not matter
    /// are `None`.
    Satisfiable(Solutions),
    Unsatisfiable,
    /// The time budget ran out.
    Unknown,
}

impl Verdict {
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self, Self::Satisfiable(_))
    }

    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsatisfiable)
    }

    #[must_use]
    pub const fn solutions(&self) -> Option<&Solutions> {
        match self {
            Self::Satisfiable(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable(_) => write!(f, "SATISFIABLE"),
            Self::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Every tunable of the engines.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// `None` picks the engine's own default: VSIDS for CDCL, MOM for DPLL.
    pub heuristic: Option<HeuristicType>,
    pub restarts: RestarterType,
    pub clause_management: ClauseManagementType,
    /// Factor applied to VSIDS activities at each decay.
    pub vsids_decay: f64,
    /// Decisions between VSIDS decays.
    pub vsids_period: usize,
    /// Conflicts per Luby unit.
    pub luby_unit: usize,
    /// Learned clause count that triggers a database clean.
    pub max_learned: usize,
    pub timeout: Option<Duration>,
    pub pure_literals: bool,
    pub variable_elimination: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            heuristic: None,
            restarts: RestarterType::default(),
            clause_management: ClauseManagementType::default(),
            vsids_decay: 0.95,
            vsids_period: 256,
            luby_unit: 100,
            max_learned: 20_000,
            timeout: None,
            pure_literals: true,
            variable_elimination: false,
        }
    }
}

impl SolverConfig {
    #[must_use]
    pub const fn with_heuristic(mut self, heuristic: HeuristicType) -> Self {
        self.heuristic = Some(heuristic);
        self
    }

    #[must_use]
    pub const fn with_restarts(mut self, restarts: RestarterType) -> Self {
        self.restarts = restarts;
        self
    }

    #[must_use]
    pub const fn with_clause_management(mut self, clause_management: ClauseManagementType) -> Self {
        self.clause_management = clause_management;
        self
    }

    #[must_use]
    pub const fn with_vsids(mut self, decay: f64, period: usize) -> Self {
        self.vsids_decay = decay;
        self.vsids_period = period;
        self
    }

    #[must_use]
    pub const fn with_luby_unit(mut self, unit: usize) -> Self {
        self.luby_unit = unit;
        self
    }

    #[must_use]
    pub const fn with_max_learned(mut self, max_learned: usize) -> Self {
        self.max_learned = max_learned;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_pure_literals(mut self, enabled: bool) -> Self {
        self.pure_literals = enabled;
        self
    }

    #[must_use]
    pub const fn with_variable_elimination(mut self, enabled: bool) -> Self {
        self.variable_elimination = enabled;
        self
    }
}

pub trait Solver {
    fn new(cnf: &Cnf, config: SolverConfig) -> Self
    where
        Self: Sized;

    /// Discards the current formula and all search state and takes `cnf` instead.
    fn load(&mut self, cnf: &Cnf);

    fn solve(&mut self) -> Verdict;

    fn stats(&self) -> SolutionStats;

    fn state(&self) -> &State;
}

#[derive(Debug, Clone)]
pub enum SolverImpls {
    Cdcl(Box<Cdcl>),
    Dpll(Box<Dpll>),
}

impl Solver for SolverImpls {
    /// Always builds the CDCL engine; [`SolverType::to_impl`] selects one at run time.
    fn new(cnf: &Cnf, config: SolverConfig) -> Self {
        Self::Cdcl(Box::new(Cdcl::new(cnf, config)))
    }

    fn load(&mut self, cnf: &Cnf) {
        match self {
            Self::Cdcl(s) => s.load(cnf),
            Self::Dpll(s) => s.load(cnf),
        }
    }

    fn solve(&mut self) -> Verdict {
        match self {
            Self::Cdcl(s) => s.solve(),
            Self::Dpll(s) => s.solve(),
        }
    }

    fn stats(&self) -> SolutionStats {
        match self {
            Self::Cdcl(s) => s.stats(),
            Self::Dpll(s) => s.stats(),
        }
    }

    fn state(&self) -> &State {
        match self {
            Self::Cdcl(s) => s.state(),
            Self::Dpll(s) => s.state(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum SolverType {
    #[default]
    Cdcl,
    Dpll,
}

impl Display for SolverType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cdcl => write!(f, "cdcl"),
            Self::Dpll => write!(f, "dpll"),
        }
    }
}

impl SolverType {
    #[must_use]
    pub fn to_impl(self, cnf: &Cnf, config: SolverConfig) -> SolverImpls {
        match self {
            Self::Cdcl => SolverImpls::Cdcl(Box::new(Cdcl::new(cnf, config))),
            Self::Dpll => SolverImpls::Dpll(Box::new(Dpll::new(cnf, config))),
        }
    }
}
