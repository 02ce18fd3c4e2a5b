#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning over an arena of clauses and an arena of variables.
//!
//! The engine is split the way the search loop uses it: a variable store and a clause
//! database cross-referenced by index, watch lists and a unit queue for propagation,
//! a trail, conflict analysis, branching heuristics and the two search controllers
//! ([`cdcl::Cdcl`] and [`dpll::Dpll`]) that drive them.

pub mod assignment;
pub mod cdcl;
pub mod clause;
pub mod clause_management;
pub mod clause_storage;
pub mod cnf;
pub mod conflict_analysis;
pub mod dimacs;
pub mod dpll;
pub mod error;
pub mod literal;
pub mod preprocessing;
pub mod propagation;
pub mod restarter;
pub mod solver;
pub mod state;
pub mod targets;
pub mod trail;
pub mod variable_selection;
pub mod watch;
