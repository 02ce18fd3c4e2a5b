//! A conflict-driven clause learning SAT solver, with a DPLL engine and DIMACS input.

/// The formula model, the search engines and their components.
pub mod sat;
