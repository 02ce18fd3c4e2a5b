//! Targets to be used within a [`log`] macro.
//!
//! No logger is installed by the library; the binary wires up `env_logger`, so
//! `RUST_LOG=analysis=debug,propagation=trace` style filters work per target.

/// Unit propagation and the watched literal rule.
pub const PROPAGATION: &str = "propagation";

/// Conflict analysis and clause learning.
pub const ANALYSIS: &str = "analysis";

/// Non-chronological backjumping and restarts.
pub const BACKJUMP: &str = "backjump";

/// Decisions and the outcome of a search.
pub const SEARCH: &str = "search";

/// Unit forcing, pure literals, tautologies and variable elimination.
pub const PREPROCESSING: &str = "preprocessing";

/// Clause insertion and deletion.
pub const CLAUSE_DB: &str = "clause_db";

/// Reading DIMACS input.
pub const PARSER: &str = "parser";

/// The command line driver.
pub const DRIVER: &str = "driver";
