//! Solver seam for area subproblems.
//!
//! The coordinators never solve anything themselves: they build a
//! [`QpProblem`] per area and hand it to a [`SubproblemSolver`].

use thiserror::Error;

use super::types::{QpProblem, QpSolution};

/// The solver could not be run at all (as opposed to reporting infeasibility).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// Problem data is malformed (dimension mismatch, NaN coefficients)
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Backend rejected its settings or failed to initialise
    #[error("Solver setup failed: {0}")]
    Setup(String),
}

/// Solves one convex QP and returns primal values for every variable.
///
/// Infeasibility and numerical failure are reported through
/// [`QpSolution::status`](super::QpSolution); `Err` is reserved for problems
/// the backend could not even accept.
pub trait SubproblemSolver: Send + Sync {
    /// Unique identifier (e.g., "clarabel")
    fn id(&self) -> &str;

    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, SolverError>;
}
