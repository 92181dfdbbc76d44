//! Optimal power flow on partitioned feeders
//!
//! This module provides the dispatch model and three ways to solve it:
//! - Centralized (one QP for the whole feeder)
//! - ADMM (dual-ascent consensus over tie-line flows)
//! - EnAPP (one-directional primal broadcast of feed-in values)
//!
//! All three share [`LocalProblemBuilder`] and hand QPs to a
//! [`SubproblemSolver`]; [`ClarabelBackend`] is the built-in solver.

mod admm;
mod assemble;
pub mod backends;
mod centralized;
mod consensus;
mod enapp;
mod export;
mod objective;
mod problem;
mod traits;
mod types;
mod workers;

pub use admm::{AdmmConfig, AdmmCoordinator};
pub use assemble::{assemble_solution, system_objective};
pub use backends::ClarabelBackend;
pub use centralized::solve_centralized;
pub use consensus::{
    admm_residual, consensus, consensus_value, dual_update, enapp_residual, ConsensusContext,
    ConsensusState, ConvergenceTracker, DualVariable, IterateHistory, IterationRecord, LinkKey,
    LinkSnapshot, SharedVariable,
};
pub use enapp::{EnappConfig, EnappCoordinator};
pub use objective::{ObjectiveKind, PeriodCosts, SIMULTANEOUS_PENALTY};
pub use problem::{LocalProblem, LocalProblemBuilder, VariableMap};
pub use traits::{SolverError, SubproblemSolver};
pub use types::{
    DispatchSolution, LineSeries, LinearConstraint, NodeSeries, QpProblem, QpSolution,
    SolveStatus, Variable,
};

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::graph::PartitionError;

/// Error types for the distributed coordinators.
#[derive(Debug, Error)]
pub enum DistributedError {
    /// Adjacency declaration does not fit the network.
    #[error("Configuration error: {0}")]
    Configuration(#[from] PartitionError),

    /// An area has no feasible point under the current boundary values.
    #[error("Subproblem of area '{area}' is infeasible at iteration {iteration}")]
    SubproblemInfeasible { area: String, iteration: usize },

    /// The solver failed to run on an area subproblem.
    #[error("Solver failed for area '{area}' at iteration {iteration}: {message}")]
    Solver {
        area: String,
        iteration: usize,
        message: String,
    },

    /// Invalid coordinator configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// Error types for the centralized solve.
#[derive(Debug, Error)]
pub enum OpfError {
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("Problem is infeasible")]
    Infeasible,

    #[error("Solver error: {0}")]
    Solver(String),
}

impl From<SolverError> for OpfError {
    fn from(err: SolverError) -> Self {
        OpfError::Solver(err.to_string())
    }
}

impl From<OpfError> for dopf_core::DopfError {
    fn from(err: OpfError) -> Self {
        dopf_core::DopfError::Solver(err.to_string())
    }
}

impl From<DistributedError> for dopf_core::DopfError {
    fn from(err: DistributedError) -> Self {
        match err {
            DistributedError::Configuration(e) => dopf_core::DopfError::Config(e.to_string()),
            DistributedError::InvalidConfig(msg) => dopf_core::DopfError::Config(msg),
            other => dopf_core::DopfError::Solver(other.to_string()),
        }
    }
}

/// How a coordinator run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    /// Tolerance dropped below the threshold.
    Converged,
    /// Iteration cap reached; the last iterate is returned.
    MaxIterReached,
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationStatus::Converged => write!(f, "converged"),
            TerminationStatus::MaxIterReached => write!(f, "max_iter_reached"),
        }
    }
}

/// Result of a distributed solve.
#[derive(Debug, Clone, Serialize)]
pub struct DistributedOutcome {
    pub status: TerminationStatus,
    pub iterations: usize,
    /// Merged system-wide dispatch of the last round
    pub solution: DispatchSolution,
    /// Base objective of every area in the last round
    pub area_objectives: BTreeMap<String, f64>,
    pub trace: Vec<IterationRecord>,
}

impl DistributedOutcome {
    pub fn converged(&self) -> bool {
        self.status == TerminationStatus::Converged
    }
}
