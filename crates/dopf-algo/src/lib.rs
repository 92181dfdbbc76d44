//! # dopf-algo: Distributed Optimal Power Flow for Radial Feeders
//!
//! This crate splits a radial distribution feeder into areas and dispatches
//! it either as one problem or by coordinating per-area subproblems.
//!
//! ## Partitioning
//!
//! [`partition_network`] cuts every declared tie-line `P → C` into two
//! half-edges `P → D` and `U → C`, where `D` and `U` are placeholder nodes
//! named in the [`dopf_core::AdjacencyDeclaration`]. Each weakly connected
//! component becomes an [`Area`]; `U` acts as a virtual substation of the
//! child area and `D` as a boundary load of the parent.
//!
//! ## Solving
//!
//! | Entry point | Description |
//! |-------------|-------------|
//! | [`solve_centralized`] | One QP for the whole feeder |
//! | [`AdmmCoordinator`] | Consensus ADMM over tie-line flows |
//! | [`EnappCoordinator`] | One-directional broadcast of child feed-in |
//!
//! Every area model is built by [`LocalProblemBuilder`] and handed to a
//! [`SubproblemSolver`]; [`ClarabelBackend`] is the built-in one.
//!
//! ## Example
//!
//! ```ignore
//! use dopf_algo::{AdmmConfig, AdmmCoordinator};
//!
//! let outcome = AdmmCoordinator::new(AdmmConfig::default().with_rho(1.0))
//!     .solve(&network, &adjacency)?;
//! println!("{} after {} rounds", outcome.status, outcome.iterations);
//! ```

pub mod graph;
pub mod opf;
pub mod test_utils;

pub use graph::{
    partition_network, Area, AreaLink, AreaPartition, AreaSummary, BoundaryLink, LinkSide,
    PartitionError, PartitionSummary,
};
pub use opf::{
    assemble_solution, solve_centralized, system_objective, AdmmConfig, AdmmCoordinator,
    ClarabelBackend, ConvergenceTracker, DispatchSolution, DistributedError, DistributedOutcome,
    EnappConfig, EnappCoordinator, IterationRecord, LocalProblem, LocalProblemBuilder,
    ObjectiveKind, OpfError, SolveStatus, SolverError, SubproblemSolver, TerminationStatus,
};
