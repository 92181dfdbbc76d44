//! One synchronous round of area solves on a reusable worker pool.

use dopf_core::{NetworkModel, NodeId};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::graph::AreaPartition;

use super::consensus::ConsensusContext;
use super::objective::ObjectiveKind;
use super::problem::{LocalProblem, LocalProblemBuilder};
use super::traits::SubproblemSolver;
use super::types::SolveStatus;
use super::DistributedError;

/// Inputs of one area for one round, fixed before dispatch.
pub(crate) struct AreaTask {
    pub area: usize,
    pub boundary_load: Vec<(NodeId, Vec<f64>)>,
    pub consensus: Option<ConsensusContext>,
}

/// A solved area subproblem.
pub(crate) struct AreaSolve {
    pub area: usize,
    pub problem: LocalProblem,
    pub x: Vec<f64>,
}

/// Pool with one worker per area unless `workers` overrides it.
pub(crate) fn build_pool(areas: usize, workers: Option<usize>) -> Result<ThreadPool, DistributedError> {
    let threads = workers.unwrap_or(areas).max(1);
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("dopf-area-{i}"))
        .build()
        .map_err(|e| DistributedError::WorkerPool(e.to_string()))
}

/// Build and solve every task in parallel. Any failed area fails the round.
pub(crate) fn solve_round(
    pool: &ThreadPool,
    network: &NetworkModel,
    partition: &AreaPartition,
    objective: ObjectiveKind,
    solver: &dyn SubproblemSolver,
    tasks: Vec<AreaTask>,
    iteration: usize,
) -> Result<Vec<AreaSolve>, DistributedError> {
    pool.install(|| {
        tasks
            .into_par_iter()
            .map(|task| {
                let area = &partition.areas[task.area];
                let mut builder = LocalProblemBuilder::new(network, area, objective);
                for (node, load) in task.boundary_load {
                    builder = builder.with_boundary_load(node, load);
                }
                if let Some(ctx) = &task.consensus {
                    builder = builder.with_consensus(ctx);
                }
                let problem = builder.build();

                let solution = solver.solve(&problem.qp).map_err(|e| DistributedError::Solver {
                    area: area.name.clone(),
                    iteration,
                    message: e.to_string(),
                })?;
                debug!(area = %area.name, iteration, status = %solution.status, "area solved");

                match solution.status {
                    SolveStatus::Optimal => Ok(AreaSolve {
                        area: task.area,
                        problem,
                        x: solution.x,
                    }),
                    SolveStatus::Infeasible => Err(DistributedError::SubproblemInfeasible {
                        area: area.name.clone(),
                        iteration,
                    }),
                    SolveStatus::Failed(message) => Err(DistributedError::Solver {
                        area: area.name.clone(),
                        iteration,
                        message,
                    }),
                }
            })
            .collect()
    })
}
