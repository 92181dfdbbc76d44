//! ADMM coordinator for partitioned feeders.
//!
//! Every round solves each area's augmented local problem in parallel, then
//! reconciles each tie-line:
//!
//! ```text
//!   z      = (x_parent + x_child) / 2
//!   λ_view = λ_view + ρ·(x_view − z)          for both views
//!   tol    = max_view max(ρ‖z_k − z_{k−1}‖², ‖λ_k − λ_{k−1}‖²)
//! ```
//!
//! `x_parent` is the flow into the parent's downstream placeholder and
//! `x_child` the child's feed-in at its upstream placeholder. The consensus
//! value becomes the parent's placeholder load for the next round.

use std::sync::Arc;
use std::time::Instant;

use dopf_core::{AdjacencyDeclaration, NetworkModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{partition_network, AreaPartition, LinkSide};

use super::assemble::{distributed_outcome, system_objective};
use super::backends::ClarabelBackend;
use super::consensus::{
    admm_residual, consensus, dual_update, ConsensusContext, ConsensusState, ConvergenceTracker,
    IterateHistory, IterationRecord, LinkKey,
};
use super::objective::ObjectiveKind;
use super::traits::SubproblemSolver;
use super::workers::{build_pool, solve_round, AreaSolve, AreaTask};
use super::{DistributedError, DistributedOutcome, TerminationStatus};

/// ADMM coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmmConfig {
    /// Penalty parameter ρ, also the dual step size.
    pub rho: f64,
    /// Iteration cap; the last iterate is returned when it is reached.
    pub max_iter: usize,
    /// Convergence threshold on the round tolerance (strict `<`).
    pub tolerance: f64,
    pub objective: ObjectiveKind,
    /// Worker threads; defaults to one per area.
    pub workers: Option<usize>,
}

impl Default for AdmmConfig {
    fn default() -> Self {
        Self {
            rho: 5e-5,
            max_iter: 500,
            tolerance: 1e-5,
            objective: ObjectiveKind::default(),
            workers: None,
        }
    }
}

impl AdmmConfig {
    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_objective(mut self, objective: ObjectiveKind) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    fn validate(&self) -> Result<(), DistributedError> {
        if !(self.rho.is_finite() && self.rho > 0.0) {
            return Err(DistributedError::InvalidConfig(format!(
                "rho must be positive and finite, got {}",
                self.rho
            )));
        }
        validate_common(self.max_iter, self.tolerance, self.workers)
    }
}

pub(crate) fn validate_common(
    max_iter: usize,
    tolerance: f64,
    workers: Option<usize>,
) -> Result<(), DistributedError> {
    if max_iter == 0 {
        return Err(DistributedError::InvalidConfig(
            "max_iter must be at least 1".to_string(),
        ));
    }
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(DistributedError::InvalidConfig(format!(
            "tolerance must be positive and finite, got {tolerance}"
        )));
    }
    if workers == Some(0) {
        return Err(DistributedError::InvalidConfig(
            "workers must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Distributed OPF by consensus ADMM over tie-line flows.
pub struct AdmmCoordinator {
    config: AdmmConfig,
    solver: Arc<dyn SubproblemSolver>,
}

impl AdmmCoordinator {
    /// Coordinator with the Clarabel backend.
    pub fn new(config: AdmmConfig) -> Self {
        Self {
            config,
            solver: Arc::new(ClarabelBackend::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AdmmConfig::default())
    }

    /// Replace the subproblem solver.
    pub fn with_solver(mut self, solver: Arc<dyn SubproblemSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &AdmmConfig {
        &self.config
    }

    /// Partition `network` along `adjacency` and run ADMM.
    pub fn solve(
        &self,
        network: &NetworkModel,
        adjacency: &AdjacencyDeclaration,
    ) -> Result<DistributedOutcome, DistributedError> {
        self.config.validate()?;
        network
            .validate()
            .map_err(|e| DistributedError::InvalidConfig(e.to_string()))?;
        let partition = partition_network(network, adjacency)?;
        self.solve_partition(network, &partition)
    }

    /// Run ADMM on an existing partition.
    pub fn solve_partition(
        &self,
        network: &NetworkModel,
        partition: &AreaPartition,
    ) -> Result<DistributedOutcome, DistributedError> {
        self.config.validate()?;
        let cfg = &self.config;
        let start = Instant::now();
        let pool = build_pool(partition.areas.len(), cfg.workers)?;
        let mut state = ConsensusState::for_admm(partition, network.horizon);
        let mut tracker = ConvergenceTracker::new(cfg.tolerance);
        let mut last_round: Vec<AreaSolve> = Vec::new();
        let mut status = TerminationStatus::MaxIterReached;

        info!(
            areas = partition.areas.len(),
            links = partition.links.len(),
            rho = cfg.rho,
            "starting ADMM"
        );

        for iteration in 1..=cfg.max_iter {
            let round_start = Instant::now();
            let tasks = admm_tasks(partition, &state, cfg.rho);
            let solves = solve_round(
                &pool,
                network,
                partition,
                cfg.objective,
                self.solver.as_ref(),
                tasks,
                iteration,
            )?;

            update_consensus(partition, &solves, &mut state, cfg.rho);
            let tolerance = admm_residual(&state, cfg.rho);

            let dispatches: Vec<_> = solves.iter().map(|s| s.problem.dispatch(&s.x)).collect();
            let objective = system_objective(cfg.objective, network, partition, &dispatches);
            let augmented: f64 = solves
                .iter()
                .map(|s| s.problem.augmented_objective(&s.x))
                .sum();

            info!(
                iteration,
                tolerance,
                objective,
                elapsed_ms = round_start.elapsed().as_millis() as u64,
                "ADMM round"
            );
            last_round = solves;

            let converged = tracker.record(IterationRecord {
                iteration,
                tolerance,
                objective,
                augmented_objective: Some(augmented),
            });
            if converged {
                status = TerminationStatus::Converged;
                break;
            }
        }

        let iterations = tracker.history().len();
        match status {
            TerminationStatus::Converged => info!(
                iterations,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "ADMM converged"
            ),
            TerminationStatus::MaxIterReached => info!(
                iterations,
                tolerance = tracker.last().map_or(f64::NAN, |r| r.tolerance),
                "ADMM reached iteration cap"
            ),
        }

        Ok(distributed_outcome(
            network,
            partition,
            cfg.objective,
            cfg.tolerance,
            &last_round,
            status,
            tracker.into_history(),
        ))
    }
}

/// Round inputs: each parent's placeholder load is the latest consensus of
/// its downstream view; every area gets a snapshot of its views.
fn admm_tasks(partition: &AreaPartition, state: &ConsensusState, rho: f64) -> Vec<AreaTask> {
    (0..partition.areas.len())
        .map(|idx| {
            let area = &partition.areas[idx];
            let boundary_load = area
                .down
                .iter()
                .map(|al| {
                    let link = &partition.links[al.link];
                    let key = LinkKey::new(&link.parent, &link.child);
                    let load = state.latest_shared(&key).unwrap_or_default().to_vec();
                    (link.parent_local.clone(), load)
                })
                .collect();
            AreaTask {
                area: idx,
                boundary_load,
                consensus: Some(ConsensusContext::snapshot(partition, idx, state, rho)),
            }
        })
        .collect()
}

fn update_consensus(
    partition: &AreaPartition,
    solves: &[AreaSolve],
    state: &mut ConsensusState,
    rho: f64,
) {
    let solve_of = |area: usize| solves.iter().find(|s| s.area == area);

    for link in &partition.links {
        let (Some(parent_idx), Some(child_idx)) =
            (partition.area_index(&link.parent), partition.area_index(&link.child))
        else {
            continue;
        };
        let (Some(parent), Some(child)) = (solve_of(parent_idx), solve_of(child_idx)) else {
            continue;
        };

        let parent_est = parent
            .problem
            .boundary_estimate(LinkSide::Down, &link.parent_local, &parent.x);
        let child_est = child
            .problem
            .boundary_estimate(LinkSide::Up, &link.child_local, &child.x);
        let z = consensus(&parent_est, &child_est);

        let horizon = z.len();
        for (key, local) in [
            (LinkKey::new(&link.parent, &link.child), &parent_est),
            (LinkKey::new(&link.child, &link.parent), &child_est),
        ] {
            let next_dual = {
                let prev = state.latest_dual(&key).unwrap_or_default();
                dual_update(prev, local, &z, rho)
            };
            state
                .shared
                .entry(key.clone())
                .or_insert_with(|| IterateHistory::zeros(horizon))
                .push(z.clone());
            state
                .dual
                .entry(key)
                .or_insert_with(|| IterateHistory::zeros(horizon))
                .push(next_dual);
        }
        debug!(tie_line = %link.tie_line(), consensus = ?z, "updated consensus");
    }
}
