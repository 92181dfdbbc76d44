//! EnAPP coordinator: one-directional broadcast of feed-in values.
//!
//! Each round solves every area's plain local problem in parallel. The
//! child's feed-in at its upstream placeholder is appended to the link's
//! shared sequence and becomes the parent's placeholder load next round.
//! There are no duals and no averaging; the round tolerance is the largest
//! absolute change of any shared value.

use std::sync::Arc;
use std::time::Instant;

use dopf_core::{AdjacencyDeclaration, NetworkModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{partition_network, AreaPartition, LinkSide};

use super::admm::validate_common;
use super::assemble::{distributed_outcome, system_objective};
use super::backends::ClarabelBackend;
use super::consensus::{
    enapp_residual, ConsensusState, ConvergenceTracker, IterateHistory, IterationRecord, LinkKey,
};
use super::objective::ObjectiveKind;
use super::traits::SubproblemSolver;
use super::workers::{build_pool, solve_round, AreaSolve, AreaTask};
use super::{DistributedError, DistributedOutcome, TerminationStatus};

/// EnAPP coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnappConfig {
    pub max_iter: usize,
    pub tolerance: f64,
    pub objective: ObjectiveKind,
    pub workers: Option<usize>,
}

impl Default for EnappConfig {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tolerance: 1e-5,
            objective: ObjectiveKind::default(),
            workers: None,
        }
    }
}

impl EnappConfig {
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
}

/// Distributed OPF by primal broadcast of upstream feed-in.
pub struct EnappCoordinator {
    config: EnappConfig,
    solver: Arc<dyn SubproblemSolver>,
}

impl EnappCoordinator {
    pub fn new(config: EnappConfig) -> Self {
        Self {
            config,
            solver: Arc::new(ClarabelBackend::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(EnappConfig::default())
    }

    pub fn with_solver(mut self, solver: Arc<dyn SubproblemSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &EnappConfig {
        &self.config
    }

    pub fn solve(
        &self,
        network: &NetworkModel,
        adjacency: &AdjacencyDeclaration,
    ) -> Result<DistributedOutcome, DistributedError> {
        validate_common(self.config.max_iter, self.config.tolerance, self.config.workers)?;
        network
            .validate()
            .map_err(|e| DistributedError::InvalidConfig(e.to_string()))?;
        let partition = partition_network(network, adjacency)?;
        self.solve_partition(network, &partition)
    }

    pub fn solve_partition(
        &self,
        network: &NetworkModel,
        partition: &AreaPartition,
    ) -> Result<DistributedOutcome, DistributedError> {
        let cfg = &self.config;
        validate_common(cfg.max_iter, cfg.tolerance, cfg.workers)?;
        let start = Instant::now();
        let pool = build_pool(partition.areas.len(), cfg.workers)?;
        let mut state = ConsensusState::for_enapp(partition, network.horizon);
        let mut tracker = ConvergenceTracker::new(cfg.tolerance);
        let mut last_round: Vec<AreaSolve> = Vec::new();
        let mut status = TerminationStatus::MaxIterReached;

        info!(areas = partition.areas.len(), links = partition.links.len(), "starting EnAPP");

        for iteration in 1..=cfg.max_iter {
            let tasks = enapp_tasks(partition, &state);
            let solves = solve_round(
                &pool,
                network,
                partition,
                cfg.objective,
                self.solver.as_ref(),
                tasks,
                iteration,
            )?;

            broadcast_feed_in(partition, &solves, &mut state);
            let tolerance = enapp_residual(&state);
            let dispatches: Vec<_> = solves.iter().map(|s| s.problem.dispatch(&s.x)).collect();
            let objective = system_objective(cfg.objective, network, partition, &dispatches);
            info!(iteration, tolerance, objective, "EnAPP round");
            last_round = solves;

            if tracker.record(IterationRecord {
                iteration,
                tolerance,
                objective,
                augmented_objective: None,
            }) {
                status = TerminationStatus::Converged;
                break;
            }
        }

        info!(
            status = %status,
            iterations = tracker.history().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "EnAPP finished"
        );

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

/// The parent's placeholder load is the child's latest feed-in.
fn enapp_tasks(partition: &AreaPartition, state: &ConsensusState) -> Vec<AreaTask> {
    partition
        .areas
        .iter()
        .enumerate()
        .map(|(idx, area)| AreaTask {
            area: idx,
            boundary_load: area
                .down
                .iter()
                .map(|al| {
                    let link = &partition.links[al.link];
                    let key = LinkKey::new(&link.child, &link.parent);
                    let load = state.latest_shared(&key).unwrap_or_default().to_vec();
                    (link.parent_local.clone(), load)
                })
                .collect(),
            consensus: None,
        })
        .collect()
}

fn broadcast_feed_in(partition: &AreaPartition, solves: &[AreaSolve], state: &mut ConsensusState) {
    for link in &partition.links {
        let Some(child) = partition
            .area_index(&link.child)
            .and_then(|idx| solves.iter().find(|s| s.area == idx))
        else {
            continue;
        };
        let feed_in = child
            .problem
            .boundary_estimate(LinkSide::Up, &link.child_local, &child.x);
        debug!(tie_line = %link.tie_line(), feed_in = ?feed_in, "broadcast feed-in");
        let horizon = feed_in.len();
        state
            .shared
            .entry(LinkKey::new(&link.child, &link.parent))
            .or_insert_with(|| IterateHistory::zeros(horizon))
            .push(feed_in);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{chain_feeder, two_area_declaration};
    use dopf_core::AreaDeclaration;

    #[test]
    fn test_default_config() {
        let cfg = EnappConfig::default();
        assert_eq!(cfg.max_iter, 50);
        assert_eq!(cfg.tolerance, 1e-5);
    }

    #[test]
    fn test_chain_converges_after_feed_in_settles() {
        let net = chain_feeder(&[10.0, 12.0]);
        let outcome = EnappCoordinator::with_defaults()
            .solve(&net, &two_area_declaration())
            .unwrap();

        // round 1 learns the feed-in, round 2 sees no change
        assert!(outcome.converged());
        assert_eq!(outcome.iterations, 2);
        let subs = outcome.solution.substation_series();
        assert!((subs[0] - 10.0).abs() < 1e-4);
        assert!((subs[1] - 12.0).abs() < 1e-4);
        assert!(outcome.trace.iter().all(|r| r.augmented_objective.is_none()));
    }

    #[test]
    fn test_single_area_converges_in_first_round() {
        let net = chain_feeder(&[10.0, 12.0]);
        let decl = AdjacencyDeclaration::new(vec![AreaDeclaration::root("all", 1)]);
        let outcome = EnappCoordinator::with_defaults().solve(&net, &decl).unwrap();
        assert!(outcome.converged());
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.trace[0].tolerance, 0.0);
    }

    #[test]
    fn test_parent_load_follows_child_feed_in() {
        let net = chain_feeder(&[10.0, 12.0]);
        let partition = partition_network(&net, &two_area_declaration()).unwrap();
        let mut state = ConsensusState::for_enapp(&partition, 2);
        state
            .shared
            .get_mut(&LinkKey::new("area2", "area1"))
            .unwrap()
            .push(vec![7.0, 8.0]);
        let tasks = enapp_tasks(&partition, &state);
        assert_eq!(tasks[0].boundary_load[0].1, vec![7.0, 8.0]);
        assert!(tasks.iter().all(|t| t.consensus.is_none()));
    }

    #[test]
    fn test_zero_iteration_cap_is_rejected() {
        let net = chain_feeder(&[10.0]);
        let err = EnappCoordinator::new(EnappConfig::default().with_max_iter(0))
            .solve(&net, &two_area_declaration())
            .unwrap_err();
        assert!(matches!(err, DistributedError::InvalidConfig(_)));
    }
}
