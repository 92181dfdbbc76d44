//! Single-problem dispatch of the whole feeder.

use dopf_core::NetworkModel;
use tracing::info;

use crate::graph::Area;

use super::objective::ObjectiveKind;
use super::problem::LocalProblemBuilder;
use super::traits::SubproblemSolver;
use super::types::{DispatchSolution, SolveStatus};
use super::OpfError;

/// Solve the unpartitioned feeder as one QP.
///
/// The feeder is treated as a single area whose sources are the nodes
/// without an incoming line. The returned objective is the solver's value
/// of the selected variant.
pub fn solve_centralized(
    network: &NetworkModel,
    objective: ObjectiveKind,
    solver: &dyn SubproblemSolver,
) -> Result<DispatchSolution, OpfError> {
    network
        .validate()
        .map_err(|e| OpfError::InvalidNetwork(e.to_string()))?;
    let area = Area::from_network("centralized", network);
    if area.substations.is_empty() {
        return Err(OpfError::InvalidNetwork(
            "network has no node without an incoming line".to_string(),
        ));
    }

    let problem = LocalProblemBuilder::new(network, &area, objective).build();
    let solution = solver.solve(&problem.qp)?;
    match solution.status {
        SolveStatus::Optimal => {}
        SolveStatus::Infeasible => return Err(OpfError::Infeasible),
        SolveStatus::Failed(message) => return Err(OpfError::Solver(message)),
    }

    let mut dispatch = problem.dispatch(&solution.x);
    dispatch.objective = solution.objective;
    info!(
        solver = solver.id(),
        objective = dispatch.objective,
        variables = problem.qp.num_variables(),
        "centralized solve finished"
    );
    Ok(dispatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opf::ClarabelBackend;
    use crate::test_utils::{chain_feeder, storage_feeder};

    #[test]
    fn test_lossless_chain_serves_total_load() {
        let net = chain_feeder(&[10.0, 12.0]);
        let result =
            solve_centralized(&net, ObjectiveKind::SubstationPower, &ClarabelBackend::new()).unwrap();
        let subs = result.substation_series();
        assert!((subs[0] - 10.0).abs() < 1e-5);
        assert!((subs[1] - 12.0).abs() < 1e-5);
        assert!((result.objective - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_storage_shifts_energy_to_cheap_period() {
        let net = storage_feeder();
        let result =
            solve_centralized(&net, ObjectiveKind::CostMinimize, &ClarabelBackend::new()).unwrap();
        let subs = result.substation_series();
        // price 0.1 then 0.3: charge first, discharge second
        assert!(subs[0] > 10.0);
        assert!(subs[1] < 12.0);
        let soc = &result.state_of_charge[&2];
        assert!((soc.values().next().copied().unwrap() - net.storage.soc_initial).abs() < 1e-4);
    }

    #[test]
    fn test_isolated_loaded_node_feeds_itself() {
        let mut net = chain_feeder(&[10.0, 12.0]);
        net.add_node(5, &[1.0, 2.0]);
        let result =
            solve_centralized(&net, ObjectiveKind::SubstationPower, &ClarabelBackend::new()).unwrap();
        let subs = result.substation_series();
        assert!((subs[0] - 11.0).abs() < 1e-5);
        assert!((subs[1] - 14.0).abs() < 1e-5);
    }

    #[test]
    fn test_insufficient_limit_is_infeasible() {
        let net = chain_feeder(&[10.0, 12.0]).with_substation_limit(5.0);
        let err = solve_centralized(&net, ObjectiveKind::SubstationPower, &ClarabelBackend::new())
            .unwrap_err();
        assert!(matches!(err, OpfError::Infeasible));
    }

    #[test]
    fn test_invalid_network_is_rejected() {
        let net = chain_feeder(&[10.0, 12.0]).with_price(vec![1.0]);
        let err = solve_centralized(&net, ObjectiveKind::CostMinimize, &ClarabelBackend::new())
            .unwrap_err();
        assert!(matches!(err, OpfError::InvalidNetwork(_)));
    }
}
