//! Merge per-area dispatches into one feeder-wide result.

use std::collections::BTreeMap;

use dopf_core::{Line, NetworkModel};
use tracing::warn;

use crate::graph::{AreaPartition, LinkSide};

use super::consensus::IterationRecord;
use super::objective::ObjectiveKind;
use super::types::{DispatchSolution, NodeSeries};
use super::workers::AreaSolve;
use super::{DistributedOutcome, TerminationStatus};

/// Merge `areas` (indexed like `partition.areas`) into one dispatch.
///
/// Placeholder ids in line keys are mapped back to the tie-line they stand
/// for, so the parent's `(P, D)` and the child's `(U, C)` both become
/// `(P, C)`. The two views are averaged; their largest disagreement is kept
/// in `tie_line_mismatch` and logged when it exceeds `tolerance`.
/// Substation power is taken from the root area only. The returned
/// objective is zero; callers set it from [`system_objective`].
pub fn assemble_solution(
    partition: &AreaPartition,
    areas: &[DispatchSolution],
    tolerance: f64,
) -> DispatchSolution {
    let mut merged = DispatchSolution::default();
    if let Some(root) = areas.get(partition.root) {
        merged.substation_power = root.substation_power.clone();
    }

    let mut views: BTreeMap<(usize, Line), Vec<f64>> = BTreeMap::new();
    for (area, result) in partition.areas.iter().zip(areas) {
        let relabel: BTreeMap<Line, Line> = area
            .links()
            .map(|al| {
                let link = &partition.links[al.link];
                let local = match al.side {
                    LinkSide::Down => Line::new(link.parent_global.clone(), link.parent_local.clone()),
                    LinkSide::Up => Line::new(link.child_local.clone(), link.child_global.clone()),
                };
                (local, link.tie_line())
            })
            .collect();

        for (t, flows) in &result.line_flow {
            for (line, value) in flows {
                let global = relabel.get(line).cloned().unwrap_or_else(|| line.clone());
                views.entry((*t, global)).or_default().push(*value);
            }
        }

        merge_family(&mut merged.storage_charge, &result.storage_charge);
        merge_family(&mut merged.storage_discharge, &result.storage_discharge);
        merge_family(&mut merged.state_of_charge, &result.state_of_charge);
        merge_family(&mut merged.flex_charge, &result.flex_charge);
        merge_family(&mut merged.flex_discharge, &result.flex_discharge);
    }

    for ((t, line), values) in views {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if values.len() > 1 {
            let spread = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
                - values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            let entry = merged.tie_line_mismatch.entry(line.clone()).or_insert(0.0);
            *entry = entry.max(spread);
        }
        merged.line_flow.entry(t).or_default().insert(line, mean);
    }

    for (line, &mismatch) in &merged.tie_line_mismatch {
        if mismatch > tolerance {
            warn!(tie_line = %line, mismatch, "area views of tie-line disagree");
        }
    }

    merged
}

fn merge_family(target: &mut NodeSeries, source: &NodeSeries) {
    for (t, values) in source {
        let slot = target.entry(*t).or_default();
        for (node, value) in values {
            slot.entry(node.clone()).or_insert(*value);
        }
    }
}

/// Feeder objective from per-area base objectives.
///
/// With `CostMinimizeWithDischargeCost` every non-root area's feed-in cost is
/// also paid by its parent (as placeholder load served from upstream), so
/// the sum of area objectives minus `Σ_t feed_in[t]·price[t]` of every
/// non-root area is reported. Every other variant reports the root area's
/// objective.
pub fn system_objective(
    objective: ObjectiveKind,
    network: &NetworkModel,
    partition: &AreaPartition,
    areas: &[DispatchSolution],
) -> f64 {
    match objective {
        ObjectiveKind::CostMinimizeWithDischargeCost => {
            let total: f64 = areas.iter().map(|a| a.objective).sum();
            let counted_twice: f64 = areas
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != partition.root)
                .flat_map(|(_, a)| a.substation_power.iter())
                .map(|(t, p)| p * network.price_at(*t))
                .sum();
            total - counted_twice
        }
        _ => areas
            .get(partition.root)
            .map(|a| a.objective)
            .unwrap_or(0.0),
    }
}

/// Package the last round of a coordinator run.
pub(crate) fn distributed_outcome(
    network: &NetworkModel,
    partition: &AreaPartition,
    objective: ObjectiveKind,
    tolerance: f64,
    solves: &[AreaSolve],
    status: TerminationStatus,
    trace: Vec<IterationRecord>,
) -> DistributedOutcome {
    let mut ordered: Vec<&AreaSolve> = solves.iter().collect();
    ordered.sort_by_key(|s| s.area);
    let dispatches: Vec<DispatchSolution> = ordered
        .iter()
        .map(|s| s.problem.dispatch(&s.x))
        .collect();

    let mut solution = assemble_solution(partition, &dispatches, tolerance);
    solution.objective = system_objective(objective, network, partition, &dispatches);
    let area_objectives = ordered
        .iter()
        .zip(&dispatches)
        .map(|(s, d)| (partition.areas[s.area].name.clone(), d.objective))
        .collect();

    DistributedOutcome {
        status,
        iterations: trace.len(),
        solution,
        area_objectives,
        trace,
    }
}
