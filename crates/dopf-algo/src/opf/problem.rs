//! Per-area dispatch model.
//!
//! For every period `t` and node `j` of the area:
//!
//! ```text
//!   feed_in(t,s) + Σ P(t,i→j) − Σ P(t,j→k) − load(t,j)
//!       − P_c(t,j) + P_d(t,j) − Pe_c(t,j) + Pe_d(t,j) = 0
//!   0 ≤ feed_in(t,s) ≤ substation_limit
//!   0 ≤ P_c, P_d ≤ rated (tightened by per-period limits when given)
//!   0 ≤ Pe_c ≤ flex_ch(t,j),  0 ≤ Pe_d ≤ flex_dis(t,j)
//!   soc_min ≤ B(t,j) ≤ soc_max
//!   B(t,j) = B(t−1,j) + (η_c·P_c − P_d/η_d)·Δt,  B(0,j) = soc_initial
//!   B(T,j) = soc_initial
//! ```
//!
//! The feed-in term only exists at source nodes. With a [`ConsensusContext`]
//! the objective additionally receives, per link and period,
//! `dual·(x − shared) + (rho/2)·(x − shared)²`.

use std::collections::BTreeMap;

use dopf_core::{series_value, Line, NetworkModel, NodeId};

use crate::graph::{Area, LinkSide};

use super::consensus::ConsensusContext;
use super::objective::ObjectiveKind;
use super::types::{DispatchSolution, QpProblem};

/// Index of every decision variable in the QP, keyed by `(period, element)`.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    pub feed_in: BTreeMap<(usize, NodeId), usize>,
    pub flow: BTreeMap<(usize, Line), usize>,
    pub storage_charge: BTreeMap<(usize, NodeId), usize>,
    pub storage_discharge: BTreeMap<(usize, NodeId), usize>,
    pub state_of_charge: BTreeMap<(usize, NodeId), usize>,
    pub flex_charge: BTreeMap<(usize, NodeId), usize>,
    pub flex_discharge: BTreeMap<(usize, NodeId), usize>,
}

impl VariableMap {
    /// Linear expression of the area's own estimate of a boundary flow:
    /// the feed-in at the placeholder source for an upstream link, the sum
    /// of flows into the placeholder leaf for a downstream link.
    pub fn boundary_terms(&self, side: LinkSide, local_node: &NodeId, period: usize) -> Vec<(usize, f64)> {
        match side {
            LinkSide::Up => self
                .feed_in
                .get(&(period, local_node.clone()))
                .map(|&idx| vec![(idx, 1.0)])
                .unwrap_or_default(),
            LinkSide::Down => self
                .flow
                .iter()
                .filter(|((t, line), _)| *t == period && &line.to == local_node)
                .map(|(_, &idx)| (idx, 1.0))
                .collect(),
        }
    }
}

/// A built area model together with its variable index.
#[derive(Debug, Clone)]
pub struct LocalProblem {
    pub area: String,
    pub horizon: usize,
    pub qp: QpProblem,
    pub vars: VariableMap,
    /// Linear costs of the selected objective, without consensus terms
    base_cost: Vec<f64>,
}

impl LocalProblem {
    /// Objective of the selected variant at `x`, without consensus terms.
    pub fn base_objective(&self, x: &[f64]) -> f64 {
        self.base_cost.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    /// Full objective at `x`, consensus terms included.
    pub fn augmented_objective(&self, x: &[f64]) -> f64 {
        self.qp.evaluate(x)
    }

    /// Per-period value of the boundary estimate for one link.
    pub fn boundary_estimate(&self, side: LinkSide, local_node: &NodeId, x: &[f64]) -> Vec<f64> {
        (1..=self.horizon)
            .map(|t| {
                self.vars
                    .boundary_terms(side, local_node, t)
                    .iter()
                    .map(|&(idx, c)| c * x[idx])
                    .sum()
            })
            .collect()
    }

    /// Map primal values back to named variable families.
    pub fn dispatch(&self, x: &[f64]) -> DispatchSolution {
        let mut out = DispatchSolution {
            objective: self.base_objective(x),
            ..Default::default()
        };
        for t in 1..=self.horizon {
            out.substation_power.insert(t, 0.0);
        }
        for ((t, _), &idx) in &self.vars.feed_in {
            *out.substation_power.entry(*t).or_default() += x[idx];
        }
        for ((t, line), &idx) in &self.vars.flow {
            out.line_flow.entry(*t).or_default().insert(line.clone(), x[idx]);
        }
        let families = [
            (&self.vars.storage_charge, &mut out.storage_charge),
            (&self.vars.storage_discharge, &mut out.storage_discharge),
            (&self.vars.state_of_charge, &mut out.state_of_charge),
            (&self.vars.flex_charge, &mut out.flex_charge),
            (&self.vars.flex_discharge, &mut out.flex_discharge),
        ];
        for (index, target) in families {
            for ((t, node), &idx) in index {
                target.entry(*t).or_default().insert(node.clone(), x[idx]);
            }
        }
        out
    }
}

/// Builds the QP of one area.
///
/// ```ignore
/// let problem = LocalProblemBuilder::new(&network, &area, ObjectiveKind::CostMinimize)
///     .with_boundary_load("D4", vec![10.0, 12.0])
///     .with_consensus(&context)
///     .build();
/// ```
pub struct LocalProblemBuilder<'a> {
    network: &'a NetworkModel,
    area: &'a Area,
    objective: ObjectiveKind,
    boundary_load: BTreeMap<NodeId, Vec<f64>>,
    consensus: Option<&'a ConsensusContext>,
}

impl<'a> LocalProblemBuilder<'a> {
    pub fn new(network: &'a NetworkModel, area: &'a Area, objective: ObjectiveKind) -> Self {
        Self {
            network,
            area,
            objective,
            boundary_load: BTreeMap::new(),
            consensus: None,
        }
    }

    /// Override the load of `node` (typically a downstream placeholder).
    pub fn with_boundary_load(mut self, node: impl Into<NodeId>, load: Vec<f64>) -> Self {
        self.boundary_load.insert(node.into(), load);
        self
    }

    /// Add augmented-Lagrangian terms for the links in `context`.
    pub fn with_consensus(mut self, context: &'a ConsensusContext) -> Self {
        self.consensus = Some(context);
        self
    }

    fn load(&self, period: usize, node: &NodeId) -> f64 {
        series_value(&self.boundary_load, period, node)
            .or_else(|| series_value(&self.area.load, period, node))
            .unwrap_or(0.0)
    }

    pub fn build(&self) -> LocalProblem {
        let net = self.network;
        let area = self.area;
        let storage = &net.storage;
        let limit = net.limits.substation_limit;

        let mut qp = QpProblem::new();
        let mut vars = VariableMap::default();
        let mut base_cost = Vec::new();

        for t in net.periods() {
            let costs = self.objective.period_costs(net.price_at(t), storage);
            let mut add = |qp: &mut QpProblem, name: String, lower: f64, upper: f64, cost: f64| {
                let idx = qp.add_variable(name, lower, upper);
                base_cost.push(cost);
                idx
            };

            for s in &area.substations {
                let idx = add(&mut qp, format!("P_subs[{t},{s}]"), 0.0, limit, costs.feed_in);
                vars.feed_in.insert((t, s.clone()), idx);
            }
            for line in &area.lines {
                let idx = add(&mut qp, format!("P[{t},{line}]"), f64::NEG_INFINITY, f64::INFINITY, 0.0);
                vars.flow.insert((t, line.clone()), idx);
            }
            for n in &area.storage_nodes {
                let cap_c = series_value(&net.storage_charge_limit, t, n)
                    .map_or(storage.rated_power, |l| l.clamp(0.0, storage.rated_power));
                let cap_d = series_value(&net.storage_discharge_limit, t, n)
                    .map_or(storage.rated_power, |l| l.clamp(0.0, storage.rated_power));
                let c = add(&mut qp, format!("P_c[{t},{n}]"), 0.0, cap_c, costs.storage_charge);
                let d = add(&mut qp, format!("P_d[{t},{n}]"), 0.0, cap_d, costs.storage_discharge);
                let b = add(&mut qp, format!("B[{t},{n}]"), storage.soc_min, storage.soc_max, 0.0);
                vars.storage_charge.insert((t, n.clone()), c);
                vars.storage_discharge.insert((t, n.clone()), d);
                vars.state_of_charge.insert((t, n.clone()), b);
            }
            for n in &area.flex_nodes {
                let cap_c = series_value(&net.flex_charge_limit, t, n).unwrap_or(0.0).max(0.0);
                let cap_d = series_value(&net.flex_discharge_limit, t, n).unwrap_or(0.0).max(0.0);
                let c = add(&mut qp, format!("Pe_c[{t},{n}]"), 0.0, cap_c, costs.flex_charge);
                let d = add(&mut qp, format!("Pe_d[{t},{n}]"), 0.0, cap_d, costs.flex_discharge);
                vars.flex_charge.insert((t, n.clone()), c);
                vars.flex_discharge.insert((t, n.clone()), d);
            }
        }
        qp.linear = base_cost.clone();

        for t in net.periods() {
            if area.substations.len() > 1 {
                let terms = area
                    .substations
                    .iter()
                    .filter_map(|s| vars.feed_in.get(&(t, s.clone())))
                    .map(|&idx| (idx, 1.0))
                    .collect();
                qp.add_inequality(terms, limit);
            }

            for node in &area.nodes {
                let key = (t, node.clone());
                let mut terms: Vec<(usize, f64)> = Vec::new();
                if let Some(&idx) = vars.feed_in.get(&key) {
                    terms.push((idx, 1.0));
                }
                for line in &area.lines {
                    let idx = vars.flow[&(t, line.clone())];
                    if &line.to == node {
                        terms.push((idx, 1.0));
                    }
                    if &line.from == node {
                        terms.push((idx, -1.0));
                    }
                }
                for (index, sign) in [
                    (&vars.storage_charge, -1.0),
                    (&vars.storage_discharge, 1.0),
                    (&vars.flex_charge, -1.0),
                    (&vars.flex_discharge, 1.0),
                ] {
                    if let Some(&idx) = index.get(&key) {
                        terms.push((idx, sign));
                    }
                }
                qp.add_equality(terms, self.load(t, node));
            }

            for n in &area.storage_nodes {
                let key = (t, n.clone());
                let b = vars.state_of_charge[&key];
                let c = vars.storage_charge[&key];
                let d = vars.storage_discharge[&key];
                let mut terms = vec![
                    (b, 1.0),
                    (c, -storage.charge_efficiency * storage.delta_t),
                    (d, storage.delta_t / storage.discharge_efficiency),
                ];
                let rhs = match vars.state_of_charge.get(&(t - 1, n.clone())) {
                    Some(&prev) => {
                        terms.push((prev, -1.0));
                        0.0
                    }
                    None => storage.soc_initial,
                };
                qp.add_equality(terms, rhs);

                if t == net.horizon {
                    qp.add_equality(vec![(b, 1.0)], storage.soc_initial);
                }
            }
        }

        if let Some(ctx) = self.consensus {
            for link in &ctx.links {
                for t in net.periods() {
                    let shared = link.shared.get(t - 1).copied().unwrap_or(0.0);
                    let dual = link.dual.get(t - 1).copied().unwrap_or(0.0);
                    let terms = vars.boundary_terms(link.side, &link.local_node, t);
                    add_consensus_penalty(&mut qp, &terms, shared, dual, ctx.rho);
                }
            }
        }

        LocalProblem {
            area: area.name.clone(),
            horizon: net.horizon,
            qp,
            vars,
            base_cost,
        }
    }
}

/// Expand `dual·(x − s) + (rho/2)·(x − s)²` with `x = Σ c_k·v_k` into
/// linear, quadratic and constant objective terms.
fn add_consensus_penalty(qp: &mut QpProblem, terms: &[(usize, f64)], shared: f64, dual: f64, rho: f64) {
    for (k, &(vk, ck)) in terms.iter().enumerate() {
        qp.add_linear_cost(vk, (dual - rho * shared) * ck);
        qp.add_quadratic_cost(vk, vk, 0.5 * rho * ck * ck);
        for &(vl, cl) in &terms[k + 1..] {
            qp.add_quadratic_cost(vk, vl, rho * ck * cl);
        }
    }
    qp.add_constant(-dual * shared + 0.5 * rho * shared * shared);
}
