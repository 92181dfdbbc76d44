use std::collections::BTreeMap;
use std::fmt;

use dopf_core::{Line, NodeId};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Decision variable with box bounds. Infinite bounds are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// Linear row `Σ coeff·x ⋄ rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub terms: Vec<(usize, f64)>,
    pub rhs: f64,
}

/// Convex QP handed to a [`SubproblemSolver`](super::SubproblemSolver):
///
/// ```text
///   min  Σ c_i x_i + Σ q_ij x_i x_j + k
///   s.t. A_eq x = b_eq
///        A_in x ≤ b_in
///        l ≤ x ≤ u
/// ```
#[derive(Debug, Clone, Default)]
pub struct QpProblem {
    pub variables: Vec<Variable>,
    pub linear: Vec<f64>,
    /// `(i, j, q)` contributes `q·x_i·x_j`; `i == j` gives `q·x_i²`.
    pub quadratic: Vec<(usize, usize, f64)>,
    pub constant: f64,
    pub equalities: Vec<LinearConstraint>,
    /// Rows of the form `terms·x ≤ rhs`.
    pub inequalities: Vec<LinearConstraint>,
}

impl QpProblem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> usize {
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
        });
        self.linear.push(0.0);
        self.variables.len() - 1
    }

    pub fn add_linear_cost(&mut self, var: usize, coeff: f64) {
        self.linear[var] += coeff;
    }

    pub fn add_quadratic_cost(&mut self, i: usize, j: usize, coeff: f64) {
        self.quadratic.push((i, j, coeff));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn add_equality(&mut self, terms: Vec<(usize, f64)>, rhs: f64) {
        self.equalities.push(LinearConstraint { terms, rhs });
    }

    pub fn add_inequality(&mut self, terms: Vec<(usize, f64)>, rhs: f64) {
        self.inequalities.push(LinearConstraint { terms, rhs });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Objective value at `x`, constant included.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        let linear: f64 = self.linear.iter().zip(x).map(|(c, v)| c * v).sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .map(|&(i, j, q)| q * x[i] * x[j])
            .sum();
        linear + quadratic + self.constant
    }

    /// Largest violation of any bound or constraint at `x`.
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        let row = |c: &LinearConstraint| c.terms.iter().map(|&(i, a)| a * x[i]).sum::<f64>() - c.rhs;
        let bounds = self
            .variables
            .iter()
            .zip(x)
            .map(|(v, &xi)| (v.lower - xi).max(xi - v.upper).max(0.0));
        let eq = self.equalities.iter().map(|c| row(c).abs());
        let ineq = self.inequalities.iter().map(|c| row(c).max(0.0));
        bounds.chain(eq).chain(ineq).fold(0.0, f64::max)
    }
}

/// Outcome reported by a subproblem solver.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Failed(String),
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Primal result of one QP solve.
#[derive(Debug, Clone)]
pub struct QpSolution {
    pub status: SolveStatus,
    pub x: Vec<f64>,
    pub objective: f64,
}

/// Per-period values keyed by node.
pub type NodeSeries = BTreeMap<usize, BTreeMap<NodeId, f64>>;

/// Per-period values keyed by line.
pub type LineSeries = BTreeMap<usize, BTreeMap<Line, f64>>;

/// Dispatch of one area, or of the whole feeder after assembly.
///
/// Periods are 1-based. `substation_power[t]` is the total feed-in of the
/// area's sources (for the merged result: of the root area only).
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchSolution {
    pub objective: f64,
    pub substation_power: BTreeMap<usize, f64>,
    #[serde(serialize_with = "serialize_line_series")]
    pub line_flow: LineSeries,
    pub storage_charge: NodeSeries,
    pub storage_discharge: NodeSeries,
    pub state_of_charge: NodeSeries,
    pub flex_charge: NodeSeries,
    pub flex_discharge: NodeSeries,
    /// Largest disagreement between the two area views of each tie-line.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(serialize_with = "serialize_line_keys")]
    pub tie_line_mismatch: BTreeMap<Line, f64>,
}

impl DispatchSolution {
    pub fn line_flow_at(&self, period: usize, line: &Line) -> Option<f64> {
        self.line_flow.get(&period)?.get(line).copied()
    }

    pub fn substation_series(&self) -> Vec<f64> {
        self.substation_power.values().copied().collect()
    }

    /// Node-keyed families by export name.
    pub fn node_families(&self) -> [(&'static str, &NodeSeries); 5] {
        [
            ("storage_charge", &self.storage_charge),
            ("storage_discharge", &self.storage_discharge),
            ("state_of_charge", &self.state_of_charge),
            ("flex_charge", &self.flex_charge),
            ("flex_discharge", &self.flex_discharge),
        ]
    }
}

fn serialize_line_series<S: Serializer>(series: &LineSeries, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(series.len()))?;
    for (period, flows) in series {
        let keyed: BTreeMap<String, f64> = flows.iter().map(|(l, v)| (l.to_string(), *v)).collect();
        map.serialize_entry(period, &keyed)?;
    }
    map.end()
}

fn serialize_line_keys<S: Serializer>(
    values: &BTreeMap<Line, f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(values.len()))?;
    for (line, value) in values {
        map.serialize_entry(&line.to_string(), value)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_includes_all_terms() {
        let mut qp = QpProblem::new();
        let a = qp.add_variable("a", 0.0, 10.0);
        let b = qp.add_variable("b", 0.0, 10.0);
        qp.add_linear_cost(a, 2.0);
        qp.add_quadratic_cost(a, b, 0.5);
        qp.add_quadratic_cost(b, b, 1.0);
        qp.add_constant(3.0);
        // 2*1 + 0.5*1*2 + 1*4 + 3
        assert_eq!(qp.evaluate(&[1.0, 2.0]), 10.0);
    }

    #[test]
    fn test_max_violation() {
        let mut qp = QpProblem::new();
        let a = qp.add_variable("a", 0.0, 1.0);
        qp.add_equality(vec![(a, 1.0)], 0.5);
        assert_eq!(qp.max_violation(&[0.5]), 0.0);
        assert!((qp.max_violation(&[2.0]) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_line_keys_serialize_as_strings() {
        let mut solution = DispatchSolution::default();
        solution
            .line_flow
            .entry(1)
            .or_default()
            .insert(Line::new(1, 2), 4.0);
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["line_flow"]["1"]["1->2"], 4.0);
    }
}
