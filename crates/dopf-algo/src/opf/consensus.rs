//! Consensus bookkeeping shared by the ADMM and EnAPP coordinators.
//!
//! Boundary quantities are tracked per *view*: the link between parent `A`
//! and child `B` has an `(A, B)` view (the parent's downstream estimate) and
//! a `(B, A)` view (the child's feed-in). Each view owns append-only
//! sequences with one vector of length `T` per iteration.
//!
//! Everything here is pure bookkeeping. Residuals are computed from the
//! sequences without mutating them, so the coordinators can be tested
//! without a solver.

use std::collections::BTreeMap;
use std::fmt;

use dopf_core::NodeId;
use serde::Serialize;

use crate::graph::{AreaPartition, LinkSide};

/// Identifies one view of a boundary link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkKey {
    pub owner: String,
    pub neighbor: String,
}

impl LinkKey {
    pub fn new(owner: impl Into<String>, neighbor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            neighbor: neighbor.into(),
        }
    }

    /// The opposite view of the same link.
    pub fn reversed(&self) -> Self {
        Self::new(self.neighbor.clone(), self.owner.clone())
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.owner, self.neighbor)
    }
}

/// Append-only sequence of per-period vectors, one entry per iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterateHistory {
    entries: Vec<Vec<f64>>,
}

/// Current best estimate of a boundary flow.
pub type SharedVariable = IterateHistory;

/// Lagrange multiplier of a boundary consensus constraint (ADMM only).
pub type DualVariable = IterateHistory;

impl IterateHistory {
    /// Sequence holding one zero vector.
    pub fn zeros(horizon: usize) -> Self {
        Self {
            entries: vec![vec![0.0; horizon]],
        }
    }

    pub fn push(&mut self, entry: Vec<f64>) {
        self.entries.push(entry);
    }

    pub fn latest(&self) -> &[f64] {
        self.entries.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entry before the latest one, if any.
    pub fn previous(&self) -> Option<&[f64]> {
        let n = self.entries.len();
        (n >= 2).then(|| self.entries[n - 2].as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Vec<f64>] {
        &self.entries
    }
}

/// Coordinator-owned iterate sequences.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsensusState {
    pub shared: BTreeMap<LinkKey, SharedVariable>,
    pub dual: BTreeMap<LinkKey, DualVariable>,
}

impl ConsensusState {
    /// Shared and dual sequences for both views of every link (ADMM).
    pub fn for_admm(partition: &AreaPartition, horizon: usize) -> Self {
        let mut state = Self::default();
        for link in &partition.links {
            for key in [
                LinkKey::new(&link.parent, &link.child),
                LinkKey::new(&link.child, &link.parent),
            ] {
                state.shared.insert(key.clone(), IterateHistory::zeros(horizon));
                state.dual.insert(key, IterateHistory::zeros(horizon));
            }
        }
        state
    }

    /// Shared sequences for the upstream view of every link only (EnAPP).
    pub fn for_enapp(partition: &AreaPartition, horizon: usize) -> Self {
        let mut state = Self::default();
        for link in &partition.links {
            state.shared.insert(
                LinkKey::new(&link.child, &link.parent),
                IterateHistory::zeros(horizon),
            );
        }
        state
    }

    /// Number of completed rounds (entries beyond the initial one).
    pub fn rounds(&self) -> usize {
        self.shared
            .values()
            .chain(self.dual.values())
            .map(|h| h.len().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }

    pub fn latest_shared(&self, key: &LinkKey) -> Option<&[f64]> {
        self.shared.get(key).map(IterateHistory::latest)
    }

    pub fn latest_dual(&self, key: &LinkKey) -> Option<&[f64]> {
        self.dual.get(key).map(IterateHistory::latest)
    }
}

/// Read-only snapshot of one link view, handed to the problem builder.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSnapshot {
    pub side: LinkSide,
    /// Placeholder node the area's estimate refers to
    pub local_node: NodeId,
    pub shared: Vec<f64>,
    pub dual: Vec<f64>,
}

/// Everything the augmented objective needs for one area.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusContext {
    pub area: String,
    pub rho: f64,
    pub links: Vec<LinkSnapshot>,
}

impl ConsensusContext {
    /// Snapshot the latest shared/dual entries of every link of `area`.
    pub fn snapshot(partition: &AreaPartition, area: usize, state: &ConsensusState, rho: f64) -> Self {
        let area = &partition.areas[area];
        let links = area
            .links()
            .map(|al| {
                let link = &partition.links[al.link];
                let key = LinkKey::new(&area.name, link.neighbor(al.side));
                LinkSnapshot {
                    side: al.side,
                    local_node: link.local_node(al.side).clone(),
                    shared: state.latest_shared(&key).unwrap_or_default().to_vec(),
                    dual: state.latest_dual(&key).unwrap_or_default().to_vec(),
                }
            })
            .collect();
        Self {
            area: area.name.clone(),
            rho,
            links,
        }
    }
}

/// Consensus of two local estimates: their arithmetic mean.
pub fn consensus_value(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Element-wise consensus of two estimate vectors.
pub fn consensus(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| consensus_value(x, y)).collect()
}

/// `dual + rho·(local − consensus)`, element-wise.
pub fn dual_update(dual: &[f64], local: &[f64], consensus: &[f64], rho: f64) -> Vec<f64> {
    dual.iter()
        .zip(local)
        .zip(consensus)
        .map(|((&l, &x), &z)| l + rho * (x - z))
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn max_abs_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// ADMM metric: max over all views of
/// `max(rho·‖Δshared‖², ‖Δdual‖²)` between the last two entries.
pub fn admm_residual(state: &ConsensusState, rho: f64) -> f64 {
    state
        .shared
        .iter()
        .map(|(key, shared)| {
            let primal = shared
                .previous()
                .map(|prev| rho * squared_distance(shared.latest(), prev))
                .unwrap_or(0.0);
            let dual = state
                .dual
                .get(key)
                .and_then(|d| d.previous().map(|prev| squared_distance(d.latest(), prev)))
                .unwrap_or(0.0);
            primal.max(dual)
        })
        .fold(0.0, f64::max)
}

/// EnAPP metric: max absolute change of any upstream view between the last
/// two entries. No tracked links yields zero.
pub fn enapp_residual(state: &ConsensusState) -> f64 {
    state
        .shared
        .values()
        .filter_map(|shared| shared.previous().map(|prev| max_abs_distance(shared.latest(), prev)))
        .fold(0.0, f64::max)
}

/// Diagnostic record of one coordinator round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based round number
    pub iteration: usize,
    pub tolerance: f64,
    /// System objective (unaugmented, with double-counting removed)
    pub objective: f64,
    /// Sum of augmented area objectives (ADMM only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub augmented_objective: Option<f64>,
}

/// Termination rule and running trace of a coordinator.
#[derive(Debug, Clone)]
pub struct ConvergenceTracker {
    threshold: f64,
    records: Vec<IterationRecord>,
}

impl ConvergenceTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            records: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Record a round; returns `true` when its tolerance is below threshold.
    pub fn record(&mut self, record: IterationRecord) -> bool {
        let converged = self.is_converged(record.tolerance);
        self.records.push(record);
        converged
    }

    pub fn is_converged(&self, tolerance: f64) -> bool {
        tolerance < self.threshold
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn into_history(self) -> Vec<IterationRecord> {
        self.records
    }
}
