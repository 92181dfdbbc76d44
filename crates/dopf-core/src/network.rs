//! Static description of a distribution feeder over a finite horizon.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DopfError, DopfResult};

/// Node identifier.
///
/// Real feeder nodes are usually numeric in the source data while boundary
/// placeholders inserted by partitioning are textual (`"D12"`), so both are
/// carried as strings. Deserialization accepts either integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for NodeId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(value) => NodeId::from(value),
            Raw::Str(value) => NodeId(value),
        })
    }
}

/// Directed line. Positive flow runs `from → to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Line {
    pub from: NodeId,
    pub to: NodeId,
}

impl Line {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Storage parameters shared by every storage node of a feeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageParams {
    /// Rated charge/discharge power (kW).
    pub rated_power: f64,
    /// Minimum state of charge (kWh).
    pub soc_min: f64,
    /// Maximum state of charge (kWh).
    pub soc_max: f64,
    /// State of charge before period 1, and required again after period T.
    pub soc_initial: f64,
    /// Charging efficiency η_c.
    pub charge_efficiency: f64,
    /// Discharging efficiency η_d.
    pub discharge_efficiency: f64,
    /// Period length (h).
    pub delta_t: f64,
}

impl StorageParams {
    /// Parameters for a battery that sustains its rated power for `hours`.
    ///
    /// SOC bounds are 30% and 95% of the rated energy and the initial SOC
    /// sits midway between them.
    pub fn with_duration(rated_power: f64, hours: f64) -> Self {
        let energy = rated_power * hours;
        let soc_min = 0.3 * energy;
        let soc_max = 0.95 * energy;
        Self {
            rated_power,
            soc_min,
            soc_max,
            soc_initial: (soc_min + soc_max) / 2.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            delta_t: 1.0,
        }
    }
}

impl Default for StorageParams {
    fn default() -> Self {
        Self::with_duration(500.0, 4.0)
    }
}

/// Operating limits that are not tied to a particular node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLimits {
    /// Upper bound on feed-in power at every substation (or virtual substation).
    pub substation_limit: f64,
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self {
            substation_limit: 8000.0,
        }
    }
}

/// Immutable feeder description consumed by partitioning and model building.
///
/// Time series are stored per node as vectors of length [`NetworkModel::horizon`];
/// period `t` (1-based) lives at index `t - 1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkModel {
    pub nodes: Vec<NodeId>,
    pub lines: Vec<Line>,
    pub horizon: usize,
    #[serde(default)]
    pub load: BTreeMap<NodeId, Vec<f64>>,
    #[serde(default)]
    pub storage_nodes: Vec<NodeId>,
    #[serde(default)]
    pub flex_nodes: Vec<NodeId>,
    #[serde(default)]
    pub flex_charge_limit: BTreeMap<NodeId, Vec<f64>>,
    #[serde(default)]
    pub flex_discharge_limit: BTreeMap<NodeId, Vec<f64>>,
    /// Optional per-period storage charge limits, tightening `rated_power`.
    #[serde(default)]
    pub storage_charge_limit: BTreeMap<NodeId, Vec<f64>>,
    /// Optional per-period storage discharge limits, tightening `rated_power`.
    #[serde(default)]
    pub storage_discharge_limit: BTreeMap<NodeId, Vec<f64>>,
    #[serde(default)]
    pub storage: StorageParams,
    pub price: Vec<f64>,
    #[serde(default)]
    pub limits: ModelLimits,
}

impl NetworkModel {
    /// Empty model over `horizon` periods with a flat unit price.
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            price: vec![1.0; horizon],
            ..Self::default()
        }
    }

    /// Add a node with its load profile (missing periods are zero).
    pub fn add_node(&mut self, id: impl Into<NodeId>, load: &[f64]) -> &mut Self {
        let id = id.into();
        let mut series = vec![0.0; self.horizon];
        for (slot, value) in series.iter_mut().zip(load) {
            *slot = *value;
        }
        self.load.insert(id.clone(), series);
        self.nodes.push(id);
        self
    }

    pub fn add_line(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        self.lines.push(Line::new(from, to));
        self
    }

    pub fn add_storage(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.storage_nodes.push(node.into());
        self
    }

    /// Register a flexible-load node with per-period charge/discharge limits.
    pub fn add_flexible_load(
        &mut self,
        node: impl Into<NodeId>,
        charge_limit: Vec<f64>,
        discharge_limit: Vec<f64>,
    ) -> &mut Self {
        let node = node.into();
        self.flex_charge_limit.insert(node.clone(), charge_limit);
        self.flex_discharge_limit.insert(node.clone(), discharge_limit);
        self.flex_nodes.push(node);
        self
    }

    pub fn with_price(mut self, price: Vec<f64>) -> Self {
        self.price = price;
        self
    }

    pub fn with_storage_params(mut self, storage: StorageParams) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_substation_limit(mut self, limit: f64) -> Self {
        self.limits.substation_limit = limit;
        self
    }

    /// Periods `1..=T`.
    pub fn periods(&self) -> RangeInclusive<usize> {
        1..=self.horizon
    }

    pub fn has_node(&self, node: &NodeId) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    pub fn load_at(&self, period: usize, node: &NodeId) -> f64 {
        series_value(&self.load, period, node).unwrap_or(0.0)
    }

    pub fn price_at(&self, period: usize) -> f64 {
        self.price.get(period - 1).copied().unwrap_or(0.0)
    }

    /// Total load of the feeder in `period`.
    pub fn total_load(&self, period: usize) -> f64 {
        self.nodes.iter().map(|n| self.load_at(period, n)).sum()
    }

    /// Nodes with no incoming line, i.e. where power enters the feeder.
    pub fn substation_nodes(&self) -> Vec<NodeId> {
        let heads: BTreeSet<&NodeId> = self.lines.iter().map(|l| &l.to).collect();
        self.nodes
            .iter()
            .filter(|n| !heads.contains(n))
            .cloned()
            .collect()
    }

    /// Check internal consistency before any model is built.
    pub fn validate(&self) -> DopfResult<()> {
        if self.horizon == 0 {
            return Err(DopfError::Validation("horizon must be at least 1".into()));
        }
        if self.price.len() != self.horizon {
            return Err(DopfError::Validation(format!(
                "price profile has {} periods, expected {}",
                self.price.len(),
                self.horizon
            )));
        }

        let nodes: BTreeSet<&NodeId> = self.nodes.iter().collect();
        if nodes.len() != self.nodes.len() {
            return Err(DopfError::Validation("duplicate node ids".into()));
        }
        for line in &self.lines {
            if !nodes.contains(&line.from) || !nodes.contains(&line.to) {
                return Err(DopfError::Validation(format!(
                    "line {line} references an unknown node"
                )));
            }
        }
        for (node, series) in &self.load {
            if !nodes.contains(node) {
                return Err(DopfError::Validation(format!(
                    "load profile for unknown node {node}"
                )));
            }
            check_len("load", node, series, self.horizon)?;
        }
        for node in self.storage_nodes.iter().chain(&self.flex_nodes) {
            if !nodes.contains(node) {
                return Err(DopfError::Validation(format!(
                    "resource at unknown node {node}"
                )));
            }
        }
        for node in &self.flex_nodes {
            for (label, table) in [
                ("flexible charge limit", &self.flex_charge_limit),
                ("flexible discharge limit", &self.flex_discharge_limit),
            ] {
                match table.get(node) {
                    Some(series) => check_len(label, node, series, self.horizon)?,
                    None => {
                        return Err(DopfError::Validation(format!(
                            "{label} missing for node {node}"
                        )))
                    }
                }
            }
        }
        for (node, series) in self
            .storage_charge_limit
            .iter()
            .chain(&self.storage_discharge_limit)
        {
            check_len("storage limit", node, series, self.horizon)?;
        }

        let s = &self.storage;
        if !(s.soc_min <= s.soc_initial && s.soc_initial <= s.soc_max) {
            return Err(DopfError::Validation(format!(
                "initial SOC {} outside [{}, {}]",
                s.soc_initial, s.soc_min, s.soc_max
            )));
        }
        for (label, eta) in [
            ("charge", s.charge_efficiency),
            ("discharge", s.discharge_efficiency),
        ] {
            if !(eta > 0.0 && eta <= 1.0) {
                return Err(DopfError::Validation(format!(
                    "{label} efficiency {eta} must lie in (0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Value of a per-node time series at a 1-based period.
pub fn series_value(
    table: &BTreeMap<NodeId, Vec<f64>>,
    period: usize,
    node: &NodeId,
) -> Option<f64> {
    table
        .get(node)
        .and_then(|series| series.get(period.checked_sub(1)?))
        .copied()
}

fn check_len(label: &str, node: &NodeId, series: &[f64], horizon: usize) -> DopfResult<()> {
    if series.len() != horizon {
        return Err(DopfError::Validation(format!(
            "{label} for node {node} has {} periods, expected {horizon}",
            series.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feeder() -> NetworkModel {
        let mut net = NetworkModel::new(2);
        net.add_node(1, &[0.0, 0.0])
            .add_node(2, &[5.0, 6.0])
            .add_node(3, &[1.0, 1.0])
            .add_line(1, 2)
            .add_line(2, 3);
        net
    }

    #[test]
    fn test_substation_nodes_are_sources() {
        let net = feeder();
        assert_eq!(net.substation_nodes(), vec![NodeId::from(1)]);
    }

    #[test]
    fn test_isolated_node_is_its_own_source() {
        let mut net = feeder();
        net.add_node(4, &[2.0, 2.0]);
        assert_eq!(
            net.substation_nodes(),
            vec![NodeId::from(1), NodeId::from(4)]
        );
    }

    #[test]
    fn test_load_lookup_is_one_based() {
        let net = feeder();
        assert_eq!(net.load_at(1, &NodeId::from(2)), 5.0);
        assert_eq!(net.load_at(2, &NodeId::from(2)), 6.0);
        assert_eq!(net.load_at(1, &NodeId::from("missing")), 0.0);
        assert_eq!(net.total_load(2), 7.0);
    }

    #[test]
    fn test_validate_accepts_consistent_model() {
        assert!(feeder().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dangling_line() {
        let mut net = feeder();
        net.add_line(3, 99);
        let err = net.validate().unwrap_err();
        assert!(err.to_string().contains("3->99"));
    }

    #[test]
    fn test_validate_rejects_short_price() {
        let net = feeder().with_price(vec![0.1]);
        assert!(net.validate().is_err());
    }

    #[test]
    fn test_default_storage_params() {
        let s = StorageParams::default();
        assert_eq!(s.rated_power, 500.0);
        assert!((s.soc_min - 600.0).abs() < 1e-9);
        assert!((s.soc_max - 1900.0).abs() < 1e-9);
        assert!((s.soc_initial - 1250.0).abs() < 1e-9);
    }

    #[test]
    fn test_node_id_deserializes_from_int_or_string() {
        let ids: Vec<NodeId> = serde_json::from_str(r#"[4, "D12"]"#).unwrap();
        assert_eq!(ids, vec![NodeId::from(4), NodeId::from("D12")]);
    }
}
