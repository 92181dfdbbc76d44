//! Raw CSV case directory.
//!
//! Expected files:
//!
//! | File | Columns |
//! |------|---------|
//! | `node_data.csv` | `Nodes`, `P` (base load) |
//! | `branch_data.csv` | `fb`, `tb` |
//! | `loadshape.csv` | `time`, `M` (multiplier per period) |
//! | `edo_kw_ch_profiles.csv`, `edo_kw_dis_profiles.csv` | `t`, one column per flexible-load node |
//! | `bat_kw_ch_profiles.csv`, `bat_kw_dis_profiles.csv` | `t`, one column per battery node |
//! | `price.csv` (optional) | `t`, `price` |
//!
//! The horizon is the number of load-shape rows and node load in period `t`
//! is `P × M[t]`. Profile files are optional; a missing pair means the
//! feeder has no resources of that kind.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use dopf_core::{NetworkModel, NodeId};
use serde::Deserialize;
use tracing::{debug, info};

/// Hourly price profile used when a case has no `price.csv`.
pub const DEFAULT_PRICE: [f64; 24] = [
    0.1, 0.1, 0.1, 0.1, 0.1, 0.12, 0.15, 0.18, 0.2, 0.2, 0.22, 0.25, 0.25, 0.28, 0.33, 0.3, 0.25,
    0.22, 0.15, 0.12, 0.12, 0.1, 0.1, 0.1,
];

#[derive(Debug, Deserialize)]
struct NodeRecord {
    #[serde(rename = "Nodes")]
    node: String,
    #[serde(rename = "P")]
    load: f64,
}

#[derive(Debug, Deserialize)]
struct BranchRecord {
    fb: String,
    tb: String,
}

#[derive(Debug, Deserialize)]
struct LoadShapeRecord {
    time: usize,
    #[serde(rename = "M")]
    multiplier: f64,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    t: usize,
    price: f64,
}

/// Load a case from a directory of raw CSV tables.
pub fn load_csv_case(dir: &Path) -> Result<NetworkModel> {
    let nodes: Vec<NodeRecord> = read_records(&dir.join("node_data.csv"))?;
    let branches: Vec<BranchRecord> = read_records(&dir.join("branch_data.csv"))?;
    let shape = load_shape(&dir.join("loadshape.csv"))?;
    let horizon = shape.len();

    let mut network = NetworkModel::new(horizon);
    for record in &nodes {
        let load: Vec<f64> = shape.iter().map(|m| record.load * m).collect();
        network.add_node(record.node.trim(), &load);
    }
    for record in &branches {
        network.add_line(record.fb.trim(), record.tb.trim());
    }

    if let Some((charge, discharge)) = profile_pair(dir, "edo", horizon)? {
        for (node, limit) in charge {
            let dis = discharge.get(&node).cloned().ok_or_else(|| {
                anyhow!("flexible load {node} has a charge profile but no discharge profile")
            })?;
            network.add_flexible_load(node, limit, dis);
        }
    }
    if let Some((charge, discharge)) = profile_pair(dir, "bat", horizon)? {
        for node in charge.keys() {
            network.add_storage(node.clone());
        }
        network.storage_charge_limit = charge;
        network.storage_discharge_limit = discharge;
    }

    network.price = load_price(dir, horizon)?;
    network
        .validate()
        .with_context(|| format!("validating case in {}", dir.display()))?;

    info!(
        dir = %dir.display(),
        nodes = network.nodes.len(),
        lines = network.lines.len(),
        horizon,
        storage = network.storage_nodes.len(),
        flexible = network.flex_nodes.len(),
        "loaded CSV case"
    );
    Ok(network)
}

fn read_records<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| format!("parsing record in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}

/// Multipliers ordered by period.
fn load_shape(path: &Path) -> Result<Vec<f64>> {
    let mut records: Vec<LoadShapeRecord> = read_records(path)?;
    if records.is_empty() {
        bail!("{} has no periods", path.display());
    }
    records.sort_by_key(|r| r.time);
    for (expected, record) in (1..).zip(&records) {
        if record.time != expected {
            bail!(
                "{}: expected period {expected}, found {}",
                path.display(),
                record.time
            );
        }
    }
    Ok(records.into_iter().map(|r| r.multiplier).collect())
}

type Profiles = BTreeMap<NodeId, Vec<f64>>;

/// Charge and discharge profiles of one resource kind, if both files exist.
fn profile_pair(dir: &Path, prefix: &str, horizon: usize) -> Result<Option<(Profiles, Profiles)>> {
    let ch = dir.join(format!("{prefix}_kw_ch_profiles.csv"));
    let dis = dir.join(format!("{prefix}_kw_dis_profiles.csv"));
    match (ch.exists(), dis.exists()) {
        (false, false) => {
            debug!(prefix, "no profiles found");
            Ok(None)
        }
        (true, true) => Ok(Some((
            read_profiles(&ch, horizon)?,
            read_profiles(&dis, horizon)?,
        ))),
        _ => bail!(
            "{prefix} profiles must come in pairs: {} and {}",
            ch.display(),
            dis.display()
        ),
    }
}

/// Wide profile table: a `t` column followed by one column per node.
fn read_profiles(path: &Path, horizon: usize) -> Result<Profiles> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    if headers.get(0) != Some("t") {
        bail!("{}: first column must be `t`", path.display());
    }
    let nodes: Vec<NodeId> = headers.iter().skip(1).map(NodeId::from).collect();

    let mut rows: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("reading record in {}", path.display()))?;
        let t: usize = record
            .get(0)
            .unwrap_or_default()
            .parse()
            .with_context(|| format!("parsing period in {}", path.display()))?;
        let values = record
            .iter()
            .skip(1)
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("parsing period {t} of {}", path.display()))?;
        rows.insert(t, values);
    }

    let mut profiles: Profiles = nodes.iter().map(|n| (n.clone(), Vec::with_capacity(horizon))).collect();
    for t in 1..=horizon {
        let row = rows
            .get(&t)
            .ok_or_else(|| anyhow!("{}: missing period {t}", path.display()))?;
        for (node, value) in nodes.iter().zip(row) {
            if let Some(series) = profiles.get_mut(node) {
                series.push(*value);
            }
        }
    }
    Ok(profiles)
}

/// Prices from `price.csv`, or [`DEFAULT_PRICE`] repeated over the horizon.
fn load_price(dir: &Path, horizon: usize) -> Result<Vec<f64>> {
    let path = dir.join("price.csv");
    if !path.exists() {
        debug!(horizon, "using default hourly price profile");
        return Ok(DEFAULT_PRICE.iter().copied().cycle().take(horizon).collect());
    }
    let mut records: Vec<PriceRecord> = read_records(&path)?;
    records.sort_by_key(|r| r.t);
    if records.len() != horizon {
        bail!(
            "{} has {} periods, load shape has {horizon}",
            path.display(),
            records.len()
        );
    }
    Ok(records.into_iter().map(|r| r.price).collect())
}
