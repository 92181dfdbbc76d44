//! JSON cases and format detection.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use dopf_core::NetworkModel;
use tracing::info;

use crate::csv_case::load_csv_case;

/// Load a case from a CSV directory or a `.json` file.
pub fn load_case(path: &Path) -> Result<NetworkModel> {
    if path.is_dir() {
        load_csv_case(path)
    } else {
        load_json_case(path)
    }
}

/// Load a [`NetworkModel`] serialized as JSON.
pub fn load_json_case(path: &Path) -> Result<NetworkModel> {
    let file = File::open(path).with_context(|| format!("opening case {}", path.display()))?;
    let network: NetworkModel = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing case {}", path.display()))?;
    network
        .validate()
        .with_context(|| format!("validating case {}", path.display()))?;
    info!(
        path = %path.display(),
        nodes = network.nodes.len(),
        horizon = network.horizon,
        "loaded JSON case"
    );
    Ok(network)
}

/// Write `network` as pretty JSON.
pub fn save_json_case(network: &NetworkModel, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), network)
        .with_context(|| format!("writing case {}", path.display()))?;
    Ok(())
}
