pub mod inspect;
pub mod partition;
pub mod solve;

use anyhow::{Context, Result};
use dopf_cli::CaseArgs;
use dopf_core::{AdjacencyDeclaration, NetworkModel};
use dopf_io::{four_area_feeder, load_adjacency, load_case};
use tracing::info;

/// Load the case and its adjacency declaration.
fn load_inputs(input: &CaseArgs) -> Result<(NetworkModel, AdjacencyDeclaration)> {
    let network = load_case(&input.case)
        .with_context(|| format!("loading case {}", input.case.display()))?;
    let adjacency = match &input.areas {
        Some(path) => load_adjacency(path)?,
        None => {
            info!("no --areas given, using the built-in four-area declaration");
            four_area_feeder()
        }
    };
    Ok((network, adjacency))
}
