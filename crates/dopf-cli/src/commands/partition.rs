use std::io::{self, Write};

use anyhow::{Context, Result};
use dopf_algo::partition_network;
use dopf_cli::CaseArgs;

use super::load_inputs;

pub fn handle(input: &CaseArgs, json: bool) -> Result<()> {
    let (network, adjacency) = load_inputs(input)?;
    let partition = partition_network(&network, &adjacency).context("partitioning case")?;
    let summary = partition.summary();

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &summary)
            .context("serializing partition summary")?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{summary}")?;
    }
    Ok(())
}
