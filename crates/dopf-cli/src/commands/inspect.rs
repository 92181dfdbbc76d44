use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use dopf_io::load_case;
use tabwriter::TabWriter;

pub fn handle(case: &Path) -> Result<()> {
    let network = load_case(case)?;

    let peak = network
        .periods()
        .map(|t| network.total_load(t))
        .fold(0.0_f64, f64::max);
    let energy: f64 = network.periods().map(|t| network.total_load(t)).sum();
    let sources: Vec<String> = network
        .substation_nodes()
        .iter()
        .map(ToString::to_string)
        .collect();
    let (price_min, price_max) = network
        .price
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });

    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "Case\t{}", case.display())?;
    writeln!(writer, "Nodes\t{}", network.nodes.len())?;
    writeln!(writer, "Lines\t{}", network.lines.len())?;
    writeln!(writer, "Periods\t{}", network.horizon)?;
    writeln!(writer, "Sources\t[{}]", sources.join(","))?;
    writeln!(writer, "Storage nodes\t{}", network.storage_nodes.len())?;
    writeln!(writer, "Flexible loads\t{}", network.flex_nodes.len())?;
    writeln!(writer, "Peak load\t{peak:.3}")?;
    writeln!(writer, "Total energy\t{energy:.3}")?;
    writeln!(writer, "Price range\t[{price_min:.3}, {price_max:.3}]")?;
    writeln!(
        writer,
        "Substation limit\t{}",
        network.limits.substation_limit
    )?;
    writer.flush()?;
    Ok(())
}
