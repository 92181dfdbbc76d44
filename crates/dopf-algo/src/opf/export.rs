//! JSON and CSV export of dispatch results and coordinator traces.

use std::path::Path;

use anyhow::{Context, Result};

use super::types::DispatchSolution;
use super::DistributedOutcome;

impl DispatchSolution {
    /// Export to pretty JSON.
    pub fn to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing dispatch to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing JSON to {}", path.display()))?;
        Ok(())
    }

    /// Convert to a JSON value (for stdout)
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).context("converting dispatch to JSON value")
    }

    /// Export in long format: `family,period,element,value`.
    ///
    /// Substation power uses an empty element; line flows use `from->to`.
    pub fn to_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("creating CSV writer for {}", path.display()))?;
        wtr.write_record(["family", "period", "element", "value"])
            .context("writing CSV header")?;

        for (t, value) in &self.substation_power {
            let row = ["substation_power".to_string(), t.to_string(), String::new(), value.to_string()];
            wtr.write_record(&row).context("writing CSV record")?;
        }
        for (t, flows) in &self.line_flow {
            for (line, value) in flows {
                let row = ["line_flow".to_string(), t.to_string(), line.to_string(), value.to_string()];
                wtr.write_record(&row).context("writing CSV record")?;
            }
        }
        for (family, series) in self.node_families() {
            for (t, values) in series {
                for (node, value) in values {
                    let row = [family.to_string(), t.to_string(), node.to_string(), value.to_string()];
                    wtr.write_record(&row).context("writing CSV record")?;
                }
            }
        }

        wtr.flush().context("flushing CSV writer")?;
        Ok(())
    }
}

impl DistributedOutcome {
    /// Export status, trace and merged dispatch as one JSON document.
    pub fn to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing outcome to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing JSON to {}", path.display()))?;
        Ok(())
    }

    /// Export the iteration trace: `iteration,tolerance,objective,augmented_objective`.
    pub fn trace_to_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("creating CSV writer for {}", path.display()))?;
        wtr.write_record(["iteration", "tolerance", "objective", "augmented_objective"])
            .context("writing CSV header")?;
        for record in &self.trace {
            let augmented = record
                .augmented_objective
                .map(|v| v.to_string())
                .unwrap_or_default();
            wtr.write_record([
                record.iteration.to_string(),
                record.tolerance.to_string(),
                record.objective.to_string(),
                augmented,
            ])
            .context("writing CSV record")?;
        }
        wtr.flush().context("flushing CSV writer")?;
        Ok(())
    }
}
