use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dopf_algo::{
    partition_network, solve_centralized, AdmmConfig, AdmmCoordinator, ClarabelBackend,
    DispatchSolution, DistributedOutcome, EnappConfig, EnappCoordinator,
};
use dopf_cli::{Method, SolveArgs};
use serde::Deserialize;
use tabwriter::TabWriter;
use tracing::info;

use super::load_inputs;

/// Coordinator settings read from `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunConfig {
    admm: AdmmConfig,
    enapp: EnappConfig,
}

impl RunConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Command-line flags take precedence over the file.
    fn apply_flags(mut self, args: &SolveArgs) -> Self {
        if let Some(objective) = args.objective {
            self.admm.objective = objective;
            self.enapp.objective = objective;
        }
        if let Some(tolerance) = args.tolerance {
            self.admm.tolerance = tolerance;
            self.enapp.tolerance = tolerance;
        }
        if let Some(workers) = args.workers {
            self.admm.workers = Some(workers);
            self.enapp.workers = Some(workers);
        }
        if let Some(rho) = args.rho {
            self.admm.rho = rho;
        }
        if let Some(max_iter) = args.max_iter {
            self.admm.max_iter = max_iter;
        }
        if let Some(max_iter) = args.enapp_max_iter {
            self.enapp.max_iter = max_iter;
        }
        self
    }
}

/// One line of the result table.
struct RunRow {
    method: &'static str,
    status: String,
    iterations: usize,
    objective: f64,
    mismatch: Option<f64>,
}

impl RunRow {
    fn distributed(method: &'static str, outcome: &DistributedOutcome) -> Self {
        Self {
            method,
            status: outcome.status.to_string(),
            iterations: outcome.iterations,
            objective: outcome.solution.objective,
            mismatch: outcome
                .solution
                .tie_line_mismatch
                .values()
                .copied()
                .reduce(f64::max),
        }
    }
}

pub fn handle(args: &SolveArgs) -> Result<()> {
    let config = RunConfig::load(args.config.as_deref())?.apply_flags(args);
    let (network, adjacency) = load_inputs(&args.input)?;
    if let Some(dir) = &args.out {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rows = Vec::new();

    if args.method.includes(Method::Centralized) {
        let solution = solve_centralized(&network, config.admm.objective, &ClarabelBackend::new())
            .context("centralized solve")?;
        if let Some(dir) = &args.out {
            export_dispatch(dir, "centralized", &solution)?;
        }
        rows.push(RunRow {
            method: "centralized",
            status: "optimal".to_string(),
            iterations: 1,
            objective: solution.objective,
            mismatch: None,
        });
    }

    if args.method.includes(Method::Admm) || args.method.includes(Method::Enapp) {
        let partition = partition_network(&network, &adjacency).context("partitioning case")?;
        info!(areas = partition.areas.len(), "partitioned case");

        if args.method.includes(Method::Admm) {
            let outcome = AdmmCoordinator::new(config.admm.clone())
                .solve_partition(&network, &partition)
                .context("ADMM solve")?;
            if let Some(dir) = &args.out {
                export_outcome(dir, "admm", &outcome)?;
            }
            rows.push(RunRow::distributed("admm", &outcome));
        }
        if args.method.includes(Method::Enapp) {
            let outcome = EnappCoordinator::new(config.enapp.clone())
                .solve_partition(&network, &partition)
                .context("EnAPP solve")?;
            if let Some(dir) = &args.out {
                export_outcome(dir, "enapp", &outcome)?;
            }
            rows.push(RunRow::distributed("enapp", &outcome));
        }
    }

    print_table(&rows)
}

fn print_table(rows: &[RunRow]) -> Result<()> {
    let reference = rows
        .iter()
        .find(|r| r.method == "centralized")
        .map(|r| r.objective);

    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "METHOD\tSTATUS\tITERATIONS\tOBJECTIVE\tGAP\tMAX TIE MISMATCH")?;
    for row in rows {
        let gap = match reference {
            Some(r) if row.method != "centralized" => {
                format!("{:.3e}", (row.objective - r).abs() / r.abs().max(1e-12))
            }
            _ => "-".to_string(),
        };
        let mismatch = row
            .mismatch
            .map(|m| format!("{m:.3e}"))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.6}\t{}\t{}",
            row.method, row.status, row.iterations, row.objective, gap, mismatch
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn export_dispatch(dir: &Path, method: &str, solution: &DispatchSolution) -> Result<()> {
    let json = output_path(dir, method, "dispatch.json");
    solution.to_json(&json)?;
    solution.to_csv(&output_path(dir, method, "dispatch.csv"))?;
    info!(method, path = %json.display(), "wrote dispatch");
    Ok(())
}

fn export_outcome(dir: &Path, method: &str, outcome: &DistributedOutcome) -> Result<()> {
    let json = output_path(dir, method, "outcome.json");
    outcome.to_json(&json)?;
    outcome
        .solution
        .to_csv(&output_path(dir, method, "dispatch.csv"))?;
    outcome.trace_to_csv(&output_path(dir, method, "trace.csv"))?;
    info!(method, path = %json.display(), "wrote outcome");
    Ok(())
}

fn output_path(dir: &Path, method: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{method}_{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dopf_algo::ObjectiveKind;
    use dopf_cli::{Cli, Commands};

    fn solve_args(extra: &[&str]) -> SolveArgs {
        let mut argv = vec!["dopf", "solve", "--case", "case.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Solve(args)) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_config_tables_are_optional() {
        let config: RunConfig = toml::from_str("[admm]\nrho = 0.5\n").unwrap();
        assert_eq!(config.admm.rho, 0.5);
        assert_eq!(config.admm.max_iter, AdmmConfig::default().max_iter);
        assert_eq!(config.enapp, EnappConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let config: RunConfig =
            toml::from_str("[admm]\nrho = 0.5\nmax_iter = 20\n[enapp]\nmax_iter = 7\n").unwrap();
        let args = solve_args(&["--rho", "2.0", "--tolerance", "1e-3", "--objective", "power_flow"]);
        let config = config.apply_flags(&args);

        assert_eq!(config.admm.rho, 2.0);
        assert_eq!(config.admm.max_iter, 20);
        assert_eq!(config.enapp.max_iter, 7);
        assert_eq!(config.enapp.tolerance, 1e-3);
        assert_eq!(config.enapp.objective, ObjectiveKind::PowerFlow);
    }

    #[test]
    fn test_unknown_config_table_is_rejected() {
        assert!(toml::from_str::<RunConfig>("[admn]\nrho = 1.0\n").is_err());
    }
}
