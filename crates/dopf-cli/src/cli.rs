use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dopf_algo::ObjectiveKind;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve the multi-period dispatch centrally or with a distributed coordinator
    Solve(SolveArgs),
    /// Cut a case into areas and print each area's shape
    Partition {
        #[command(flatten)]
        input: CaseArgs,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a case without solving it
    Inspect {
        /// Case file (.json) or directory of CSV tables
        #[arg(long)]
        case: PathBuf,
    },
}

/// Case plus the adjacency declaration that partitions it.
#[derive(Args, Debug, Clone)]
pub struct CaseArgs {
    /// Case file (.json) or directory of CSV tables
    #[arg(long)]
    pub case: PathBuf,
    /// Area adjacency (.toml or .json); defaults to the built-in four-area split
    #[arg(long)]
    pub areas: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    #[command(flatten)]
    pub input: CaseArgs,
    /// Solution method
    #[arg(long, value_enum, default_value_t = Method::All)]
    pub method: Method,
    /// Objective variant (e.g. cost_minimize_with_discharge_cost)
    #[arg(long)]
    pub objective: Option<ObjectiveKind>,
    /// ADMM penalty parameter
    #[arg(long)]
    pub rho: Option<f64>,
    /// ADMM iteration cap
    #[arg(long)]
    pub max_iter: Option<usize>,
    /// EnAPP iteration cap
    #[arg(long)]
    pub enapp_max_iter: Option<usize>,
    /// Convergence threshold for both coordinators
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Worker threads per round (defaults to one per area)
    #[arg(long)]
    pub workers: Option<usize>,
    /// TOML file with [admm] and [enapp] tables; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory for dispatch and trace exports
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Centralized,
    Admm,
    Enapp,
    All,
}

impl Method {
    pub fn includes(self, other: Method) -> bool {
        self == Method::All || self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_flags_parse() {
        let cli = Cli::try_parse_from([
            "dopf",
            "solve",
            "--case",
            "case.json",
            "--method",
            "admm",
            "--objective",
            "cost-minimize",
            "--rho",
            "0.5",
        ])
        .unwrap();
        let Some(Commands::Solve(args)) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.method, Method::Admm);
        assert_eq!(args.objective, Some(ObjectiveKind::CostMinimize));
        assert_eq!(args.rho, Some(0.5));
        assert!(args.input.areas.is_none());
    }

    #[test]
    fn test_unknown_objective_is_rejected() {
        let result =
            Cli::try_parse_from(["dopf", "solve", "--case", "c.json", "--objective", "cheapest"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_method_all_includes_every_method() {
        assert!(Method::All.includes(Method::Enapp));
        assert!(Method::Admm.includes(Method::Admm));
        assert!(!Method::Admm.includes(Method::Centralized));
    }
}
