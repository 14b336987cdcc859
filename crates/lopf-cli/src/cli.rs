use clap::{Args, Parser, Subcommand, ValueHint};
use lopf_core::{DemoConfig, LinkDispatch};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lopf",
    author,
    version,
    about = "Linear optimal power flow demo with storage and capacity expansion",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the two-ring demo network, solve the LOPF and print the results
    Run(RunArgs),
    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file; defaults are used for missing fields
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// TOML configuration file; flags below override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Number of hourly snapshots
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Buses per AC ring
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Number of AC rings
    #[arg(long)]
    pub replicas: Option<usize>,

    /// CO2 cap over the solved snapshots (t)
    #[arg(long)]
    pub co2_limit: Option<f64>,

    /// Number of leading snapshots to optimise
    #[arg(long)]
    pub solve_snapshots: Option<usize>,

    /// Seed for reactances and synthetic series
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hold transport links at their synthetic schedule instead of optimising them
    #[arg(long)]
    pub fixed_link_schedule: bool,

    /// Solved snapshot (0-based) used for the branch flow and injection cross-check
    #[arg(long, default_value_t = 0)]
    pub report_snapshot: usize,

    /// Write a JSON run report to this path
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub json: Option<PathBuf>,

    /// Run the post-solve consistency checks and fail if any is violated
    #[arg(long)]
    pub check: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut DemoConfig) {
        if let Some(horizon) = self.horizon {
            config.horizon_hours = horizon;
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        if let Some(replicas) = self.replicas {
            config.replica_count = replicas;
        }
        if let Some(limit) = self.co2_limit {
            config.co2_limit = limit;
        }
        if let Some(count) = self.solve_snapshots {
            config.solve_snapshot_count = count;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        if self.fixed_link_schedule {
            config.link_dispatch = LinkDispatch::Scheduled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "lopf",
            "run",
            "--horizon",
            "6",
            "--co2-limit",
            "250",
            "--fixed-link-schedule",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = DemoConfig::default();
        args.apply(&mut config);
        assert_eq!(config.horizon_hours, 6);
        assert_eq!(config.co2_limit, 250.0);
        assert_eq!(config.link_dispatch, LinkDispatch::Scheduled);
        assert_eq!(config.block_size, 3);
    }

    #[test]
    fn test_log_level_is_global() {
        let cli = Cli::parse_from(["lopf", "config", "--log-level", "debug"]);
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
    }
}
