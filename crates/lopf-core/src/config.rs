//! Run configuration for the two-ring demo network.

use crate::error::ConfigError;
use crate::series::{default_start, hourly_snapshots, Snapshot};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on `block_size * replica_count`.
pub const MAX_BUSES: usize = 100_000;

/// How transport links are dispatched by the optimiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDispatch {
    /// Flow is a decision variable within `[p_min, p_max]`
    #[default]
    Optimised,
    /// Flow follows the `p_set` schedule
    Scheduled,
}

/// Parameters of a demo run. Every field has a default, so an empty TOML
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Number of hourly snapshots
    pub horizon_hours: usize,
    /// Buses per AC ring
    pub block_size: usize,
    /// Number of AC rings
    pub replica_count: usize,
    /// CO2 cap over the solved horizon (t)
    pub co2_limit: f64,
    /// Number of leading snapshots passed to the optimiser
    pub solve_snapshot_count: usize,
    pub random_seed: u64,
    /// First snapshot, `YYYY-MM-DDTHH:MM:SS`
    pub start: Snapshot,
    pub link_dispatch: LinkDispatch,
    /// Power balance tolerance for post-solve checks (MW)
    pub balance_tolerance: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            horizon_hours: 10,
            block_size: 3,
            replica_count: 2,
            co2_limit: 1000.0,
            solve_snapshot_count: 4,
            random_seed: 0,
            start: default_start(),
            link_dispatch: LinkDispatch::Optimised,
            balance_tolerance: 1e-3,
        }
    }
}

impl DemoConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size < 2 {
            return Err(ConfigError::BlockSize(self.block_size));
        }
        if self.replica_count < 1 {
            return Err(ConfigError::ReplicaCount(self.replica_count));
        }
        match self.block_size.checked_mul(self.replica_count) {
            Some(n) if n <= MAX_BUSES => {}
            _ => {
                return Err(ConfigError::TooManyBuses {
                    block_size: self.block_size,
                    replica_count: self.replica_count,
                })
            }
        }
        if self.horizon_hours < 1 {
            return Err(ConfigError::Horizon(self.horizon_hours));
        }
        if self.solve_snapshot_count < 1 || self.solve_snapshot_count > self.horizon_hours {
            return Err(ConfigError::SolveSnapshotCount {
                count: self.solve_snapshot_count,
                horizon: self.horizon_hours,
            });
        }
        for (field, value) in [
            ("co2_limit", self.co2_limit),
            ("balance_tolerance", self.balance_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NonNegative { field, value });
            }
        }
        Ok(())
    }

    pub fn num_buses(&self) -> usize {
        self.block_size.saturating_mul(self.replica_count)
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        hourly_snapshots(self.start, self.horizon_hours)
    }

    /// Leading snapshots handed to the optimiser.
    pub fn solve_snapshots(&self) -> Vec<Snapshot> {
        hourly_snapshots(self.start, self.solve_snapshot_count)
    }
}
