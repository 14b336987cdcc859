//! Error types for network construction and configuration
//!
//! [`NetworkError`] and [`ConfigError`] are raised while a network is being
//! assembled. [`LopfError`] is the umbrella type used at API boundaries so
//! callers can propagate any failure with `?`.
//!
//! # Example
//!
//! ```
//! use lopf_core::{DemoConfig, LopfError, LopfResult};
//!
//! fn check(config: &DemoConfig) -> LopfResult<usize> {
//!     config.validate()?;
//!     Ok(config.num_buses())
//! }
//!
//! let bad = DemoConfig { block_size: 1, ..DemoConfig::default() };
//! assert!(matches!(check(&bad), Err(LopfError::Config(_))));
//! assert_eq!(check(&DemoConfig::default()).unwrap(), 6);
//! ```

use thiserror::Error;

/// Errors raised by the network construction API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// An element of the same kind already uses this name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A referenced bus has not been added yet
    #[error("{kind} '{name}' references unknown bus '{bus}'")]
    UnknownBus {
        kind: &'static str,
        name: String,
        bus: String,
    },

    /// A referenced source has not been added yet
    #[error("{kind} '{name}' references unknown source '{source_name}'")]
    UnknownSource {
        kind: &'static str,
        name: String,
        source_name: String,
    },

    /// A numeric attribute is outside its admissible range
    #[error("{kind} '{name}': {reason}")]
    InvalidAttribute {
        kind: &'static str,
        name: String,
        reason: String,
    },

    /// Snapshots must be strictly increasing
    #[error("snapshots must be strictly increasing (offending index {0})")]
    UnorderedSnapshots(usize),
}

/// Invalid run parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("block_size must be at least 2 (got {0})")]
    BlockSize(usize),

    #[error("replica_count must be at least 1 (got {0})")]
    ReplicaCount(usize),

    #[error("block_size * replica_count is too large ({block_size} * {replica_count})")]
    TooManyBuses {
        block_size: usize,
        replica_count: usize,
    },

    #[error("horizon_hours must be at least 1 (got {0})")]
    Horizon(usize),

    #[error("solve_snapshot_count must lie in 1..={horizon} (got {count})")]
    SolveSnapshotCount { count: usize, horizon: usize },

    #[error("{field} must be finite and non-negative (got {value})")]
    NonNegative { field: &'static str, value: f64 },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Unified error type for the `lopf` crates.
#[derive(Error, Debug)]
pub enum LopfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Solver failures (infeasible, unbounded, backend errors)
    #[error("Solver error: {0}")]
    Solver(String),

    /// Post-solve consistency check failed
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using LopfError.
pub type LopfResult<T> = Result<T, LopfError>;

impl From<String> for LopfError {
    fn from(s: String) -> Self {
        LopfError::Other(s)
    }
}

impl From<&str> for LopfError {
    fn from(s: &str) -> Self {
        LopfError::Other(s.to_string())
    }
}
