//! # lopf-algo: capacity-expansion LOPF for the two-ring demo
//!
//! - [`builder`]: the demo network (AC rings bridged by transport links)
//! - [`lopf`]: linear optimal power flow with storage, expansion and a CO2 cap
//! - [`validation`]: post-solve consistency checks
//!
//! ## Example
//!
//! ```no_run
//! use lopf_algo::{demo_case, validation, Lopf};
//! use lopf_core::DemoConfig;
//!
//! let config = DemoConfig::default();
//! let mut case = demo_case(&config)?;
//! let snapshots = config.solve_snapshots();
//! Lopf::new().solve(&mut case.network, &snapshots)?;
//! validation::check_all(&case.network, &snapshots, config.balance_tolerance)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod lopf;
pub mod validation;

pub use builder::{build_demo_network, demo_case, DemoCase};
pub use lopf::{Lopf, LopfOptions, LopfStatus, LopfSummary, SolveError};
pub use validation::{check_all, ConsistencyError, ConsistencyReport};
