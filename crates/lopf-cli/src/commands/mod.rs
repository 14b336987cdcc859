pub mod config;
pub mod run;

use anyhow::{Context, Result};
use lopf_core::DemoConfig;
use std::path::Path;

/// Load `path` if given, otherwise start from the defaults.
pub fn load_config(path: Option<&Path>) -> Result<DemoConfig> {
    match path {
        Some(path) => DemoConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(DemoConfig::default()),
    }
}
