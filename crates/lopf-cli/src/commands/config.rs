//! `lopf config`

use anyhow::{Context, Result};
use std::path::Path;

pub fn handle(path: Option<&Path>) -> Result<()> {
    let config = super::load_config(path)?;
    let text = config
        .to_toml_string()
        .context("serialising configuration")?;
    print!("{text}");
    Ok(())
}
