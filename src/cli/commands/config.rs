//! Config Command
//!
//! Usage:
//!   prdsmith config show [-f json]
//!   prdsmith config path

use crate::config::ConfigLoader;
use crate::types::Result;

/// Print the merged effective configuration
pub fn show(format: &str) -> Result<()> {
    ConfigLoader::show_config(format == "json")
}

/// Print the configuration file locations
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}
