//! Scan Command
//!
//! Runs fact extraction only and prints the technical facts as JSON.
//!
//! Usage:
//!   prdsmith scan <REPO_DIR> [--output FILE]

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;

use super::generate::{require_repo_dir, write_or_print};
use crate::analyzer::extract_facts;
use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

pub fn run(repo: &Path, output: Option<PathBuf>) -> Result<()> {
    let repo = require_repo_dir(repo)?;
    let config = ConfigLoader::load()?;

    let rt = Runtime::new()?;
    let facts = rt.block_on(extract_facts(&repo, &config.scan))?;

    let out = Output::new();
    out.section(&format!("Technical facts: {}", facts.metadata.project_name));
    out.field("Files", facts.metadata.total_files);
    out.field("Screens", facts.screens.len());
    out.field("API endpoints", facts.api_endpoints.len());
    out.field("Data models", facts.data_models.len());
    out.field("Frameworks", facts.metadata.frameworks.join(", "));

    write_or_print(&serde_json::to_string_pretty(&facts)?, output.as_deref())
}
