//! Generate Command
//!
//! Runs the full pipeline against an unpacked repository.
//!
//! Usage:
//!   prdsmith generate <REPO_DIR> [--brief FILE] [--output FILE] [--model M]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ai::provider::create_provider;
use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::prd::{LogProgress, PipelineOutput, PrdPipeline};
use crate::types::{PrdError, Result};

pub struct GenerateOptions {
    pub repo: PathBuf,
    pub brief: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub model: Option<String>,
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let repo = require_repo_dir(&options.repo)?;
    let brief = options.brief.as_deref().map(fs::read_to_string).transpose()?;

    let mut config = ConfigLoader::load()?;
    if let Some(model) = options.model {
        config.llm.model = model;
    }
    let provider = create_provider(&config.llm)?;
    info!(provider = provider.name(), model = provider.model(), "Using completion provider");

    let rt = Runtime::new()?;
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            stop.cancel();
        }
    });

    let pipeline = PrdPipeline::new(Arc::new(config), provider)
        .with_progress(Arc::new(LogProgress))
        .with_cancellation(cancel);
    let result = rt.block_on(pipeline.run(&repo, brief.as_deref()))?;

    print_summary(&result, options.output.as_deref());
    write_or_print(&serde_json::to_string_pretty(&result)?, options.output.as_deref())
}

fn print_summary(result: &PipelineOutput, output: Option<&Path>) {
    let out = Output::new();
    let report = &result.report;

    out.section(&format!("PRD: {}", result.prd.project_name()));
    out.field("Screens", result.prd.technical().screens.len());
    out.field("API endpoints", result.prd.technical().api_endpoints.len());
    out.field("Sections", result.prd.detailed.len());
    out.field("Client questions", result.questions.len());
    out.field("Strategy evidence", format!(
        "{} of {} documents (~{} tokens)",
        report.tier2.evidence_sent, report.tier2.evidence_collected, report.tier2.estimated_tokens
    ));

    if report.tier2.degraded {
        out.warning("Strategy was generated from reduced evidence after a deadline");
    }
    if !report.tier3.failed.is_empty() {
        let names: Vec<String> = report.tier3.failed.iter().map(|k| k.to_string()).collect();
        out.warning(&format!("Sections left out: {}", names.join(", ")));
    }
    if let Some(path) = output {
        out.success(&format!("Written to {}", path.display()));
    }
}

/// Canonical path of an existing directory
pub(crate) fn require_repo_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(PrdError::Scan(format!(
            "not a directory: {}",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}

/// Write `json` to `output`, or print it to stdout
pub(crate) fn write_or_print(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_require_repo_dir() {
        let dir = TempDir::new().unwrap();
        assert!(require_repo_dir(dir.path()).is_ok());
        assert!(matches!(
            require_repo_dir(&dir.path().join("missing")),
            Err(PrdError::Scan(_))
        ));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/prd.json");
        write_or_print("{}", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }
}
