//! prdsmith - Product Requirements from Source Code
//!
//! Turns an unpacked repository (plus an optional client brief) into a
//! structured product requirements document and a list of open client
//! questions.
//!
//! ## Pipeline
//!
//! - **Tier 1**: deterministic fact extraction (screens, endpoints, models,
//!   navigation, state, events) by path conventions and content patterns
//! - **Tier 2**: strategy generation under a hard deadline, with one
//!   reduced-evidence retry
//! - **Tier 3**: detailed sections generated one by one; a failed section is
//!   left out without failing the batch
//!
//! Technical facts from tier 1 are never altered by the generation tiers.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use prdsmith::{ConfigLoader, PrdPipeline, create_provider};
//!
//! let config = ConfigLoader::load()?;
//! let provider = create_provider(&config.llm)?;
//! let output = PrdPipeline::new(Arc::new(config), provider)
//!     .run(&repo_root, Some(brief.as_str()))
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: repository scanning and feature detectors
//! - [`evidence`]: evidence collection and token budgeting
//! - [`ai`]: completion provider, retry executor, deadline race, validation
//! - [`prd`]: tier orchestration, merge and the pipeline entry point
//! - [`config`]: layered configuration

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod evidence;
pub mod prd;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::error::{ErrorCategory, PrdError, Result};
pub use types::{ClientQuestion, EvidenceDocument, Prd, SectionKind, TechnicalFacts};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use prd::{
    LogProgress, PipelineOutput, PrdPipeline, ProgressObserver, RunReport,
};

pub use ai::{CompletionProvider, CompletionRequest, SharedProvider, create_provider};
pub use analyzer::extract_facts;
pub use evidence::{EvidenceCollector, EvidenceMode, chunk};
