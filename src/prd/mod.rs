//! PRD Generation Pipeline
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Tier 1: extract facts ─→ skeleton
//!                             ↓
//! Tier 2: evidence(tier2) ─→ strategy ─→ merge
//!                                          ↓
//! Tier 3: evidence(tier3) ─→ sections ──→ merge ─→ PipelineOutput
//! ```
//!
//! Tier 3 starts only after tier 2 has finished (possibly degraded), since
//! section prompts read the merged strategy. Configuration is read-only for
//! the whole run; the only shared state is the cancellation token.

pub mod merge;
pub mod progress;
pub mod prompts;
pub mod tier2;
pub mod tier3;

pub use merge::{merge_tier2, merge_tier3};
pub use progress::{LogProgress, ProgressObserver, ProgressReporter};
pub use tier2::{StrategyGenerator, Tier2Output};
pub use tier3::{SectionGenerator, Tier3Output};

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::ai::provider::SharedProvider;
use crate::analyzer::extract_facts;
use crate::config::Config;
use crate::evidence::{EvidenceCollector, EvidenceMode};
use crate::types::{Prd, PrdError, QuestionLog, Result, SectionKind};

/// Diagnostics for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub tier2: Tier2Report,
    pub tier3: Tier3Report,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier2Report {
    pub degraded: bool,
    pub calls: u32,
    pub evidence_collected: usize,
    pub evidence_sent: usize,
    pub estimated_tokens: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier3Report {
    pub evidence_collected: usize,
    pub succeeded: Vec<SectionKind>,
    pub failed: Vec<SectionKind>,
}

/// Final artifact of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub prd: Prd,
    pub questions: QuestionLog,
    pub generated_at: DateTime<Utc>,
    pub report: RunReport,
}

pub struct PrdPipeline {
    config: Arc<Config>,
    provider: SharedProvider,
    progress: ProgressReporter,
    cancel: CancellationToken,
}

impl PrdPipeline {
    pub fn new(config: Arc<Config>, provider: SharedProvider) -> Self {
        Self {
            config,
            provider,
            progress: ProgressReporter::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = ProgressReporter::new(observer);
        self
    }

    /// Share a stop flag with the caller
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(PrdError::Cancelled)
        } else {
            Ok(())
        }
    }

    #[instrument(skip_all, fields(repo = %repo_root.display(), provider = self.provider.name()))]
    pub async fn run(&self, repo_root: &Path, brief: Option<&str>) -> Result<PipelineOutput> {
        let config = &self.config;
        let retry = config.retry.policy();
        let mut questions = QuestionLog::new();
        let mut report = RunReport::default();

        self.check_cancelled()?;
        self.progress.report(0, "Preparing");
        let facts = extract_facts(repo_root, &config.scan).await?;
        let skeleton = Prd::skeleton(facts);
        self.progress.report(15, "Extracted technical facts");

        // Tier 2
        self.check_cancelled()?;
        let collector = EvidenceCollector::new(repo_root, &config.evidence, &config.scan);
        let evidence = collector
            .collect(brief, Some(skeleton.technical()), EvidenceMode::Tier2)
            .await;
        report.tier2.evidence_collected = evidence.len();
        self.progress.report(25, "Collected strategy evidence");

        let tier2 = StrategyGenerator::new(
            self.provider.clone(),
            config.tier2.clone(),
            retry.clone(),
            self.cancel.clone(),
        )
        .generate(&skeleton, &evidence, &self.progress)
        .await?;

        report.tier2.degraded = tier2.degraded;
        report.tier2.calls = tier2.calls;
        report.tier2.evidence_sent = tier2.evidence_sent;
        report.tier2.estimated_tokens = tier2.estimated_tokens;
        questions.append(tier2.draft.questions);
        let prd = merge_tier2(&skeleton, tier2.draft.strategic);
        self.progress.report(55, "Strategy merged");

        // Tier 3
        self.check_cancelled()?;
        let evidence = collector
            .collect(brief, Some(prd.technical()), EvidenceMode::Tier3)
            .await;
        report.tier3.evidence_collected = evidence.len();

        let tier3 = SectionGenerator::new(
            self.provider.clone(),
            config.tier3.clone(),
            retry,
            self.cancel.clone(),
        )
        .generate(&prd, &evidence, &self.progress)
        .await?;

        report.tier3.succeeded = tier3.succeeded();
        report.tier3.failed = tier3.failed.clone();
        questions.append(tier3.questions);
        let prd = merge_tier3(&prd, &tier3.sections);
        self.progress.report(100, "Merge complete");

        info!(
            sections = prd.detailed.len(),
            questions = questions.len(),
            degraded = report.tier2.degraded,
            "PRD generated"
        );

        Ok(PipelineOutput {
            prd,
            questions,
            generated_at: Utc::now(),
            report,
        })
    }
}
