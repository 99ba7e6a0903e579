//! Tier 3: Section Generation
//!
//! Runs the configured sections one at a time, in order. Each section gets
//! its own retry budget and no deadline. A failed section is logged and left
//! out; the batch always continues. Cancellation is checked between
//! sections.

use std::collections::HashSet;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::progress::ProgressReporter;
use super::prompts;
use crate::ai::provider::{CompletionRequest, SharedProvider};
use crate::ai::retry::{RetryPolicy, execute_with_retry};
use crate::ai::validation::parse_response;
use crate::config::Tier3Config;
use crate::evidence::chunk;
use crate::types::{ClientQuestion, EvidenceDocument, Prd, PrdError, Result, SectionKind};

/// Progress range covered by the section batch
const PROGRESS_START: u8 = 60;
const PROGRESS_SPAN: u8 = 35;

#[derive(Debug, Clone, Default)]
pub struct Tier3Output {
    /// Successful sections, in generation order
    pub sections: Vec<(SectionKind, Value)>,
    /// Questions from successful sections only
    pub questions: Vec<ClientQuestion>,
    pub failed: Vec<SectionKind>,
}

impl Tier3Output {
    pub fn succeeded(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|(kind, _)| *kind).collect()
    }
}

fn stage(kind: SectionKind) -> String {
    format!("tier3:{}", kind)
}

/// Validate a raw section response: `content` is required and non-null
pub fn parse_section(raw: &str, kind: SectionKind) -> Result<(Value, Vec<ClientQuestion>)> {
    let stage = stage(kind);
    let mut value = parse_response(raw, &["content"], &stage)?;
    let content = value.get_mut("content").map(Value::take).unwrap_or_default();
    if content.is_null() {
        return Err(PrdError::malformed(&stage, "`content` is null"));
    }
    let questions = ClientQuestion::parse_list(value.get("clientQuestions"), &stage);
    Ok((content, questions))
}

pub struct SectionGenerator {
    provider: SharedProvider,
    config: Tier3Config,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl SectionGenerator {
    pub fn new(
        provider: SharedProvider,
        config: Tier3Config,
        retry: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            config,
            retry,
            cancel,
        }
    }

    /// Generate every configured section against the tier-2 document.
    ///
    /// Only cancellation fails the batch as a whole.
    #[instrument(
        skip_all,
        fields(project = %prd.project_name(), sections = self.config.sections.len())
    )]
    pub async fn generate(
        &self,
        prd: &Prd,
        evidence: &[EvidenceDocument],
        progress: &ProgressReporter,
    ) -> Result<Tier3Output> {
        let mut seen = HashSet::new();
        let kinds: Vec<SectionKind> = self
            .config
            .sections
            .iter()
            .copied()
            .filter(|k| seen.insert(*k))
            .collect();

        let mut output = Tier3Output::default();
        for (i, kind) in kinds.iter().copied().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(PrdError::Cancelled);
            }
            let percent = PROGRESS_START + (PROGRESS_SPAN as usize * i / kinds.len().max(1)) as u8;
            progress.report(percent, &format!("Generating section {}", kind));

            match self.section(kind, prd, evidence).await {
                Ok((content, questions)) => {
                    debug!(section = %kind, questions = questions.len(), "Section generated");
                    output.sections.push((kind, content));
                    output.questions.extend(questions);
                }
                Err(err) => {
                    warn!(section = %kind, error = %err, "Section failed, leaving it out");
                    output.failed.push(kind);
                }
            }
        }

        info!(
            succeeded = output.sections.len(),
            failed = output.failed.len(),
            "Section batch finished"
        );
        Ok(output)
    }

    async fn section(
        &self,
        kind: SectionKind,
        prd: &Prd,
        evidence: &[EvidenceDocument],
    ) -> Result<(Value, Vec<ClientQuestion>)> {
        let ceiling = self.config.max_input_tokens;
        let system = prompts::section_system(kind);
        let budget =
            prompts::evidence_budget(&system, &prompts::section_user(kind, prd, &[]), ceiling);
        let budgeted = chunk(evidence, budget);
        let user =
            prompts::fit_to_ceiling(&system, prompts::section_user(kind, prd, &budgeted), ceiling)?;
        let request = CompletionRequest::json(system, user, self.config.temperature);

        let provider = &self.provider;
        let request = &request;
        execute_with_retry(self.retry.clone(), &self.cancel, &stage(kind), |_| async move {
            let raw = provider.complete(request).await?;
            parse_section(&raw, kind)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::{ScriptedProvider, Step};
    use crate::types::TechnicalFacts;
    use std::sync::Arc;
    use std::time::Duration;

    const FIVE: [SectionKind; 5] = [
        SectionKind::Goals,
        SectionKind::Scope,
        SectionKind::Assumptions,
        SectionKind::Dependencies,
        SectionKind::Risks,
    ];

    fn config(sections: &[SectionKind]) -> Tier3Config {
        Tier3Config {
            max_input_tokens: 16_000,
            temperature: 0.2,
            sections: sections.to_vec(),
        }
    }

    fn section_of(request: &CompletionRequest) -> SectionKind {
        FIVE.iter()
            .copied()
            .find(|k| request.system_prompt.contains(&format!("`{}`", k.key())))
            .unwrap()
    }

    fn answer(kind: SectionKind) -> String {
        format!(
            r#"{{"content": {{"items": ["{k}"]}}, "clientQuestions": [{{"question": "About {k}?"}}]}}"#,
            k = kind.key()
        )
    }

    fn prd() -> Prd {
        Prd::skeleton(TechnicalFacts::default())
    }

    #[tokio::test]
    async fn test_failing_section_is_isolated() {
        let provider = Arc::new(ScriptedProvider::new(|_, request| {
            match section_of(request) {
                SectionKind::Assumptions => {
                    Step::Fail(PrdError::malformed("tier3:assumptions", "garbage"))
                }
                kind => Step::Respond(answer(kind)),
            }
        }));
        let generator = SectionGenerator::new(
            provider.clone(),
            config(&FIVE),
            RetryPolicy::no_retry(),
            CancellationToken::new(),
        );

        let out = generator
            .generate(&prd(), &[], &ProgressReporter::default())
            .await
            .unwrap();

        assert_eq!(
            out.succeeded(),
            vec![
                SectionKind::Goals,
                SectionKind::Scope,
                SectionKind::Dependencies,
                SectionKind::Risks
            ]
        );
        assert_eq!(out.failed, vec![SectionKind::Assumptions]);
        assert_eq!(out.questions.len(), 4);
        assert!(out.questions.iter().all(|q| q.origin != "tier3:assumptions"));
        assert_eq!(out.sections[0].1["items"][0], "goals");
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn test_sections_retry_transient_failures() {
        let provider = Arc::new(ScriptedProvider::new(|call, request| match call {
            0 => Step::Fail(PrdError::timeout("completion", Duration::from_secs(1))),
            _ => Step::Respond(answer(section_of(request))),
        }));
        let retry = RetryPolicy {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            retryable_signatures: vec!["timeout".into()],
        };
        let generator = SectionGenerator::new(
            provider.clone(),
            config(&[SectionKind::Goals]),
            retry,
            CancellationToken::new(),
        );

        let out = generator
            .generate(&prd(), &[], &ProgressReporter::default())
            .await
            .unwrap();
        assert_eq!(out.succeeded(), vec![SectionKind::Goals]);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_batch() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let provider = Arc::new(ScriptedProvider::new(move |_, request| {
            trigger.cancel();
            Step::Respond(answer(section_of(request)))
        }));
        let generator =
            SectionGenerator::new(provider.clone(), config(&FIVE), RetryPolicy::no_retry(), cancel);

        let err = generator
            .generate(&prd(), &[], &ProgressReporter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PrdError::Cancelled));
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_parse_section() {
        let (content, questions) = parse_section(
            r#"```json
{"content": ["a"], "clientQuestions": [{"question": "q"}]}
```"#,
            SectionKind::Scope,
        )
        .unwrap();
        assert_eq!(content[0], "a");
        assert_eq!(questions[0].origin, "tier3:scope");

        assert!(parse_section(r#"{"content": null}"#, SectionKind::Scope).is_err());
        assert!(parse_section(r#"{"items": []}"#, SectionKind::Scope).is_err());
    }
}
