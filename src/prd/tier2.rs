//! Tier 2: Strategy Generation
//!
//! ```text
//! Preparing → Calling(full) ─┬─ Completed → Done
//!                            ├─ Failed    → error
//!                            └─ Deadline  → Calling(first half) ─┬─ Completed → Done (degraded)
//!                                                                ├─ Failed    → error
//!                                                                └─ Deadline  → DeadlineExceeded
//! ```
//!
//! Each call is the retry executor raced against a deadline that covers all
//! of its attempts. The losing side of the race is dropped.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::progress::ProgressReporter;
use super::prompts;
use crate::ai::provider::{CompletionRequest, SharedProvider};
use crate::ai::retry::{RetryPolicy, execute_with_retry};
use crate::ai::timeout::{CallOutcome, race_deadline};
use crate::ai::validation::parse_response;
use crate::config::Tier2Config;
use crate::evidence::chunk;
use crate::types::{ClientQuestion, EvidenceDocument, Prd, PrdError, Result, StrategicFields};

const STAGE: &str = "tier2";

/// Parsed tier-2 response
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDraft {
    pub strategic: StrategicFields,
    pub questions: Vec<ClientQuestion>,
}

#[derive(Debug, Clone)]
pub struct Tier2Output {
    pub draft: StrategyDraft,
    /// Succeeded only after halving the evidence
    pub degraded: bool,
    /// Deadline-raced calls made (1 or 2)
    pub calls: u32,
    /// Evidence documents in the prompt that succeeded
    pub evidence_sent: usize,
    /// Estimated size of the prompt that succeeded
    pub estimated_tokens: usize,
}

/// Validate a raw tier-2 response.
///
/// Requires `prd` (an object) and `clientQuestions` (a list). Technical keys
/// the model may echo inside `prd` are ignored.
pub fn parse_strategy(raw: &str) -> Result<StrategyDraft> {
    let mut value = parse_response(raw, &["prd", "clientQuestions"], STAGE)?;
    let prd = value.get_mut("prd").map(Value::take).unwrap_or_default();
    if !prd.is_object() {
        return Err(PrdError::malformed(STAGE, "`prd` is not an object"));
    }
    let questions = value.get("clientQuestions");
    if !questions.is_some_and(Value::is_array) {
        return Err(PrdError::malformed(STAGE, "`clientQuestions` is not a list"));
    }
    let strategic: StrategicFields = serde_json::from_value(prd)
        .map_err(|e| PrdError::malformed(STAGE, format!("`prd` has the wrong shape: {}", e)))?;

    Ok(StrategyDraft {
        strategic,
        questions: ClientQuestion::parse_list(questions, STAGE),
    })
}

pub struct StrategyGenerator {
    provider: SharedProvider,
    config: Tier2Config,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl StrategyGenerator {
    pub fn new(
        provider: SharedProvider,
        config: Tier2Config,
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

    #[instrument(skip_all, fields(project = %prd.project_name(), evidence = evidence.len()))]
    pub async fn generate(
        &self,
        prd: &Prd,
        evidence: &[EvidenceDocument],
        progress: &ProgressReporter,
    ) -> Result<Tier2Output> {
        let system = prompts::strategy_system();
        let budget = prompts::evidence_budget(
            &system,
            &prompts::strategy_user(prd, &[]),
            self.config.max_input_tokens,
        );
        let budgeted = chunk(evidence, budget);
        progress.report(30, &format!("Budgeted {} evidence documents", budgeted.len()));

        let request = self.request(&system, prd, &budgeted)?;
        let original_tokens = request.estimated_tokens();
        progress.report(35, "Calling strategy tier");

        match self.call(&request).await {
            CallOutcome::Completed(draft) => {
                return Ok(Tier2Output {
                    draft,
                    degraded: false,
                    calls: 1,
                    evidence_sent: budgeted.len(),
                    estimated_tokens: original_tokens,
                });
            }
            CallOutcome::Failed(err) => return Err(err),
            CallOutcome::Deadline => warn!(
                deadline_ms = self.config.deadline_ms,
                estimated_tokens = original_tokens,
                documents = budgeted.len(),
                "Strategy call hit its deadline, retrying with half the evidence"
            ),
        }

        let reduced = &budgeted[..budgeted.len() / 2];
        let request = self.request(&system, prd, reduced)?;
        progress.report(45, "Retrying strategy tier with reduced evidence");

        match self.call(&request).await {
            CallOutcome::Completed(draft) => {
                info!(documents = reduced.len(), "Strategy generated from reduced evidence");
                Ok(Tier2Output {
                    draft,
                    degraded: true,
                    calls: 2,
                    evidence_sent: reduced.len(),
                    estimated_tokens: request.estimated_tokens(),
                })
            }
            CallOutcome::Failed(err) => Err(err),
            CallOutcome::Deadline => Err(PrdError::DeadlineExceeded {
                timeout: self.config.deadline(),
                estimated_tokens: original_tokens,
                attempts: 2,
            }),
        }
    }

    fn request(
        &self,
        system: &str,
        prd: &Prd,
        evidence: &[EvidenceDocument],
    ) -> Result<CompletionRequest> {
        let user = prompts::fit_to_ceiling(
            system,
            prompts::strategy_user(prd, evidence),
            self.config.max_input_tokens,
        )?;
        Ok(CompletionRequest::json(system, user, self.config.temperature))
    }

    async fn call(&self, request: &CompletionRequest) -> CallOutcome<StrategyDraft> {
        let provider = &self.provider;
        let attempts = execute_with_retry(self.retry.clone(), &self.cancel, STAGE, |_| async move {
            let raw = provider.complete(request).await?;
            parse_strategy(&raw)
        });
        race_deadline(self.config.deadline(), attempts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::{ScriptedProvider, Step};
    use crate::ai::tokenizer::estimate_tokens;
    use crate::types::{EvidenceType, TechnicalFacts};
    use std::sync::Arc;
    use std::time::Duration;

    const VALID: &str = r#"{
        "prd": {"mission": "Invoices without an accountant", "personas": [{"name": "Shop owner"}]},
        "clientQuestions": [{"fieldPath": "strategic.targetAudience", "question": "Which regions?"}]
    }"#;

    fn config() -> Tier2Config {
        Tier2Config {
            max_input_tokens: 20_000,
            deadline_ms: 50,
            temperature: 0.3,
        }
    }

    fn prd() -> Prd {
        let mut facts = TechnicalFacts::default();
        facts.metadata.project_name = "Acme".into();
        Prd::skeleton(facts)
    }

    fn evidence(n: usize) -> Vec<EvidenceDocument> {
        (0..n)
            .map(|i| {
                EvidenceDocument::new(
                    format!("d{}", i),
                    EvidenceType::RepoDocs,
                    format!("doc {}", i),
                    format!("EVIDENCE-MARKER-{}", i),
                )
            })
            .collect()
    }

    fn generator(provider: Arc<ScriptedProvider>, retry: RetryPolicy) -> StrategyGenerator {
        StrategyGenerator::new(provider, config(), retry, CancellationToken::new())
    }

    fn markers(request: &CompletionRequest) -> usize {
        request.user_prompt.matches("EVIDENCE-MARKER-").count()
    }

    #[tokio::test]
    async fn test_success_on_first_call() {
        let provider = Arc::new(ScriptedProvider::always(VALID));
        let out = generator(provider.clone(), RetryPolicy::no_retry())
            .generate(&prd(), &evidence(4), &ProgressReporter::default())
            .await
            .unwrap();

        assert!(!out.degraded);
        assert_eq!(out.calls, 1);
        assert_eq!(out.evidence_sent, 4);
        assert_eq!(out.draft.strategic.mission.as_deref(), Some("Invoices without an accountant"));
        assert_eq!(out.draft.questions.len(), 1);
        assert_eq!(provider.call_count(), 1);
        assert!(provider.requests()[0].response_is_json);
    }

    #[tokio::test]
    async fn test_always_hanging_degrades_exactly_once_then_fails() {
        let provider = Arc::new(ScriptedProvider::hanging());
        let err = generator(provider.clone(), RetryPolicy::no_retry())
            .generate(&prd(), &evidence(5), &ProgressReporter::default())
            .await
            .unwrap_err();

        match err {
            PrdError::DeadlineExceeded {
                timeout,
                estimated_tokens,
                attempts,
            } => {
                assert_eq!(timeout, Duration::from_millis(50));
                assert_eq!(attempts, 2);
                assert!(estimated_tokens > 0);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(markers(&requests[0]), 5);
        assert!(markers(&requests[1]) * 2 <= markers(&requests[0]));
        assert!(requests[1].user_prompt.contains("EVIDENCE-MARKER-0"));
        assert!(!requests[1].user_prompt.contains("EVIDENCE-MARKER-2"));
    }

    #[tokio::test]
    async fn test_reduced_call_can_succeed() {
        let provider = Arc::new(ScriptedProvider::new(|call, _| match call {
            0 => Step::Hang,
            _ => Step::Respond(VALID.to_string()),
        }));
        let out = generator(provider.clone(), RetryPolicy::no_retry())
            .generate(&prd(), &evidence(4), &ProgressReporter::default())
            .await
            .unwrap();

        assert!(out.degraded);
        assert_eq!(out.calls, 2);
        assert_eq!(out.evidence_sent, 2);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::always(r#"{"prd": {}}"#));
        let retry = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            retryable_signatures: vec!["timeout".into()],
        };
        let err = generator(provider.clone(), retry)
            .generate(&prd(), &evidence(1), &ProgressReporter::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PrdError::MalformedResponse { .. }));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retries_inside_the_deadline() {
        let provider = Arc::new(ScriptedProvider::new(|call, _| match call {
            0 => Step::Fail(PrdError::timeout("completion", Duration::from_secs(1))),
            _ => Step::Respond(VALID.to_string()),
        }));
        let retry = RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            retryable_signatures: vec!["timeout".into()],
        };
        let out = generator(provider.clone(), retry)
            .generate(&prd(), &evidence(1), &ProgressReporter::default())
            .await
            .unwrap();

        assert!(!out.degraded);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_prompt_respects_ceiling() {
        let provider = Arc::new(ScriptedProvider::always(VALID));
        let mut cfg = config();
        cfg.max_input_tokens = 2_000;
        let big: Vec<EvidenceDocument> = (0..10)
            .map(|i| {
                let id = format!("d{}", i);
                EvidenceDocument::new(id, EvidenceType::RepoDocs, "big", "x".repeat(4_000))
            })
            .collect();

        let cancel = CancellationToken::new();
        StrategyGenerator::new(provider.clone(), cfg, RetryPolicy::no_retry(), cancel)
            .generate(&prd(), &big, &ProgressReporter::default())
            .await
            .unwrap();

        let request = &provider.requests()[0];
        let total = estimate_tokens(&request.system_prompt) + estimate_tokens(&request.user_prompt);
        assert!(total <= 2_000);
    }

    #[test]
    fn test_parse_strategy_rejects_bad_shapes() {
        assert!(parse_strategy(r#"{"prd": [], "clientQuestions": []}"#).is_err());
        assert!(parse_strategy(r#"{"prd": {"personas": "many"}, "clientQuestions": []}"#).is_err());
        assert!(parse_strategy("I could not do it").is_err());

        let raw = r#"{"prd": {"screens": [1], "vision": "v"}, "clientQuestions": []}"#;
        let draft = parse_strategy(raw).unwrap();
        assert_eq!(draft.strategic.vision.as_deref(), Some("v"));
        assert!(draft.questions.is_empty());
    }

    #[test]
    fn test_parse_strategy_requires_question_list() {
        for raw in [
            r#"{"prd": {"vision": "v"}, "clientQuestions": null}"#,
            r#"{"prd": {"vision": "v"}, "clientQuestions": {"question": "q"}}"#,
        ] {
            let err = parse_strategy(raw).unwrap_err();
            assert!(matches!(err, PrdError::MalformedResponse { .. }), "{raw}: {err}");
        }
    }
}
