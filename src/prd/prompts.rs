//! Tier prompt templates
//!
//! Both tiers share one layout: a system prompt fixing role, objectives and
//! output schema, and a user prompt carrying the technical facts, prior
//! output and the budgeted evidence.

use crate::ai::prompt::PromptBuilder;
use crate::ai::tokenizer::{estimate_tokens, truncate_to_tokens};
use crate::evidence::collector::code_summary;
use crate::types::{EvidenceDocument, PrdError, Prd, Result, SectionKind};

const STRATEGY_SCHEMA: &str = r#"{
  "prd": {
    "mission": "string",
    "vision": "string",
    "problemStatement": "string",
    "solutionOverview": "string",
    "targetAudience": "string",
    "valuePropositions": ["string"],
    "personas": [{"name": "string", "description": "string", "goals": ["string"], "painPoints": ["string"]}],
    "leanCanvas": {
      "problem": ["string"], "customerSegments": ["string"], "uniqueValueProposition": "string",
      "solution": ["string"], "channels": ["string"], "revenueStreams": ["string"],
      "costStructure": ["string"], "keyMetrics": ["string"], "unfairAdvantage": "string"
    }
  },
  "clientQuestions": [
    {"fieldPath": "strategic.personas", "question": "string", "rationale": "string", "priority": "high|medium|low"}
  ]
}"#;

const SECTION_SCHEMA: &str = r#"{
  "content": <section body, shaped as described in the objectives>,
  "clientQuestions": [
    {"fieldPath": "detailed.<section>", "question": "string", "rationale": "string", "priority": "high|medium|low"}
  ]
}"#;

const GROUNDING_RULES: &[&str] = &[
    "Do NOT contradict the technical facts; they were extracted from the code",
    "Do NOT invent features, integrations or metrics the evidence does not support",
    "When the evidence is silent, leave the field out and ask a client question instead",
];

// =============================================================================
// Tier 2: Strategy
// =============================================================================

pub fn strategy_system() -> String {
    PromptBuilder::new()
        .role("product manager", "turning codebases and briefs into product strategy")
        .objectives(&[
            "Read the technical facts and the evidence documents",
            "State the product's mission, vision, problem and solution in plain language",
            "Describe the target audience and the personas the product serves",
            "Fill in a lean canvas from what the evidence supports",
            "List client questions for every strategic point the evidence cannot settle",
        ])
        .focus("the strategic layer of the requirements document", GROUNDING_RULES)
        .anti_patterns(
            &[
                "\"The app helps users be more productive\" (generic, unfalsifiable)",
                "A persona with no goals or pain points",
            ],
            &[
                "\"Small shops send and track invoices without an accountant\" (specific)",
                "A client question naming the field it would fill",
            ],
        )
        .output_schema(STRATEGY_SCHEMA)
        .build()
}

/// User prompt for tier 2; `evidence` is already budgeted
pub fn strategy_user(prd: &Prd, evidence: &[EvidenceDocument]) -> String {
    PromptBuilder::new()
        .context_item("Project", prd.project_name())
        .context_item("Frameworks", &frameworks(prd))
        .section("Technical Facts", code_summary(prd.technical()).content())
        .section("Evidence", &render_evidence(evidence))
        .build()
}

// =============================================================================
// Tier 3: Sections
// =============================================================================

fn section_brief(kind: SectionKind) -> (&'static str, &'static str) {
    match kind {
        SectionKind::Goals => (
            "product goals and success metrics",
            "content: {\"goals\": [{\"goal\": string, \"metric\": string}]}",
        ),
        SectionKind::Scope => (
            "scope boundaries",
            "content: {\"inScope\": [string], \"outOfScope\": [string]}",
        ),
        SectionKind::Assumptions => (
            "assumptions the product relies on",
            "content: {\"assumptions\": [{\"assumption\": string, \"impactIfWrong\": string}]}",
        ),
        SectionKind::Dependencies => (
            "external dependencies and integrations",
            "content: {\"dependencies\": [{\"name\": string, \"kind\": string, \"purpose\": string}]}",
        ),
        SectionKind::RoleModel => (
            "user roles and access rules",
            "content: {\"roles\": [{\"role\": string, \"permissions\": [string]}]}",
        ),
        SectionKind::AcceptanceCriteria => (
            "acceptance criteria per feature",
            "content: {\"criteria\": [{\"feature\": string, \"given\": string, \"when\": string, \"then\": string}]}",
        ),
        SectionKind::UserFlows => (
            "user flows across the detected screens",
            "content: {\"flows\": [{\"name\": string, \"steps\": [string]}]}",
        ),
        SectionKind::TechnicalRequirements => (
            "technical requirements derived from the code",
            "content: {\"requirements\": [{\"area\": string, \"requirement\": string}]}",
        ),
        SectionKind::NonFunctionalRequirements => (
            "non-functional requirements",
            "content: {\"requirements\": [{\"category\": string, \"requirement\": string}]}",
        ),
        SectionKind::Risks => (
            "product and delivery risks",
            "content: {\"risks\": [{\"risk\": string, \"likelihood\": string, \"mitigation\": string}]}",
        ),
        SectionKind::OpenQuestions => (
            "open questions still blocking the document",
            "content: {\"questions\": [string]}",
        ),
    }
}

pub fn section_system(kind: SectionKind) -> String {
    let (topic, shape) = section_brief(kind);
    let write = format!("Write the `{}` section: {}", kind.key(), topic);
    let shape = format!("Shape the body as {}", shape);
    PromptBuilder::new()
        .role("product manager", "detailed requirements documents")
        .objectives(&[
            write.as_str(),
            shape.as_str(),
            "Stay consistent with the strategy already written",
            "Ask client questions only about this section",
        ])
        .focus(&format!("the {} section", kind.key()), GROUNDING_RULES)
        .output_schema(SECTION_SCHEMA)
        .build()
}

pub fn section_user(kind: SectionKind, prd: &Prd, evidence: &[EvidenceDocument]) -> String {
    let strategy = serde_json::to_string_pretty(&prd.strategic).unwrap_or_default();
    PromptBuilder::new()
        .context_item("Project", prd.project_name())
        .context_item("Frameworks", &frameworks(prd))
        .context_item("Section", kind.key())
        .section("Strategy", &strategy)
        .section("Technical Facts", code_summary(prd.technical()).content())
        .section("Evidence", &render_evidence(evidence))
        .build()
}

// =============================================================================
// Shared
// =============================================================================

fn frameworks(prd: &Prd) -> String {
    let tags = &prd.technical().metadata.frameworks;
    if tags.is_empty() {
        "unknown".to_string()
    } else {
        tags.join(", ")
    }
}

pub fn render_evidence(documents: &[EvidenceDocument]) -> String {
    if documents.is_empty() {
        return "(no evidence available)".to_string();
    }
    documents
        .iter()
        .map(|d| {
            let source = d.source_path().map(|s| format!(" ({})", s)).unwrap_or_default();
            format!("## [{}] {}{}\n\n{}", d.doc_type(), d.title(), source, d.content())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Tokens left for evidence once the fixed parts of a prompt are paid for
pub fn evidence_budget(system: &str, user_without_evidence: &str, ceiling: usize) -> usize {
    ceiling.saturating_sub(estimate_tokens(system) + estimate_tokens(user_without_evidence))
}

/// Trim `user` so that system + user fits `ceiling`
pub fn fit_to_ceiling(system: &str, user: String, ceiling: usize) -> Result<String> {
    let available = ceiling.saturating_sub(estimate_tokens(system));
    truncate_to_tokens(&user, available).ok_or_else(|| {
        PrdError::Config(format!(
            "input ceiling of {} tokens cannot hold the prompt (system prompt alone is ~{})",
            ceiling,
            estimate_tokens(system)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvidenceType, TechnicalFacts};

    fn prd() -> Prd {
        let mut facts = TechnicalFacts::default();
        facts.metadata.project_name = "Acme".into();
        facts.metadata.frameworks = vec!["nextjs".into()];
        Prd::skeleton(facts)
    }

    #[test]
    fn test_strategy_prompts() {
        let docs = vec![
            EvidenceDocument::new("readme", EvidenceType::RepoReadme, "README", "Invoices.")
                .with_source("README.md"),
        ];
        assert!(strategy_system().contains("clientQuestions"));
        let user = strategy_user(&prd(), &docs);
        assert!(user.contains("**Project**: Acme"));
        assert!(user.contains("## [repo_readme] README (README.md)"));
        assert!(user.contains("Invoices."));
    }

    #[test]
    fn test_section_prompts_name_the_section() {
        let system = section_system(SectionKind::RoleModel);
        assert!(system.contains("`role_model`"));
        assert!(system.contains("\"roles\""));
        let user = section_user(SectionKind::RoleModel, &prd(), &[]);
        assert!(user.contains("(no evidence available)"));
    }

    #[test]
    fn test_fit_to_ceiling() {
        let system = "s".repeat(40);
        let user = "u".repeat(4000);
        let fitted = fit_to_ceiling(&system, user, 200).unwrap();
        assert!(estimate_tokens(&system) + estimate_tokens(&fitted) <= 200);
        assert!(fit_to_ceiling(&system, "u".repeat(400), 12).is_err());
        assert_eq!(evidence_budget(&system, "abcd", 20), 9);
    }
}
