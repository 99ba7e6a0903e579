//! Document Aggregate
//!
//! The PRD is held in three strata:
//!
//! - **technical**: written by fact extraction, read-only afterwards
//! - **strategic**: owned by tier 2
//! - **detailed**: owned by tier 3, one named slot per section
//!
//! Only the merge step rebuilds a `Prd`, and it always copies the technical
//! stratum from the pre-tier snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::facts::TechnicalFacts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prd {
    pub(crate) technical: TechnicalFacts,
    #[serde(default)]
    pub strategic: StrategicFields,
    #[serde(default)]
    pub detailed: DetailedSections,
}

impl Prd {
    /// Empty skeleton around freshly extracted facts
    pub fn skeleton(technical: TechnicalFacts) -> Self {
        Self {
            technical,
            strategic: StrategicFields::default(),
            detailed: DetailedSections::default(),
        }
    }

    pub fn technical(&self) -> &TechnicalFacts {
        &self.technical
    }

    pub fn project_name(&self) -> &str {
        &self.technical.metadata.project_name
    }
}

// =============================================================================
// Strategic Stratum
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategicFields {
    pub mission: Option<String>,
    pub vision: Option<String>,
    pub problem_statement: Option<String>,
    pub solution_overview: Option<String>,
    pub target_audience: Option<String>,
    pub value_propositions: Vec<String>,
    pub personas: Vec<Persona>,
    pub lean_canvas: Option<LeanCanvas>,
}

impl StrategicFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fields present in `newer` win; absent ones keep the current value.
    pub fn overlay(self, newer: StrategicFields) -> StrategicFields {
        StrategicFields {
            mission: newer.mission.or(self.mission),
            vision: newer.vision.or(self.vision),
            problem_statement: newer.problem_statement.or(self.problem_statement),
            solution_overview: newer.solution_overview.or(self.solution_overview),
            target_audience: newer.target_audience.or(self.target_audience),
            value_propositions: non_empty_or(newer.value_propositions, self.value_propositions),
            personas: non_empty_or(newer.personas, self.personas),
            lean_canvas: newer.lean_canvas.or(self.lean_canvas),
        }
    }
}

fn non_empty_or<T>(preferred: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Persona {
    pub name: String,
    pub description: Option<String>,
    pub goals: Vec<String>,
    pub pain_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeanCanvas {
    pub problem: Vec<String>,
    pub customer_segments: Vec<String>,
    pub unique_value_proposition: Option<String>,
    pub solution: Vec<String>,
    pub channels: Vec<String>,
    pub revenue_streams: Vec<String>,
    pub cost_structure: Vec<String>,
    pub key_metrics: Vec<String>,
    pub unfair_advantage: Option<String>,
}

// =============================================================================
// Detailed Stratum
// =============================================================================

/// Named tier-3 sections, in default generation order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Goals,
    Scope,
    Assumptions,
    Dependencies,
    RoleModel,
    AcceptanceCriteria,
    UserFlows,
    TechnicalRequirements,
    NonFunctionalRequirements,
    Risks,
    OpenQuestions,
}

impl SectionKind {
    pub const ALL: [SectionKind; 11] = [
        SectionKind::Goals,
        SectionKind::Scope,
        SectionKind::Assumptions,
        SectionKind::Dependencies,
        SectionKind::RoleModel,
        SectionKind::AcceptanceCriteria,
        SectionKind::UserFlows,
        SectionKind::TechnicalRequirements,
        SectionKind::NonFunctionalRequirements,
        SectionKind::Risks,
        SectionKind::OpenQuestions,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Goals => "goals",
            Self::Scope => "scope",
            Self::Assumptions => "assumptions",
            Self::Dependencies => "dependencies",
            Self::RoleModel => "role_model",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::UserFlows => "user_flows",
            Self::TechnicalRequirements => "technical_requirements",
            Self::NonFunctionalRequirements => "non_functional_requirements",
            Self::Risks => "risks",
            Self::OpenQuestions => "open_questions",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .iter()
            .copied()
            .find(|k| k.key() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown section: {}", s))
    }
}

/// Tier-3 output slots keyed by section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailedSections(BTreeMap<SectionKind, Value>);

impl DetailedSections {
    pub fn get(&self, kind: SectionKind) -> Option<&Value> {
        self.0.get(&kind)
    }

    pub fn contains(&self, kind: SectionKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = SectionKind> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, kind: SectionKind, content: Value) {
        self.0.insert(kind, content);
    }
}
