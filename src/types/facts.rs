//! Technical Fact Types
//!
//! Output of deterministic fact extraction. Set once per run and never
//! altered by the generation tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything tier 1 learned from the code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicalFacts {
    pub screens: Vec<Screen>,
    pub navigation: Vec<NavigationEdge>,
    pub api_endpoints: Vec<ApiEndpoint>,
    pub data_models: Vec<DataModel>,
    pub state_management: Vec<StatePattern>,
    pub events: Vec<EventFact>,
    pub metadata: ExtractionMetadata,
}

impl TechnicalFacts {
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
            && self.navigation.is_empty()
            && self.api_endpoints.is_empty()
            && self.data_models.is_empty()
            && self.state_management.is_empty()
            && self.events.is_empty()
    }
}

/// A user-facing page or screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    /// Route derived from file-system routing conventions
    pub route: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEdge {
    /// Screen the navigation starts from
    pub from: String,
    /// Route or screen name navigated to
    pub to: String,
    /// `link`, `push`, `navigate`, `redirect`
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Upper-case HTTP verb, or `QUERY`/`MUTATION` for GraphQL operations
    pub method: String,
    /// Normalized path; dynamic segments become `:param`
    pub path: String,
    /// File the endpoint was found in
    pub source: String,
    /// Idiom that matched (`fetch`, `axios`, `next-route`, `express`, ...)
    pub idiom: String,
}

impl ApiEndpoint {
    /// Deduplication key
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModel {
    pub name: String,
    pub fields: Vec<ModelField>,
    pub source: String,
    /// `prisma`, `typescript`, `mongoose`, `sqlalchemy`, `django`, `typeorm`, `graphql`
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelField {
    pub name: String,
    pub field_type: String,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePattern {
    /// `redux`, `zustand`, `context`, `pinia`, ...
    pub library: String,
    pub name: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFact {
    pub name: String,
    /// `analytics`, `domain`, or `dom`
    pub kind: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionMetadata {
    pub project_name: String,
    /// Framework tags reported by the detectors, sorted and deduplicated
    pub frameworks: Vec<String>,
    pub total_files: usize,
    pub screen_files: usize,
    pub api_files: usize,
    pub data_model_files: usize,
    pub extracted_at: Option<DateTime<Utc>>,
}
