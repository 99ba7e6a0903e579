//! Evidence Document Types
//!
//! Free-text material fed to the generation tiers. Documents are immutable;
//! the chunker produces truncated copies instead of editing in place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    UploadedBrief,
    RepoReadme,
    RepoDocs,
    CodeSummary,
    PackageMetadata,
    ConfigFile,
    TestFile,
    ComponentAnalysis,
    CodePatterns,
    Other,
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UploadedBrief => "uploaded_brief",
            Self::RepoReadme => "repo_readme",
            Self::RepoDocs => "repo_docs",
            Self::CodeSummary => "code_summary",
            Self::PackageMetadata => "package_metadata",
            Self::ConfigFile => "config_file",
            Self::TestFile => "test_file",
            Self::ComponentAnalysis => "component_analysis",
            Self::CodePatterns => "code_patterns",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDocument {
    id: String,
    doc_type: EvidenceType,
    title: String,
    content: String,
    source_path: Option<String>,
    #[serde(default)]
    truncated: bool,
}

impl EvidenceDocument {
    pub fn new(
        id: impl Into<String>,
        doc_type: EvidenceType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            doc_type,
            title: title.into(),
            content: content.into(),
            source_path: None,
            truncated: false,
        }
    }

    pub fn with_source(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn doc_type(&self) -> EvidenceType {
        self.doc_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Flag a document whose source was cut at read time
    pub(crate) fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    /// Copy of this document carrying different content, flagged as truncated
    pub(crate) fn truncated_copy(&self, content: String) -> Self {
        Self {
            content,
            truncated: true,
            ..self.clone()
        }
    }
}
