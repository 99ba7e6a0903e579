//! Evidence Collector
//!
//! Gathers free-text sources into an ordered `EvidenceDocument` list.
//! Order is priority: the chunker keeps a prefix of this list, so what comes
//! first survives a tight budget.
//!
//! 1. Uploaded brief
//! 2. README
//! 3. Documentation directory
//! 4. Synthesized code summary
//! 5. Package metadata
//! 6. Config files
//! 7. Test files
//! 8. Code patterns
//!
//! Missing sources are skipped silently.

use std::path::Path;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ai::tokenizer::truncation_marker;
use crate::analyzer::scanner::{FileScanner, classify};
use crate::config::{EvidenceConfig, ScanConfig};
use crate::types::{EvidenceDocument, EvidenceType, TechnicalFacts, log_skip};

const README_NAMES: &[&str] = &[
    "README.md",
    "readme.md",
    "Readme.md",
    "README.mdx",
    "README.rst",
    "README.txt",
    "README",
];
const DOC_DIRS: &[&str] = &["docs", "doc", "documentation"];
const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "txt", "rst"];

const PACKAGE_FILES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "go.mod",
    "composer.json",
    "Gemfile",
    "pubspec.yaml",
];

const CONFIG_FILES: &[&str] = &[
    "tsconfig.json",
    "next.config.js",
    "next.config.mjs",
    "next.config.ts",
    "vite.config.ts",
    "vite.config.js",
    "nuxt.config.ts",
    "svelte.config.js",
    "angular.json",
    "app.json",
    "tailwind.config.js",
    "tailwind.config.ts",
    ".env.example",
    "docker-compose.yml",
    "docker-compose.yaml",
    "Dockerfile",
];

/// Entries listed per category in the code summary
const SUMMARY_LIST_LIMIT: usize = 60;

/// Which document types a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMode {
    /// Strategic tier: no low-value technical material
    Tier2,
    /// Section tier: everything except uncategorized documents
    Tier3,
    Full,
}

impl EvidenceMode {
    pub fn allows(self, doc_type: EvidenceType) -> bool {
        use EvidenceType::*;
        match self {
            Self::Tier2 => matches!(
                doc_type,
                UploadedBrief | RepoReadme | RepoDocs | CodeSummary | PackageMetadata
            ),
            Self::Tier3 => doc_type != Other,
            Self::Full => true,
        }
    }

    /// Keep only the documents this mode allows, preserving order
    pub fn filter(self, documents: Vec<EvidenceDocument>) -> Vec<EvidenceDocument> {
        documents
            .into_iter()
            .filter(|d| self.allows(d.doc_type()))
            .collect()
    }
}

pub struct EvidenceCollector<'a> {
    root: &'a Path,
    config: &'a EvidenceConfig,
    scan_config: &'a ScanConfig,
}

impl<'a> EvidenceCollector<'a> {
    pub fn new(root: &'a Path, config: &'a EvidenceConfig, scan_config: &'a ScanConfig) -> Self {
        Self {
            root,
            config,
            scan_config,
        }
    }

    /// Collect the ordered evidence list for `mode`
    #[instrument(skip_all, fields(mode = ?mode))]
    pub async fn collect(
        &self,
        brief: Option<&str>,
        facts: Option<&TechnicalFacts>,
        mode: EvidenceMode,
    ) -> Vec<EvidenceDocument> {
        let mut documents = Vec::new();

        if let Some(text) = brief.map(str::trim).filter(|t| !t.is_empty()) {
            documents.push(EvidenceDocument::new(
                "brief",
                EvidenceType::UploadedBrief,
                "Uploaded brief",
                text,
            ));
        }

        if mode.allows(EvidenceType::RepoReadme) {
            documents.extend(self.readme().await);
        }
        if mode.allows(EvidenceType::RepoDocs) {
            documents.extend(self.docs().await);
        }
        if mode.allows(EvidenceType::CodeSummary)
            && self.config.include_code_summary
            && let Some(facts) = facts
        {
            documents.push(code_summary(facts));
        }
        if mode.allows(EvidenceType::PackageMetadata) {
            let limit = PACKAGE_FILES.len();
            documents.extend(
                self.root_files(PACKAGE_FILES, limit, EvidenceType::PackageMetadata, "package")
                    .await,
            );
        }
        if mode.allows(EvidenceType::ConfigFile) {
            let limit = self.config.max_config_files;
            documents.extend(
                self.root_files(CONFIG_FILES, limit, EvidenceType::ConfigFile, "config")
                    .await,
            );
        }
        if mode.allows(EvidenceType::TestFile) {
            documents.extend(self.test_files().await);
        }
        if mode.allows(EvidenceType::CodePatterns)
            && let Some(doc) = facts.and_then(code_patterns)
        {
            documents.push(doc);
        }

        debug!(count = documents.len(), "Collected evidence");
        mode.filter(documents)
    }

    /// Read a text file; `None` when unreadable or blank
    async fn read(&self, path: &Path) -> Option<FileText> {
        let bytes = log_skip(tokio::fs::read(path).await, &path.display().to_string())?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(cap_bytes(text, self.config.max_doc_bytes))
    }

    async fn readme(&self) -> Option<EvidenceDocument> {
        for name in README_NAMES {
            let path = self.root.join(name);
            if !path.is_file() {
                continue;
            }
            let Some(text) = self.read(&path).await else {
                continue;
            };
            return Some(text.into_document("readme", EvidenceType::RepoReadme, "README", name));
        }
        None
    }

    async fn docs(&self) -> Vec<EvidenceDocument> {
        let mut paths = Vec::new();
        for dir in DOC_DIRS {
            let dir_path = self.root.join(dir);
            if !dir_path.is_dir() {
                continue;
            }
            let walker = WalkBuilder::new(&dir_path)
                .follow_links(false)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();
            for entry in walker.filter_map(|e| e.ok()) {
                let path = entry.path();
                let is_doc = entry.file_type().is_some_and(|t| t.is_file())
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| DOC_EXTENSIONS.contains(&e));
                if is_doc {
                    paths.push(path.to_path_buf());
                }
            }
        }

        let mut documents = Vec::new();
        for path in paths.into_iter().take(self.config.max_doc_files) {
            let rel = relative(self.root, &path);
            if let Some(text) = self.read(&path).await {
                let id = format!("docs:{}", rel);
                documents.push(text.into_document(id, EvidenceType::RepoDocs, rel.clone(), &rel));
            }
        }
        documents
    }

    async fn root_files(
        &self,
        names: &[&str],
        limit: usize,
        doc_type: EvidenceType,
        prefix: &str,
    ) -> Vec<EvidenceDocument> {
        let mut documents = Vec::new();
        for name in names {
            if documents.len() >= limit {
                break;
            }
            let path = self.root.join(name);
            if !path.is_file() {
                continue;
            }
            if let Some(text) = self.read(&path).await {
                let id = format!("{}:{}", prefix, name);
                documents.push(text.into_document(id, doc_type, *name, name));
            }
        }
        documents
    }

    async fn test_files(&self) -> Vec<EvidenceDocument> {
        if self.config.max_test_files == 0 {
            return Vec::new();
        }
        let scanned = FileScanner::new(self.root, self.scan_config).scan();
        let Some(files) = log_skip(scanned, "test scan") else {
            return Vec::new();
        };

        let mut documents = Vec::new();
        for file in files
            .iter()
            .filter(|f| classify::is_code_file(&f.relative) && classify::is_test_file(&f.relative))
        {
            if documents.len() >= self.config.max_test_files {
                break;
            }
            if let Some(text) = self.read(&file.path).await {
                documents.push(text.into_document(
                    format!("test:{}", file.relative),
                    EvidenceType::TestFile,
                    file.relative.clone(),
                    &file.relative,
                ));
            }
        }
        documents
    }
}

/// File content after the per-document byte cap
struct FileText {
    content: String,
    truncated: bool,
}

impl FileText {
    fn into_document(
        self,
        id: impl Into<String>,
        doc_type: EvidenceType,
        title: impl Into<String>,
        source: &str,
    ) -> EvidenceDocument {
        EvidenceDocument::new(id, doc_type, title, self.content)
            .with_source(source)
            .with_truncated(self.truncated)
    }
}

/// Cut `text` to at most `max_bytes` on a char boundary, appending the
/// truncation marker with the number of dropped characters
fn cap_bytes(text: &str, max_bytes: usize) -> FileText {
    if text.len() <= max_bytes {
        return FileText {
            content: text.to_string(),
            truncated: false,
        };
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let dropped = text[end..].chars().count();
    let mut content = text[..end].trim_end().to_string();
    content.push_str(&truncation_marker(dropped));
    FileText {
        content,
        truncated: true,
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// =============================================================================
// Synthesized Documents
// =============================================================================

/// Structural summary of the extracted facts
pub fn code_summary(facts: &TechnicalFacts) -> EvidenceDocument {
    let meta = &facts.metadata;
    let mut out = String::new();

    out.push_str(&format!("Project: {}\n", meta.project_name));
    if !meta.frameworks.is_empty() {
        out.push_str(&format!("Frameworks: {}\n", meta.frameworks.join(", ")));
    }
    out.push_str(&format!(
        "Files: {} total, {} screens, {} API, {} data model\n",
        meta.total_files, meta.screen_files, meta.api_files, meta.data_model_files
    ));

    section(&mut out, "Screens", facts.screens.iter().map(|s| match &s.route {
        Some(route) => format!("{} ({})", s.name, route),
        None => s.name.clone(),
    }));
    section(&mut out, "API endpoints", facts.api_endpoints.iter().map(|e| e.key()));
    section(&mut out, "Data models", facts.data_models.iter().map(|m| {
        let fields: Vec<&str> = m.fields.iter().map(|f| f.name.as_str()).collect();
        if fields.is_empty() {
            m.name.clone()
        } else {
            format!("{} {{ {} }}", m.name, fields.join(", "))
        }
    }));

    EvidenceDocument::new(
        "code-summary",
        EvidenceType::CodeSummary,
        "Code structure summary",
        out.trim_end(),
    )
}

/// State, event and navigation patterns; `None` when there are none
pub fn code_patterns(facts: &TechnicalFacts) -> Option<EvidenceDocument> {
    if facts.state_management.is_empty()
        && facts.events.is_empty()
        && facts.navigation.is_empty()
    {
        return None;
    }
    let mut out = String::new();
    section(&mut out, "State management", facts.state_management.iter().map(|s| match &s.name {
        Some(name) => format!("{}: {}", s.library, name),
        None => s.library.clone(),
    }));
    section(&mut out, "Events", facts.events.iter().map(|e| format!("{} ({})", e.name, e.kind)));
    section(
        &mut out,
        "Navigation",
        facts
            .navigation
            .iter()
            .map(|n| format!("{} -> {} [{}]", n.from, n.to, n.trigger)),
    );

    Some(EvidenceDocument::new(
        "code-patterns",
        EvidenceType::CodePatterns,
        "Code patterns",
        out.trim(),
    ))
}

fn section(out: &mut String, title: &str, items: impl Iterator<Item = String>) {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{} ({}):\n", title, items.len()));
    for item in items.iter().take(SUMMARY_LIST_LIMIT) {
        out.push_str(&format!("- {}\n", item));
    }
    if items.len() > SUMMARY_LIST_LIMIT {
        out.push_str(&format!("- ... {} more\n", items.len() - SUMMARY_LIST_LIMIT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiEndpoint, Screen, StatePattern};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn sample_facts() -> TechnicalFacts {
        let mut facts = TechnicalFacts::default();
        facts.metadata.project_name = "Acme".into();
        facts.screens.push(Screen {
            name: "Dashboard".into(),
            path: "src/pages/Dashboard.tsx".into(),
            route: Some("/Dashboard".into()),
        });
        facts.api_endpoints.push(ApiEndpoint {
            method: "GET".into(),
            path: "/api/users".into(),
            source: "src/api/users/route.ts".into(),
            idiom: "next-route".into(),
        });
        facts.state_management.push(StatePattern {
            library: "redux".into(),
            name: Some("cart".into()),
            source: "src/store.ts".into(),
        });
        facts
    }

    fn full_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Acme\nBilling.");
        write(dir.path(), "docs/b-guide.md", "Guide");
        write(dir.path(), "docs/a-intro.md", "Intro");
        write(dir.path(), "docs/diagram.png", "binary");
        write(dir.path(), "package.json", r#"{"name": "acme"}"#);
        write(dir.path(), "tsconfig.json", "{}");
        write(dir.path(), "src/cart.test.ts", "test('adds', () => {})");
        dir
    }

    fn types(docs: &[EvidenceDocument]) -> Vec<EvidenceType> {
        docs.iter().map(|d| d.doc_type()).collect()
    }

    #[tokio::test]
    async fn test_full_mode_order() {
        let dir = full_repo();
        let config = EvidenceConfig::default();
        let scan = ScanConfig::default();
        let facts = sample_facts();
        let docs = EvidenceCollector::new(dir.path(), &config, &scan)
            .collect(Some("We need invoicing."), Some(&facts), EvidenceMode::Full)
            .await;

        use EvidenceType::*;
        assert_eq!(
            types(&docs),
            vec![
                UploadedBrief,
                RepoReadme,
                RepoDocs,
                RepoDocs,
                CodeSummary,
                PackageMetadata,
                ConfigFile,
                TestFile,
                CodePatterns
            ]
        );
        assert_eq!(docs[2].source_path(), Some("docs/a-intro.md"));
        assert!(docs[4].content().contains("GET /api/users"));
        assert!(docs[8].content().contains("redux: cart"));
    }

    #[tokio::test]
    async fn test_tier2_mode_excludes_technical_noise() {
        let dir = full_repo();
        let config = EvidenceConfig::default();
        let scan = ScanConfig::default();
        let facts = sample_facts();
        let docs = EvidenceCollector::new(dir.path(), &config, &scan)
            .collect(None, Some(&facts), EvidenceMode::Tier2)
            .await;

        assert!(docs.iter().all(|d| !matches!(
            d.doc_type(),
            EvidenceType::ConfigFile | EvidenceType::TestFile | EvidenceType::CodePatterns
        )));
        assert_eq!(docs[0].doc_type(), EvidenceType::RepoReadme);
    }

    #[tokio::test]
    async fn test_missing_sources_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = EvidenceConfig::default();
        let scan = ScanConfig::default();
        let docs = EvidenceCollector::new(dir.path(), &config, &scan)
            .collect(Some("   "), None, EvidenceMode::Full)
            .await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_file_carries_truncation_marker() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", &"a".repeat(500));
        let config = EvidenceConfig {
            max_doc_bytes: 100,
            ..EvidenceConfig::default()
        };
        let scan = ScanConfig::default();
        let docs = EvidenceCollector::new(dir.path(), &config, &scan)
            .collect(None, None, EvidenceMode::Full)
            .await;

        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_truncated());
        assert!(docs[0].content().ends_with("[... truncated 400 characters]"));
        assert!(docs[0].content().starts_with(&"a".repeat(100)));
    }

    #[test]
    fn test_cap_bytes_respects_char_boundaries() {
        let capped = cap_bytes("ééé", 3);
        assert!(capped.truncated);
        assert_eq!(capped.content, "é\n\n[... truncated 2 characters]");

        let whole = cap_bytes("short", 100);
        assert!(!whole.truncated);
        assert_eq!(whole.content, "short");
    }

    #[tokio::test]
    async fn test_blank_readme_falls_through_to_next_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "   \n");
        write(dir.path(), "README.txt", "Acme billing");
        let config = EvidenceConfig::default();
        let scan = ScanConfig::default();
        let docs = EvidenceCollector::new(dir.path(), &config, &scan)
            .collect(None, None, EvidenceMode::Full)
            .await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_path(), Some("README.txt"));
        assert_eq!(docs[0].content(), "Acme billing");
    }

    #[test]
    fn test_mode_filter() {
        let docs = vec![
            EvidenceDocument::new("a", EvidenceType::Other, "a", "x"),
            EvidenceDocument::new("b", EvidenceType::ComponentAnalysis, "b", "x"),
            EvidenceDocument::new("c", EvidenceType::RepoReadme, "c", "x"),
        ];
        assert_eq!(EvidenceMode::Tier2.filter(docs.clone()).len(), 1);
        assert_eq!(EvidenceMode::Tier3.filter(docs.clone()).len(), 2);
        assert_eq!(EvidenceMode::Full.filter(docs).len(), 3);
    }
}
