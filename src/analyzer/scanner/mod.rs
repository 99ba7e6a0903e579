//! Repository Scanner
//!
//! Walks the repository and classifies paths by naming convention only.
//! The resulting `ScanResult` is consumed once by fact extraction.

pub mod classify;
pub mod file_scanner;

pub use file_scanner::{FileScanner, ScannedFile};

use std::path::Path;

use crate::config::ScanConfig;
use crate::types::Result;

/// Transient classification of the repository's files
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub screens: Vec<String>,
    pub api_files: Vec<String>,
    pub data_model_files: Vec<String>,
    pub all_files: Vec<ScannedFile>,
}

impl ScanResult {
    /// Files the detectors should read
    pub fn code_files(&self) -> impl Iterator<Item = &ScannedFile> {
        self.all_files
            .iter()
            .filter(|f| classify::is_code_file(&f.relative))
    }
}

/// Walk `root` and classify every file found
pub fn scan_repository(root: &Path, config: &ScanConfig) -> Result<ScanResult> {
    let all_files = FileScanner::new(root, config).scan()?;

    let mut result = ScanResult::default();
    for file in &all_files {
        let rel = file.relative.as_str();
        if classify::is_screen(rel) {
            result.screens.push(rel.to_string());
        }
        if classify::is_api_file(rel) {
            result.api_files.push(rel.to_string());
        }
        if classify::is_data_model_file(rel) {
            result.data_model_files.push(rel.to_string());
        }
    }
    result.all_files = all_files;

    tracing::debug!(
        total = result.all_files.len(),
        screens = result.screens.len(),
        api = result.api_files.len(),
        models = result.data_model_files.len(),
        "Scan complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_classifies_files() {
        let dir = TempDir::new().unwrap();
        for rel in [
            "src/pages/Dashboard.tsx",
            "src/api/users/route.ts",
            "prisma/schema.prisma",
            "README.md",
        ] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "// content").unwrap();
        }

        let result = scan_repository(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(result.all_files.len(), 4);
        assert_eq!(result.screens, vec!["src/pages/Dashboard.tsx"]);
        assert_eq!(result.api_files, vec!["src/api/users/route.ts"]);
        assert_eq!(result.data_model_files, vec!["prisma/schema.prisma"]);
        assert_eq!(result.code_files().count(), 3);
    }
}
