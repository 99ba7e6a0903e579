use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ScanConfig;
use crate::types::{PrdError, Result};

/// Recursive walker that skips dependency, build and VCS directories
pub struct FileScanner {
    root: PathBuf,
    skip_dirs: HashSet<String>,
    max_file_size: u64,
    max_files: usize,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P, config: &ScanConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            skip_dirs: config.skip_dirs.iter().cloned().collect(),
            max_file_size: config.max_file_size,
            max_files: config.max_files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree in file-name order.
    ///
    /// Unreadable entries are skipped; only a missing or non-directory root
    /// is an error.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.root.is_dir() {
            return Err(PrdError::Scan(format!(
                "Not a directory: {}",
                self.root.display()
            )));
        }

        let skip = self.skip_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && skip.contains(&*entry.file_name().to_string_lossy()))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let Ok(metadata) = path.metadata() else {
                continue;
            };
            if metadata.len() > self.max_file_size {
                continue;
            }
            let Some(relative) = self.relative(path) else {
                continue;
            };

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative,
                size: metadata.len(),
            });

            if files.len() >= self.max_files {
                debug!(limit = self.max_files, "File limit reached, stopping scan");
                break;
            }
        }

        Ok(files)
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Root-relative path with forward slashes
    pub relative: String,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_skips_noise_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/index.ts", "x");
        touch(dir.path(), "node_modules/react/index.js", "x");
        touch(dir.path(), "dist/bundle.js", "x");
        touch(dir.path(), ".git/HEAD", "x");

        let files = FileScanner::new(dir.path(), &ScanConfig::default())
            .scan()
            .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(names, vec!["src/index.ts"]);
    }

    #[test]
    fn test_respects_size_and_count_limits() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.ts", "small");
        touch(dir.path(), "b.ts", &"x".repeat(64));
        touch(dir.path(), "c.ts", "small");
        touch(dir.path(), "d.ts", "small");

        let config = ScanConfig {
            max_file_size: 16,
            max_files: 2,
            ..Default::default()
        };
        let files = FileScanner::new(dir.path(), &config).scan().unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(names, vec!["a.ts", "c.ts"]);
    }

    #[test]
    fn test_missing_root_is_scan_error() {
        let dir = TempDir::new().unwrap();
        let result = FileScanner::new(dir.path().join("nope"), &ScanConfig::default()).scan();
        assert!(matches!(result, Err(PrdError::Scan(_))));
    }
}
