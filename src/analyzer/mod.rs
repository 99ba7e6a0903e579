//! Code Analyzer Module
//!
//! Deterministic, non-AI fact extraction:
//! - Repository scanning with path-convention classification
//! - Table-driven feature detectors over file contents
//! - Project metadata resolution

pub mod detectors;
pub mod extractor;
pub mod project;
pub mod scanner;

pub use detectors::{Detection, normalize_path};
pub use extractor::extract_facts;
pub use project::resolve_project_name;
pub use scanner::{ScanResult, scan_repository};
