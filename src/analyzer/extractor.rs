//! Tier-1 Fact Extraction
//!
//! Scan → classify → run detectors → fold into `TechnicalFacts`. Fully
//! deterministic apart from the extraction timestamp; any single file that
//! cannot be read is skipped.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, instrument};

use super::detectors::{self, Detection, normalize_path};
use super::project::{package_frameworks, resolve_project_name};
use super::scanner::{ScanResult, classify, scan_repository};
use crate::config::ScanConfig;
use crate::types::{
    ApiEndpoint, DataModel, EventFact, ExtractionMetadata, NavigationEdge, Result, Screen,
    StatePattern, TechnicalFacts, log_skip,
};

/// Extensions the navigation/state/event detectors understand
const FRONTEND_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "vue", "svelte"];

/// Collects detections from many files, deduplicating across files
struct Accumulator<T, K> {
    facts: Vec<T>,
    seen: HashSet<K>,
    key: fn(&T) -> K,
}

impl<T, K: Hash + Eq> Accumulator<T, K> {
    fn new(key: fn(&T) -> K) -> Self {
        Self {
            facts: Vec::new(),
            seen: HashSet::new(),
            key,
        }
    }

    fn absorb(&mut self, detection: Detection<T>, frameworks: &mut BTreeSet<String>) {
        if let Some(framework) = detection.framework {
            frameworks.insert(framework);
        }
        for fact in detection.facts {
            if self.seen.insert((self.key)(&fact)) {
                self.facts.push(fact);
            }
        }
    }
}

/// Run tier-1 extraction over the repository at `root`
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn extract_facts(root: &Path, config: &ScanConfig) -> Result<TechnicalFacts> {
    let scan = scan_repository(root, config)?;
    let mut frameworks: BTreeSet<String> = package_frameworks(root).into_iter().collect();

    let mut endpoints = Accumulator::<ApiEndpoint, String>::new(|e| e.key());
    let mut models = Accumulator::<DataModel, String>::new(|m| m.name.clone());
    let mut navigation = Accumulator::<NavigationEdge, (String, String, String)>::new(|n| {
        (n.from.clone(), n.to.clone(), n.trigger.clone())
    });
    let mut state = Accumulator::<StatePattern, (String, Option<String>)>::new(|s| {
        (s.library.clone(), s.name.clone())
    });
    let mut events =
        Accumulator::<EventFact, (String, String)>::new(|e| (e.name.clone(), e.kind.clone()));

    let model_files: HashSet<&str> = scan.data_model_files.iter().map(String::as_str).collect();

    for file in scan.code_files() {
        let Some(content) = log_skip(tokio::fs::read_to_string(&file.path).await, &file.relative)
        else {
            continue;
        };
        let rel = file.relative.as_str();

        endpoints.absorb(detectors::api::detect(&content, rel), &mut frameworks);

        if model_files.contains(rel) {
            models.absorb(detectors::data_model::detect(&content, rel), &mut frameworks);
        }

        if is_frontend(rel) {
            navigation.absorb(detectors::navigation::detect(&content, rel), &mut frameworks);
            state.absorb(detectors::state::detect(&content, rel), &mut frameworks);
            events.absorb(detectors::events::detect(&content, rel), &mut frameworks);
        }
    }

    let facts = TechnicalFacts {
        screens: screens(&scan),
        navigation: navigation.facts,
        api_endpoints: endpoints.facts,
        data_models: models.facts,
        state_management: state.facts,
        events: events.facts,
        metadata: ExtractionMetadata {
            project_name: resolve_project_name(root),
            frameworks: frameworks.into_iter().collect(),
            total_files: scan.all_files.len(),
            screen_files: scan.screens.len(),
            api_files: scan.api_files.len(),
            data_model_files: scan.data_model_files.len(),
            extracted_at: Some(Utc::now()),
        },
    };

    info!(
        project = %facts.metadata.project_name,
        screens = facts.screens.len(),
        endpoints = facts.api_endpoints.len(),
        models = facts.data_models.len(),
        "Extracted technical facts"
    );
    Ok(facts)
}

fn screens(scan: &ScanResult) -> Vec<Screen> {
    scan.screens
        .iter()
        .map(|path| Screen {
            name: classify::screen_name(path),
            path: path.clone(),
            route: classify::route_from_path(path).and_then(|r| normalize_path(&r)),
        })
        .inspect(|s| debug!(screen = %s.name, route = ?s.route, "Screen"))
        .collect()
}

fn is_frontend(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| FRONTEND_EXTENSIONS.contains(&ext))
}
