//! Document merge
//!
//! Pure functions rebuilding a `Prd` from a pre-tier snapshot and one tier's
//! output. The technical stratum is always copied from the snapshot, so no
//! tier output can change it. Merging is idempotent for identical inputs.

use serde_json::Value;

use crate::types::{Prd, SectionKind, StrategicFields};

/// Overlay tier-2 strategy on `snapshot`
pub fn merge_tier2(snapshot: &Prd, strategic: StrategicFields) -> Prd {
    Prd {
        technical: snapshot.technical.clone(),
        strategic: snapshot.strategic.clone().overlay(strategic),
        detailed: snapshot.detailed.clone(),
    }
}

/// Write each successful tier-3 section into its slot on `snapshot`
pub fn merge_tier3(snapshot: &Prd, sections: &[(SectionKind, Value)]) -> Prd {
    let mut detailed = snapshot.detailed.clone();
    for (kind, content) in sections {
        detailed.set(*kind, content.clone());
    }
    Prd {
        technical: snapshot.technical.clone(),
        strategic: snapshot.strategic.clone(),
        detailed,
    }
}
