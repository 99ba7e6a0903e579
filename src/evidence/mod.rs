//! Evidence Module
//!
//! Free-text inputs for the generation tiers:
//! - Collection in priority order, filtered by tier profile
//! - Greedy token budgeting over the ordered list

pub mod chunker;
pub mod collector;

pub use chunker::{chunk, total_tokens};
pub use collector::{EvidenceCollector, EvidenceMode};
