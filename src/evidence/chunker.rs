//! Token Budgeter
//!
//! Greedy, order-preserving selection of evidence under a token ceiling.
//! Costs use the approximate estimate from [`crate::ai::tokenizer`]; the
//! guarantee below holds for that estimate, not for a real tokenizer.
//!
//! Documents are accepted until the next one would overflow. That document
//! is truncated to the remaining budget and becomes the last one kept;
//! everything after it is dropped. If the remainder cannot even hold the
//! truncation marker, the overflowing document is dropped too.

use tracing::debug;

use crate::ai::tokenizer::{estimate_tokens, truncate_to_tokens};
use crate::types::EvidenceDocument;

/// Select a prefix of `documents` whose estimated cost fits `max_tokens`
pub fn chunk(documents: &[EvidenceDocument], max_tokens: usize) -> Vec<EvidenceDocument> {
    let mut kept = Vec::with_capacity(documents.len());
    let mut used = 0usize;

    for doc in documents {
        let cost = estimate_tokens(doc.content());
        if used + cost <= max_tokens {
            used += cost;
            kept.push(doc.clone());
            continue;
        }

        let remaining = max_tokens - used;
        match truncate_to_tokens(doc.content(), remaining) {
            Some(content) => {
                debug!(id = doc.id(), remaining, "Truncated overflowing evidence");
                kept.push(doc.truncated_copy(content));
            }
            None => debug!(id = doc.id(), remaining, "Dropped overflowing evidence"),
        }
        break;
    }

    if kept.len() < documents.len() {
        debug!(
            kept = kept.len(),
            dropped = documents.len() - kept.len(),
            max_tokens,
            "Evidence budget reached"
        );
    }
    kept
}

/// Sum of estimated tokens over the documents' content
pub fn total_tokens(documents: &[EvidenceDocument]) -> usize {
    documents.iter().map(|d| estimate_tokens(d.content())).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvidenceType;
    use proptest::prelude::*;

    fn doc(id: &str, chars: usize) -> EvidenceDocument {
        EvidenceDocument::new(id, EvidenceType::RepoDocs, id, "a".repeat(chars))
    }

    #[test]
    fn test_everything_fits() {
        let docs = vec![doc("a", 40), doc("b", 40)];
        let kept = chunk(&docs, 20);
        assert_eq!(kept, docs);
        assert_eq!(total_tokens(&kept), 20);
    }

    #[test]
    fn test_overflowing_document_is_truncated_and_last() {
        let docs = vec![doc("a", 40), doc("b", 400), doc("c", 4)];
        let kept = chunk(&docs, 60);

        let ids: Vec<&str> = kept.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!kept[0].is_truncated());
        assert!(kept[1].is_truncated());
        assert!(kept[1].content().contains("[... truncated"));
        assert!(total_tokens(&kept) <= 60);
    }

    #[test]
    fn test_overflow_without_room_for_marker_is_dropped() {
        let docs = vec![doc("a", 40), doc("b", 400), doc("c", 4)];
        let kept = chunk(&docs, 11);
        let ids: Vec<&str> = kept.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_zero_budget() {
        assert!(chunk(&[doc("a", 4)], 0).is_empty());
        assert!(chunk(&[], 100).is_empty());
    }

    proptest! {
        #[test]
        fn prop_budget_holds_and_prefix_is_kept(
            contents in prop::collection::vec("[a-zé ]{0,300}", 0..12),
            max_tokens in 0usize..400,
        ) {
            let docs: Vec<EvidenceDocument> = contents
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    EvidenceDocument::new(format!("d{}", i), EvidenceType::Other, "t", c.as_str())
                })
                .collect();

            let kept = chunk(&docs, max_tokens);

            prop_assert!(total_tokens(&kept) <= max_tokens);
            prop_assert!(kept.len() <= docs.len());
            for (i, d) in kept.iter().enumerate() {
                prop_assert_eq!(d.id(), docs[i].id());
                let is_last = i + 1 == kept.len();
                if !is_last {
                    prop_assert!(!d.is_truncated());
                    prop_assert_eq!(d.content(), docs[i].content());
                }
            }
        }
    }
}
