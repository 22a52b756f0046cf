use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::types::{ScoredDocument, SearchResult};

/// SHA-256 of the trimmed, lower-cased content.
pub fn content_fingerprint(content: &str) -> [u8; 32] {
    let normalized = content.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Merge per-variant hit lists in variant order, keeping the first
/// occurrence of each distinct content and tagging it with the variant that
/// found it.
pub fn merge_variant_hits(per_variant: Vec<(String, Vec<ScoredDocument>)>) -> Vec<SearchResult> {
    let mut seen: HashSet<[u8; 32]> = HashSet::new();
    let mut merged = Vec::new();

    for (variant, hits) in per_variant {
        for hit in hits {
            if seen.insert(content_fingerprint(&hit.document.content)) {
                merged.push(SearchResult {
                    document: hit.document,
                    similarity: hit.score,
                    rerank_score: None,
                    matched_query: variant.clone(),
                });
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, DocumentMetadata, Sentiment};

    fn hit(id: &str, content: &str, score: f32) -> ScoredDocument {
        ScoredDocument {
            document: Document {
                id: id.into(),
                content: content.into(),
                metadata: DocumentMetadata {
                    sentiment: Sentiment::Neutral,
                    rating: None,
                    chunk_index: 0,
                    total_chunks: 1,
                    row_index: 0,
                },
            },
            score,
        }
    }

    #[test]
    fn test_fingerprint_normalises() {
        assert_eq!(
            content_fingerprint("  Late Delivery\n"),
            content_fingerprint("late delivery")
        );
        assert_ne!(content_fingerprint("late delivery"), content_fingerprint("late deliveries"));
    }

    #[test]
    fn test_first_variant_wins() {
        let merged = merge_variant_hits(vec![
            ("q1".into(), vec![hit("a", "Package was late", 0.9)]),
            (
                "q2".into(),
                vec![hit("b", "  package WAS late ", 0.95), hit("c", "Rude driver", 0.5)],
            ),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].document.id, "a");
        assert_eq!(merged[0].matched_query, "q1");
        assert_eq!(merged[1].document.id, "c");
        assert_eq!(merged[1].matched_query, "q2");
    }

    #[test]
    fn test_identical_variants_are_idempotent() {
        let hits = vec![hit("a", "one", 0.9), hit("b", "two", 0.8)];
        let single = merge_variant_hits(vec![("q".into(), hits.clone())]);
        let repeated = merge_variant_hits(vec![
            ("q".into(), hits.clone()),
            ("q".into(), hits.clone()),
            ("q".into(), hits),
        ]);
        let ids = |r: &[SearchResult]| r.iter().map(|s| s.document.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&single), ids(&repeated));
    }
}
