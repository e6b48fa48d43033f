//! Retrieval store and embedder seams, plus ranking rules.
//!
//! The engine treats vector search as a black box behind [`RetrievalStore`]
//! (implementations live in `hrdesk-infra`), but owns the ordering
//! semantics: descending score, ties broken by corpus priority then by
//! document identifier, so results are deterministic for equal scores.

use hrdesk_types::error::RetrievalError;
use hrdesk_types::retrieval::RetrievedFragment;

/// Trait for similarity search over the HR corpus.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in hrdesk-infra.
pub trait RetrievalStore: Send + Sync {
    /// Return the top fragments for a query, at most `k`, best first.
    ///
    /// An empty result (nothing above the relevance floor) is not an error.
    fn search(
        &self,
        query: &str,
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievedFragment>, RetrievalError>> + Send;
}

/// Shared stores search like their inner store.
impl<T: RetrievalStore> RetrievalStore for std::sync::Arc<T> {
    fn search(
        &self,
        query: &str,
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievedFragment>, RetrievalError>> + Send
    {
        self.as_ref().search(query, k)
    }
}

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in hrdesk-infra.
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors, one per input.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send;

    /// The model name used for embeddings.
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}

/// Apply the relevance floor, deterministic ordering, and truncation to `k`.
///
/// Ordering: score descending; ties by corpus priority (policy documents
/// over employee records over FAQ), then by document identifier.
pub fn rank_fragments(
    mut fragments: Vec<RetrievedFragment>,
    k: usize,
    min_score: f32,
) -> Vec<RetrievedFragment> {
    fragments.retain(|f| f.score >= min_score);
    fragments.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.corpus.priority().cmp(&b.corpus.priority()))
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    fragments.truncate(k);
    fragments
}

/// Pick a top-k for the query shape.
///
/// Employee lookups need few precise records, calculations even fewer,
/// multi-faceted questions more; everything else uses the configured
/// default.
pub fn top_k_for(query: &str, default_k: usize) -> usize {
    let lower = query.to_lowercase();

    if ["who is", "who are", "find employee", "contact", "email"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        return 5;
    }
    if ["calculate", "salary", "breakdown", "basic salary"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        return 3;
    }
    let word_count = query.split_whitespace().count();
    if word_count > 15 || query.matches('?').count() > 1 {
        return 12;
    }
    default_k
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrdesk_types::retrieval::Corpus;

    fn frag(id: &str, score: f32, corpus: Corpus) -> RetrievedFragment {
        RetrievedFragment {
            document_id: id.to_string(),
            text: format!("text of {id}"),
            score,
            corpus,
        }
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let ranked = rank_fragments(
            vec![
                frag("a", 0.3, Corpus::Faq),
                frag("b", 0.9, Corpus::Policy),
                frag("c", 0.6, Corpus::Employee),
            ],
            10,
            0.0,
        );
        let ids: Vec<&str> = ranked.iter().map(|f| f.document_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_break_by_corpus_then_id() {
        let ranked = rank_fragments(
            vec![
                frag("z-faq", 0.5, Corpus::Faq),
                frag("m-emp", 0.5, Corpus::Employee),
                frag("a-pol", 0.5, Corpus::Policy),
                frag("b-pol", 0.5, Corpus::Policy),
            ],
            10,
            0.0,
        );
        let ids: Vec<&str> = ranked.iter().map(|f| f.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a-pol", "b-pol", "m-emp", "z-faq"]);
    }

    #[test]
    fn test_rank_applies_floor_and_k() {
        let ranked = rank_fragments(
            vec![
                frag("a", 0.9, Corpus::Policy),
                frag("b", 0.8, Corpus::Policy),
                frag("c", 0.1, Corpus::Policy),
            ],
            1,
            0.25,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].document_id, "a");
    }

    #[test]
    fn test_rank_empty_input() {
        assert!(rank_fragments(vec![], 5, 0.25).is_empty());
    }

    #[test]
    fn test_top_k_employee_lookup() {
        assert_eq!(top_k_for("Who is the COO?", 8), 5);
        assert_eq!(top_k_for("find employee Punom", 8), 5);
    }

    #[test]
    fn test_top_k_calculation() {
        assert_eq!(top_k_for("calculate my basic salary", 8), 3);
    }

    #[test]
    fn test_top_k_complex_query() {
        let long = "Could you explain in detail how the annual leave accrual \
                    interacts with the encashment rules across quarters for new joiners";
        assert_eq!(top_k_for(long, 8), 12);
        assert_eq!(top_k_for("Leave? Bonus? Both?", 8), 12);
    }

    #[test]
    fn test_top_k_default() {
        assert_eq!(top_k_for("What is the notice period?", 8), 8);
    }
}
