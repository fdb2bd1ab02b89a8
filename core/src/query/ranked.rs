//! Bag-of-terms ranked retrieval.
//!
//! Scores are accumulated term at a time into a sparse per-document map, divided
//! by L_d and pushed through a bounded min-heap, so the work is proportional to
//! the number of matching documents rather than the corpus size.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::index::IndexSource;
use crate::query::topk::TopK;
use crate::DocId;

#[derive(Debug, Clone, Copy)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

// Higher score ranks first; equal scores rank the lower document id first.
impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.score)
            .cmp(&OrderedFloat(other.score))
            .then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

fn accumulate<S: IndexSource + ?Sized>(source: &S, terms: &[String]) -> Result<HashMap<DocId, f64>> {
    let corpus = source.corpus_stats();
    let model = source.scheme().model();
    let mut accumulators: HashMap<DocId, f64> = HashMap::new();
    let mut seen = HashSet::new();

    for term in terms {
        if !seen.insert(term.as_str()) {
            continue;
        }
        let postings = source.postings_without_positions(term)?;
        if postings.is_empty() {
            tracing::warn!(term = %term, "query term not in index");
            continue;
        }
        let query_weight = model.query_weight(postings.len() as u64, &corpus);
        for posting in &postings {
            *accumulators.entry(posting.doc_id).or_insert(0.0) += posting.weight * query_weight;
        }
    }
    Ok(accumulators)
}

/// Returns the `k` best documents for `terms`, highest score first.
///
/// Terms are treated as a set. Missing terms contribute nothing, and documents
/// whose accumulator stays at zero are not scored.
pub fn ranked_query<S: IndexSource + ?Sized>(
    source: &S,
    terms: &[String],
    k: usize,
) -> Result<Vec<ScoredDocument>> {
    if k == 0 || terms.is_empty() {
        return Ok(Vec::new());
    }

    let accumulators = accumulate(source, terms)?;
    tracing::debug!(candidates = accumulators.len(), "accumulated scores");

    let mut top = TopK::new(k);
    for (doc_id, accumulator) in accumulators {
        if accumulator == 0.0 {
            continue;
        }
        let normalization = source.normalization(doc_id)?;
        let score = if normalization > 0.0 {
            accumulator / normalization
        } else {
            accumulator
        };
        top.push(ScoredDocument { doc_id, score });
    }

    let results = top.into_sorted_vec();
    tracing::debug!(returned = results.len(), k, "selected top documents");
    Ok(results)
}
