use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IndexError, Result};
use crate::weighting::{CorpusStats, DocStats, WeighingScheme};
use crate::{DocId, Position};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: String,
    pub byte_size: u64,
}

/// A document's occurrence record for one term.
///
/// `positions` is strictly ascending. When decoded without positions the list is
/// empty but `term_frequency` still carries tf(t,d).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub positions: Vec<Position>,
    pub term_frequency: u32,
    /// w(d,t) under the scheme the index was built with.
    pub weight: f64,
}

impl Posting {
    pub fn new(doc_id: DocId) -> Self {
        Self {
            doc_id,
            positions: Vec::new(),
            term_frequency: 0,
            weight: 0.0,
        }
    }

    pub fn with_positions(doc_id: DocId, positions: Vec<Position>) -> Self {
        let term_frequency = positions.len() as u32;
        Self {
            doc_id,
            positions,
            term_frequency,
            weight: 0.0,
        }
    }

    /// Inserts a position keeping the list sorted; duplicates are ignored.
    pub fn add_position(&mut self, position: Position) {
        match self.positions.last() {
            Some(&last) if last < position => self.positions.push(position),
            None => self.positions.push(position),
            _ => {
                if let Err(at) = self.positions.binary_search(&position) {
                    self.positions.insert(at, position);
                }
            }
        }
        self.term_frequency = self.positions.len() as u32;
    }

    pub fn without_positions(&self) -> Self {
        Self {
            doc_id: self.doc_id,
            positions: Vec::new(),
            term_frequency: self.term_frequency,
            weight: self.weight,
        }
    }
}

/// Read access shared by the on-disk reader and the in-memory index.
///
/// Missing terms are not errors here: they yield an empty postings list.
pub trait IndexSource {
    fn scheme(&self) -> WeighingScheme;

    fn corpus_stats(&self) -> CorpusStats;

    fn postings(&self, term: &str) -> Result<Vec<Posting>>;

    fn postings_without_positions(&self, term: &str) -> Result<Vec<Posting>>;

    /// All terms in ascending order.
    fn vocabulary(&self) -> Result<Vec<String>>;

    /// L_d for a document under the index's scheme.
    fn normalization(&self, doc_id: DocId) -> Result<f64>;
}

/// Per-document figures gathered during the build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentRecord {
    pub meta: DocMeta,
    pub length: u64,
    pub distinct_terms: u64,
    pub normalization: f64,
}

impl DocumentRecord {
    pub fn average_tf(&self) -> f64 {
        if self.distinct_terms == 0 {
            0.0
        } else {
            self.length as f64 / self.distinct_terms as f64
        }
    }

    pub fn stats(&self) -> DocStats {
        DocStats {
            length: self.length,
            byte_size: self.meta.byte_size,
            average_tf: self.average_tf(),
        }
    }
}

/// A fully aggregated index, weighted and ready to be written out.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    pub scheme: WeighingScheme,
    pub vocabulary: BTreeMap<String, Vec<Posting>>,
    pub documents: Vec<DocumentRecord>,
    pub average_doc_length: f64,
}

impl InMemoryIndex {
    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, doc_id: DocId) -> Option<&DocumentRecord> {
        self.documents.get(doc_id as usize)
    }
}

impl IndexSource for InMemoryIndex {
    fn scheme(&self) -> WeighingScheme {
        self.scheme
    }

    fn corpus_stats(&self) -> CorpusStats {
        CorpusStats {
            document_count: self.documents.len() as u64,
            average_doc_length: self.average_doc_length,
        }
    }

    fn postings(&self, term: &str) -> Result<Vec<Posting>> {
        Ok(self.vocabulary.get(term).cloned().unwrap_or_default())
    }

    fn postings_without_positions(&self, term: &str) -> Result<Vec<Posting>> {
        Ok(self
            .vocabulary
            .get(term)
            .map(|list| list.iter().map(Posting::without_positions).collect())
            .unwrap_or_default())
    }

    fn vocabulary(&self) -> Result<Vec<String>> {
        Ok(self.vocabulary.keys().cloned().collect())
    }

    fn normalization(&self, doc_id: DocId) -> Result<f64> {
        self.document(doc_id)
            .map(|record| record.normalization)
            .ok_or_else(|| IndexError::InvalidInput(format!("unknown document {doc_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_stay_sorted_and_unique() {
        let mut p = Posting::new(3);
        for pos in [5, 1, 9, 5, 3] {
            p.add_position(pos);
        }
        assert_eq!(p.positions, vec![1, 3, 5, 9]);
        assert_eq!(p.term_frequency, 4);
    }

    #[test]
    fn stripping_positions_keeps_tf() {
        let p = Posting::with_positions(1, vec![2, 4, 8]);
        let stripped = p.without_positions();
        assert!(stripped.positions.is_empty());
        assert_eq!(stripped.term_frequency, 3);
    }

    #[test]
    fn missing_term_is_empty() {
        let index = InMemoryIndex::default();
        assert!(index.postings("absent").unwrap().is_empty());
    }
}
