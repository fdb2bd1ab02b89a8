use std::path::Path;

use crate::codec::PostingsStore;
use crate::config::SessionConfig;
use crate::dictionary::DictionarySnapshot;
use crate::doc_weights::{DocWeightsStore, DocumentWeight, RECORD_SIZE};
use crate::error::{IndexError, Result};
use crate::index::{DocMeta, IndexSource, Posting};
use crate::persist::{load_docs, load_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use crate::query::{self, QueryNode, ScoredDocument};
use crate::weighting::{CorpusStats, WeighingScheme};
use crate::DocId;

/// A published index opened for querying.
///
/// The term dictionary is loaded from its published snapshot at open, so any
/// number of readers, in one process or several, may share an index.
pub struct IndexReader {
    paths: IndexPaths,
    meta: MetaFile,
    session: SessionConfig,
    dictionary: DictionarySnapshot,
    average_doc_length: f64,
    postings: PostingsStore,
    weights: DocWeightsStore,
    docs: Vec<DocMeta>,
}

impl IndexReader {
    /// Opens the index at `root`, refusing it if it was built under a scheme
    /// other than the session's.
    pub fn open<P: AsRef<Path>>(root: P, session: SessionConfig) -> Result<Self> {
        let paths = IndexPaths::new(root);
        let meta = load_meta(&paths)?;
        if meta.scheme != session.scheme {
            return Err(IndexError::SchemeMismatch {
                stamped: meta.scheme,
                active: session.scheme,
            });
        }
        Self::open_with_meta(paths, meta, session)
    }

    /// Opens the index under whatever scheme it was built with.
    pub fn open_stamped<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = IndexPaths::new(root);
        let meta = load_meta(&paths)?;
        let session = SessionConfig {
            scheme: meta.scheme,
            stemmer: meta.stemmer,
            ..SessionConfig::default()
        };
        Self::open_with_meta(paths, meta, session)
    }

    fn open_with_meta(paths: IndexPaths, meta: MetaFile, session: SessionConfig) -> Result<Self> {
        if meta.version != FORMAT_VERSION {
            return Err(IndexError::InvalidInput(format!(
                "index format version {} is not supported (expected {FORMAT_VERSION})",
                meta.version
            )));
        }
        let postings = PostingsStore::open(paths.postings())?;
        let weights = DocWeightsStore::open(paths.doc_weights())?;
        if weights.count() != meta.num_docs as u64 {
            return Err(IndexError::corrupt(
                0,
                format!(
                    "weight store holds {} documents but metadata records {}",
                    weights.count(),
                    meta.num_docs
                ),
            ));
        }
        let average_doc_length = weights.average_doc_length()?;
        let tolerance = 1e-9 * meta.average_doc_length.abs().max(1.0);
        let consistent = (average_doc_length - meta.average_doc_length).abs() <= tolerance;
        if !consistent {
            return Err(IndexError::corrupt(
                weights.count() * RECORD_SIZE,
                format!(
                    "weight store average length {average_doc_length} disagrees with metadata {}",
                    meta.average_doc_length
                ),
            ));
        }
        let docs = load_docs(&paths)?;
        let dictionary = DictionarySnapshot::load(paths.terms())?;
        tracing::info!(
            root = %paths.root.display(),
            num_docs = meta.num_docs,
            num_terms = dictionary.len(),
            scheme = %meta.scheme,
            "opened index"
        );
        Ok(Self {
            paths,
            meta,
            session,
            dictionary,
            average_doc_length,
            postings,
            weights,
            docs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    pub fn meta(&self) -> &MetaFile {
        &self.meta
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn num_docs(&self) -> u32 {
        self.meta.num_docs
    }

    pub fn document(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(doc_id as usize)
    }

    pub fn document_weight(&self, doc_id: DocId) -> Result<DocumentWeight> {
        self.weights.get(doc_id)
    }

    /// Postings offset for `term`, or `TermNotFound`.
    fn offset(&self, term: &str) -> Result<u64> {
        let offset = self.dictionary.get(term)?;
        u64::try_from(offset)
            .map_err(|_| IndexError::corrupt(0, format!("negative offset {offset} for '{term}'")))
    }

    fn lookup(&self, term: &str, with_positions: bool) -> Result<Vec<Posting>> {
        let offset = match self.offset(term) {
            Ok(offset) => offset,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        if with_positions {
            self.postings.read_postings(offset)
        } else {
            self.postings.read_postings_without_positions(offset)
        }
    }

    pub fn boolean_query(&self, node: &QueryNode) -> Result<Vec<Posting>> {
        query::evaluate(self, node)
    }

    /// Ranked retrieval with the session's default `k`.
    pub fn ranked_query(&self, terms: &[String]) -> Result<Vec<ScoredDocument>> {
        query::ranked_query(self, terms, self.session.top_k)
    }

    pub fn ranked_query_k(&self, terms: &[String], k: usize) -> Result<Vec<ScoredDocument>> {
        query::ranked_query(self, terms, k)
    }
}

impl IndexSource for IndexReader {
    fn scheme(&self) -> WeighingScheme {
        self.meta.scheme
    }

    fn corpus_stats(&self) -> CorpusStats {
        CorpusStats {
            document_count: self.meta.num_docs as u64,
            average_doc_length: self.average_doc_length,
        }
    }

    fn postings(&self, term: &str) -> Result<Vec<Posting>> {
        self.lookup(term, true)
    }

    fn postings_without_positions(&self, term: &str) -> Result<Vec<Posting>> {
        self.lookup(term, false)
    }

    fn vocabulary(&self) -> Result<Vec<String>> {
        Ok(self.dictionary.keys().map(str::to_string).collect())
    }

    fn normalization(&self, doc_id: DocId) -> Result<f64> {
        Ok(self.weights.get(doc_id)?.normalization)
    }
}
