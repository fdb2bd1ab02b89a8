use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::Path;

use crate::codec::PostingsWriter;
use crate::config::SessionConfig;
use crate::corpus::Corpus;
use crate::dictionary::{OpenMode, TermDictionary};
use crate::doc_weights::{DocWeightsWriter, DocumentWeight};
use crate::error::{IndexError, Result};
use crate::index::{DocMeta, DocumentRecord, InMemoryIndex, Posting};
use crate::persist::{now_rfc3339, publish, save_docs, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use crate::tokenizer::{StemmerAlgorithm, Tokenizer};
use crate::weighting::{CorpusStats, WeighingScheme};
use crate::{DocId, Position};

/// Aggregates `(term, doc, position)` occurrences into a sorted vocabulary.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    vocabulary: BTreeMap<String, Vec<Posting>>,
    metas: Vec<Option<DocMeta>>,
    doc_count: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_document(&mut self, doc_id: DocId, meta: DocMeta) {
        let slot = doc_id as usize;
        if self.metas.len() <= slot {
            self.metas.resize(slot + 1, None);
        }
        self.metas[slot] = Some(meta);
        self.doc_count = self.doc_count.max(slot + 1);
    }

    /// Records one occurrence. Documents may arrive in any order; postings and
    /// positions are kept sorted either way.
    pub fn add_occurrence(&mut self, term: &str, doc_id: DocId, position: Position) {
        self.doc_count = self.doc_count.max(doc_id as usize + 1);
        let postings = self.vocabulary.entry(term.to_string()).or_default();
        match postings.last_mut() {
            Some(last) if last.doc_id == doc_id => last.add_position(position),
            Some(last) if last.doc_id > doc_id => {
                match postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
                    Ok(at) => postings[at].add_position(position),
                    Err(at) => postings.insert(at, Posting::with_positions(doc_id, vec![position])),
                }
            }
            _ => postings.push(Posting::with_positions(doc_id, vec![position])),
        }
    }

    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }

    /// Computes document statistics, w(d,t) for every posting and L_d for every
    /// document under `scheme`.
    pub fn finish(self, scheme: WeighingScheme) -> InMemoryIndex {
        let IndexBuilder { mut vocabulary, metas, doc_count } = self;

        let mut documents: Vec<DocumentRecord> = (0..doc_count)
            .map(|id| DocumentRecord {
                meta: metas.get(id).cloned().flatten().unwrap_or_default(),
                ..DocumentRecord::default()
            })
            .collect();
        let mut term_frequencies: Vec<Vec<u32>> = vec![Vec::new(); doc_count];

        for postings in vocabulary.values() {
            for p in postings {
                let record = &mut documents[p.doc_id as usize];
                record.length += p.term_frequency as u64;
                record.distinct_terms += 1;
                term_frequencies[p.doc_id as usize].push(p.term_frequency);
            }
        }

        let total_length: u64 = documents.iter().map(|d| d.length).sum();
        let average_doc_length = if doc_count == 0 {
            0.0
        } else {
            total_length as f64 / doc_count as f64
        };
        let corpus = CorpusStats {
            document_count: doc_count as u64,
            average_doc_length,
        };

        let model = scheme.model();
        for postings in vocabulary.values_mut() {
            for p in postings.iter_mut() {
                let stats = documents[p.doc_id as usize].stats();
                p.weight = model.document_weight(p.term_frequency, &stats, &corpus);
            }
        }
        for (record, tfs) in documents.iter_mut().zip(&term_frequencies) {
            record.normalization = model.normalization(tfs, &record.stats());
        }

        InMemoryIndex {
            scheme,
            vocabulary,
            documents,
            average_doc_length,
        }
    }
}

/// Tokenizes every corpus document into an in-memory index.
pub fn index_corpus(
    corpus: &dyn Corpus,
    tokenizer: &dyn Tokenizer,
    scheme: WeighingScheme,
) -> Result<InMemoryIndex> {
    let mut builder = IndexBuilder::new();
    for doc in corpus.documents() {
        let mut doc = doc?;
        let mut raw = Vec::new();
        doc.content.read_to_end(&mut raw)?;
        let text = String::from_utf8_lossy(&raw);

        builder.set_document(
            doc.id,
            DocMeta {
                title: doc.title,
                byte_size: doc.byte_size,
            },
        );
        for (term, position) in tokenizer.tokenize(&text) {
            builder.add_occurrence(&term, doc.id, position);
        }
    }
    tracing::info!(num_docs = corpus.len(), num_terms = builder.num_terms(), "ingested documents");
    Ok(builder.finish(scheme))
}

/// Writes `index` to a staging directory next to `root`, then publishes it.
///
/// On any error the staging directory is removed and an existing index at
/// `root` is left as it was. Readers opened on the previous index resolve files
/// by path and must be reopened after a rebuild.
pub fn write_index(index: &InMemoryIndex, root: &Path, stemmer: StemmerAlgorithm) -> Result<MetaFile> {
    let parent = match root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".boolrank-build-")
        .tempdir_in(parent)?;
    let paths = IndexPaths::new(staging.path());

    let mut postings = PostingsWriter::new(BufWriter::new(File::create(paths.postings())?));
    let dictionary = TermDictionary::open(paths.dictionary(), OpenMode::Create)?;
    for (term, list) in &index.vocabulary {
        let (start, _) = postings.write_postings(list)?;
        tracing::trace!(term = %term, start, df = list.len(), "wrote postings");
        dictionary.put(term, start as i64)?;
    }
    let postings_bytes = postings.cursor();
    postings.flush()?;
    postings
        .into_inner()
        .into_inner()
        .map_err(|e| IndexError::Io(e.into_error()))?
        .sync_all()?;
    let snapshot = dictionary.snapshot()?;
    dictionary.close()?;
    snapshot.save(paths.terms())?;

    let mut weights = DocWeightsWriter::new(BufWriter::new(File::create(paths.doc_weights())?));
    for (doc_id, record) in index.documents.iter().enumerate() {
        weights.write(
            doc_id as DocId,
            &DocumentWeight {
                normalization: record.normalization,
                length: record.length as i64,
                byte_size: record.meta.byte_size as i64,
                average_tf: record.average_tf().round() as i32,
            },
        )?;
    }
    weights
        .finish(index.average_doc_length)?
        .into_inner()
        .map_err(|e| IndexError::Io(e.into_error()))?
        .sync_all()?;

    let docs: Vec<DocMeta> = index.documents.iter().map(|d| d.meta.clone()).collect();
    save_docs(&paths, &docs)?;

    let num_docs = u32::try_from(index.num_docs())
        .map_err(|_| IndexError::InvalidInput("too many documents".into()))?;
    let meta = MetaFile {
        num_docs,
        created_at: now_rfc3339(),
        version: FORMAT_VERSION,
        scheme: index.scheme,
        stemmer,
        average_doc_length: index.average_doc_length,
    };
    save_meta(&paths, &meta)?;

    publish(staging.path(), root)?;
    tracing::info!(
        root = %root.display(),
        num_docs,
        num_terms = index.vocabulary.len(),
        postings_bytes,
        scheme = %index.scheme,
        "index build complete"
    );
    Ok(meta)
}

/// Builds and publishes an index for `corpus` under the session's scheme.
pub fn build_index<P: AsRef<Path>>(
    corpus: &dyn Corpus,
    tokenizer: &dyn Tokenizer,
    session: &SessionConfig,
    root: P,
) -> Result<MetaFile> {
    tracing::info!(scheme = %session.scheme, docs = corpus.len(), "building index");
    let index = index_corpus(corpus, tokenizer, session.scheme)?;
    write_index(&index, root.as_ref(), session.stemmer)
}
