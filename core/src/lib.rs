//! Disk-resident positional inverted index with boolean and ranked retrieval.
//!
//! An index is built from a [`Corpus`] through a [`Tokenizer`] into an
//! [`InMemoryIndex`], then written as a delta-encoded postings store, a sled
//! term dictionary and a fixed-width document weight store. Queries run through
//! [`IndexReader`] or directly against the in-memory index via [`IndexSource`].

pub mod builder;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod doc_weights;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod reader;
pub mod tokenizer;
pub mod weighting;

pub use builder::{build_index, IndexBuilder};
pub use config::SessionConfig;
pub use corpus::{Corpus, CorpusDocument, MemoryCorpus};
pub use error::{IndexError, Result};
pub use index::{DocMeta, InMemoryIndex, IndexSource, Posting};
pub use persist::has_existing_index;
pub use query::{parse_boolean_query, QueryNode, ScoredDocument};
pub use reader::IndexReader;
pub use tokenizer::{StemmerAlgorithm, TokenProcessor, Tokenizer};
pub use weighting::WeighingScheme;

pub type DocId = u32;
pub type Position = u32;
