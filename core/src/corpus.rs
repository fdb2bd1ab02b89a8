use std::io::{Cursor, Read};

use crate::error::Result;
use crate::DocId;

/// One document as handed to the index builder.
pub struct CorpusDocument {
    pub id: DocId,
    pub title: String,
    pub byte_size: u64,
    pub content: Box<dyn Read>,
}

/// An ordered source of documents. Ids are expected to run densely from zero.
pub trait Corpus {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn documents(&self) -> Box<dyn Iterator<Item = Result<CorpusDocument>> + '_>;
}

/// A corpus held in memory as `(title, body)` pairs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    docs: Vec<(String, String)>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, title: impl Into<String>, body: impl Into<String>) -> DocId {
        self.docs.push((title.into(), body.into()));
        (self.docs.len() - 1) as DocId
    }
}

impl<T: Into<String>, B: Into<String>> FromIterator<(T, B)> for MemoryCorpus {
    fn from_iter<I: IntoIterator<Item = (T, B)>>(iter: I) -> Self {
        let mut corpus = MemoryCorpus::new();
        for (title, body) in iter {
            corpus.push(title, body);
        }
        corpus
    }
}

impl Corpus for MemoryCorpus {
    fn len(&self) -> usize {
        self.docs.len()
    }

    fn documents(&self) -> Box<dyn Iterator<Item = Result<CorpusDocument>> + '_> {
        Box::new(self.docs.iter().enumerate().map(|(id, (title, body))| {
            Ok(CorpusDocument {
                id: id as DocId,
                title: title.clone(),
                byte_size: body.len() as u64,
                content: Box::new(Cursor::new(body.clone().into_bytes())),
            })
        }))
    }
}
