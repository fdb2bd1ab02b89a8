use thiserror::Error;

use crate::weighting::WeighingScheme;

/// Errors raised while building, persisting or querying an index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("term not found: {0}")]
    TermNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dictionary error: {0}")]
    Dictionary(#[from] sled::Error),

    #[error("corrupt data at offset {offset}: {reason}")]
    CorruptData { offset: u64, reason: String },

    #[error("index was built with the {stamped} scheme but the session uses {active}")]
    SchemeMismatch {
        stamped: WeighingScheme,
        active: WeighingScheme,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store opened read-only: {0}")]
    ReadOnly(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        IndexError::CorruptData {
            offset,
            reason: reason.into(),
        }
    }

    /// A missing term degrades to an empty postings list instead of failing a query.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::TermNotFound(_))
    }
}
