//! Term weighting schemes.
//!
//! Every scheme answers three questions: the weight of a term inside a document
//! w(d,t), the weight of a query term w(q,t), and the document length
//! normalization L_d that divides the accumulated score. The set of schemes is
//! closed; [`WeighingScheme::model`] picks the implementation once per session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IndexError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeighingScheme {
    #[default]
    Default,
    TfIdf,
    Okapi,
    Wacky,
}

impl WeighingScheme {
    pub const ALL: [WeighingScheme; 4] = [
        WeighingScheme::Default,
        WeighingScheme::TfIdf,
        WeighingScheme::Okapi,
        WeighingScheme::Wacky,
    ];

    pub fn model(self) -> &'static dyn WeightModel {
        match self {
            WeighingScheme::Default => &DefaultWeights,
            WeighingScheme::TfIdf => &TfIdfWeights,
            WeighingScheme::Okapi => &OkapiWeights,
            WeighingScheme::Wacky => &WackyWeights,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeighingScheme::Default => "default",
            WeighingScheme::TfIdf => "tfidf",
            WeighingScheme::Okapi => "okapi",
            WeighingScheme::Wacky => "wacky",
        }
    }
}

impl fmt::Display for WeighingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeighingScheme {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(WeighingScheme::Default),
            "tfidf" | "tf-idf" => Ok(WeighingScheme::TfIdf),
            "okapi" | "bm25" => Ok(WeighingScheme::Okapi),
            "wacky" => Ok(WeighingScheme::Wacky),
            other => Err(IndexError::InvalidInput(format!(
                "unknown weighing scheme '{other}'"
            ))),
        }
    }
}

/// Corpus-wide figures: N and the average document length in tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CorpusStats {
    pub document_count: u64,
    pub average_doc_length: f64,
}

/// Per-document figures used by the schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DocStats {
    /// Number of tokens in the document.
    pub length: u64,
    pub byte_size: u64,
    /// Mean term frequency over the document's distinct terms.
    pub average_tf: f64,
}

pub trait WeightModel: Sync {
    /// w(d,t) for a term occurring `tf` times in the document.
    fn document_weight(&self, tf: u32, doc: &DocStats, corpus: &CorpusStats) -> f64;

    /// w(q,t) for a term with document frequency `df`.
    fn query_weight(&self, df: u64, corpus: &CorpusStats) -> f64;

    /// L_d, given the term frequencies of every distinct term in the document.
    fn normalization(&self, term_frequencies: &[u32], doc: &DocStats) -> f64;
}

fn log_tf(tf: u32) -> f64 {
    1.0 + (tf as f64).ln()
}

pub struct DefaultWeights;

impl WeightModel for DefaultWeights {
    fn document_weight(&self, tf: u32, _doc: &DocStats, _corpus: &CorpusStats) -> f64 {
        if tf == 0 {
            return 0.0;
        }
        log_tf(tf)
    }

    fn query_weight(&self, _df: u64, corpus: &CorpusStats) -> f64 {
        if corpus.document_count == 0 {
            return 0.0;
        }
        1.0 + (corpus.document_count as f64).ln()
    }

    fn normalization(&self, term_frequencies: &[u32], _doc: &DocStats) -> f64 {
        term_frequencies
            .iter()
            .filter(|&&tf| tf > 0)
            .map(|&tf| log_tf(tf).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

pub struct TfIdfWeights;

impl WeightModel for TfIdfWeights {
    fn document_weight(&self, tf: u32, _doc: &DocStats, _corpus: &CorpusStats) -> f64 {
        tf as f64
    }

    fn query_weight(&self, df: u64, corpus: &CorpusStats) -> f64 {
        if df == 0 || corpus.document_count == 0 {
            return 0.0;
        }
        (corpus.document_count as f64 / df as f64).ln()
    }

    fn normalization(&self, term_frequencies: &[u32], _doc: &DocStats) -> f64 {
        term_frequencies
            .iter()
            .map(|&tf| (tf as f64).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

pub struct OkapiWeights;

impl WeightModel for OkapiWeights {
    fn document_weight(&self, tf: u32, doc: &DocStats, corpus: &CorpusStats) -> f64 {
        // An empty corpus has no average; treat every document as average length.
        let relative_length = if corpus.average_doc_length > 0.0 {
            doc.length as f64 / corpus.average_doc_length
        } else {
            1.0
        };
        (2.2 * tf as f64) / (1.2 * (0.25 + 0.75 * relative_length))
    }

    fn query_weight(&self, df: u64, corpus: &CorpusStats) -> f64 {
        let n = corpus.document_count as f64;
        let df = df as f64;
        let idf = ((n - df + 0.5) / (df + 0.5)).ln();
        idf.max(0.1)
    }

    fn normalization(&self, _term_frequencies: &[u32], _doc: &DocStats) -> f64 {
        1.0
    }
}

pub struct WackyWeights;

impl WeightModel for WackyWeights {
    fn document_weight(&self, tf: u32, doc: &DocStats, _corpus: &CorpusStats) -> f64 {
        if tf == 0 {
            return 0.0;
        }
        let denominator = if doc.average_tf > 0.0 {
            1.0 + doc.average_tf.ln()
        } else {
            1.0
        };
        log_tf(tf) / denominator
    }

    fn query_weight(&self, df: u64, corpus: &CorpusStats) -> f64 {
        if df == 0 {
            return 0.0;
        }
        let n = corpus.document_count as f64;
        let df = df as f64;
        // df == N gives ln(0) = -inf, clamped to zero.
        ((n - df) / df).ln().max(0.0)
    }

    fn normalization(&self, _term_frequencies: &[u32], doc: &DocStats) -> f64 {
        (doc.byte_size as f64).sqrt()
    }
}
