use serde::{Deserialize, Serialize};

use crate::tokenizer::StemmerAlgorithm;
use crate::weighting::WeighingScheme;

pub const DEFAULT_TOP_K: usize = 10;

/// Settings fixed for one build or query session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub scheme: WeighingScheme,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub stemmer: StemmerAlgorithm,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scheme: WeighingScheme::default(),
            top_k: DEFAULT_TOP_K,
            stemmer: StemmerAlgorithm::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_scheme(scheme: WeighingScheme) -> Self {
        Self { scheme, ..Self::default() }
    }
}
