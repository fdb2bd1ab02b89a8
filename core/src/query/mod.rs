//! Boolean and ranked retrieval over any [`IndexSource`](crate::IndexSource).

pub mod ast;
pub mod boolean;
pub mod merge;
pub mod ranked;
pub mod topk;

pub use ast::{parse_boolean_query, QueryNode};
pub use boolean::evaluate;
pub use ranked::{ranked_query, ScoredDocument};
pub use topk::TopK;
