use crate::error::Result;
use crate::index::{IndexSource, Posting};
use crate::query::ast::QueryNode;
use crate::query::merge::{intersect, phrase, union};

/// Evaluates a boolean query tree to a postings list sorted by document id.
///
/// Terms missing from the index evaluate to an empty list; an empty result is a
/// normal outcome, not an error.
pub fn evaluate<S: IndexSource + ?Sized>(source: &S, node: &QueryNode) -> Result<Vec<Posting>> {
    match node {
        QueryNode::Term(term) => source.postings(term),
        QueryNode::Phrase(terms) => {
            let lists = terms
                .iter()
                .map(|t| source.postings(t))
                .collect::<Result<Vec<_>>>()?;
            Ok(phrase(&lists))
        }
        QueryNode::And(children) => {
            let Some((first, rest)) = children.split_first() else {
                return Ok(Vec::new());
            };
            let mut acc = evaluate(source, first)?;
            for child in rest {
                if acc.is_empty() {
                    break;
                }
                acc = intersect(&acc, &evaluate(source, child)?);
            }
            Ok(acc)
        }
        QueryNode::Or(children) => {
            let mut acc = Vec::new();
            for child in children {
                acc = union(&acc, &evaluate(source, child)?);
            }
            Ok(acc)
        }
    }
}
