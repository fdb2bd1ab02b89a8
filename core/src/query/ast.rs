use std::fmt;

use crate::tokenizer::Tokenizer;

/// A parsed boolean query. Leaves hold already-normalized terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Term(String),
    Phrase(Vec<String>),
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
}

impl QueryNode {
    /// Every term mentioned anywhere in the tree, in order of appearance.
    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            QueryNode::Term(t) => out.push(t),
            QueryNode::Phrase(terms) => out.extend(terms.iter().map(String::as_str)),
            QueryNode::And(children) | QueryNode::Or(children) => {
                for child in children {
                    child.collect_terms(out);
                }
            }
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term(t) => f.write_str(t),
            QueryNode::Phrase(terms) => write!(f, "\"{}\"", terms.join(" ")),
            QueryNode::And(children) => join(f, children, " "),
            QueryNode::Or(children) => join(f, children, " + "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, children: &[QueryNode], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match child {
            QueryNode::And(_) | QueryNode::Or(_) => write!(f, "({child})")?,
            _ => write!(f, "{child}")?,
        }
    }
    Ok(())
}

fn split_outside_quotes(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// First normalized form of a raw token; hyphenated words use their joined form.
fn first_term(tokenizer: &dyn Tokenizer, raw: &str) -> Option<String> {
    tokenizer.normalize(raw).into_iter().next()
}

/// Parses `a b + "c d" e` style queries.
///
/// `+` separates OR groups, whitespace separates the AND literals of a group and
/// a double-quoted run of words is a phrase. Literals that normalize to nothing
/// are dropped; `None` means no literal survived.
pub fn parse_boolean_query(text: &str, tokenizer: &dyn Tokenizer) -> Option<QueryNode> {
    let mut groups = Vec::new();
    for group in split_outside_quotes(text, '+') {
        let mut literals = Vec::new();
        let mut rest = group.trim_start();
        while !rest.is_empty() {
            if let Some(quoted) = rest.strip_prefix('"') {
                let (body, tail) = match quoted.find('"') {
                    Some(end) => (&quoted[..end], &quoted[end + 1..]),
                    None => (quoted, ""),
                };
                let terms: Vec<String> = body
                    .split_whitespace()
                    .filter_map(|raw| first_term(tokenizer, raw))
                    .collect();
                match terms.len() {
                    0 => {}
                    1 => literals.extend(terms.into_iter().map(QueryNode::Term)),
                    _ => literals.push(QueryNode::Phrase(terms)),
                }
                rest = tail;
            } else {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '"')
                    .unwrap_or(rest.len());
                if let Some(term) = first_term(tokenizer, &rest[..end]) {
                    literals.push(QueryNode::Term(term));
                }
                rest = &rest[end..];
            }
            rest = rest.trim_start();
        }
        match literals.len() {
            0 => {}
            1 => groups.extend(literals),
            _ => groups.push(QueryNode::And(literals)),
        }
    }
    match groups.len() {
        0 => None,
        1 => groups.pop(),
        _ => Some(QueryNode::Or(groups)),
    }
}
