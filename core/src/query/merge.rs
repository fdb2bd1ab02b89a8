//! Two-pointer merges over postings lists sorted by document id.

use std::cmp::Ordering;

use crate::index::Posting;
use crate::Position;

fn union_positions(a: &[Position], b: &[Position]) -> Vec<Position> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Documents present in both lists.
///
/// Matching postings are combined with the union of their positions, so an AND
/// result still carries every position either operand matched at. The weight
/// is taken from the left operand.
pub fn intersect(left: &[Posting], right: &[Posting]) -> Vec<Posting> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (a, b) = (&left[i], &right[j]);
        match a.doc_id.cmp(&b.doc_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let positions = union_positions(&a.positions, &b.positions);
                out.push(Posting {
                    doc_id: a.doc_id,
                    term_frequency: positions.len() as u32,
                    positions,
                    weight: a.weight,
                });
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Documents present in either list. On a shared document the left posting is kept.
pub fn union(left: &[Posting], right: &[Posting]) -> Vec<Posting> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].doc_id.cmp(&right[j].doc_id) {
            Ordering::Less => {
                out.push(left[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                out.push(right[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                out.push(left[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
    out
}

/// Keeps documents where some left position `p` has `p + distance` in the right
/// posting. The result carries the matching left positions.
pub fn positional_intersect(left: &[Posting], right: &[Posting], distance: Position) -> Vec<Posting> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (a, b) = (&left[i], &right[j]);
        match a.doc_id.cmp(&b.doc_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let mut matched = Vec::new();
                let mut k = 0;
                for &p in &a.positions {
                    let Some(target) = p.checked_add(distance) else { break };
                    while k < b.positions.len() && b.positions[k] < target {
                        k += 1;
                    }
                    if k == b.positions.len() {
                        break;
                    }
                    if b.positions[k] == target {
                        matched.push(p);
                    }
                }
                if !matched.is_empty() {
                    out.push(Posting {
                        doc_id: a.doc_id,
                        term_frequency: matched.len() as u32,
                        positions: matched,
                        weight: a.weight,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Folds the per-term lists of a phrase left to right. The accumulated result
/// holds first-term positions, so the i-th following term must sit i places
/// after them.
pub fn phrase(lists: &[Vec<Posting>]) -> Vec<Posting> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let mut acc = first.clone();
    for (i, next) in rest.iter().enumerate() {
        if acc.is_empty() {
            break;
        }
        acc = positional_intersect(&acc, next, i as Position + 1);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocId;

    fn p(doc_id: DocId, positions: &[Position]) -> Posting {
        Posting::with_positions(doc_id, positions.to_vec())
    }

    fn ids(list: &[Posting]) -> Vec<DocId> {
        list.iter().map(|p| p.doc_id).collect()
    }

    #[test]
    fn and_keeps_shared_documents() {
        let cat = vec![p(0, &[1]), p(1, &[4])];
        let dog = vec![p(1, &[2]), p(2, &[0])];
        assert_eq!(ids(&intersect(&cat, &dog)), vec![1]);
        assert_eq!(ids(&intersect(&dog, &cat)), vec![1]);
    }

    #[test]
    fn and_unions_positions_of_matching_documents() {
        // AND merges positions rather than intersecting them.
        let a = vec![p(3, &[1, 5])];
        let b = vec![p(3, &[2, 5, 9])];
        let merged = intersect(&a, &b);
        assert_eq!(merged[0].positions, vec![1, 2, 5, 9]);
        assert_eq!(merged[0].term_frequency, 4);
    }

    #[test]
    fn or_carries_tails_and_keeps_left_on_ties() {
        let mut a = vec![p(1, &[0]), p(4, &[1]), p(8, &[2]), p(9, &[3])];
        a[1].weight = 7.0;
        let b = vec![p(2, &[5]), p(4, &[6])];
        let merged = union(&a, &b);
        assert_eq!(ids(&merged), vec![1, 2, 4, 8, 9]);
        assert_eq!(merged[2].weight, 7.0);
        assert_eq!(merged[2].positions, vec![1]);
        assert_eq!(ids(&union(&b, &a)), ids(&merged));
    }

    #[test]
    fn empty_operands() {
        let a = vec![p(1, &[0])];
        assert!(intersect(&a, &[]).is_empty());
        assert_eq!(ids(&union(&[], &a)), vec![1]);
        assert!(phrase(&[]).is_empty());
    }

    #[test]
    fn phrase_requires_adjacency() {
        let new = vec![p(0, &[1, 7]), p(1, &[3]), p(2, &[0])];
        let york = vec![p(0, &[2]), p(1, &[5]), p(2, &[1, 4])];
        let result = phrase(&[new, york]);
        assert_eq!(ids(&result), vec![0, 2]);
        assert_eq!(result[0].positions, vec![1]);
        assert_eq!(result[1].positions, vec![0]);
    }

    #[test]
    fn three_term_phrase_checks_offsets_from_first_term() {
        let a = vec![p(0, &[0, 10]), p(1, &[0])];
        let b = vec![p(0, &[1, 11]), p(1, &[1])];
        let c = vec![p(0, &[12]), p(1, &[5])];
        let result = phrase(&[a, b, c]);
        assert_eq!(ids(&result), vec![0]);
        assert_eq!(result[0].positions, vec![10]);
    }

    #[test]
    fn single_term_phrase_is_the_term() {
        let a = vec![p(0, &[1]), p(3, &[2, 4])];
        assert_eq!(phrase(&[a.clone()]), a);
    }
}
