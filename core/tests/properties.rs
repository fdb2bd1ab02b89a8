use boolrank_core::codec::{decode_block, encode_block};
use boolrank_core::query::merge::{intersect, phrase, union};
use boolrank_core::Posting;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn postings_strategy() -> impl Strategy<Value = Vec<Posting>> {
    prop::collection::btree_map(
        0u32..5_000,
        (prop::collection::btree_set(0u32..10_000, 1..12), 0.0f64..50.0),
        0..40,
    )
    .prop_map(|docs| {
        docs.into_iter()
            .map(|(doc_id, (positions, weight))| {
                let mut p = Posting::with_positions(doc_id, positions.into_iter().collect());
                p.weight = weight;
                p
            })
            .collect()
    })
}

fn ids(list: &[Posting]) -> Vec<u32> {
    list.iter().map(|p| p.doc_id).collect()
}

proptest! {
    #[test]
    fn decode_inverts_encode(list in postings_strategy()) {
        let mut buf = Vec::new();
        encode_block(&list, &mut buf).unwrap();
        let decoded = decode_block(&buf[..], 0, buf.len() as u64, true).unwrap();
        prop_assert_eq!(&decoded, &list);
        prop_assert!(decoded.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
        for p in &decoded {
            prop_assert!(p.positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn and_is_subset_of_or_and_both_commute(a in postings_strategy(), b in postings_strategy()) {
        let and_ab = ids(&intersect(&a, &b));
        let or_ab = ids(&union(&a, &b));
        prop_assert_eq!(&and_ab, &ids(&intersect(&b, &a)));
        prop_assert_eq!(&or_ab, &ids(&union(&b, &a)));

        let or_set: BTreeSet<u32> = or_ab.iter().copied().collect();
        prop_assert!(and_ab.iter().all(|d| or_set.contains(d)));
        prop_assert!(or_ab.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn phrase_results_are_contained_in_and(a in postings_strategy(), b in postings_strategy()) {
        let phrase_ids: BTreeSet<u32> = ids(&phrase(&[a.clone(), b.clone()])).into_iter().collect();
        let and_ids: BTreeSet<u32> = ids(&intersect(&a, &b)).into_iter().collect();
        prop_assert!(phrase_ids.is_subset(&and_ids));
    }
}
