use boolrank_core::codec::{decode_block, encode_block};
use boolrank_core::query::{ranked_query, TopK};
use boolrank_core::{IndexBuilder, Posting, WeighingScheme};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_postings() -> Vec<Posting> {
    (0..2_000u32)
        .map(|doc| {
            let positions = (0..(doc % 7 + 1)).map(|i| i * 13 + doc % 5).collect();
            let mut p = Posting::with_positions(doc * 3, positions);
            p.weight = 1.0 + (doc % 11) as f64;
            p
        })
        .collect()
}

fn bench_codec(c: &mut Criterion) {
    let postings = sample_postings();
    let mut buf = Vec::new();
    encode_block(&postings, &mut buf).unwrap();
    let len = buf.len() as u64;

    c.bench_function("encode_block", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(buf.len());
            encode_block(black_box(&postings), &mut out).unwrap();
            out
        })
    });
    c.bench_function("decode_with_positions", |b| {
        b.iter(|| decode_block(black_box(&buf[..]), 0, len, true).unwrap())
    });
    c.bench_function("decode_without_positions", |b| {
        b.iter(|| decode_block(black_box(&buf[..]), 0, len, false).unwrap())
    });
}

fn bench_ranking(c: &mut Criterion) {
    let mut builder = IndexBuilder::new();
    for doc in 0..5_000u32 {
        for pos in 0..40u32 {
            let term = format!("t{}", (doc * 31 + pos * 7) % 500);
            builder.add_occurrence(&term, doc, pos);
        }
    }
    let index = builder.finish(WeighingScheme::Okapi);
    let terms: Vec<String> = ["t1", "t42", "t314", "t499"].iter().map(|s| s.to_string()).collect();

    c.bench_function("ranked_top10", |b| {
        b.iter(|| ranked_query(&index, black_box(&terms), 10).unwrap())
    });
    c.bench_function("topk_push_100k", |b| {
        b.iter(|| {
            let mut top = TopK::new(10);
            top.extend((0..100_000u32).map(|i| i.wrapping_mul(2_654_435_761)));
            top.into_sorted_vec()
        })
    });
}

criterion_group!(benches, bench_codec, bench_ranking);
criterion_main!(benches);
