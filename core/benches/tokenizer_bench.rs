use boolrank_core::tokenizer::{TokenProcessor, Tokenizer};
use criterion::{criterion_group, criterion_main, Criterion};

const TEXT: &str = "The well-known quick brown fox jumps over the lazy dog's back, \
    running past Runners who RUN through the café while a state-of-the-art engine hums.";

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = TokenProcessor::default();
    let text = TEXT.repeat(50);
    c.bench_function("tokenize_paragraphs", |b| b.iter(|| tokenizer.tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
