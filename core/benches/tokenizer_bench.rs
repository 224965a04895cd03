use criterion::{criterion_group, criterion_main, Criterion};
use sift_core::tokenizer::{SegmentMode, Segmenter, Stopwords};

const TEXT: &str = "#实验室简介#\n\n情感分析在各个维度和方面取得了显著的发展。\
该领域已从传统的粗粒度分析（如文档和句子级别分析）发展到细粒度分析。\n\n\
- Sentiment analysis moved from document level to aspect level.";

fn bench_segment(c: &mut Criterion) {
    let seg = Segmenter::new(Stopwords::builtin());
    c.bench_function("segment_search", |b| b.iter(|| seg.segment(TEXT, SegmentMode::Search)));
    c.bench_function("segment_precise", |b| b.iter(|| seg.segment(TEXT, SegmentMode::Precise)));
}

criterion_group!(benches, bench_segment);
criterion_main!(benches);
