//! Benchmarks for throw translation and record assembly
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dartbridge::config::TelemetrySchema;
use dartbridge::scoring::{classify, translate};
use dartbridge::upstream::{HttpReply, StateFetcher, UpstreamApi};
use dartbridge::{BridgeContext, ChannelPublisher, GameState, SharedSession, Throw, ThrowSet};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct NoUpstream;

#[async_trait::async_trait]
impl UpstreamApi for NoUpstream {
    async fn get(&self, _path: &str, _timeout: Duration) -> dartbridge::Result<HttpReply> {
        Ok(HttpReply::new(404, ""))
    }
}

fn state_document(darts: usize) -> Value {
    let throws: Vec<Value> = (0..darts)
        .map(|i| json!({ "segment": { "number": 20 - i as u8, "multiplier": 3 } }))
        .collect();
    json!({ "player": 0, "gameScores": [170], "winner": -1, "throws": throws })
}

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    group.throughput(Throughput::Elements(1));

    for darts in [0usize, 1, 3] {
        let throws = ThrowSet::new((0..darts).map(|_| Throw::new(20, 3)));
        group.bench_with_input(BenchmarkId::from_parameter(darts), &throws, |b, throws| {
            b.iter(|| translate(black_box(throws)))
        });
    }

    group.finish();
}

fn bench_parse_state(c: &mut Criterion) {
    let document = state_document(3);
    c.bench_function("parse_game_state", |b| {
        b.iter(|| GameState::from_value(black_box(&document)))
    });
}

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify_checkout", |b| {
        b.iter(|| {
            for remaining in 0..=180u32 {
                black_box(classify(black_box(remaining), false, 1));
            }
        })
    });
}

fn bench_build_record(c: &mut Criterion) {
    let fetcher = StateFetcher::new(
        Arc::new(NoUpstream),
        vec!["/api/state".to_string()],
        Duration::ZERO,
        Duration::from_millis(100),
    );
    let (publisher, _rx) = ChannelPublisher::new();
    let context = BridgeContext::new(
        fetcher,
        Arc::new(publisher),
        SharedSession::new(),
        TelemetrySchema::default(),
    );

    let mut group = c.benchmark_group("build_record");
    for darts in [1usize, 3] {
        let document = state_document(darts);
        group.bench_with_input(BenchmarkId::from_parameter(darts), &document, |b, doc| {
            b.iter(|| context.build_record(black_box(doc)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_translate,
    bench_parse_state,
    bench_classify,
    bench_build_record
);
criterion_main!(benches);
