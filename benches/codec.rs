//! Frame codec benchmarks.
//!
//! Measures decoding of typical inbound frames and encoding of outbound ones.
//!
//! Run with: cargo bench --bench codec
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;

use graphql_ws_client::protocol::{decode, encode};
use graphql_ws_client::{Message, SubscribePayload, SubscriptionId};

// ============================================================================
// Inputs
// ============================================================================

fn next_frame(fields: usize) -> String {
    let data: serde_json::Map<_, _> = (0..fields)
        .map(|i| (format!("field{i}"), json!({ "id": i, "name": "value" })))
        .collect();
    json!({ "type": "next", "id": "bench-1", "payload": { "data": data } }).to_string()
}

// ============================================================================
// Benchmark: Decode
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &fields in &[1usize, 16, 256] {
        let frame = next_frame(fields);
        group.bench_with_input(BenchmarkId::new("next", fields), &frame, |b, frame| {
            b.iter(|| decode(black_box(frame)));
        });
    }

    group.bench_function("invalid_json", |b| {
        b.iter(|| decode(black_box("{\"type\": \"next\", ")));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Encode
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let message = Message::Subscribe {
        id: SubscriptionId::new("bench-1"),
        payload: SubscribePayload::new("subscription { tick { id name } }"),
    };

    c.bench_function("encode/subscribe", |b| {
        b.iter(|| encode(black_box(&message)));
    });
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
