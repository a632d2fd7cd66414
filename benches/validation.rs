//! Validator and router throughput.
//!
//! Measures schema validation of representative payloads and the full
//! inbound pipeline for event frames:
//! - Flat result objects
//! - Deep `Script.RemoteValue` trees at several depths
//! - `browsingContext.getTree` results at several sizes
//!
//! Run with: cargo bench --bench validation
//! Results saved to: target/criterion/

use std::hint::black_box;

use bidi_engine::router::Router;
use bidi_engine::{ConnectionOptions, SchemaRegistry, Validator};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const TREE_DEPTHS: &[usize] = &[4, 16, 64];
const CONTEXT_COUNTS: &[usize] = &[10, 100, 1000];

// ============================================================================
// Payloads
// ============================================================================

fn registry() -> &'static SchemaRegistry {
    SchemaRegistry::global().expect("registry")
}

fn nested_array(depth: usize) -> Value {
    (0..depth).fold(json!({"type": "number", "value": "NaN"}), |inner, _| {
        json!({"type": "array", "handle": "h", "value": [inner, {"type": "string", "value": "x"}]})
    })
}

fn context_tree(count: usize) -> Value {
    let contexts: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "context": format!("ctx-{i}"),
                "url": "https://example.com/",
                "children": [],
                "parent": null
            })
        })
        .collect();
    json!({ "contexts": contexts })
}

// ============================================================================
// Benchmark: Flat Objects
// ============================================================================

fn bench_flat(c: &mut Criterion) {
    let validator = Validator::new(registry());
    let status = json!({"ready": true, "message": "ok"});
    let schema = registry().resolve("Session.StatusResult").expect("schema");

    c.bench_function("validate_status_result", |b| {
        b.iter(|| validator.validate(black_box(&status), schema));
    });
}

// ============================================================================
// Benchmark: Deep Remote Values
// ============================================================================

fn bench_remote_value(c: &mut Criterion) {
    let validator = Validator::new(registry());
    let schema = registry().resolve("Script.RemoteValue").expect("schema");

    let mut group = c.benchmark_group("validate_remote_value");
    for &depth in TREE_DEPTHS {
        let value = nested_array(depth);
        group.bench_with_input(BenchmarkId::new("depth", depth), &value, |b, value| {
            b.iter(|| validator.validate(black_box(value), schema));
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Context Trees
// ============================================================================

fn bench_get_tree(c: &mut Criterion) {
    let validator = Validator::new(registry());
    let schema = registry()
        .resolve("BrowsingContext.GetTreeResult")
        .expect("schema");

    let mut group = c.benchmark_group("validate_get_tree");
    for &count in CONTEXT_COUNTS {
        let value = context_tree(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("contexts", count), &value, |b, value| {
            b.iter(|| validator.validate(black_box(value), schema));
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Inbound Pipeline
// ============================================================================

fn bench_inbound_event(c: &mut Criterion) {
    let mut router = Router::new(registry(), &ConnectionOptions::new());
    let frame = json!({
        "method": "log.entryAdded",
        "params": {
            "type": "console",
            "level": "info",
            "source": {"realm": "r1", "context": "c1"},
            "text": "hello",
            "timestamp": 1,
            "method": "log",
            "args": [{"type": "string", "value": "hello"}]
        }
    })
    .to_string();

    c.bench_function("router_inbound_event", |b| {
        b.iter(|| router.handle_frame(black_box(&frame)));
    });
}

criterion_group!(
    benches,
    bench_flat,
    bench_remote_value,
    bench_get_tree,
    bench_inbound_event
);
criterion_main!(benches);
