//! Ledger benchmark suite for Spyglass.
//!
//! Benchmarks the hot paths of a spy under test load:
//! - Dispatch (record + respond) on a growing ledger
//! - Name and argument-filtered queries
//! - Chronological and sequential causal checks
//!
//! Run:
//!   cargo bench --bench ledger_benchmark

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use spyglass::matcher::{anything, greater_than};
use spyglass::responder::returns_static_value;
use spyglass::{Spy, Value, occurred_chronologically, occurred_sequentially};

const METHODS: [&str; 4] = ["open", "read", "write", "close"];

// =============================================================================
// HELPERS
// =============================================================================

fn populated_spy(calls: usize) -> Spy {
    let spy = Spy::builder()
        .responder("read", returns_static_value(vec![1, 2, 3]))
        .build();
    for i in 0..calls {
        spy.handle(METHODS[i % METHODS.len()], vec![Value::from(i)])
            .unwrap();
    }
    spy
}

// =============================================================================
// DISPATCH BENCHMARKS
// =============================================================================

/// Cost of one recorded call as the ledger grows.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("spy/dispatch");
    for &size in &[0usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("handle", size), &size, |b, &size| {
            b.iter_batched(
                || populated_spy(size),
                |spy| {
                    black_box(spy.handle("read", vec![Value::from(1)]).unwrap());
                    spy
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

// =============================================================================
// QUERY BENCHMARKS
// =============================================================================

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/query");
    for &size in &[100usize, 10_000] {
        let reflector = populated_spy(size).reflector();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("by_name", size), &reflector, |b, r| {
            b.iter(|| black_box(r.by_name("write")))
        });
        group.bench_with_input(BenchmarkId::new("by_name_and_args", size), &reflector, |b, r| {
            let query = [greater_than(50.0)];
            b.iter(|| black_box(r.by_name_and_args("write", &query)))
        });
        group.bench_with_input(BenchmarkId::new("history", size), &reflector, |b, r| {
            b.iter(|| black_box(r.history()))
        });
        group.bench_with_input(BenchmarkId::new("anything", size), &reflector, |b, r| {
            let query = [anything()];
            b.iter(|| black_box(r.by_name_and_args("close", &query)))
        });
    }
    group.finish();
}

// =============================================================================
// CAUSAL BENCHMARKS
// =============================================================================

fn bench_causal(c: &mut Criterion) {
    let mut group = c.benchmark_group("causal");
    for &size in &[100usize, 10_000] {
        let reflector = populated_spy(size).reflector();
        let lists: Vec<_> = METHODS.iter().map(|m| reflector.by_name(m)).collect();
        group.bench_with_input(BenchmarkId::new("chronological", size), &lists, |b, lists| {
            b.iter(|| black_box(occurred_chronologically(lists).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("sequential", size), &lists, |b, lists| {
            b.iter(|| black_box(occurred_sequentially(lists).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_queries, bench_causal);
criterion_main!(benches);
