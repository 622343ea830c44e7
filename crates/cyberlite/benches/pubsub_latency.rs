// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish/Subscribe and Request/Response Latency Benchmark
//!
//! Measures the in-process hot paths:
//! - write -> try_read for several payload sizes
//! - fan-out to several readers of one channel
//! - send_request round trip through a handler-mode service

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cyberlite::{Domain, Node, NodeConfig, QosProfile, RAW_DATA_TYPE};
use std::sync::Arc;
use std::time::Duration;

fn bench_node(name: &str) -> Arc<Node> {
    Node::builder(name)
        .domain(Domain::intra_process())
        .config(NodeConfig::default())
        .build()
        .expect("bench node")
}

/// Benchmark: one writer, one reader, payload size sweep
fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_read");
    for size in [0usize, 64, 1024, 16 * 1024] {
        let node = bench_node("bench_write_read");
        let writer = node
            .create_writer("bench", RAW_DATA_TYPE, 16)
            .expect("writer");
        let reader = node
            .create_reader_with_qos("bench", RAW_DATA_TYPE, QosProfile::keep_last(16), None)
            .expect("reader");
        let payload = vec![0xA5u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                writer.write(payload.clone()).expect("write");
                black_box(reader.try_read().expect("read"));
            });
        });
    }
    group.finish();
}

/// Benchmark: fan-out cost with N readers sharing one envelope
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    for readers in [1usize, 4, 16] {
        let node = bench_node("bench_fan_out");
        let writer = node.create_writer("fan", RAW_DATA_TYPE, 1).expect("writer");
        let subs: Vec<_> = (0..readers)
            .map(|_| {
                node.create_reader("fan", RAW_DATA_TYPE, None)
                    .expect("reader")
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(readers), &readers, |b, _| {
            b.iter(|| {
                writer.write(b"tick".to_vec()).expect("write");
                for sub in &subs {
                    black_box(sub.try_read().expect("read"));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark: request/response round trip
fn bench_rpc_round_trip(c: &mut Criterion) {
    let node = bench_node("bench_rpc");
    let _service = node
        .create_service("echo", RAW_DATA_TYPE, |req| Ok(req.payload().to_vec()))
        .expect("service");
    let client = node.create_client("echo", RAW_DATA_TYPE).expect("client");

    c.bench_function("rpc_round_trip", |b| {
        b.iter(|| {
            black_box(
                client
                    .send_request_timeout(b"ping".to_vec(), Duration::from_secs(1))
                    .expect("reply"),
            );
        });
    });
}

criterion_group!(benches, bench_write_read, bench_fan_out, bench_rpc_round_trip);
criterion_main!(benches);
