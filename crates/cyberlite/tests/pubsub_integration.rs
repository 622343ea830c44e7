// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! Publish/subscribe integration tests
//!
//! Exercises writers and readers across nodes through the public API only.

use cyberlite::{Domain, Error, Node, NodeConfig, OverflowPolicy, QosProfile, RAW_DATA_TYPE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn node(domain: &Domain, name: &str) -> Arc<Node> {
    let _ = env_logger::builder().is_test(true).try_init();
    Node::builder(name)
        .domain(domain.clone())
        .config(NodeConfig::default())
        .build()
        .expect("node")
}

#[test]
fn test_fifo_order_per_writer() {
    let domain = Domain::intra_process();
    let talker = node(&domain, "fifo_talker");
    let listener = node(&domain, "fifo_listener");

    let reader = listener
        .create_reader_with_qos("seq", RAW_DATA_TYPE, QosProfile::keep_last(100), None)
        .unwrap();
    let writer = talker.create_writer("seq", RAW_DATA_TYPE, 100).unwrap();

    for i in 0u32..50 {
        writer.write(i.to_le_bytes().to_vec()).unwrap();
    }
    for i in 0u32..50 {
        let envelope = reader.try_read().unwrap().expect("buffered");
        assert_eq!(envelope.payload(), i.to_le_bytes());
    }
    assert!(reader.try_read().unwrap().is_none());
}

#[test]
fn test_writer_depth_two_keeps_latest_two() {
    let domain = Domain::intra_process();
    let talker = node(&domain, "pose_talker");
    let listener = node(&domain, "pose_listener");

    let writer = talker.create_writer("pose", RAW_DATA_TYPE, 2).unwrap();
    let reader = listener.create_reader("pose", RAW_DATA_TYPE, None).unwrap();

    for p in ["A", "B", "C"] {
        writer.write(p).unwrap();
    }

    let got: Vec<Option<Vec<u8>>> = (0..3)
        .map(|_| reader.try_read().unwrap().map(|e| e.payload().to_vec()))
        .collect();
    assert_eq!(got, vec![Some(b"B".to_vec()), Some(b"C".to_vec()), None]);
    assert_eq!(reader.stats().dropped, 1);
}

#[test]
fn test_every_reader_gets_the_same_envelope() {
    let domain = Domain::intra_process();
    let talker = node(&domain, "share_talker");
    let readers: Vec<_> = (0..3)
        .map(|i| {
            node(&domain, &format!("share_listener{}", i))
        })
        .collect();
    let subs: Vec<_> = readers
        .iter()
        .map(|n| n.create_reader("fan", RAW_DATA_TYPE, None).unwrap())
        .collect();
    let writer = talker.create_writer("fan", RAW_DATA_TYPE, 1).unwrap();

    writer.write(b"shared".to_vec()).unwrap();
    let got: Vec<_> = subs.iter().map(|r| r.try_read().unwrap().unwrap()).collect();
    assert!(got.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(got[0].payload(), b"shared");
}

#[test]
fn test_random_payloads_survive_intact() {
    let domain = Domain::intra_process();
    let node = node(&domain, "random_payloads");
    let reader = node
        .create_reader_with_qos("blob", RAW_DATA_TYPE, QosProfile::keep_last(64), None)
        .unwrap();
    let writer = node.create_writer("blob", RAW_DATA_TYPE, 64).unwrap();

    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let payloads: Vec<Vec<u8>> = (0..64)
        .map(|_| {
            let len = rng.usize(0..4096);
            (0..len).map(|_| rng.u8(..)).collect()
        })
        .collect();

    for payload in &payloads {
        writer.write(payload.clone()).unwrap();
    }
    for payload in &payloads {
        assert_eq!(reader.try_read().unwrap().unwrap().payload(), payload.as_slice());
    }
}

#[test]
fn test_concurrent_writers_never_overflow_reader() {
    const WRITERS: usize = 4;
    const PER_WRITER: usize = 500;
    const DEPTH: u32 = 8;

    let domain = Domain::intra_process();
    let listener = node(&domain, "overflow_listener");
    let reader = Arc::new(
        listener
            .create_reader_with_qos("burst", RAW_DATA_TYPE, QosProfile::keep_last(DEPTH), None)
            .unwrap(),
    );

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let domain = domain.clone();
            thread::spawn(move || {
                let talker = node(&domain, &format!("overflow_talker{}", w));
                let writer = talker.create_writer("burst", RAW_DATA_TYPE, DEPTH).unwrap();
                let mut rng = fastrand::Rng::with_seed(w as u64);
                for _ in 0..PER_WRITER {
                    let payload: Vec<u8> = (0..rng.usize(1..64)).map(|_| rng.u8(..)).collect();
                    writer.write(payload).unwrap();
                }
            })
        })
        .collect();

    let mut consumed = 0usize;
    while handles.iter().any(|h| !h.is_finished()) {
        assert!(reader.pending() <= DEPTH as usize);
        if reader.try_read().unwrap().is_some() {
            consumed += 1;
        }
    }
    for handle in handles {
        handle.join().unwrap();
    }
    while reader.try_read().unwrap().is_some() {
        consumed += 1;
    }

    let stats = reader.stats();
    assert_eq!(stats.received, (WRITERS * PER_WRITER) as u64);
    assert_eq!(stats.received, consumed as u64 + stats.dropped);
}

#[test]
fn test_reject_policy_from_config() {
    let domain = Domain::intra_process();
    let config = NodeConfig {
        default_queue_depth: 2,
        overflow_policy: OverflowPolicy::Reject,
        ..NodeConfig::default()
    };
    let node = Node::builder("reject_cfg")
        .domain(domain)
        .config(config)
        .build()
        .unwrap();
    let reader = node.create_reader("r", RAW_DATA_TYPE, None).unwrap();
    let writer = node.create_writer("r", RAW_DATA_TYPE, 2).unwrap();
    for p in ["A", "B", "C"] {
        writer.write(p).unwrap();
    }
    assert_eq!(reader.try_read().unwrap().unwrap().payload(), b"A");
    assert_eq!(reader.try_read().unwrap().unwrap().payload(), b"B");
    assert!(reader.try_read().unwrap().is_none());
}

#[test]
fn test_notification_counts_match_arrivals() {
    let domain = Domain::intra_process();
    let node = node(&domain, "notify_counts");
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    let reader = node
        .create_reader(
            "tick",
            RAW_DATA_TYPE,
            Some(Arc::new(move |_: &str| {
                sink.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
    let writer = node.create_writer("tick", RAW_DATA_TYPE, 1).unwrap();
    for _ in 0..10 {
        writer.write(b"t".to_vec()).unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 10);
    assert_eq!(reader.pending(), 1);
}

#[test]
fn test_blocked_readers_all_wake_on_shutdown() {
    let domain = Domain::intra_process();
    let node = node(&domain, "wake_all");
    let readers: Vec<_> = (0..4)
        .map(|_| Arc::new(node.create_reader("idle", RAW_DATA_TYPE, None).unwrap()))
        .collect();

    let handles: Vec<_> = readers
        .iter()
        .map(|r| {
            let r = Arc::clone(r);
            thread::spawn(move || r.read())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    node.shutdown();
    for handle in handles {
        assert!(matches!(handle.join().unwrap(), Err(Error::NodeUnavailable(_))));
    }
}
