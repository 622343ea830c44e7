// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! Request/response integration tests
//!
//! Clients and services on separate nodes sharing one domain.

use cyberlite::{
    Domain, Node, NodeConfig, RpcError, SchemaDescriptor, SchemaFormat, RAW_DATA_TYPE,
};
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
fn test_typed_service_round_trip() {
    let domain = Domain::intra_process();
    let server = node(&domain, "calc_server");
    server
        .register_schema(SchemaDescriptor::new(
            "calc.Pair",
            SchemaFormat::Json,
            r#"{"type":"array","items":{"type":"integer"}}"#,
        ))
        .unwrap();

    let _service = server
        .create_service("add", "calc.Pair", |req| {
            let pair: Vec<i64> = serde_json::from_slice(req.payload()).map_err(|e| e.to_string())?;
            let sum: i64 = pair.iter().sum();
            Ok(sum.to_string().into_bytes())
        })
        .unwrap();

    // The registry is per domain, so a second node sees the same type.
    let caller = node(&domain, "calc_client");
    let client = caller.create_client("add", "calc.Pair").unwrap();
    assert!(client.wait_for_service(Duration::from_secs(1)));

    let reply = client.send_request(b"[2, 40]".to_vec()).unwrap();
    assert_eq!(reply.payload(), b"42");
    assert_eq!(reply.type_name(), "calc.Pair");

    let err = client.send_request(b"not json".to_vec()).unwrap_err();
    assert!(matches!(err, RpcError::Remote(_)));
}

#[test]
fn test_many_threads_share_one_client() {
    let domain = Domain::intra_process();
    let server = node(&domain, "shared_server");
    let _service = server
        .create_service("double", RAW_DATA_TYPE, |req| {
            let mut out = req.payload().to_vec();
            out.extend_from_slice(req.payload());
            Ok(out)
        })
        .unwrap();

    let caller = node(&domain, "shared_client");
    let client = Arc::new(caller.create_client("double", RAW_DATA_TYPE).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for n in 0..20 {
                    let payload = format!("{}-{};", t, n);
                    let reply = client.send_request(payload.clone()).unwrap();
                    assert_eq!(reply.payload(), format!("{0}{0}", payload).as_bytes());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(client.in_flight(), 0);
}

#[test]
fn test_service_name_is_exclusive() {
    let domain = Domain::intra_process();
    let a = node(&domain, "exclusive_a");
    let b = node(&domain, "exclusive_b");
    let _first = a
        .create_queued_service("only", RAW_DATA_TYPE, None)
        .unwrap();
    assert!(b.create_queued_service("only", RAW_DATA_TYPE, None).is_err());
}

#[test]
fn test_dropped_service_frees_the_name() {
    let domain = Domain::intra_process();
    let server = node(&domain, "rebind");
    let first = server
        .create_service("svc", RAW_DATA_TYPE, |_| Ok(b"one".to_vec()))
        .unwrap();
    drop(first);
    let _second = server
        .create_service("svc", RAW_DATA_TYPE, |_| Ok(b"two".to_vec()))
        .unwrap();

    let client = server.create_client("svc", RAW_DATA_TYPE).unwrap();
    assert_eq!(client.send_request(Vec::new()).unwrap().payload(), b"two");
}

#[test]
fn test_client_node_shutdown_mid_request() {
    let domain = Domain::intra_process();
    let server = node(&domain, "stall_server");
    let _service = server
        .create_queued_service("stall", RAW_DATA_TYPE, None)
        .unwrap();

    let caller = node(&domain, "stall_client");
    let client = Arc::new(caller.create_client("stall", RAW_DATA_TYPE).unwrap());
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || client.send_request(b"?".to_vec()))
        })
        .collect();

    while client.in_flight() < 3 {
        thread::sleep(Duration::from_millis(2));
    }
    caller.shutdown();
    for handle in handles {
        assert!(matches!(handle.join().unwrap(), Err(RpcError::Shutdown)));
    }
}
