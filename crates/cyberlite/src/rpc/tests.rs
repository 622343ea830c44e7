// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{RequestHandler, RpcError};
use crate::config::RAW_DATA_TYPE;
use crate::message::Envelope;
use crate::{Domain, Node, NodeConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn node_in(domain: &Domain, name: &str) -> Arc<Node> {
    Node::builder(name)
        .domain(domain.clone())
        .config(NodeConfig::default())
        .build()
        .expect("node")
}

fn node(name: &str) -> Arc<Node> {
    node_in(&Domain::intra_process(), name)
}

const LONG: Duration = Duration::from_secs(5);

#[test]
fn echo_round_trip() {
    let node = node("rpc_echo");
    let _service = node
        .create_service("echo", RAW_DATA_TYPE, |req| Ok(req.payload().to_vec()))
        .unwrap();
    let client = node.create_client("echo", RAW_DATA_TYPE).unwrap();

    let reply = client.send_request_timeout("hello", LONG).unwrap();
    assert_eq!(reply.payload(), b"hello");
    assert_eq!(reply.type_name(), RAW_DATA_TYPE);
    assert_eq!(client.in_flight(), 0);
}

#[test]
fn empty_reply_is_success() {
    let node = node("rpc_empty_reply");
    let _service = node
        .create_service("ack", RAW_DATA_TYPE, |_| Ok(Vec::new()))
        .unwrap();
    let client = node.create_client("ack", RAW_DATA_TYPE).unwrap();

    let reply = client.send_request_timeout(b"x".to_vec(), LONG).unwrap();
    assert!(reply.is_empty());
}

#[test]
fn handler_error_is_remote() {
    let node = node("rpc_remote_error");
    let _service = node
        .create_service("fail", RAW_DATA_TYPE, |_| Err("bad input".to_string()))
        .unwrap();
    let client = node.create_client("fail", RAW_DATA_TYPE).unwrap();

    let err = client.send_request_timeout("x", LONG).unwrap_err();
    assert!(matches!(err, RpcError::Remote(msg) if msg == "bad input"));
}

#[test]
fn named_handler_type() {
    struct Upper;

    impl RequestHandler for Upper {
        fn handle(&self, request: &Envelope) -> Result<Vec<u8>, String> {
            Ok(request.payload().to_ascii_uppercase())
        }
    }

    let node = node("rpc_named_handler");
    let _service = node
        .create_service_with_handler("upper", RAW_DATA_TYPE, Upper)
        .unwrap();
    let client = node.create_client("upper", RAW_DATA_TYPE).unwrap();
    let reply = client.send_request_timeout("abc", LONG).unwrap();
    assert_eq!(reply.payload(), b"ABC");
}

#[test]
fn missing_service_is_reported() {
    let node = node("rpc_missing");
    let client = node.create_client("nobody", RAW_DATA_TYPE).unwrap();
    let err = client.send_request_timeout("x", LONG).unwrap_err();
    assert!(matches!(err, RpcError::ServiceNotFound(name) if name == "nobody"));
    assert_eq!(client.in_flight(), 0);
}

#[test]
fn unanswered_request_times_out() {
    let node = node("rpc_timeout");
    let service = node
        .create_queued_service("slow", RAW_DATA_TYPE, None)
        .unwrap();
    let client = node.create_client("slow", RAW_DATA_TYPE).unwrap();

    let err = client
        .send_request_timeout("x", Duration::from_millis(30))
        .unwrap_err();
    assert!(matches!(err, RpcError::Timeout));
    assert_eq!(client.in_flight(), 0);

    // The late reply lands nowhere and does not disturb the next call.
    let pending = service.read().unwrap().expect("request queued");
    service.respond(pending.id(), "late").unwrap();
}

#[test]
fn queued_service_read_then_write() {
    let node = node("rpc_queued");
    let service = Arc::new(
        node.create_queued_service("adder", RAW_DATA_TYPE, None)
            .unwrap(),
    );
    let client = node.create_client("adder", RAW_DATA_TYPE).unwrap();

    let server = Arc::clone(&service);
    let worker = thread::spawn(move || loop {
        if let Some(request) = server.read().unwrap() {
            let mut reply = request.payload().to_vec();
            reply.push(b'!');
            server.write(reply).unwrap();
            return;
        }
        thread::sleep(Duration::from_millis(2));
    });

    let reply = client.send_request_timeout("hi", LONG).unwrap();
    assert_eq!(reply.payload(), b"hi!");
    worker.join().unwrap();
    assert_eq!(service.handled(), 1);
}

#[test]
fn respond_routes_by_request_id() {
    let node = node("rpc_respond_by_id");
    let service = Arc::new(
        node.create_queued_service("swap", RAW_DATA_TYPE, None)
            .unwrap(),
    );
    let client = Arc::new(node.create_client("swap", RAW_DATA_TYPE).unwrap());

    let calls: Vec<_> = ["first", "second"]
        .into_iter()
        .map(|payload| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                let reply = client.send_request_timeout(payload, LONG).unwrap();
                (payload, String::from_utf8(reply.payload().to_vec()).unwrap())
            })
        })
        .collect();

    // Collect both, then answer in reverse order.
    let mut requests = Vec::new();
    while requests.len() < 2 {
        if let Some(request) = service.read().unwrap() {
            requests.push(request);
        } else {
            thread::sleep(Duration::from_millis(2));
        }
    }
    for request in requests.iter().rev() {
        let reply = format!("re:{}", String::from_utf8_lossy(request.payload()));
        service.respond(request.id(), reply).unwrap();
    }

    for call in calls {
        let (sent, got) = call.join().unwrap();
        assert_eq!(got, format!("re:{}", sent));
    }
}

#[test]
fn write_without_read_is_invalid() {
    let node = node("rpc_write_unread");
    let service = node
        .create_queued_service("idle", RAW_DATA_TYPE, None)
        .unwrap();
    assert!(matches!(
        service.write("x"),
        Err(RpcError::InvalidState(_))
    ));
}

#[test]
fn handler_service_cannot_be_read() {
    let node = node("rpc_handler_read");
    let service = node
        .create_service("echo", RAW_DATA_TYPE, |req| Ok(req.payload().to_vec()))
        .unwrap();
    assert!(!service.is_queued());
    assert!(matches!(service.read(), Err(RpcError::InvalidState(_))));
}

#[test]
fn queued_service_notifies_with_name() {
    let node = node("rpc_notify");
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    let service = node
        .create_queued_service(
            "ping",
            RAW_DATA_TYPE,
            Some(Arc::new(move |name: &str| {
                assert_eq!(name, "ping");
                sink.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();
    let client = node.create_client("ping", RAW_DATA_TYPE).unwrap();

    let _ = client.send_request_timeout("x", Duration::from_millis(50));
    while hits.load(Ordering::SeqCst) == 0 {
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(service.pending(), 1);
}

#[test]
fn concurrent_clients_get_their_own_replies() {
    const PAIRS: usize = 8;
    const CALLS: usize = 25;

    let domain = Domain::intra_process();
    let server_node = node_in(&domain, "rpc_fanout_server");
    let services: Vec<_> = (0..PAIRS)
        .map(|i| {
            server_node
                .create_service(&format!("svc{}", i), RAW_DATA_TYPE, move |req| {
                    let mut reply = format!("{}:", i).into_bytes();
                    reply.extend_from_slice(req.payload());
                    Ok(reply)
                })
                .unwrap()
        })
        .collect();

    let workers: Vec<_> = (0..PAIRS)
        .map(|i| {
            let domain = domain.clone();
            thread::spawn(move || {
                let node = node_in(&domain, &format!("rpc_fanout_client{}", i));
                let client = node
                    .create_client(&format!("svc{}", i), RAW_DATA_TYPE)
                    .unwrap();
                for n in 0..CALLS {
                    let payload = format!("req{}", n);
                    let reply = client.send_request_timeout(payload.clone(), LONG).unwrap();
                    assert_eq!(reply.payload(), format!("{}:{}", i, payload).as_bytes());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    assert!(services.iter().all(|s| s.handled() == CALLS as u64));
}

#[test]
fn shutdown_unblocks_send_request() {
    let domain = Domain::intra_process();
    let server_node = node_in(&domain, "rpc_shutdown_server");
    let _service = server_node
        .create_queued_service("never", RAW_DATA_TYPE, None)
        .unwrap();

    let client_node = node_in(&domain, "rpc_shutdown_client");
    let client = Arc::new(client_node.create_client("never", RAW_DATA_TYPE).unwrap());
    let caller = Arc::clone(&client);
    let handle = thread::spawn(move || caller.send_request_timeout("x", LONG));

    thread::sleep(Duration::from_millis(50));
    client_node.shutdown();
    let outcome = handle.join().unwrap();
    assert!(matches!(outcome, Err(RpcError::Shutdown)));
    assert!(matches!(
        client.send_request_timeout("y", LONG),
        Err(RpcError::Shutdown)
    ));
}

#[test]
fn service_shutdown_resolves_open_requests() {
    let domain = Domain::intra_process();
    let server_node = node_in(&domain, "rpc_service_down");
    let service = server_node
        .create_queued_service("doomed", RAW_DATA_TYPE, None)
        .unwrap();
    let client_node = node_in(&domain, "rpc_service_down_client");
    let client = Arc::new(client_node.create_client("doomed", RAW_DATA_TYPE).unwrap());

    let caller = Arc::clone(&client);
    let handle = thread::spawn(move || caller.send_request_timeout("x", LONG));
    while service.pending() == 0 {
        thread::sleep(Duration::from_millis(2));
    }

    server_node.shutdown();
    assert!(matches!(handle.join().unwrap(), Err(RpcError::Shutdown)));
    assert!(matches!(service.read(), Err(RpcError::Shutdown)));
    assert!(!domain.topology().snapshot().has_service("doomed"));
}

#[test]
fn client_waits_for_service() {
    let domain = Domain::intra_process();
    let client_node = node_in(&domain, "rpc_wait_client");
    let client = client_node.create_client("late", RAW_DATA_TYPE).unwrap();
    assert!(!client.wait_for_service(Duration::from_millis(10)));

    let server_node = node_in(&domain, "rpc_wait_server");
    let _service = server_node
        .create_service("late", RAW_DATA_TYPE, |req| Ok(req.payload().to_vec()))
        .unwrap();
    assert!(client.wait_for_service(LONG));
}

#[test]
fn unbounded_timeout_round_trip() {
    let node = node("rpc_timeout_max");
    let _service = node
        .create_service("echo", RAW_DATA_TYPE, |req| Ok(req.payload().to_vec()))
        .unwrap();
    let client = node.create_client("echo", RAW_DATA_TYPE).unwrap();

    assert!(client.wait_for_service(Duration::MAX));
    let reply = client.send_request_timeout("hi", Duration::MAX).unwrap();
    assert_eq!(reply.payload(), b"hi");
}

#[test]
fn largest_configured_timeout_is_usable() {
    let config = NodeConfig {
        request_timeout_ms: u64::MAX,
        ..NodeConfig::default()
    };
    let node = Node::builder("rpc_config_timeout_max")
        .domain(Domain::intra_process())
        .config(config)
        .build()
        .unwrap();
    let _service = node
        .create_service("echo", RAW_DATA_TYPE, |req| Ok(req.payload().to_vec()))
        .unwrap();
    let client = node.create_client("echo", RAW_DATA_TYPE).unwrap();

    assert_eq!(client.send_request("ok").unwrap().payload(), b"ok");
}

#[test]
fn shutdown_unblocks_unbounded_request() {
    let domain = Domain::intra_process();
    let server_node = node_in(&domain, "rpc_max_shutdown_server");
    let _service = server_node
        .create_queued_service("never", RAW_DATA_TYPE, None)
        .unwrap();

    let client_node = node_in(&domain, "rpc_max_shutdown_client");
    let client = Arc::new(client_node.create_client("never", RAW_DATA_TYPE).unwrap());
    let caller = Arc::clone(&client);
    let handle = thread::spawn(move || caller.send_request_timeout("x", Duration::MAX));

    while client.in_flight() == 0 {
        thread::sleep(Duration::from_millis(2));
    }
    client_node.shutdown();
    assert!(matches!(handle.join().unwrap(), Err(RpcError::Shutdown)));
}
