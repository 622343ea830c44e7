// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # cyberlite - Node-centric publish/subscribe and request/response core
//!
//! Applications create named [`Node`]s; a node is the factory for
//! [`Writer`]s, [`Reader`]s, [`Service`]s and [`Client`]s. Every payload
//! travels as an [`Envelope`] (opaque bytes plus a message type name), and
//! every endpoint advertises a [`RoleAttributes`] record so the
//! [`TopologyManager`] can answer "which channels exist and what type do they
//! carry".
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cyberlite::{create_node, Result, RAW_DATA_TYPE};
//!
//! fn main() -> Result<()> {
//!     let node = create_node("talker")?;
//!     let writer = node.create_writer("chatter", RAW_DATA_TYPE, 10)?;
//!     let reader = node.create_reader("chatter", RAW_DATA_TYPE, None)?;
//!
//!     writer.write(b"hello".to_vec())?;
//!     let envelope = reader.read()?;
//!     println!("{} bytes of {}", envelope.len(), envelope.type_name());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Application Layer                           |
//! |        Node -> Writer / Reader / Service / Client                   |
//! +---------------------------------------------------------------------+
//! |   Schema Registry        |   Topology Manager   |   Node lifecycle  |
//! |   type -> descriptor     |   roles, snapshots   |   shutdown hooks  |
//! +---------------------------------------------------------------------+
//! |                      Transport (trait)                              |
//! |   IntraProcessTransport: fan-out, per-service dispatcher threads    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Node`] | Named participant, factory for all endpoints |
//! | [`Writer`] | Publishes envelopes on a channel |
//! | [`Reader`] | Bounded FIFO of received envelopes, blocking or polled |
//! | [`Service`] | Answers requests, by handler or from a queue |
//! | [`Client`] | Sends requests and waits for the matching reply |
//! | [`SchemaRegistry`] | Type name to schema descriptor |
//! | [`TopologyManager`] | Live view of advertised roles |

/// Node configuration and compile-time defaults.
pub mod config;
/// Advertised roles and the topology view.
pub mod discovery;
mod error;
/// Process lifecycle (`init`, `ok`, `shutdown`).
pub mod init;
mod message;
/// Node, builder and domain.
pub mod node;
/// Queue depth and overflow policy.
pub mod qos;
/// Subscribe side of a channel.
pub mod reader;
/// Request/response.
pub mod rpc;
/// Schema descriptors and the registry.
pub mod schema;
/// Transport boundary and the in-process transport.
pub mod transport;
mod writer;

pub use config::{
    NodeConfig, CONFIG_ENV_VAR, DEFAULT_DISCOVERY_SETTLE_MS, DEFAULT_QUEUE_DEPTH,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TYPE_QUERY_SETTLE_MS, RAW_DATA_TYPE,
};
pub use discovery::{RoleAttributes, RoleKind, TopologyManager, TopologySnapshot};
pub use error::{Error, Result};
pub use message::Envelope;
pub use node::{Domain, Node, NodeBuilder};
pub use qos::{OverflowPolicy, QosProfile};
pub use reader::{MessageHook, Reader, ReaderStats};
pub use rpc::{
    Client, PendingRequest, RequestHandler, RequestId, RpcError, RpcResult, Service,
};
pub use schema::{SchemaDescriptor, SchemaFormat, SchemaRegistry, SchemaResolver};
pub use transport::{IntraProcessTransport, Transport};
pub use writer::{Writer, WriterStats};

use std::sync::Arc;

/// Node in the process-wide domain. Shorthand for [`Node::new`].
pub fn create_node(name: &str) -> Result<Arc<Node>> {
    Node::new(name)
}

/// cyberlite version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
