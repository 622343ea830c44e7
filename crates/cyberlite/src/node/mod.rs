// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node: named factory and lifetime owner for writers, readers, services
//! and clients.
//!
//! A node is bound to a [`Domain`] (transport, schema registry, topology).
//! Every entity it creates keeps a handle on the node's shared context and
//! registers a shutdown hook with it. `Node::shutdown` (or dropping the last
//! `Arc<Node>`) runs those hooks:
//!
//! - readers close their queue, waking blocked `read` calls with an error
//! - clients fail every in-flight request with `RpcError::Shutdown`
//! - services resolve unanswered requests and unregister
//! - every role is withdrawn from discovery
//!
//! Afterwards every `create_*` call and every entity operation fails with
//! `Error::NodeUnavailable` (or `RpcError::Shutdown`).

mod builder;
mod context;
mod domain;
mod runtime;


pub use builder::NodeBuilder;
pub use domain::Domain;
pub use runtime::Node;

pub(crate) use context::{NodeContext, ShutdownHook};
