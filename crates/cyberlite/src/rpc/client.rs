// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client (requester) implementation.
//!
//! Each request gets a [`RequestId`] and a reply slot in the pending map.
//! The transport answers through a [`Responder`] that fills exactly that
//! slot, so concurrent calls on one client never see each other's replies.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::error::{RpcError, RpcResult};
use super::types::{RequestId, ResponseSlot};
use crate::discovery::{RoleAttributes, RoleKind};
use crate::message::Envelope;
use crate::node::{NodeContext, ShutdownHook};
use crate::transport::{Responder, ServiceRequest};
use crate::{Error, Result};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Request/response endpoint calling one service name.
///
/// # Example
///
/// ```rust,no_run
/// use cyberlite::{Node, RAW_DATA_TYPE};
///
/// let node = Node::new("caller")?;
/// let client = node.create_client("echo", RAW_DATA_TYPE)?;
/// match client.send_request(b"ping".to_vec()) {
///     Ok(reply) => println!("reply: {} bytes", reply.len()),
///     Err(e) => eprintln!("request failed: {}", e),
/// }
/// # Ok::<(), cyberlite::Error>(())
/// ```
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    role: Arc<RoleAttributes>,
    ctx: Arc<NodeContext>,

    /// Unique per client in this process
    client_id: u64,

    /// Sequence number counter
    sequence: AtomicU64,

    /// In-flight requests: request id -> reply slot
    pending: DashMap<RequestId, Arc<ResponseSlot>>,

    /// Default timeout
    timeout: Duration,

    released: AtomicBool,
}

impl Client {
    pub(crate) fn new(ctx: &Arc<NodeContext>, name: &str, type_name: &str) -> Result<Self> {
        ctx.ensure_alive()?;
        if name.is_empty() {
            return Err(Error::InvalidState("service name is empty".to_string()));
        }
        let schema = ctx.resolve_schema(type_name)?;

        let role = Arc::new(
            RoleAttributes::new(RoleKind::Client, ctx.name(), name, type_name).with_schema(schema),
        );
        ctx.transport().advertise(&role)?;

        let inner = Arc::new(ClientInner {
            role,
            ctx: Arc::clone(ctx),
            client_id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            sequence: AtomicU64::new(1),
            pending: DashMap::new(),
            timeout: ctx.config().request_timeout(),
            released: AtomicBool::new(false),
        });
        ctx.register_hook(&inner);
        log::debug!(
            "[Client] '{}' created on node '{}' (type={}, id={})",
            name,
            ctx.name(),
            type_name,
            inner.client_id
        );
        Ok(Self { inner })
    }

    /// Send `payload` and block until the reply, using the node's
    /// configured request timeout.
    ///
    /// A zero-length reply is `Ok` with an empty envelope; failures are
    /// always `Err`.
    pub fn send_request(&self, payload: impl Into<Vec<u8>>) -> RpcResult<Arc<Envelope>> {
        self.send_request_timeout(payload, self.inner.timeout)
    }

    /// Like [`send_request`](Self::send_request) with an explicit timeout.
    ///
    /// # Errors
    ///
    /// - `Shutdown` if the node is, or becomes, shut down
    /// - `ServiceNotFound` if nobody serves the name
    /// - `Timeout` if no reply arrived in time
    /// - `Remote` / `NoResponse` from the service side
    pub fn send_request_timeout(
        &self,
        payload: impl Into<Vec<u8>>,
        timeout: Duration,
    ) -> RpcResult<Arc<Envelope>> {
        let inner = &self.inner;
        if inner.released.load(Ordering::Acquire) || !inner.ctx.is_alive() {
            return Err(RpcError::Shutdown);
        }

        let seq = inner.sequence.fetch_add(1, Ordering::Relaxed);
        let id = RequestId::new(inner.client_id, seq);
        let slot = Arc::new(ResponseSlot::new());
        inner.pending.insert(id, Arc::clone(&slot));

        // A shutdown between the first check and the insert would miss this slot.
        if inner.released.load(Ordering::Acquire) || !inner.ctx.is_alive() {
            inner.pending.remove(&id);
            return Err(RpcError::Shutdown);
        }

        let weak: Weak<ResponseSlot> = Arc::downgrade(&slot);
        let responder = Responder::new(id, move |result| {
            if let Some(slot) = weak.upgrade() {
                slot.fill(result);
            }
        });
        let envelope = Envelope::new(payload, inner.role.message_type.as_str()).shared();
        let request = ServiceRequest::new(envelope, responder);

        if let Err(e) = inner
            .ctx
            .transport()
            .call_service(&inner.role.channel_name, request)
        {
            inner.pending.remove(&id);
            log::debug!(
                "[Client] '{}' request {} not routed: {}",
                inner.role.channel_name,
                id,
                e
            );
            return Err(e);
        }

        let outcome = slot.wait_until(Instant::now().checked_add(timeout));
        inner.pending.remove(&id);
        match outcome {
            Some(result) => result,
            None => {
                log::debug!(
                    "[Client] '{}' request {} timed out after {:?}",
                    inner.role.channel_name,
                    id,
                    timeout
                );
                Err(RpcError::Timeout)
            }
        }
    }

    /// Block until a server for this name is visible, or `timeout` elapses.
    pub fn wait_for_service(&self, timeout: Duration) -> bool {
        self.inner
            .ctx
            .topology()
            .wait_for_service(&self.inner.role.channel_name, timeout)
    }

    /// Requests currently awaiting a reply.
    pub fn in_flight(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn name(&self) -> &str {
        &self.inner.role.channel_name
    }

    pub fn message_type(&self) -> &str {
        &self.inner.role.message_type
    }

    pub fn role(&self) -> &Arc<RoleAttributes> {
        &self.inner.role
    }
}

impl ClientInner {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let slots: Vec<Arc<ResponseSlot>> =
            self.pending.iter().map(|e| Arc::clone(e.value())).collect();
        self.pending.clear();
        for slot in slots {
            slot.fill(Err(RpcError::Shutdown));
        }
        self.ctx.transport().withdraw(&self.role);
    }
}

impl ShutdownHook for ClientInner {
    fn on_shutdown(&self) {
        self.release();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.inner.release();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.inner.role.channel_name)
            .field("id", &self.inner.client_id)
            .field("in_flight", &self.inner.pending.len())
            .finish()
    }
}
