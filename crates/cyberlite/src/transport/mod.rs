// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport boundary.
//!
//! The core never moves bytes between peers itself. Writers, readers,
//! services and clients only call the primitives of [`Transport`]; how the
//! envelopes travel (process-local, shared memory, network) is the
//! implementation's business. [`IntraProcessTransport`] is the bundled
//! process-local implementation.
//!
//! # Threading
//!
//! Delivery callbacks and service handlers run on transport-owned threads.
//! They must not block for long: a stalled callback delays delivery of
//! unrelated messages on the same thread.

mod intra;

pub use intra::IntraProcessTransport;

use std::sync::Arc;

use crate::discovery::RoleAttributes;
use crate::message::Envelope;
use crate::rpc::{RequestId, RpcError, RpcResult};
use crate::Result;

/// Invoked once per envelope delivered to a subscription.
pub type DeliveryCallback = Arc<dyn Fn(&Arc<Envelope>) + Send + Sync>;

/// Invoked once per inbound request on a registered service.
pub type ServiceHandler = Arc<dyn Fn(ServiceRequest) + Send + Sync>;

type ReplySink = Box<dyn FnOnce(RpcResult<Arc<Envelope>>) + Send>;

/// Handle returned by [`Transport::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// One-shot reply path back to the requesting client.
///
/// Dropping a responder without answering resolves the request with
/// [`RpcError::NoResponse`], so a client never waits on a request that
/// nobody will answer.
pub struct Responder {
    id: RequestId,
    sink: Option<ReplySink>,
}

impl Responder {
    pub fn new<F>(id: RequestId, sink: F) -> Self
    where
        F: FnOnce(RpcResult<Arc<Envelope>>) + Send + 'static,
    {
        Self {
            id,
            sink: Some(Box::new(sink)),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn respond(mut self, result: RpcResult<Arc<Envelope>>) {
        if let Some(sink) = self.sink.take() {
            sink(result);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink(Err(RpcError::NoResponse));
        }
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("id", &self.id)
            .field("answered", &self.sink.is_none())
            .finish()
    }
}

/// Request envelope plus the way to answer it.
#[derive(Debug)]
pub struct ServiceRequest {
    pub envelope: Arc<Envelope>,
    pub responder: Responder,
}

impl ServiceRequest {
    pub fn new(envelope: Arc<Envelope>, responder: Responder) -> Self {
        Self {
            envelope,
            responder,
        }
    }

    pub fn id(&self) -> RequestId {
        self.responder.id()
    }
}

/// Primitives the core needs from whatever moves envelopes.
pub trait Transport: Send + Sync {
    /// Make a role visible to discovery.
    fn advertise(&self, role: &Arc<RoleAttributes>) -> Result<()>;

    /// Retract a previously advertised role.
    fn withdraw(&self, role: &RoleAttributes);

    /// Hand an envelope to every current subscriber of `channel`.
    ///
    /// At-most-once; publishing with no subscribers succeeds.
    fn publish(&self, channel: &str, envelope: Arc<Envelope>) -> Result<()>;

    fn subscribe(&self, channel: &str, callback: DeliveryCallback) -> Result<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Bind `handler` to `name`. A name can only be served once.
    fn register_service(&self, name: &str, handler: ServiceHandler) -> Result<()>;

    fn unregister_service(&self, name: &str);

    /// Route a request to the service. Does not wait for the reply: the
    /// outcome arrives through the request's [`Responder`].
    fn call_service(&self, name: &str, request: ServiceRequest) -> RpcResult<()>;

    /// Stop accepting work; every later operation fails.
    fn close(&self);

    fn is_closed(&self) -> bool;
}
