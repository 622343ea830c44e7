// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service (replier) implementation.
//!
//! Two ways to answer requests:
//!
//! - **Handler**: a [`RequestHandler`] runs on the transport's dispatcher
//!   thread for each request and its return value is the reply.
//! - **Queued**: requests are buffered; the application pulls them with
//!   [`Service::read`] and answers with [`Service::respond`] (exact request)
//!   or [`Service::write`] (oldest request read but not yet answered).
//!
//! Either way every reply is routed to the exact request that produced it.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::error::{RpcError, RpcResult};
use super::types::RequestId;
use crate::discovery::{RoleAttributes, RoleKind};
use crate::message::Envelope;
use crate::node::{NodeContext, ShutdownHook};
use crate::reader::MessageHook;
use crate::transport::{Responder, ServiceHandler, ServiceRequest};
use crate::{Error, Result};

/// Computes the reply payload for one request.
///
/// Runs on a transport thread; long blocking work delays every later request
/// to the same service.
///
/// # Example
///
/// ```rust,ignore
/// struct Upper;
///
/// impl RequestHandler for Upper {
///     fn handle(&self, request: &Envelope) -> Result<Vec<u8>, String> {
///         Ok(request.payload().to_ascii_uppercase())
///     }
/// }
///
/// node.create_service_with_handler("upper", RAW_DATA_TYPE, Upper)?;
/// ```
pub trait RequestHandler: Send + Sync + 'static {
    /// `Err(message)` is delivered to the client as `RpcError::Remote`.
    fn handle(&self, request: &Envelope) -> std::result::Result<Vec<u8>, String>;
}

impl<F> RequestHandler for F
where
    F: Fn(&Envelope) -> std::result::Result<Vec<u8>, String> + Send + Sync + 'static,
{
    fn handle(&self, request: &Envelope) -> std::result::Result<Vec<u8>, String> {
        self(request)
    }
}

/// A request pulled from a queued service, awaiting its reply.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    id: RequestId,
    envelope: Arc<Envelope>,
}

impl PendingRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        self.envelope.payload()
    }

    pub fn envelope(&self) -> &Arc<Envelope> {
        &self.envelope
    }
}

// ---------------------------------------------------------------------------
// Inbox (queued mode)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InboxState {
    /// Received, not yet handed out by `read`.
    unread: VecDeque<PendingRequest>,
    /// Handed out by `read`, not yet answered, in read order.
    awaiting: VecDeque<RequestId>,
    responders: HashMap<RequestId, Responder>,
    closed: bool,
}

#[derive(Default)]
struct RequestInbox {
    state: Mutex<InboxState>,
}

impl RequestInbox {
    fn push(&self, request: ServiceRequest) {
        let ServiceRequest {
            envelope,
            responder,
        } = request;
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            responder.respond(Err(RpcError::Shutdown));
            return;
        }
        let id = responder.id();
        state.responders.insert(id, responder);
        state.unread.push_back(PendingRequest { id, envelope });
    }

    fn read(&self) -> Option<PendingRequest> {
        let mut state = self.state.lock();
        let request = state.unread.pop_front()?;
        state.awaiting.push_back(request.id);
        Some(request)
    }

    fn take_responder(&self, id: RequestId) -> Option<Responder> {
        let mut state = self.state.lock();
        let responder = state.responders.remove(&id)?;
        state.awaiting.retain(|a| *a != id);
        state.unread.retain(|r| r.id != id);
        Some(responder)
    }

    fn take_oldest_awaiting(&self) -> Option<Responder> {
        let mut state = self.state.lock();
        while let Some(id) = state.awaiting.pop_front() {
            if let Some(responder) = state.responders.remove(&id) {
                return Some(responder);
            }
        }
        None
    }

    fn unread_len(&self) -> usize {
        self.state.lock().unread.len()
    }

    fn close(&self) {
        let responders: Vec<Responder> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.unread.clear();
            state.awaiting.clear();
            state.responders.drain().map(|(_, r)| r).collect()
        };
        for responder in responders {
            responder.respond(Err(RpcError::Shutdown));
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

enum Mode {
    Handler,
    Queued(Arc<RequestInbox>),
}

/// Request/response endpoint bound to one service name.
pub struct Service {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    role: Arc<RoleAttributes>,
    ctx: Arc<NodeContext>,
    mode: Mode,
    notify: Arc<RwLock<Option<MessageHook>>>,
    handled: Arc<AtomicU64>,
    released: AtomicBool,
}

impl Service {
    pub(crate) fn with_handler<H: RequestHandler>(
        ctx: &Arc<NodeContext>,
        name: &str,
        type_name: &str,
        handler: H,
    ) -> Result<Self> {
        let notify = Arc::new(RwLock::new(None::<MessageHook>));
        let handled = Arc::new(AtomicU64::new(0));

        let dispatch: ServiceHandler = {
            let handler = Arc::new(handler);
            let service_name = name.to_string();
            let reply_type = type_name.to_string();
            let notify = Arc::clone(&notify);
            let handled = Arc::clone(&handled);
            Arc::new(move |request: ServiceRequest| {
                fire(&notify, &service_name);
                let ServiceRequest {
                    envelope,
                    responder,
                } = request;
                let reply = handler
                    .handle(&envelope)
                    .map(|payload| Envelope::new(payload, reply_type.as_str()).shared())
                    .map_err(|msg| {
                        log::warn!("[Service] '{}' handler failed: {}", service_name, msg);
                        RpcError::Remote(msg)
                    });
                handled.fetch_add(1, Ordering::Relaxed);
                responder.respond(reply);
            })
        };

        Self::build(ctx, name, type_name, Mode::Handler, dispatch, notify, handled)
    }

    pub(crate) fn queued(
        ctx: &Arc<NodeContext>,
        name: &str,
        type_name: &str,
        on_request: Option<MessageHook>,
    ) -> Result<Self> {
        let notify = Arc::new(RwLock::new(on_request));
        let handled = Arc::new(AtomicU64::new(0));
        let inbox = Arc::new(RequestInbox::default());

        let dispatch: ServiceHandler = {
            let inbox = Arc::clone(&inbox);
            let service_name = name.to_string();
            let notify = Arc::clone(&notify);
            Arc::new(move |request: ServiceRequest| {
                inbox.push(request);
                fire(&notify, &service_name);
            })
        };

        Self::build(
            ctx,
            name,
            type_name,
            Mode::Queued(inbox),
            dispatch,
            notify,
            handled,
        )
    }

    fn build(
        ctx: &Arc<NodeContext>,
        name: &str,
        type_name: &str,
        mode: Mode,
        dispatch: ServiceHandler,
        notify: Arc<RwLock<Option<MessageHook>>>,
        handled: Arc<AtomicU64>,
    ) -> Result<Self> {
        ctx.ensure_alive()?;
        if name.is_empty() {
            return Err(Error::InvalidState("service name is empty".to_string()));
        }
        let schema = ctx.resolve_schema(type_name)?;

        ctx.transport().register_service(name, dispatch)?;
        let role = Arc::new(
            RoleAttributes::new(RoleKind::Service, ctx.name(), name, type_name).with_schema(schema),
        );
        if let Err(e) = ctx.transport().advertise(&role) {
            ctx.transport().unregister_service(name);
            return Err(e);
        }

        let inner = Arc::new(ServiceInner {
            role,
            ctx: Arc::clone(ctx),
            mode,
            notify,
            handled,
            released: AtomicBool::new(false),
        });
        ctx.register_hook(&inner);
        log::debug!(
            "[Service] '{}' created on node '{}' (type={}, queued={})",
            name,
            ctx.name(),
            type_name,
            matches!(inner.mode, Mode::Queued(_))
        );
        Ok(Self { inner })
    }

    fn inbox(&self) -> RpcResult<&RequestInbox> {
        if self.inner.released.load(Ordering::Acquire) || !self.inner.ctx.is_alive() {
            return Err(RpcError::Shutdown);
        }
        match &self.inner.mode {
            Mode::Queued(inbox) => Ok(inbox.as_ref()),
            Mode::Handler => Err(RpcError::InvalidState(format!(
                "service '{}' answers through its handler",
                self.inner.role.channel_name
            ))),
        }
    }

    /// Oldest request not yet read; `Ok(None)` when nothing is waiting.
    pub fn read(&self) -> RpcResult<Option<PendingRequest>> {
        Ok(self.inbox()?.read())
    }

    /// Answer one specific request.
    pub fn respond(&self, id: RequestId, payload: impl Into<Vec<u8>>) -> RpcResult<()> {
        let responder = self.inbox()?.take_responder(id).ok_or_else(|| {
            RpcError::InvalidState(format!("request {} is not awaiting a reply", id))
        })?;
        self.reply(responder, payload.into());
        Ok(())
    }

    /// Answer the oldest request handed out by `read` and not yet answered.
    pub fn write(&self, payload: impl Into<Vec<u8>>) -> RpcResult<()> {
        let responder = self.inbox()?.take_oldest_awaiting().ok_or_else(|| {
            RpcError::InvalidState("no request has been read and left unanswered".to_string())
        })?;
        self.reply(responder, payload.into());
        Ok(())
    }

    fn reply(&self, responder: Responder, payload: Vec<u8>) {
        let envelope = Envelope::new(payload, self.inner.role.message_type.as_str()).shared();
        self.inner.handled.fetch_add(1, Ordering::Relaxed);
        responder.respond(Ok(envelope));
    }

    /// Requests received and not yet read (queued mode).
    pub fn pending(&self) -> usize {
        match &self.inner.mode {
            Mode::Queued(inbox) => inbox.unread_len(),
            Mode::Handler => 0,
        }
    }

    /// Replies sent so far.
    pub fn handled(&self) -> u64 {
        self.inner.handled.load(Ordering::Relaxed)
    }

    pub fn set_notify(&self, hook: Option<MessageHook>) {
        *self.inner.notify.write() = hook;
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.inner.mode, Mode::Queued(_))
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

fn fire(notify: &RwLock<Option<MessageHook>>, name: &str) {
    let hook = notify.read().clone();
    if let Some(hook) = hook {
        hook(name);
    }
}

impl ServiceInner {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let transport = self.ctx.transport();
        transport.unregister_service(&self.role.channel_name);
        transport.withdraw(&self.role);
        if let Mode::Queued(inbox) = &self.mode {
            inbox.close();
        }
    }
}

impl ShutdownHook for ServiceInner {
    fn on_shutdown(&self) {
        self.release();
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.inner.release();
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.inner.role.channel_name)
            .field("queued", &self.is_queued())
            .finish()
    }
}
