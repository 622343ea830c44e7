// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::queue::{Pop, PushOutcome, ReaderQueue};
use super::MessageHook;
use crate::discovery::{RoleAttributes, RoleKind};
use crate::message::Envelope;
use crate::node::{NodeContext, ShutdownHook};
use crate::qos::QosProfile;
use crate::transport::{DeliveryCallback, SubscriptionId};
use crate::{Error, Result};

/// Counters for one reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Envelopes delivered by the transport.
    pub received: u64,
    /// Envelopes lost to the overflow policy.
    pub dropped: u64,
    /// Envelopes currently buffered.
    pub pending: usize,
}

/// Consumes envelopes from one channel.
pub struct Reader {
    inner: Arc<ReaderInner>,
}

struct ReaderInner {
    role: Arc<RoleAttributes>,
    ctx: Arc<NodeContext>,
    queue: Arc<ReaderQueue>,
    hook: Arc<RwLock<Option<MessageHook>>>,
    subscription: SubscriptionId,
    released: AtomicBool,
}

impl Reader {
    pub(crate) fn new(
        ctx: &Arc<NodeContext>,
        channel: &str,
        type_name: &str,
        qos: QosProfile,
        on_message: Option<MessageHook>,
    ) -> Result<Self> {
        ctx.ensure_alive()?;
        if channel.is_empty() {
            return Err(Error::InvalidState("channel name is empty".to_string()));
        }
        qos.validate()?;
        let schema = ctx.resolve_schema(type_name)?;

        let queue = Arc::new(ReaderQueue::new(qos));
        let hook = Arc::new(RwLock::new(on_message));
        let callback = delivery_callback(channel, Arc::clone(&queue), Arc::clone(&hook));
        let subscription = ctx.transport().subscribe(channel, callback)?;

        let role = Arc::new(
            RoleAttributes::new(RoleKind::Reader, ctx.name(), channel, type_name)
                .with_schema(schema)
                .with_qos(qos),
        );
        if let Err(e) = ctx.transport().advertise(&role) {
            ctx.transport().unsubscribe(subscription);
            return Err(e);
        }

        let inner = Arc::new(ReaderInner {
            role,
            ctx: Arc::clone(ctx),
            queue,
            hook,
            subscription,
            released: AtomicBool::new(false),
        });
        ctx.register_hook(&inner);
        log::debug!(
            "[Reader] '{}' created on node '{}' (type={}, depth={}, overflow={:?})",
            channel,
            ctx.name(),
            type_name,
            qos.depth,
            qos.overflow
        );
        Ok(Self { inner })
    }

    /// Pop the oldest buffered envelope without blocking.
    ///
    /// `Ok(None)` means nothing is buffered yet; a zero-length payload is
    /// returned as `Ok(Some(..))`.
    pub fn try_read(&self) -> Result<Option<Arc<Envelope>>> {
        match self.inner.queue.try_pop() {
            Pop::Item(envelope) => Ok(Some(envelope)),
            Pop::Empty => Ok(None),
            Pop::Closed => Err(self.inner.ctx.unavailable()),
        }
    }

    /// Pop the oldest envelope, blocking until one arrives.
    ///
    /// # Errors
    ///
    /// `NodeUnavailable` if the node shuts down before or while waiting.
    pub fn read(&self) -> Result<Arc<Envelope>> {
        loop {
            match self.inner.queue.pop_wait(None) {
                Pop::Item(envelope) => return Ok(envelope),
                Pop::Closed => return Err(self.inner.ctx.unavailable()),
                Pop::Empty => continue,
            }
        }
    }

    /// Like [`read`](Self::read) but gives up after `timeout` with `Ok(None)`.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn read_timeout(&self, timeout: Duration) -> Result<Option<Arc<Envelope>>> {
        match self.inner.queue.pop_wait(Instant::now().checked_add(timeout)) {
            Pop::Item(envelope) => Ok(Some(envelope)),
            Pop::Empty => Ok(None),
            Pop::Closed => Err(self.inner.ctx.unavailable()),
        }
    }

    /// Replace (or clear) the per-arrival notification hook.
    pub fn set_notify(&self, hook: Option<MessageHook>) {
        *self.inner.hook.write() = hook;
    }

    /// Number of buffered envelopes.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn depth(&self) -> usize {
        self.inner.queue.depth()
    }

    pub fn stats(&self) -> ReaderStats {
        let (received, dropped, pending) = self.inner.queue.counters();
        ReaderStats {
            received,
            dropped,
            pending,
        }
    }

    pub fn channel_name(&self) -> &str {
        &self.inner.role.channel_name
    }

    pub fn message_type(&self) -> &str {
        &self.inner.role.message_type
    }

    pub fn role(&self) -> &Arc<RoleAttributes> {
        &self.inner.role
    }
}

/// Transport-side half of a reader: enqueue, then notify outside the lock.
fn delivery_callback(
    channel: &str,
    queue: Arc<ReaderQueue>,
    hook: Arc<RwLock<Option<MessageHook>>>,
) -> DeliveryCallback {
    let channel = channel.to_string();
    Arc::new(move |envelope: &Arc<Envelope>| {
        match queue.push(Arc::clone(envelope)) {
            PushOutcome::Accepted => {}
            PushOutcome::DroppedOldest => {
                log::trace!("[Reader] '{}' full, dropped oldest", channel);
            }
            PushOutcome::Rejected => {
                log::trace!("[Reader] '{}' full, rejected arrival", channel);
                return;
            }
            PushOutcome::Closed => return,
        }
        let hook = hook.read().clone();
        if let Some(hook) = hook {
            hook(&channel);
        }
    })
}

impl ReaderInner {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let transport = self.ctx.transport();
        transport.unsubscribe(self.subscription);
        transport.withdraw(&self.role);
        self.queue.close();
    }
}

impl ShutdownHook for ReaderInner {
    fn on_shutdown(&self) {
        self.release();
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.inner.release();
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("channel", &self.inner.role.channel_name)
            .field("type", &self.inner.role.message_type)
            .field("pending", &self.inner.queue.len())
            .finish()
    }
}
