// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish side of a channel.
//!
//! A writer resolves its type's schema at construction and refuses to exist
//! without one (except for `RawData`). Writes are at-most-once with no
//! retry; the caller decides what to do with a failure.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::discovery::{RoleAttributes, RoleKind};
use crate::message::Envelope;
use crate::node::{NodeContext, ShutdownHook};
use crate::qos::QosProfile;
use crate::{Error, Result};

/// Counters for one writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: u64,
    pub failed: u64,
}

/// Publishes envelopes on one channel.
pub struct Writer {
    inner: Arc<WriterInner>,
}

struct WriterInner {
    role: Arc<RoleAttributes>,
    ctx: Arc<NodeContext>,
    released: AtomicBool,
    written: AtomicU64,
    failed: AtomicU64,
}

impl Writer {
    pub(crate) fn new(
        ctx: &Arc<NodeContext>,
        channel: &str,
        type_name: &str,
        qos: QosProfile,
    ) -> Result<Self> {
        ctx.ensure_alive()?;
        if channel.is_empty() {
            return Err(Error::InvalidState("channel name is empty".to_string()));
        }
        qos.validate()?;
        let schema = ctx.resolve_schema(type_name)?;

        let role = Arc::new(
            RoleAttributes::new(RoleKind::Writer, ctx.name(), channel, type_name)
                .with_schema(schema)
                .with_qos(qos),
        );
        ctx.transport().advertise(&role)?;

        let inner = Arc::new(WriterInner {
            role,
            ctx: Arc::clone(ctx),
            released: AtomicBool::new(false),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });
        ctx.register_hook(&inner);
        log::debug!(
            "[Writer] '{}' created on node '{}' (type={}, depth={})",
            channel,
            ctx.name(),
            type_name,
            qos.depth
        );
        Ok(Self { inner })
    }

    /// Wrap `payload` with this writer's type name and publish it.
    ///
    /// # Errors
    ///
    /// `NodeUnavailable` after the node shut down, or the transport's error.
    pub fn write(&self, payload: impl Into<Vec<u8>>) -> Result<()> {
        let inner = &self.inner;
        if inner.released.load(Ordering::Acquire) || !inner.ctx.is_alive() {
            return Err(inner.ctx.unavailable());
        }

        let envelope = Envelope::new(payload, inner.role.message_type.as_str()).shared();
        match inner
            .ctx
            .transport()
            .publish(&inner.role.channel_name, envelope)
        {
            Ok(()) => {
                inner.written.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                log::debug!("[Writer] '{}' publish failed: {}", inner.role.channel_name, e);
                Err(e)
            }
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

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            written: self.inner.written.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
        }
    }
}

impl WriterInner {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ctx.transport().withdraw(&self.role);
    }
}

impl ShutdownHook for WriterInner {
    fn on_shutdown(&self) {
        self.release();
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        self.inner.release();
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("channel", &self.inner.role.channel_name)
            .field("type", &self.inner.role.message_type)
            .finish()
    }
}
