// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request correlation types.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use super::error::RpcResult;
use crate::message::Envelope;

/// Identity of one request: issuing client plus its sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    pub client: u64,
    pub sequence: u64,
}

impl RequestId {
    pub fn new(client: u64, sequence: u64) -> Self {
        Self { client, sequence }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.client, self.sequence)
    }
}

/// Single-assignment reply slot a client thread blocks on.
///
/// The first `fill` wins; later ones are ignored so a late reply cannot
/// overwrite a shutdown or timeout outcome.
pub(crate) struct ResponseSlot {
    value: Mutex<Option<RpcResult<Arc<Envelope>>>>,
    ready: Condvar,
}

impl ResponseSlot {
    pub(crate) fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Store the outcome; returns false if one was already stored.
    pub(crate) fn fill(&self, result: RpcResult<Arc<Envelope>>) -> bool {
        let mut value = self.value.lock();
        if value.is_some() {
            return false;
        }
        *value = Some(result);
        drop(value);
        self.ready.notify_all();
        true
    }

    /// Wait for the outcome until `deadline` (forever when `None`); `None`
    /// on timeout.
    pub(crate) fn wait_until(
        &self,
        deadline: Option<Instant>,
    ) -> Option<RpcResult<Arc<Envelope>>> {
        let mut value = self.value.lock();
        loop {
            if let Some(result) = value.take() {
                return Some(result);
            }
            match deadline {
                None => self.ready.wait(&mut value),
                Some(deadline) => {
                    if self.ready.wait_until(&mut value, deadline).timed_out() {
                        return value.take();
                    }
                }
            }
        }
    }
}
