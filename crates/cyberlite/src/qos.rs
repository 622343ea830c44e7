// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Quality of service for channel endpoints.
//!
//! Only the reader-side queue is configurable at this layer: how many
//! envelopes are buffered and what happens once the buffer is full.

use crate::config::DEFAULT_QUEUE_DEPTH;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// What a reader queue does when a new envelope arrives at full depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverflowPolicy {
    /// Evict the oldest buffered envelope (latest-state channels).
    #[default]
    DropOldest,
    /// Discard the incoming envelope (command/event channels).
    Reject,
}

/// Queue depth plus overflow policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosProfile {
    pub depth: u32,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl QosProfile {
    /// Drop-oldest queue holding the `depth` most recent envelopes.
    pub fn keep_last(depth: u32) -> Self {
        Self {
            depth,
            overflow: OverflowPolicy::DropOldest,
        }
    }

    /// Queue of `depth` envelopes that rejects arrivals once full.
    pub fn reject_when_full(depth: u32) -> Self {
        Self {
            depth,
            overflow: OverflowPolicy::Reject,
        }
    }

    #[must_use]
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Reject a zero depth; every other value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::InvalidQos(
                "queue depth must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn depth_usize(&self) -> usize {
        self.depth as usize
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::keep_last(DEFAULT_QUEUE_DEPTH)
    }
}
