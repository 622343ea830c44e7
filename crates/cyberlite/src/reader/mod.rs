// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscribe side of a channel.
//!
//! Each reader owns a bounded FIFO guarded by its own mutex/condvar pair;
//! there is no lock shared between readers.
//!
//! ```text
//!   transport thread                       application thread
//!   ----------------                       ------------------
//!   delivery callback                      try_read / read / read_timeout
//!     lock queue, push (drop oldest)         lock queue, pop front
//!     unlock, notify_one                     (or wait on condvar)
//!     notification hook(channel)
//! ```
//!
//! Overflow follows the reader's [`OverflowPolicy`](crate::qos::OverflowPolicy):
//! drop-oldest keeps the `depth` most recent envelopes, reject keeps the
//! first `depth` and discards later arrivals until the consumer catches up.

mod queue;
mod runtime;


pub use runtime::{Reader, ReaderStats};

use std::sync::Arc;

/// Notification invoked with the channel (or service) name on each arrival.
pub type MessageHook = Arc<dyn Fn(&str) + Send + Sync>;
