// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::message::Envelope;
use crate::qos::{OverflowPolicy, QosProfile};

/// Result of handing one envelope to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushOutcome {
    Accepted,
    /// Accepted after evicting the oldest entry.
    DroppedOldest,
    /// Queue full under `Reject`; the envelope was discarded.
    Rejected,
    Closed,
}

#[derive(Debug)]
pub(crate) enum Pop {
    Item(Arc<Envelope>),
    Empty,
    Closed,
}

struct QueueState {
    items: VecDeque<Arc<Envelope>>,
    closed: bool,
    received: u64,
    dropped: u64,
}

/// Bounded FIFO of envelopes for one reader.
pub(crate) struct ReaderQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    depth: usize,
    overflow: OverflowPolicy,
}

impl ReaderQueue {
    pub(crate) fn new(qos: QosProfile) -> Self {
        let depth = qos.depth_usize().max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(depth.min(1024)),
                closed: false,
                received: 0,
                dropped: 0,
            }),
            available: Condvar::new(),
            depth,
            overflow: qos.overflow,
        }
    }

    /// Append at the tail, enforcing depth. Signals one waiter after the
    /// lock is released.
    pub(crate) fn push(&self, envelope: Arc<Envelope>) -> PushOutcome {
        let mut state = self.state.lock();
        if state.closed {
            return PushOutcome::Closed;
        }
        state.received += 1;

        let mut outcome = PushOutcome::Accepted;
        if state.items.len() >= self.depth {
            match self.overflow {
                OverflowPolicy::DropOldest => {
                    state.items.pop_front();
                    state.dropped += 1;
                    outcome = PushOutcome::DroppedOldest;
                }
                OverflowPolicy::Reject => {
                    state.dropped += 1;
                    return PushOutcome::Rejected;
                }
            }
        }
        state.items.push_back(envelope);
        drop(state);

        self.available.notify_one();
        outcome
    }

    pub(crate) fn try_pop(&self) -> Pop {
        let mut state = self.state.lock();
        if state.closed {
            return Pop::Closed;
        }
        match state.items.pop_front() {
            Some(envelope) => Pop::Item(envelope),
            None => Pop::Empty,
        }
    }

    /// Pop the oldest entry, waiting for one until `deadline` (forever when
    /// `None`). Returns `Empty` only on timeout.
    pub(crate) fn pop_wait(&self, deadline: Option<Instant>) -> Pop {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Pop::Closed;
            }
            if let Some(envelope) = state.items.pop_front() {
                return Pop::Item(envelope);
            }
            match deadline {
                None => self.available.wait(&mut state),
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        if state.closed {
                            return Pop::Closed;
                        }
                        return match state.items.pop_front() {
                            Some(envelope) => Pop::Item(envelope),
                            None => Pop::Empty,
                        };
                    }
                }
            }
        }
    }

    /// Discard buffered entries and wake every waiter; later pushes and
    /// pops report `Closed`.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.items.clear();
        drop(state);
        self.available.notify_all();
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// (received, dropped, pending)
    pub(crate) fn counters(&self) -> (u64, u64, usize) {
        let state = self.state.lock();
        (state.received, state.dropped, state.items.len())
    }
}
