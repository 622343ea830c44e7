// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The unit of transfer: serialized bytes tagged with their type name.

use std::sync::Arc;

/// Immutable payload plus type tag.
///
/// One envelope published on a channel is delivered to every subscribed
/// reader as the same `Arc<Envelope>`; nothing is copied per reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope {
    payload: Vec<u8>,
    type_name: String,
}

impl Envelope {
    pub fn new(payload: impl Into<Vec<u8>>, type_name: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            type_name: type_name.into(),
        }
    }

    /// Wrap in an `Arc` for fan-out.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// A zero-length payload is valid application data, not a "no data" marker.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
