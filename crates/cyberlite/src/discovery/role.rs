// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::qos::QosProfile;
use crate::{Error, Result};

/// Process-unique identity of one advertised endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(u64);

impl RoleId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RoleId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "role#{}", self.0)
    }
}

/// Which side of a channel or service an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Writer,
    Reader,
    Service,
    Client,
}

impl RoleKind {
    pub fn is_channel(self) -> bool {
        matches!(self, RoleKind::Writer | RoleKind::Reader)
    }
}

/// Advertised metadata of one endpoint.
///
/// Built once by the node when the endpoint is created and never mutated
/// afterwards; the transport and topology share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAttributes {
    pub id: RoleId,
    pub kind: RoleKind,
    pub node_name: String,
    /// Channel name for writers/readers, service name for services/clients.
    pub channel_name: String,
    pub message_type: String,
    /// Encoded `SchemaBundle`; empty for `RawData`.
    #[serde(default)]
    pub schema_descriptor: Vec<u8>,
    pub qos: QosProfile,
}

impl RoleAttributes {
    pub fn new(
        kind: RoleKind,
        node_name: impl Into<String>,
        channel_name: impl Into<String>,
        message_type: impl Into<String>,
    ) -> Self {
        Self {
            id: RoleId::next(),
            kind,
            node_name: node_name.into(),
            channel_name: channel_name.into(),
            message_type: message_type.into(),
            schema_descriptor: Vec::new(),
            qos: QosProfile::default(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema_descriptor: Vec<u8>) -> Self {
        self.schema_descriptor = schema_descriptor;
        self
    }

    #[must_use]
    pub fn with_qos(mut self, qos: QosProfile) -> Self {
        self.qos = qos;
        self
    }

    pub fn queue_depth(&self) -> u32 {
        self.qos.depth
    }

    /// Serialized form returned by `channel_roles`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::InvalidState(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidState(e.to_string()))
    }
}
