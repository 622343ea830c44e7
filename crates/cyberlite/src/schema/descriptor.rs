// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SchemaFormat
// ---------------------------------------------------------------------------

/// Source format of a schema definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaFormat {
    /// Protocol buffers message definition.
    Proto,
    /// JSON-based schema description; payloads are JSON documents.
    Json,
    /// OMG IDL v4 text.
    Idl,
    /// Opaque identifier understood only by the producer.
    Opaque,
}

// ---------------------------------------------------------------------------
// SchemaDescriptor
// ---------------------------------------------------------------------------

/// Definition of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Fully-qualified type name (e.g. "geometry.Pose").
    pub type_name: String,
    pub format: SchemaFormat,
    /// Raw schema content (proto text, JSON schema, IDL, ...).
    pub content: String,
    /// Type names this definition refers to.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl SchemaDescriptor {
    pub fn new(
        type_name: impl Into<String>,
        format: SchemaFormat,
        content: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            format,
            content: content.into(),
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dependency(mut self, type_name: impl Into<String>) -> Self {
        self.dependencies.push(type_name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.type_name.is_empty() {
            return Err(Error::EmptyMessageType);
        }
        if self.content.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "schema content for '{}' is empty",
                self.type_name
            )));
        }
        if self.dependencies.iter().any(|d| d == &self.type_name) {
            return Err(Error::InvalidSchema(format!(
                "'{}' depends on itself",
                self.type_name
            )));
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidSchema(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SchemaBundle
// ---------------------------------------------------------------------------

/// A descriptor together with every descriptor it transitively depends on.
///
/// This is the encoded form carried in `RoleAttributes::schema_descriptor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaBundle {
    pub root: SchemaDescriptor,
    /// Dependencies, leaves first.
    #[serde(default)]
    pub dependencies: Vec<SchemaDescriptor>,
}

impl SchemaBundle {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    /// Accept either an encoded bundle or a bare encoded descriptor.
    pub fn decode_lenient(bytes: &[u8]) -> Result<Self> {
        if let Ok(bundle) = Self::decode(bytes) {
            return Ok(bundle);
        }
        let root = SchemaDescriptor::decode(bytes)?;
        Ok(Self {
            root,
            dependencies: Vec::new(),
        })
    }
}
