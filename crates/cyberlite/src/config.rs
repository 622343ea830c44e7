// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! cyberlite configuration.
//!
//! - **Level 1 (Static)**: compile-time defaults below.
//! - **Level 2 (Dynamic)**: [`NodeConfig`], loaded from YAML and handed to
//!   `NodeBuilder::config`.
//!
//! # Example YAML
//!
//! ```yaml
//! # cyberlite.yaml
//! default_queue_depth: 10
//! overflow_policy: REJECT
//! request_timeout_ms: 2000
//! discovery_settle_ms: 500
//! ```

use crate::qos::{OverflowPolicy, QosProfile};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// =======================================================================
// Static defaults
// =======================================================================

/// Reader queue depth when the caller does not pick one.
pub const DEFAULT_QUEUE_DEPTH: u32 = 1;

/// Message type that carries opaque bytes and never needs a schema.
pub const RAW_DATA_TYPE: &str = "RawData";

/// How long `Client::send_request` waits for the matching reply.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Settle delay for type lookups issued by running code.
pub const DEFAULT_TYPE_QUERY_SETTLE_MS: u64 = 0;

/// Settle delay for topology queries issued right after startup.
pub const DEFAULT_DISCOVERY_SETTLE_MS: u64 = 2_000;

/// Environment variable naming a YAML file for [`NodeConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "CYBERLITE_CONFIG";

// =======================================================================
// Runtime configuration
// =======================================================================

/// Per-node tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Depth used by `create_reader` (readers have no explicit depth argument).
    pub default_queue_depth: u32,
    /// Overflow policy applied to reader queues created by the node.
    pub overflow_policy: OverflowPolicy,
    /// Default reply deadline for clients.
    pub request_timeout_ms: u64,
    /// Settle delay for `active_channels` / `channel_roles` convenience calls.
    pub discovery_settle_ms: u64,
    /// Settle delay for `message_type_of` convenience calls.
    pub type_query_settle_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            default_queue_depth: DEFAULT_QUEUE_DEPTH,
            overflow_policy: OverflowPolicy::DropOldest,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            discovery_settle_ms: DEFAULT_DISCOVERY_SETTLE_MS,
            type_query_settle_ms: DEFAULT_TYPE_QUERY_SETTLE_MS,
        }
    }
}

impl NodeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: NodeConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file from disk.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigFileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        log::debug!("[Config] loading {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Load the file named by `CYBERLITE_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_yaml_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.reader_qos().validate()?;
        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// QoS applied to readers created without an explicit profile.
    pub fn reader_qos(&self) -> QosProfile {
        QosProfile::keep_last(self.default_queue_depth).with_overflow(self.overflow_policy)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn discovery_settle(&self) -> Duration {
        Duration::from_millis(self.discovery_settle_ms)
    }

    pub fn type_query_settle(&self) -> Duration {
        Duration::from_millis(self.type_query_settle_ms)
    }
}
