// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node builder.
//!
//! Collaborators default to [`Domain::global`]; any of them can be swapped
//! individually, or a whole domain injected with [`NodeBuilder::domain`].

use std::path::PathBuf;
use std::sync::Arc;

use super::context::NodeContext;
use super::domain::Domain;
use super::runtime::Node;
use crate::config::NodeConfig;
use crate::discovery::TopologyManager;
use crate::schema::SchemaResolver;
use crate::transport::Transport;
use crate::{init, Error, Result};

/// Builder for configuring and creating a [`Node`].
pub struct NodeBuilder {
    name: String,
    domain: Option<Domain>,
    transport: Option<Arc<dyn Transport>>,
    schemas: Option<Arc<dyn SchemaResolver>>,
    topology: Option<Arc<TopologyManager>>,
    config: Option<NodeConfig>,
    config_path: Option<PathBuf>,
}

impl NodeBuilder {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            domain: None,
            transport: None,
            schemas: None,
            topology: None,
            config: None,
            config_path: None,
        }
    }

    /// Join an explicit domain instead of the process-wide one.
    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Override the transport. It must feed the topology this node uses.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn schema_registry(mut self, schemas: Arc<dyn SchemaResolver>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn topology(mut self, topology: Arc<TopologyManager>) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the node configuration from a YAML file at build time.
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Create the node.
    ///
    /// Configuration precedence: `config(..)`, then `with_config(..)`, then
    /// the file named by `CYBERLITE_CONFIG`, then defaults.
    ///
    /// # Errors
    ///
    /// - `InvalidState` for an empty name
    /// - configuration errors from loading/validating the config
    /// - `NodeUnavailable` once the process has been shut down
    pub fn build(self) -> Result<Arc<Node>> {
        if self.name.is_empty() {
            return Err(Error::InvalidState("node name is empty".to_string()));
        }

        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => NodeConfig::from_yaml_file(path)?,
            (None, None) => NodeConfig::from_env()?,
        };

        let mut domain = self.domain.unwrap_or_else(Domain::global);
        if let Some(transport) = self.transport {
            domain = domain.with_transport(transport);
        }
        if let Some(schemas) = self.schemas {
            domain = domain.with_schemas(schemas);
        }
        if let Some(topology) = self.topology {
            domain = domain.with_topology(topology);
        }

        let ctx = NodeContext::new(self.name, domain, config);
        init::track_node(&ctx)?;
        log::debug!("[Node] '{}' created", ctx.name());
        Ok(Arc::new(Node::from_context(ctx)))
    }
}
