// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::Arc;

use crate::discovery::TopologyManager;
use crate::schema::{self, SchemaRegistry, SchemaResolver};
use crate::transport::{IntraProcessTransport, Transport};
use crate::Result;

/// The collaborators a node is built against.
///
/// Nodes sharing a domain see each other's channels and services; nodes in
/// different domains are isolated.
#[derive(Clone)]
pub struct Domain {
    transport: Arc<dyn Transport>,
    schemas: Arc<dyn SchemaResolver>,
    topology: Arc<TopologyManager>,
}

impl Domain {
    /// The transport must feed `topology` with its advertisements.
    pub fn new(
        transport: Arc<dyn Transport>,
        schemas: Arc<dyn SchemaResolver>,
        topology: Arc<TopologyManager>,
    ) -> Self {
        Self {
            transport,
            schemas,
            topology,
        }
    }

    /// Process-wide default used by `create_node` and `Node::new`.
    pub fn global() -> Self {
        let transport: Arc<dyn Transport> = IntraProcessTransport::global();
        let schemas: Arc<dyn SchemaResolver> = SchemaRegistry::global();
        Self::new(transport, schemas, TopologyManager::global())
    }

    /// Fresh isolated in-process domain with its own registry and topology.
    pub fn intra_process() -> Self {
        let topology = Arc::new(TopologyManager::new());
        let transport: Arc<dyn Transport> =
            Arc::new(IntraProcessTransport::new(Arc::clone(&topology)));
        let schemas: Arc<dyn SchemaResolver> = Arc::new(SchemaRegistry::new());
        Self::new(transport, schemas, topology)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn schemas(&self) -> &Arc<dyn SchemaResolver> {
        &self.schemas
    }

    pub fn topology(&self) -> &Arc<TopologyManager> {
        &self.topology
    }

    /// Render a payload using this domain's schema registry.
    pub fn debug_string(&self, type_name: &str, payload: &[u8]) -> Result<String> {
        schema::debug_string(self.schemas.as_ref(), type_name, payload)
    }

    #[must_use]
    pub(crate) fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub(crate) fn with_schemas(mut self, schemas: Arc<dyn SchemaResolver>) -> Self {
        self.schemas = schemas;
        self
    }

    #[must_use]
    pub(crate) fn with_topology(mut self, topology: Arc<TopologyManager>) -> Self {
        self.topology = topology;
        self
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("topology_generation", &self.topology.generation())
            .field("transport_closed", &self.transport.is_closed())
            .finish()
    }
}
