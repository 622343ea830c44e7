// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::builder::NodeBuilder;
use super::context::NodeContext;
use super::domain::Domain;
use crate::config::NodeConfig;
use crate::message::Envelope;
use crate::qos::QosProfile;
use crate::reader::{MessageHook, Reader};
use crate::rpc::{Client, RequestHandler, Service};
use crate::schema::SchemaDescriptor;
use crate::writer::Writer;
use crate::Result;

/// A named participant in a domain; factory for all endpoints.
///
/// Dropping the last `Arc<Node>` shuts the node down, the same as calling
/// [`shutdown`](Self::shutdown). Entities keep working only while their node
/// is held, so a chained `create_node("x")?.create_reader(..)` yields a
/// reader that is already inert. Bind the node to a variable that outlives
/// its entities.
///
/// # Example
///
/// ```rust,no_run
/// use cyberlite::{Node, RAW_DATA_TYPE};
///
/// let node = Node::new("talker")?;
/// let writer = node.create_writer("chatter", RAW_DATA_TYPE, 10)?;
/// let reader = node.create_reader("chatter", RAW_DATA_TYPE, None)?;
///
/// writer.write(b"hello".to_vec())?;
/// assert_eq!(reader.try_read()?.map(|e| e.payload().to_vec()), Some(b"hello".to_vec()));
/// # Ok::<(), cyberlite::Error>(())
/// ```
pub struct Node {
    ctx: Arc<NodeContext>,
}

impl Node {
    /// Node in the process-wide domain with configuration from the
    /// environment. Equivalent to `Node::builder(name).build()`.
    pub fn new(name: &str) -> Result<Arc<Self>> {
        Self::builder(name).build()
    }

    pub fn builder(name: &str) -> NodeBuilder {
        NodeBuilder::new(name)
    }

    pub(super) fn from_context(ctx: Arc<NodeContext>) -> Self {
        Self { ctx }
    }

    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    pub fn domain(&self) -> &Domain {
        self.ctx.domain()
    }

    pub fn config(&self) -> &NodeConfig {
        self.ctx.config()
    }

    pub fn is_shutdown(&self) -> bool {
        !self.ctx.is_alive()
    }

    // -----------------------------------------------------------------------
    // Entity factories
    // -----------------------------------------------------------------------

    /// Writer on `channel` advertising a drop-oldest queue of `qos_depth`.
    pub fn create_writer(&self, channel: &str, type_name: &str, qos_depth: u32) -> Result<Writer> {
        self.create_writer_with_qos(channel, type_name, QosProfile::keep_last(qos_depth))
    }

    pub fn create_writer_with_qos(
        &self,
        channel: &str,
        type_name: &str,
        qos: QosProfile,
    ) -> Result<Writer> {
        Writer::new(&self.ctx, channel, type_name, qos)
    }

    /// Reader on `channel` sized to the depth the channel's writer advertised.
    ///
    /// With no writer known yet the node's default queue depth applies. The
    /// overflow policy always comes from the node configuration.
    ///
    /// `on_message` runs on the delivering thread with the channel name,
    /// after the envelope is queued and outside the queue lock.
    pub fn create_reader(
        &self,
        channel: &str,
        type_name: &str,
        on_message: Option<MessageHook>,
    ) -> Result<Reader> {
        let qos = self.channel_reader_qos(channel);
        self.create_reader_with_qos(channel, type_name, qos, on_message)
    }

    pub fn create_reader_with_qos(
        &self,
        channel: &str,
        type_name: &str,
        qos: QosProfile,
        on_message: Option<MessageHook>,
    ) -> Result<Reader> {
        Reader::new(&self.ctx, channel, type_name, qos, on_message)
    }

    /// Service whose replies are computed by `handler` on the transport's
    /// dispatcher thread. Keep the handler short.
    ///
    /// `Err(message)` from the handler reaches the client as
    /// `RpcError::Remote(message)`.
    pub fn create_service<F>(&self, name: &str, type_name: &str, handler: F) -> Result<Service>
    where
        F: Fn(&Envelope) -> std::result::Result<Vec<u8>, String> + Send + Sync + 'static,
    {
        Service::with_handler(&self.ctx, name, type_name, handler)
    }

    /// Like [`create_service`](Self::create_service) for a named
    /// [`RequestHandler`] implementation.
    pub fn create_service_with_handler<H: RequestHandler>(
        &self,
        name: &str,
        type_name: &str,
        handler: H,
    ) -> Result<Service> {
        Service::with_handler(&self.ctx, name, type_name, handler)
    }

    /// Service whose requests are queued for the application to `read` and
    /// answer with `respond`/`write`.
    pub fn create_queued_service(
        &self,
        name: &str,
        type_name: &str,
        on_request: Option<MessageHook>,
    ) -> Result<Service> {
        Service::queued(&self.ctx, name, type_name, on_request)
    }

    pub fn create_client(&self, name: &str, type_name: &str) -> Result<Client> {
        Client::new(&self.ctx, name, type_name)
    }

    // -----------------------------------------------------------------------
    // Schemas
    // -----------------------------------------------------------------------

    pub fn register_schema(&self, descriptor: SchemaDescriptor) -> Result<u32> {
        self.ctx.ensure_alive()?;
        self.ctx.schemas().register(descriptor)
    }

    /// Register an encoded descriptor (or descriptor bundle).
    pub fn register_schema_encoded(&self, bytes: &[u8]) -> Result<u32> {
        self.ctx.ensure_alive()?;
        self.ctx.schemas().register_encoded(bytes)
    }

    /// Render a payload of `type_name` for display.
    pub fn debug_string(&self, type_name: &str, payload: &[u8]) -> Result<String> {
        self.ctx.domain().debug_string(type_name, payload)
    }

    // -----------------------------------------------------------------------
    // Discovery convenience, settle delays from the node config
    // -----------------------------------------------------------------------

    pub fn message_type_of(&self, channel: &str) -> Option<String> {
        self.ctx
            .topology()
            .message_type_of(channel, self.ctx.config().type_query_settle())
    }

    pub fn active_channels(&self) -> BTreeSet<String> {
        self.ctx
            .topology()
            .active_channels(self.ctx.config().discovery_settle())
    }

    pub fn channel_roles(&self) -> BTreeMap<String, Vec<Vec<u8>>> {
        self.ctx
            .topology()
            .channel_roles(self.ctx.config().discovery_settle())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Release the node's transport binding and make every entity inert.
    ///
    /// Blocked `Reader::read` and `Client::send_request` calls return an
    /// error. Idempotent.
    pub fn shutdown(&self) {
        self.ctx.shutdown();
    }

    fn channel_reader_qos(&self, channel: &str) -> QosProfile {
        let config = self.ctx.config();
        let snapshot = self.ctx.topology().snapshot();
        match snapshot.channel(channel).and_then(|roles| roles.writers.first()) {
            Some(writer) => {
                log::debug!(
                    "[Node] reader on '{}' follows writer depth {}",
                    channel,
                    writer.qos.depth
                );
                QosProfile::keep_last(writer.qos.depth).with_overflow(config.overflow_policy)
            }
            None => config.reader_qos(),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.ctx.shutdown();
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.ctx.name())
            .field("shutdown", &!self.ctx.is_alive())
            .finish()
    }
}
