// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::domain::Domain;
use crate::config::{NodeConfig, RAW_DATA_TYPE};
use crate::discovery::TopologyManager;
use crate::schema::SchemaResolver;
use crate::transport::Transport;
use crate::{Error, Result};

/// Teardown step an entity registers with its node.
pub(crate) trait ShutdownHook: Send + Sync {
    fn on_shutdown(&self);
}

/// State shared between a node and every entity it created.
pub(crate) struct NodeContext {
    name: String,
    domain: Domain,
    config: NodeConfig,
    alive: AtomicBool,
    hooks: Mutex<Vec<Weak<dyn ShutdownHook>>>,
}

impl NodeContext {
    pub(crate) fn new(name: String, domain: Domain, config: NodeConfig) -> Arc<Self> {
        Arc::new(Self {
            name,
            domain,
            config,
            alive: AtomicBool::new(true),
            hooks: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn domain(&self) -> &Domain {
        &self.domain
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        self.domain.transport()
    }

    pub(crate) fn schemas(&self) -> &Arc<dyn SchemaResolver> {
        self.domain.schemas()
    }

    pub(crate) fn topology(&self) -> &Arc<TopologyManager> {
        self.domain.topology()
    }

    pub(crate) fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn unavailable(&self) -> Error {
        Error::NodeUnavailable(self.name.clone())
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(self.unavailable())
        }
    }

    /// Encoded schema for `type_name`; empty for `RawData`.
    pub(crate) fn resolve_schema(&self, type_name: &str) -> Result<Vec<u8>> {
        if type_name.is_empty() {
            return Err(Error::EmptyMessageType);
        }
        if type_name == RAW_DATA_TYPE {
            return Ok(Vec::new());
        }
        self.schemas().resolve(type_name).ok_or_else(|| {
            log::warn!(
                "[Node] '{}': no schema registered for type '{}'",
                self.name,
                type_name
            );
            Error::SchemaUnresolved(type_name.to_string())
        })
    }

    /// Attach an entity to this node's lifetime.
    ///
    /// If the node is already shut down the hook runs immediately.
    pub(crate) fn register_hook<H: ShutdownHook + 'static>(&self, hook: &Arc<H>) {
        let weak: Weak<dyn ShutdownHook> = Arc::downgrade(hook) as Weak<dyn ShutdownHook>;
        let mut hooks = self.hooks.lock();
        if self.is_alive() {
            hooks.retain(|h| h.strong_count() > 0);
            hooks.push(weak);
            return;
        }
        drop(hooks);
        hook.on_shutdown();
    }

    /// Flip to shut down and run every live hook. Returns false if the node
    /// was already shut down.
    pub(crate) fn shutdown(&self) -> bool {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return false;
        }
        let hooks = std::mem::take(&mut *self.hooks.lock());
        let mut released = 0usize;
        for hook in hooks.iter().filter_map(Weak::upgrade) {
            hook.on_shutdown();
            released += 1;
        }
        log::info!(
            "[Node] '{}' shut down ({} entities released)",
            self.name,
            released
        );
        true
    }
}
