// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-local transport.
//!
//! Publishing fans out synchronously on the caller's thread: every
//! subscriber callback runs before `publish` returns, in subscription order.
//! Each registered service gets one dispatcher thread fed by a crossbeam
//! channel, so requests to one service are handled one at a time in arrival
//! order while distinct services run in parallel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{DeliveryCallback, ServiceHandler, ServiceRequest, SubscriptionId, Transport};
use crate::discovery::{RoleAttributes, TopologyManager};
use crate::message::Envelope;
use crate::rpc::{RpcError, RpcResult};
use crate::{Error, Result};

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    callback: DeliveryCallback,
}

struct ServiceWorker {
    tx: Option<Sender<ServiceRequest>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for ServiceWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        // Disconnect so the dispatcher's recv() returns.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            // A handler may tear down its own service; never join ourselves.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// In-process [`Transport`] backed by a [`TopologyManager`].
pub struct IntraProcessTransport {
    topology: Arc<TopologyManager>,
    channels: DashMap<String, Vec<Subscription>>,
    subscriptions: DashMap<SubscriptionId, String>,
    services: DashMap<String, ServiceWorker>,
    next_subscription: AtomicU64,
    closed: AtomicBool,
}

impl IntraProcessTransport {
    pub fn new(topology: Arc<TopologyManager>) -> Self {
        Self {
            topology,
            channels: DashMap::new(),
            subscriptions: DashMap::new(),
            services: DashMap::new(),
            next_subscription: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Process-wide transport feeding [`TopologyManager::global`].
    pub fn global() -> Arc<IntraProcessTransport> {
        static GLOBAL: OnceLock<Arc<IntraProcessTransport>> = OnceLock::new();
        Arc::clone(
            GLOBAL.get_or_init(|| Arc::new(IntraProcessTransport::new(TopologyManager::global()))),
        )
    }

    pub fn topology(&self) -> &Arc<TopologyManager> {
        &self.topology
    }

    /// Current number of subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, |subs| subs.len())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::TransportUnavailable(
                "intra-process transport closed".to_string(),
            ));
        }
        Ok(())
    }
}

impl Transport for IntraProcessTransport {
    fn advertise(&self, role: &Arc<RoleAttributes>) -> Result<()> {
        self.ensure_open()?;
        self.topology.join(Arc::clone(role));
        Ok(())
    }

    fn withdraw(&self, role: &RoleAttributes) {
        self.topology.leave(role.id);
    }

    fn publish(&self, channel: &str, envelope: Arc<Envelope>) -> Result<()> {
        self.ensure_open()?;

        // Clone the callbacks so no shard lock is held while they run.
        let callbacks: Vec<DeliveryCallback> = match self.channels.get(channel) {
            Some(subs) => subs.iter().map(|s| Arc::clone(&s.callback)).collect(),
            None => return Ok(()),
        };

        for callback in callbacks {
            callback(&envelope);
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str, callback: DeliveryCallback) -> Result<SubscriptionId> {
        self.ensure_open()?;
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(Subscription { id, callback });
        self.subscriptions.insert(id, channel.to_string());
        log::debug!("[Transport] subscription {:?} on '{}'", id, channel);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let Some((_, channel)) = self.subscriptions.remove(&id) else {
            return;
        };
        let now_empty = match self.channels.get_mut(&channel) {
            Some(mut subs) => {
                subs.retain(|s| s.id != id);
                subs.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.channels.remove_if(&channel, |_, subs| subs.is_empty());
        }
    }

    fn register_service(&self, name: &str, handler: ServiceHandler) -> Result<()> {
        self.ensure_open()?;
        // The vacant entry keeps the shard locked until the worker is in place.
        let slot = match self.services.entry(name.to_string()) {
            Entry::Occupied(_) => {
                return Err(Error::InvalidState(format!(
                    "service '{}' is already served",
                    name
                )));
            }
            Entry::Vacant(slot) => slot,
        };

        let (tx, rx) = channel::unbounded::<ServiceRequest>();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name(format!("svc-{}", name))
            .spawn(move || {
                while let Ok(request) = rx.recv() {
                    if worker_stop.load(Ordering::Acquire) {
                        break;
                    }
                    handler(request);
                }
                // Pending requests drop here and resolve as NoResponse.
            })?;

        slot.insert(ServiceWorker {
            tx: Some(tx),
            stop,
            handle: Some(handle),
        });
        log::debug!("[Transport] service '{}' registered", name);
        Ok(())
    }

    fn unregister_service(&self, name: &str) {
        // Remove first, drop (and join) outside the shard lock.
        let removed = self.services.remove(name);
        if removed.is_some() {
            log::debug!("[Transport] service '{}' unregistered", name);
        }
        drop(removed);
    }

    fn call_service(&self, name: &str, request: ServiceRequest) -> RpcResult<()> {
        self.ensure_open()?;
        let tx = match self.services.get(name) {
            Some(worker) => worker.tx.clone(),
            None => None,
        };
        let Some(tx) = tx else {
            return Err(RpcError::ServiceNotFound(name.to_string()));
        };
        tx.send(request)
            .map_err(|_| RpcError::ServiceNotFound(name.to_string()))
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        for name in names {
            self.unregister_service(&name);
        }
        self.channels.clear();
        self.subscriptions.clear();
        log::debug!("[Transport] intra-process transport closed");
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
