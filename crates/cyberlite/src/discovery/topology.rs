// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::{Condvar, Mutex, RwLock};

use super::role::{RoleAttributes, RoleId, RoleKind};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Writers and readers advertised on one channel, in join order.
#[derive(Debug, Clone, Default)]
pub struct ChannelRoles {
    pub writers: Vec<Arc<RoleAttributes>>,
    pub readers: Vec<Arc<RoleAttributes>>,
}

impl ChannelRoles {
    /// Writers first, then readers.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RoleAttributes>> {
        self.writers.iter().chain(self.readers.iter())
    }

    fn is_empty(&self) -> bool {
        self.writers.is_empty() && self.readers.is_empty()
    }
}

/// Services and clients advertised under one service name.
#[derive(Debug, Clone, Default)]
pub struct ServiceRoles {
    pub servers: Vec<Arc<RoleAttributes>>,
    pub clients: Vec<Arc<RoleAttributes>>,
}

impl ServiceRoles {
    fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.clients.is_empty()
    }
}

/// Immutable point-in-time view of every advertised role.
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    generation: u64,
    roles: HashMap<RoleId, Arc<RoleAttributes>>,
    channels: BTreeMap<String, ChannelRoles>,
    services: BTreeMap<String, ServiceRoles>,
}

impl TopologySnapshot {
    /// Incremented by every join/leave; 0 for an empty manager.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn role(&self, id: RoleId) -> Option<&Arc<RoleAttributes>> {
        self.roles.get(&id)
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn channel(&self, channel: &str) -> Option<&ChannelRoles> {
        self.channels.get(channel)
    }

    /// Channel names with at least one writer or reader, sorted.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelRoles)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Type of the first advertised writer, else of the first reader.
    pub fn message_type_of(&self, channel: &str) -> Option<&str> {
        self.channels
            .get(channel)
            .and_then(|roles| roles.iter().next())
            .map(|role| role.message_type.as_str())
    }

    pub fn has_service(&self, service: &str) -> bool {
        self.services
            .get(service)
            .is_some_and(|roles| !roles.servers.is_empty())
    }

    pub fn service(&self, service: &str) -> Option<&ServiceRoles> {
        self.services.get(service)
    }

    /// Service names with at least one server or client, sorted.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    fn insert(&mut self, role: Arc<RoleAttributes>) {
        let name = role.channel_name.clone();
        let slot = match role.kind {
            RoleKind::Writer => &mut self.channels.entry(name).or_default().writers,
            RoleKind::Reader => &mut self.channels.entry(name).or_default().readers,
            RoleKind::Service => &mut self.services.entry(name).or_default().servers,
            RoleKind::Client => &mut self.services.entry(name).or_default().clients,
        };
        slot.push(Arc::clone(&role));
        self.roles.insert(role.id, role);
    }

    fn remove(&mut self, id: RoleId) -> Option<Arc<RoleAttributes>> {
        let role = self.roles.remove(&id)?;
        let name = role.channel_name.as_str();
        if role.kind.is_channel() {
            if let Some(entry) = self.channels.get_mut(name) {
                entry.writers.retain(|r| r.id != id);
                entry.readers.retain(|r| r.id != id);
                if entry.is_empty() {
                    self.channels.remove(name);
                }
            }
        } else if let Some(entry) = self.services.get_mut(name) {
            entry.servers.retain(|r| r.id != id);
            entry.clients.retain(|r| r.id != id);
            if entry.is_empty() {
                self.services.remove(name);
            }
        }
        Some(role)
    }
}

// ---------------------------------------------------------------------------
// Change notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Join,
    Leave,
}

/// One join or leave, delivered to listeners after the snapshot is swapped.
#[derive(Debug, Clone)]
pub struct TopologyChange {
    pub kind: ChangeKind,
    pub role: Arc<RoleAttributes>,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&TopologyChange) + Send + Sync>;

// ---------------------------------------------------------------------------
// TopologyManager
// ---------------------------------------------------------------------------

/// Registry of every advertised writer, reader, service and client.
///
/// Queries read an `ArcSwap` snapshot and never take a lock. Updates are
/// serialized by `update`, which also carries the generation that readiness
/// waits block on.
pub struct TopologyManager {
    snapshot: ArcSwap<TopologySnapshot>,
    update: Mutex<u64>,
    changed: Condvar,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl TopologyManager {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(TopologySnapshot::default()),
            update: Mutex::new(0),
            changed: Condvar::new(),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Process-wide manager used by `Domain::global()`.
    pub fn global() -> Arc<TopologyManager> {
        static GLOBAL: OnceLock<Arc<TopologyManager>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(TopologyManager::new())))
    }

    pub fn snapshot(&self) -> Arc<TopologySnapshot> {
        self.snapshot.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.load().generation
    }

    /// Record an advertised role. Re-advertising the same id is ignored.
    pub fn join(&self, role: Arc<RoleAttributes>) {
        let mut generation = self.update.lock();
        let current = self.snapshot.load_full();
        if current.roles.contains_key(&role.id) {
            log::debug!("[Topology] {} already advertised", role.id);
            return;
        }

        let mut next = (*current).clone();
        next.insert(Arc::clone(&role));
        *generation += 1;
        next.generation = *generation;
        let change = TopologyChange {
            kind: ChangeKind::Join,
            role,
            generation: *generation,
        };
        self.snapshot.store(Arc::new(next));
        drop(generation);

        log::debug!(
            "[Topology] join {:?} '{}' ({}) from node '{}'",
            change.role.kind,
            change.role.channel_name,
            change.role.message_type,
            change.role.node_name
        );
        self.changed.notify_all();
        self.notify_listeners(&change);
    }

    /// Remove a role; returns it if it was known.
    pub fn leave(&self, id: RoleId) -> Option<Arc<RoleAttributes>> {
        let mut generation = self.update.lock();
        let current = self.snapshot.load_full();
        if !current.roles.contains_key(&id) {
            return None;
        }

        let mut next = (*current).clone();
        let role = next.remove(id)?;
        *generation += 1;
        next.generation = *generation;
        let change = TopologyChange {
            kind: ChangeKind::Leave,
            role: Arc::clone(&role),
            generation: *generation,
        };
        self.snapshot.store(Arc::new(next));
        drop(generation);

        log::debug!(
            "[Topology] leave {:?} '{}' from node '{}'",
            role.kind,
            role.channel_name,
            role.node_name
        );
        self.changed.notify_all();
        self.notify_listeners(&change);
        Some(role)
    }

    /// Register a callback for every subsequent join/leave.
    ///
    /// Listeners run on the thread that applied the change, outside any
    /// topology lock.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&TopologyChange) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn notify_listeners(&self, change: &TopologyChange) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }

    // -----------------------------------------------------------------------
    // Readiness
    // -----------------------------------------------------------------------

    /// Block until `predicate` holds for the current snapshot or `timeout`
    /// elapses. Returns the final predicate value.
    pub fn wait_until<P>(&self, predicate: P, timeout: Duration) -> bool
    where
        P: Fn(&TopologySnapshot) -> bool,
    {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.update.lock();
        loop {
            if predicate(&self.snapshot.load()) {
                return true;
            }
            match deadline {
                None => self.changed.wait(&mut guard),
                Some(deadline) => {
                    if self.changed.wait_until(&mut guard, deadline).timed_out() {
                        return predicate(&self.snapshot.load());
                    }
                }
            }
        }
    }

    /// Block until the generation moves past `after`.
    pub fn wait_for_generation(&self, after: u64, timeout: Duration) -> bool {
        self.wait_until(|snap| snap.generation > after, timeout)
    }

    pub fn wait_for_channel(&self, channel: &str, timeout: Duration) -> bool {
        self.wait_until(|snap| snap.has_channel(channel), timeout)
    }

    /// Block until at least one server is advertised for `service`.
    pub fn wait_for_service(&self, service: &str, timeout: Duration) -> bool {
        self.wait_until(|snap| snap.has_service(service), timeout)
    }

    // -----------------------------------------------------------------------
    // Query surface
    // -----------------------------------------------------------------------

    /// Message type advertised on `channel`.
    ///
    /// Returns as soon as the channel is known, waiting at most `settle`.
    pub fn message_type_of(&self, channel: &str, settle: Duration) -> Option<String> {
        if !settle.is_zero() {
            self.wait_for_channel(channel, settle);
        }
        self.snapshot
            .load()
            .message_type_of(channel)
            .map(str::to_string)
    }

    /// Every channel with at least one writer or reader, after waiting `settle`.
    pub fn active_channels(&self, settle: Duration) -> BTreeSet<String> {
        settle_for(settle);
        self.snapshot
            .load()
            .channel_names()
            .map(str::to_string)
            .collect()
    }

    /// Serialized roles per channel (writers, then readers), after waiting `settle`.
    pub fn channel_roles(&self, settle: Duration) -> BTreeMap<String, Vec<Vec<u8>>> {
        settle_for(settle);
        let snapshot = self.snapshot.load();
        snapshot
            .channels()
            .map(|(name, roles)| {
                let encoded = roles
                    .iter()
                    .filter_map(|role| match role.encode() {
                        Ok(bytes) => Some(bytes),
                        Err(e) => {
                            log::warn!("[Topology] cannot serialize {}: {}", role.id, e);
                            None
                        }
                    })
                    .collect();
                (name.to_string(), encoded)
            })
            .collect()
    }

    /// Every service name with at least one server or client.
    pub fn services(&self) -> BTreeSet<String> {
        self.snapshot
            .load()
            .service_names()
            .map(str::to_string)
            .collect()
    }
}

impl Default for TopologyManager {
    fn default() -> Self {
        Self::new()
    }
}

fn settle_for(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
