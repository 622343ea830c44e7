// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process lifecycle.
//!
//! `init` is optional: nodes can be built without it. `shutdown` is
//! process-wide and final: it shuts down every live node and refuses to
//! build new ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::node::NodeContext;
use crate::{Error, Result};

struct RuntimeState {
    app_name: Mutex<Option<String>>,
    initialized: AtomicBool,
    shutdown: AtomicBool,
    nodes: Mutex<Vec<Weak<NodeContext>>>,
}

fn state() -> &'static RuntimeState {
    static STATE: OnceLock<RuntimeState> = OnceLock::new();
    STATE.get_or_init(|| RuntimeState {
        app_name: Mutex::new(None),
        initialized: AtomicBool::new(false),
        shutdown: AtomicBool::new(false),
        nodes: Mutex::new(Vec::new()),
    })
}

/// Mark the process as initialized under `app_name`.
///
/// Returns false if it was already initialized (the first name is kept).
pub fn init(app_name: &str) -> bool {
    let state = state();
    let mut name = state.app_name.lock();
    if state.initialized.swap(true, Ordering::AcqRel) {
        log::debug!("[Init] already initialized as {:?}", name.as_deref());
        return false;
    }
    *name = Some(app_name.to_string());
    log::info!("[Init] '{}' initialized", app_name);
    true
}

/// Initialized and not shut down.
pub fn ok() -> bool {
    let state = state();
    state.initialized.load(Ordering::Acquire) && !state.shutdown.load(Ordering::Acquire)
}

pub fn is_shutdown() -> bool {
    state().shutdown.load(Ordering::Acquire)
}

pub fn app_name() -> Option<String> {
    state().app_name.lock().clone()
}

/// Shut down every live node. Later node construction fails with
/// `NodeUnavailable`. Idempotent.
pub fn shutdown() {
    let state = state();
    let nodes = {
        let mut nodes = state.nodes.lock();
        if state.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        std::mem::take(&mut *nodes)
    };

    let mut count = 0usize;
    for ctx in nodes.iter().filter_map(Weak::upgrade) {
        if ctx.shutdown() {
            count += 1;
        }
    }
    log::info!("[Init] process shut down ({} nodes)", count);
}

/// Register a freshly built node with the process lifecycle.
pub(crate) fn track_node(ctx: &Arc<NodeContext>) -> Result<()> {
    let state = state();
    let mut nodes = state.nodes.lock();
    if state.shutdown.load(Ordering::Acquire) {
        return Err(Error::NodeUnavailable(ctx.name().to_string()));
    }
    nodes.retain(|n| n.strong_count() > 0);
    nodes.push(Arc::downgrade(ctx));
    Ok(())
}
