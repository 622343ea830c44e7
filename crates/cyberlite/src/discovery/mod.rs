// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery: advertised roles and the process-wide topology.
//!
//! Every writer, reader, service and client produces one immutable
//! [`RoleAttributes`] at construction. The transport forwards advertisements
//! to a [`TopologyManager`], which publishes them as immutable
//! [`TopologySnapshot`]s. Readers of the snapshot never block writers.
//!
//! Knowledge is eventually consistent. Callers that just joined should use
//! the readiness primitives (`wait_for_channel`, `wait_for_generation`,
//! listeners) rather than trusting an early negative answer.

mod role;
mod topology;


pub use role::{RoleAttributes, RoleId, RoleKind};
pub use topology::{
    ChangeKind, ChannelRoles, ListenerId, ServiceRoles, TopologyChange, TopologyManager,
    TopologySnapshot,
};
