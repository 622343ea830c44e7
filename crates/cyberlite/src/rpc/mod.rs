// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/response on top of the transport's service primitives.
//!
//! # Architecture
//!
//! ```text
//!   Client                                        Service
//!   ------                                        -------
//!   send_request(payload)
//!     id = (client_id, seq)
//!     pending[id] = slot
//!     Transport::call_service ---- request ---->  handler(envelope) -> reply
//!                                                 or inbox -> read / respond
//!     slot.wait_until(deadline) <--- Responder ----
//!     pending.remove(id)
//! ```
//!
//! Correlation is by [`RequestId`]: a reply can only fill the slot of the
//! request that produced it. Node shutdown fills every open slot with
//! [`RpcError::Shutdown`].

mod client;
mod error;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use client::Client;
pub use error::{RpcError, RpcResult};
pub use service::{PendingRequest, RequestHandler, Service};
pub use types::RequestId;
