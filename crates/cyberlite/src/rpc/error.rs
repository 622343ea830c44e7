// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for request/response operations.

use std::fmt;

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur during a request/response exchange
#[derive(Debug)]
pub enum RpcError {
    /// No reply arrived before the deadline
    Timeout,

    /// The client's node (or the serving node) was shut down
    Shutdown,

    /// No service is registered under this name
    ServiceNotFound(String),

    /// The service dropped the request without answering
    NoResponse,

    /// The service handler reported a failure
    Remote(String),

    /// Operation not valid for this service
    InvalidState(String),

    /// Transport-level failure
    Transport(crate::Error),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "RPC request timed out"),
            Self::Shutdown => write!(f, "RPC endpoint shut down"),
            Self::ServiceNotFound(name) => write!(f, "Service not found: {}", name),
            Self::NoResponse => write!(f, "Service dropped the request without a reply"),
            Self::Remote(msg) => write!(f, "Remote handler failed: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid RPC state: {}", msg),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::Error> for RpcError {
    fn from(e: crate::Error) -> Self {
        match e {
            crate::Error::NodeUnavailable(_) => Self::Shutdown,
            crate::Error::InvalidState(msg) => Self::InvalidState(msg),
            other => Self::Transport(other),
        }
    }
}
