// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by every cyberlite entity.
//!
//! Request/response operations use [`crate::rpc::RpcError`], which wraps this
//! type for transport-level failures.

/// Errors returned by node, writer, reader and discovery operations.
///
/// # Example
///
/// ```rust,no_run
/// use cyberlite::{create_node, Error};
///
/// let node = create_node("planner").expect("node");
/// match node.create_writer("pose", "Pose", 2) {
///     Err(Error::SchemaUnresolved(ty)) => println!("register a schema for {} first", ty),
///     Err(e) => println!("other error: {}", e),
///     Ok(_) => println!("writer ready"),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Generic configuration error (bad YAML, out of range values).
    Config(String),
    /// Configuration file not found at specified path.
    ConfigFileNotFound(String),
    /// QoS profile is invalid (e.g. zero queue depth).
    InvalidQos(String),

    // ========================================================================
    // Entity Errors
    // ========================================================================
    /// The owning node (or the whole process) has been shut down.
    NodeUnavailable(String),
    /// No schema descriptor is registered for this message type.
    SchemaUnresolved(String),
    /// Invalid state for the requested operation.
    InvalidState(String),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Publish, subscribe or call failed at the transport boundary.
    TransportUnavailable(String),
    /// I/O error with underlying cause.
    Io(std::io::Error),

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// Schema descriptor could not be decoded or is malformed.
    InvalidSchema(String),
    /// Message type name is empty.
    EmptyMessageType,
    /// Payload is empty where content is required.
    EmptyPayload,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Configuration
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::ConfigFileNotFound(path) => write!(f, "Config file not found: {}", path),
            Error::InvalidQos(msg) => write!(f, "Invalid QoS: {}", msg),
            // Entity
            Error::NodeUnavailable(node) => write!(f, "Node '{}' is shut down", node),
            Error::SchemaUnresolved(ty) => write!(f, "Schema not found for type '{}'", ty),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            // Transport
            Error::TransportUnavailable(msg) => write!(f, "Transport unavailable: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            // Data
            Error::InvalidSchema(msg) => write!(f, "Invalid schema descriptor: {}", msg),
            Error::EmptyMessageType => write!(f, "Message type is empty"),
            Error::EmptyPayload => write!(f, "Payload is empty"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_subject() {
        let err = Error::SchemaUnresolved("Pose".to_string());
        assert_eq!(err.to_string(), "Schema not found for type 'Pose'");

        let err = Error::NodeUnavailable("planner".to_string());
        assert!(err.to_string().contains("planner"));
    }

    #[test]
    fn io_error_is_chained_as_source() {
        use std::error::Error as _;

        let err = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.source().is_some());
        assert!(Error::EmptyPayload.source().is_none());
    }
}
