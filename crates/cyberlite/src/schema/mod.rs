// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema registry: type name to schema descriptor.
//!
//! Writers and readers for any type other than `RawData` resolve their
//! descriptor here before they are built, and the encoded descriptor is
//! advertised with the endpoint so remote tooling can decode payloads.
//!
//! ```text
//!   Node::register_schema ---> SchemaResolver::register
//!                                     |
//!   Node::create_writer  ---> SchemaResolver::resolve --> RoleAttributes.schema_descriptor
//! ```

mod debug;
mod descriptor;
mod registry;

pub use debug::debug_string;
pub use descriptor::{SchemaBundle, SchemaDescriptor, SchemaFormat};
pub use registry::{SchemaEntry, SchemaRegistry, SchemaResolver};
