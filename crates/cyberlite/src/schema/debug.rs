// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Human-readable rendering of a raw payload.

use std::fmt::Write as _;

use super::descriptor::{SchemaBundle, SchemaFormat};
use super::registry::SchemaResolver;
use crate::config::RAW_DATA_TYPE;
use crate::{Error, Result};

/// Render `payload` of type `type_name` for display.
///
/// JSON-format types are pretty-printed, printable UTF-8 is quoted, and
/// everything else falls back to a 16-bytes-per-row hex dump.
///
/// # Errors
///
/// `EmptyMessageType`, `EmptyPayload`, or `SchemaUnresolved` when the type
/// is not registered.
pub fn debug_string(
    resolver: &dyn SchemaResolver,
    type_name: &str,
    payload: &[u8],
) -> Result<String> {
    if type_name.is_empty() {
        return Err(Error::EmptyMessageType);
    }
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }

    if type_name != RAW_DATA_TYPE {
        let encoded = resolver
            .resolve(type_name)
            .ok_or_else(|| Error::SchemaUnresolved(type_name.to_string()))?;
        let bundle = SchemaBundle::decode(&encoded)?;
        if bundle.root.format == SchemaFormat::Json {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(payload) {
                return serde_json::to_string_pretty(&value)
                    .map_err(|e| Error::InvalidSchema(e.to_string()));
            }
        }
    }

    if let Some(text) = printable_text(payload) {
        return Ok(format!("\"{}\"", text));
    }
    Ok(hex_dump(payload))
}

fn printable_text(data: &[u8]) -> Option<&str> {
    let s = std::str::from_utf8(data).ok()?;
    if s.chars().all(|c| !c.is_control() || c.is_ascii_whitespace()) {
        Some(s)
    } else {
        None
    }
}

fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:04x}  ", i * 16);
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                out.push(' ');
            }
            let _ = write!(out, "{:02x} ", byte);
        }
        for j in chunk.len()..16 {
            if j == 8 {
                out.push(' ');
            }
            out.push_str("   ");
        }
        out.push_str(" |");
        for byte in chunk {
            out.push(if (0x20..0x7f).contains(byte) {
                *byte as char
            } else {
                '.'
            });
        }
        out.push_str("|\n");
    }
    out
}
