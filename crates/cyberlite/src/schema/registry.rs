// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use parking_lot::RwLock;

use super::descriptor::{SchemaBundle, SchemaDescriptor};
use crate::Result;

// ---------------------------------------------------------------------------
// SchemaResolver
// ---------------------------------------------------------------------------

/// Lookup/registration contract nodes are built against.
///
/// [`SchemaRegistry`] is the bundled implementation; anything that can map a
/// type name to an encoded descriptor can stand in for it.
pub trait SchemaResolver: Send + Sync {
    /// Encoded [`SchemaBundle`] for `type_name`, or `None` when the type (or
    /// one of its dependencies) is unknown.
    fn resolve(&self, type_name: &str) -> Option<Vec<u8>>;

    /// Register a descriptor and return its version number.
    fn register(&self, descriptor: SchemaDescriptor) -> Result<u32>;

    /// Register from encoded form (a bundle or a bare descriptor).
    ///
    /// Bundled dependencies are registered first; the root's version is
    /// returned.
    fn register_encoded(&self, bytes: &[u8]) -> Result<u32> {
        let bundle = SchemaBundle::decode_lenient(bytes)?;
        for dep in bundle.dependencies {
            self.register(dep)?;
        }
        self.register(bundle.root)
    }
}

// ---------------------------------------------------------------------------
// SchemaEntry
// ---------------------------------------------------------------------------

/// A single versioned schema stored in the registry.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub descriptor: SchemaDescriptor,
    /// Monotonically increasing version number starting at 1.
    pub version: u32,
    /// 64-bit hash of the descriptor for fast equality checks.
    pub hash: u64,
    pub registered_at: SystemTime,
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// In-memory store of versioned schemas keyed by type name.
pub struct SchemaRegistry {
    /// Map from type name to an ordered list of versions (index 0 = v1).
    schemas: RwLock<HashMap<String, Vec<SchemaEntry>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry used by `Domain::global()`.
    pub fn global() -> Arc<SchemaRegistry> {
        static GLOBAL: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SchemaRegistry::new())))
    }

    /// Latest descriptor registered for `type_name`.
    pub fn latest(&self, type_name: &str) -> Option<SchemaDescriptor> {
        self.schemas
            .read()
            .get(type_name)
            .and_then(|v| v.last())
            .map(|e| e.descriptor.clone())
    }

    /// Specific version of a schema (1-indexed).
    pub fn version(&self, type_name: &str, version: u32) -> Option<SchemaEntry> {
        if version == 0 {
            return None;
        }
        self.schemas
            .read()
            .get(type_name)
            .and_then(|v| v.get((version - 1) as usize))
            .cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.read().contains_key(type_name)
    }

    /// All registered type names (sorted for determinism).
    pub fn list_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn versions(&self, type_name: &str) -> Vec<u32> {
        match self.schemas.read().get(type_name) {
            Some(versions) => versions.iter().map(|e| e.version).collect(),
            None => Vec::new(),
        }
    }

    /// Latest descriptor plus its transitive dependencies, leaves first.
    pub fn bundle(&self, type_name: &str) -> Option<SchemaBundle> {
        let schemas = self.schemas.read();
        let root = schemas.get(type_name)?.last()?.descriptor.clone();

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(root.type_name.clone());
        for dep in &root.dependencies {
            if !collect_dependencies(&schemas, dep, &mut visited, &mut ordered) {
                log::warn!(
                    "[Schema] '{}' depends on unregistered type '{}'",
                    type_name,
                    dep
                );
                return None;
            }
        }

        Some(SchemaBundle {
            root,
            dependencies: ordered,
        })
    }

    /// Compute a deterministic 64-bit hash for the given descriptor.
    pub(crate) fn compute_hash(descriptor: &SchemaDescriptor) -> u64 {
        let mut hasher = DefaultHasher::new();
        descriptor.hash(&mut hasher);
        hasher.finish()
    }
}

/// Depth-first walk; dependencies land in `out` before their dependents.
fn collect_dependencies(
    schemas: &HashMap<String, Vec<SchemaEntry>>,
    type_name: &str,
    visited: &mut HashSet<String>,
    out: &mut Vec<SchemaDescriptor>,
) -> bool {
    if !visited.insert(type_name.to_string()) {
        return true;
    }
    let Some(entry) = schemas.get(type_name).and_then(|v| v.last()) else {
        return false;
    };
    for dep in &entry.descriptor.dependencies {
        if !collect_dependencies(schemas, dep, visited, out) {
            return false;
        }
    }
    out.push(entry.descriptor.clone());
    true
}

impl SchemaResolver for SchemaRegistry {
    fn resolve(&self, type_name: &str) -> Option<Vec<u8>> {
        let bundle = self.bundle(type_name)?;
        match bundle.encode() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("[Schema] cannot encode '{}': {}", type_name, e);
                None
            }
        }
    }

    /// Identical content to the latest version is a no-op returning that
    /// version; anything else becomes a new version.
    fn register(&self, descriptor: SchemaDescriptor) -> Result<u32> {
        descriptor.validate()?;
        let hash = Self::compute_hash(&descriptor);

        let mut schemas = self.schemas.write();
        let versions = schemas.entry(descriptor.type_name.clone()).or_default();

        if let Some(latest) = versions.last() {
            if latest.hash == hash && latest.descriptor == descriptor {
                return Ok(latest.version);
            }
        }

        let version = (versions.len() as u32) + 1;
        log::debug!(
            "[Schema] registered '{}' v{} ({:?})",
            descriptor.type_name,
            version,
            descriptor.format
        );
        versions.push(SchemaEntry {
            descriptor,
            version,
            hash,
            registered_at: SystemTime::now(),
        });
        Ok(version)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaFormat;
    use crate::Error;

    fn proto(name: &str, content: &str) -> SchemaDescriptor {
        SchemaDescriptor::new(name, SchemaFormat::Proto, content)
    }

    #[test]
    fn register_same_name_increments_version() {
        let reg = SchemaRegistry::new();
        let v1 = reg.register(proto("Pose", "message Pose { double x = 1; }")).unwrap();
        let v2 = reg
            .register(proto("Pose", "message Pose { double x = 1; double y = 2; }"))
            .unwrap();
        assert_eq!((v1, v2), (1, 2));
        assert_eq!(reg.versions("Pose"), vec![1, 2]);
        assert!(reg.latest("Pose").unwrap().content.contains("double y"));
        assert!(!reg.version("Pose", 1).unwrap().descriptor.content.contains("double y"));
    }

    #[test]
    fn identical_reregistration_is_idempotent() {
        let reg = SchemaRegistry::new();
        let desc = proto("Pose", "message Pose {}");
        assert_eq!(reg.register(desc.clone()).unwrap(), 1);
        assert_eq!(reg.register(desc).unwrap(), 1);
        assert_eq!(reg.versions("Pose"), vec![1]);
    }

    #[test]
    fn empty_content_rejected() {
        let reg = SchemaRegistry::new();
        let err = reg.register(proto("Pose", "")).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
        assert!(!reg.contains("Pose"));
    }

    #[test]
    fn list_types_is_sorted() {
        let reg = SchemaRegistry::new();
        reg.register(proto("Zebra", "message Zebra {}")).unwrap();
        reg.register(proto("Alpha", "message Alpha {}")).unwrap();
        assert_eq!(reg.list_types(), vec!["Alpha", "Zebra"]);
    }

    #[test]
    fn resolve_includes_transitive_dependencies_leaves_first() {
        let reg = SchemaRegistry::new();
        reg.register(proto("Header", "message Header {}")).unwrap();
        reg.register(proto("Point", "message Point {}").with_dependency("Header"))
            .unwrap();
        reg.register(
            proto("Pose", "message Pose {}")
                .with_dependency("Point")
                .with_dependency("Header"),
        )
        .unwrap();

        let bytes = reg.resolve("Pose").expect("resolvable");
        let bundle = SchemaBundle::decode(&bytes).unwrap();
        assert_eq!(bundle.root.type_name, "Pose");
        let deps: Vec<_> = bundle.dependencies.iter().map(|d| d.type_name.as_str()).collect();
        assert_eq!(deps, vec!["Header", "Point"]);
    }

    #[test]
    fn missing_dependency_leaves_type_unresolved() {
        let reg = SchemaRegistry::new();
        reg.register(proto("Pose", "message Pose {}").with_dependency("Header"))
            .unwrap();
        assert!(reg.resolve("Pose").is_none());
        assert!(reg.resolve("Unknown").is_none());
    }

    #[test]
    fn resolved_bundle_registers_into_another_registry() {
        let source = SchemaRegistry::new();
        source.register(proto("Header", "message Header {}")).unwrap();
        source
            .register(proto("Pose", "message Pose {}").with_dependency("Header"))
            .unwrap();
        let bytes = source.resolve("Pose").unwrap();

        let target = SchemaRegistry::new();
        assert_eq!(target.register_encoded(&bytes).unwrap(), 1);
        assert!(target.contains("Header"));
        assert_eq!(target.resolve("Pose"), Some(bytes));
    }

    #[test]
    fn schema_hash_uniqueness() {
        let a = SchemaRegistry::compute_hash(&proto("A", "message A {}"));
        let b = SchemaRegistry::compute_hash(&proto("B", "message A {}"));
        assert_ne!(a, b);
        assert_eq!(a, SchemaRegistry::compute_hash(&proto("A", "message A {}")));
    }
}
