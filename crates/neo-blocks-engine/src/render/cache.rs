use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

use super::descriptor::TabDescriptor;
use crate::models::{Block, BlockId, BlockTypeDefinition};

/// Deterministic key for one `(block type, block, namespace, static)` render
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        prefix: &str,
        block_type_id: u64,
        block_id: Option<BlockId>,
        namespace: &str,
        is_static: bool,
    ) -> Self {
        let block_id = block_id.map(|id| id.to_string()).unwrap_or_default();
        let static_flag = if is_static { "s" } else { "" };
        Self(format!(
            "{prefix}:{block_type_id}:{block_id}:{namespace}:{static_flag}"
        ))
    }

    /// Start of every key rendered for one block, in any namespace
    pub fn block_prefix(prefix: &str, block_type_id: u64, block_id: BlockId) -> String {
        format!("{prefix}:{block_type_id}:{block_id}:")
    }

    /// Start of every key rendered for one block type, templates included
    pub fn block_type_prefix(prefix: &str, block_type_id: u64) -> String {
        format!("{prefix}:{block_type_id}:")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Versions a cached descriptor was computed from.
///
/// `block_version` is `None` for the template render of a block type, so that
/// entry depends on the type's layout alone. `namespace_version` covers the
/// fully resolved block namespace: the key only carries the input name, while
/// rendered field names also depend on the ambient namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockDependency {
    pub type_version: u64,
    pub block_version: Option<u64>,
    pub namespace_version: u64,
}

impl BlockDependency {
    pub fn new(
        block_type: &BlockTypeDefinition,
        block: Option<&Block>,
        block_namespace: &str,
    ) -> Self {
        Self {
            type_version: type_version(block_type),
            block_version: block.map(block_version),
            namespace_version: xxh3_64(block_namespace.as_bytes()),
        }
    }
}

/// Fingerprint of everything about a block type that shows up in its markup
pub fn type_version(block_type: &BlockTypeDefinition) -> u64 {
    let mut hasher = Xxh3::new();
    block_type.id.hash(&mut hasher);
    block_type.layout.hash(&mut hasher);
    hasher.finish()
}

/// Fingerprint of a block's identity, content and field errors
pub fn block_version(block: &Block) -> u64 {
    let mut hasher = Xxh3::new();
    block.id.hash(&mut hasher);
    block.type_id.hash(&mut hasher);
    for (handle, value) in &block.content {
        handle.hash(&mut hasher);
        value.to_string().hash(&mut hasher);
    }
    block.errors.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub tabs: Arc<Vec<TabDescriptor>>,
    pub dependency: BlockDependency,
}

/// Key-value store shared by every request in the process.
///
/// No locking happens around compute-then-store: two requests missing the same
/// key may both compute and both write. Entries are pure functions of their
/// inputs, so the last write wins harmlessly.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;
    fn set(&self, key: CacheKey, entry: CacheEntry);
    fn remove(&self, key: &CacheKey);
    /// Drop every entry whose key starts with `key_prefix`
    fn remove_prefix(&self, key_prefix: &str);
    fn clear(&self);
}

/// In-process [`CacheStore`]
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    fn remove(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    fn remove_prefix(&self, key_prefix: &str) {
        self.entries
            .retain(|key, _| !key.as_str().starts_with(key_prefix));
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
