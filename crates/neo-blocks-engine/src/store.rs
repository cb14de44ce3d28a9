//! Storage contracts the host implements, plus in-memory implementations.
//!
//! The engine decides what gets written; the store only keeps rows. Block
//! content is stored beside its row and is opaque to the store.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::models::{Block, BlockContent, BlockId, BlockRecord, FieldRef, FieldSettings, OwnerContext};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid Neo block ID: {0}")]
    BlockNotFound(BlockId),
    #[error("Blocks can't be saved before their owner has an id")]
    UnsavedOwner,
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Filter over persisted blocks. Results come back ordered by owner, then
/// sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockQuery {
    pub field_id: u64,
    pub owner_id: Option<u64>,
    pub locale: Option<String>,
    pub ids: Option<Vec<BlockId>>,
    pub enabled_only: bool,
    pub limit: Option<usize>,
}

impl BlockQuery {
    pub fn for_field(field_id: u64) -> Self {
        Self {
            field_id,
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owner_id: u64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn in_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_ids(mut self, ids: Vec<BlockId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn enabled_only(mut self, enabled_only: bool) -> Self {
        self.enabled_only = enabled_only;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, record: &BlockRecord) -> bool {
        record.field_id == self.field_id
            && self.owner_id.is_none_or(|owner| record.owner_id == owner)
            && self
                .locale
                .as_deref()
                .is_none_or(|locale| record.owner_locale == locale)
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&record.id))
            && (!self.enabled_only || record.enabled)
    }
}

pub trait BlockStore {
    fn find_blocks(&self, query: &BlockQuery) -> Result<Vec<Block>, StoreError>;

    fn count_blocks(&self, query: &BlockQuery) -> Result<usize, StoreError>;

    /// `(owner id, block id)` for every block of `field_id` owned by one of
    /// `owner_ids`, in a single round trip
    fn owner_block_pairs(
        &self,
        field_id: u64,
        owner_ids: &[u64],
    ) -> Result<Vec<(u64, BlockId)>, StoreError>;

    /// Persist `blocks` as the complete value of `field` for `owner`.
    ///
    /// New blocks get ids, every block gets its position as sort order, and
    /// content is only rewritten for new or modified blocks. Stored blocks of
    /// the same owner, field and locale that are not in `blocks` are deleted
    /// and returned.
    fn save_blocks(
        &mut self,
        field: &FieldRef,
        owner: &OwnerContext,
        blocks: &mut [Block],
    ) -> Result<Vec<BlockRecord>, StoreError>;

    /// Remove every block of a field; returns how many were removed
    fn delete_field_blocks(&mut self, field_id: u64) -> Result<usize, StoreError>;
}

pub trait SettingsStore {
    /// Persist settings, assigning ids to unsaved block types and groups
    fn save_settings(&mut self, settings: FieldSettings) -> Result<FieldSettings, StoreError>;

    fn load_settings(&self, field_id: u64) -> Result<Option<FieldSettings>, StoreError>;

    fn delete_field(&mut self, field_id: u64) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
struct StoredBlock {
    record: BlockRecord,
    content: BlockContent,
}

/// [`BlockStore`] over a map, counting read queries
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    rows: BTreeMap<BlockId, StoredBlock>,
    next_id: u64,
    queries: AtomicUsize,
    content_writes: usize,
    unavailable: AtomicBool,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read queries served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Content writes performed so far
    pub fn content_writes(&self) -> usize {
        self.content_writes
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&self, id: BlockId) -> Option<&BlockRecord> {
        self.rows.get(&id).map(|row| &row.record)
    }

    /// Make every following read fail, to exercise error paths
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin_query(&self) -> Result<(), StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        Ok(())
    }

    fn matching<'a>(&'a self, query: &'a BlockQuery) -> impl Iterator<Item = &'a StoredBlock> {
        let mut rows: Vec<_> = self
            .rows
            .values()
            .filter(|row| query.matches(&row.record))
            .collect();
        rows.sort_by_key(|row| (row.record.owner_id, row.record.sort_order));
        rows.into_iter().take(query.limit.unwrap_or(usize::MAX))
    }
}

impl BlockStore for InMemoryBlockStore {
    fn find_blocks(&self, query: &BlockQuery) -> Result<Vec<Block>, StoreError> {
        self.begin_query()?;
        Ok(self
            .matching(query)
            .map(|row| row.record.clone().into_block(row.content.clone()))
            .collect())
    }

    fn count_blocks(&self, query: &BlockQuery) -> Result<usize, StoreError> {
        self.begin_query()?;
        Ok(self.matching(query).count())
    }

    fn owner_block_pairs(
        &self,
        field_id: u64,
        owner_ids: &[u64],
    ) -> Result<Vec<(u64, BlockId)>, StoreError> {
        self.begin_query()?;
        Ok(self
            .rows
            .values()
            .filter(|row| {
                row.record.field_id == field_id && owner_ids.contains(&row.record.owner_id)
            })
            .map(|row| (row.record.owner_id, row.record.id))
            .collect())
    }

    fn save_blocks(
        &mut self,
        field: &FieldRef,
        owner: &OwnerContext,
        blocks: &mut [Block],
    ) -> Result<Vec<BlockRecord>, StoreError> {
        let owner_id = owner.id.ok_or(StoreError::UnsavedOwner)?;
        let mut kept = HashSet::with_capacity(blocks.len());

        for (position, block) in blocks.iter_mut().enumerate() {
            let write_content = block.is_new() || block.modified;
            let id = match block.id {
                Some(id) => id,
                None => {
                    self.next_id += 1;
                    BlockId(self.next_id)
                }
            };

            block.id = Some(id);
            block.field_id = field.id;
            block.owner_id = Some(owner_id);
            block.owner_locale = owner.locale.clone();
            block.sort_order = position as u32;

            let record = block.to_record().ok_or(StoreError::UnsavedOwner)?;
            let content = match self.rows.remove(&id) {
                Some(previous) if !write_content => previous.content,
                _ => {
                    self.content_writes += 1;
                    block.content.clone()
                }
            };
            self.rows.insert(id, StoredBlock { record, content });
            block.modified = false;
            kept.insert(id);
        }

        let stale: Vec<BlockId> = self
            .rows
            .iter()
            .filter(|(id, row)| {
                !kept.contains(*id)
                    && row.record.field_id == field.id
                    && row.record.owner_id == owner_id
                    && row.record.owner_locale == owner.locale
            })
            .map(|(id, _)| *id)
            .collect();
        let deleted: Vec<BlockRecord> = stale
            .iter()
            .filter_map(|id| self.rows.remove(id))
            .map(|row| row.record)
            .collect();
        log::debug!(
            "saved {} blocks of field {} for owner {owner_id}, deleted {}",
            kept.len(),
            field.handle,
            deleted.len()
        );

        Ok(deleted)
    }

    fn delete_field_blocks(&mut self, field_id: u64) -> Result<usize, StoreError> {
        let before = self.rows.len();
        self.rows.retain(|_, row| row.record.field_id != field_id);
        Ok(before - self.rows.len())
    }
}

/// [`SettingsStore`] over a map
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    fields: BTreeMap<u64, FieldSettings>,
    next_type_id: u64,
    next_group_id: u64,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn save_settings(&mut self, mut settings: FieldSettings) -> Result<FieldSettings, StoreError> {
        for block_type in &mut settings.block_types {
            block_type.field_id = settings.field.id;
            if block_type.id == 0 {
                self.next_type_id += 1;
                block_type.id = self.next_type_id;
            }
        }
        for group in &mut settings.groups {
            if group.id.is_none() {
                self.next_group_id += 1;
                group.id = Some(self.next_group_id);
            }
        }

        self.fields.insert(settings.field.id, settings.clone());
        Ok(settings)
    }

    fn load_settings(&self, field_id: u64) -> Result<Option<FieldSettings>, StoreError> {
        Ok(self.fields.get(&field_id).cloned())
    }

    fn delete_field(&mut self, field_id: u64) -> Result<(), StoreError> {
        self.fields.remove(&field_id);
        Ok(())
    }
}
