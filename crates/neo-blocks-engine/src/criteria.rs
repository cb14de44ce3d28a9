//! Lazy access to a field's blocks for one owner.
//!
//! A field value is a [`BlockCriteria`] rather than a list: it only hits the
//! store when read. Right after a form submission the criteria instead holds
//! the freshly built blocks, and reads return those without a query.

use crate::models::{Block, FieldRef, OwnerContext};
use crate::store::{BlockQuery, BlockStore, StoreError};
use crate::tree::BlockSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaScope {
    Owner(u64),
    /// Matches no blocks, e.g. for an owner that hasn't been saved yet
    Nothing,
}

/// Raw field value as the host hands it over
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Nothing in hand; read from the store
    Stored,
    /// Explicitly empty
    Empty,
    /// Blocks built from a submission
    Blocks(Vec<Block>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockCriteria {
    pub field_id: u64,
    pub scope: CriteriaScope,
    pub locale: String,
    pub enabled_only: bool,
    pub limit: Option<usize>,
    matched: Option<BlockSequence>,
}

impl BlockCriteria {
    pub fn new(field: &FieldRef, owner: &OwnerContext) -> Self {
        Self {
            field_id: field.id,
            scope: owner.id.map_or(CriteriaScope::Nothing, CriteriaScope::Owner),
            locale: owner.locale.clone(),
            enabled_only: true,
            limit: None,
            matched: None,
        }
    }

    /// The criteria backing a field value
    pub fn prepare(field: &FieldRef, owner: &OwnerContext, value: FieldValue) -> Self {
        let mut criteria = Self::new(field, owner);
        match value {
            FieldValue::Stored => {}
            FieldValue::Empty => criteria.set_matched(Vec::new()),
            FieldValue::Blocks(blocks) => criteria.set_matched(blocks),
        }
        criteria
    }

    /// Serve reads from `blocks`. Status and limit no longer apply: disabled
    /// blocks of a submission still belong to the value.
    pub fn set_matched(&mut self, blocks: Vec<Block>) {
        self.enabled_only = false;
        self.limit = None;
        self.matched = Some(BlockSequence::new(blocks));
    }

    pub fn matched(&self) -> Option<&BlockSequence> {
        self.matched.as_ref()
    }

    pub fn enabled_only(mut self, enabled_only: bool) -> Self {
        self.enabled_only = enabled_only;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Store query equivalent of these criteria; `None` when nothing can match
    pub fn to_query(&self) -> Option<BlockQuery> {
        let CriteriaScope::Owner(owner_id) = self.scope else {
            return None;
        };
        Some(
            BlockQuery::for_field(self.field_id)
                .owned_by(owner_id)
                .in_locale(self.locale.clone())
                .enabled_only(self.enabled_only)
                .limit(self.limit),
        )
    }

    pub fn find(&self, store: &dyn BlockStore) -> Result<Vec<Block>, StoreError> {
        if let Some(matched) = &self.matched {
            return Ok(matched.blocks().to_vec());
        }
        match self.to_query() {
            Some(query) => store.find_blocks(&query),
            None => Ok(Vec::new()),
        }
    }

    pub fn count(&self, store: &dyn BlockStore) -> Result<usize, StoreError> {
        if let Some(matched) = &self.matched {
            return Ok(matched.len());
        }
        match self.to_query() {
            Some(query) => store.count_blocks(&query),
            None => Ok(0),
        }
    }
}

/// Owner query filter on whether a field has any blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptinessFilter {
    Empty,
    NotEmpty,
}

impl EmptinessFilter {
    /// Recognizes `:empty:`, `:notempty:` and `not :empty:`; any other value
    /// is not an emptiness filter.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            ":empty:" => Some(Self::Empty),
            ":notempty:" | "not :empty:" => Some(Self::NotEmpty),
            _ => None,
        }
    }

    pub fn matches(self, block_count: usize) -> bool {
        match self {
            Self::Empty => block_count == 0,
            Self::NotEmpty => block_count > 0,
        }
    }

    /// The subset of `owner_ids` passing this filter, in one store query
    pub fn filter_owners(
        self,
        store: &dyn BlockStore,
        field_id: u64,
        owner_ids: &[u64],
    ) -> Result<Vec<u64>, StoreError> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }
        let pairs = store.owner_block_pairs(field_id, owner_ids)?;
        Ok(owner_ids
            .iter()
            .copied()
            .filter(|owner| self.matches(pairs.iter().filter(|(o, _)| o == owner).count()))
            .collect())
    }
}
