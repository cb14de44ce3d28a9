use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::block_type::OwnerContext;

/// Persisted identifier of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field handle -> stored value. Interpreted by the host's field types only.
pub type BlockContent = BTreeMap<String, Value>;

/// Field handle -> error messages for that field
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Where a block stands relative to its last save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    New,
    Unchanged,
    Modified,
}

/// One instance of content conforming to a block type.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// `None` until the block is persisted
    pub id: Option<BlockId>,
    pub field_id: u64,
    pub type_id: u64,
    pub owner_id: Option<u64>,
    pub owner_locale: String,
    pub enabled: bool,
    pub collapsed: bool,
    /// Nesting depth, 1 = top level
    pub level: u32,
    pub sort_order: u32,
    pub modified: bool,
    pub content: BlockContent,
    /// Path to this block's own posted field values, e.g. `fields.body.new1.fields`
    pub content_post_location: Option<String>,
    pub errors: FieldErrors,
}

impl Block {
    /// A fresh, unsaved block owned by `owner`
    pub fn new(field_id: u64, type_id: u64, owner: &OwnerContext) -> Self {
        Self {
            id: None,
            field_id,
            type_id,
            owner_id: owner.id,
            owner_locale: owner.locale.clone(),
            enabled: true,
            collapsed: false,
            level: 1,
            sort_order: 0,
            modified: true,
            content: BlockContent::new(),
            content_post_location: None,
            errors: FieldErrors::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn change_state(&self) -> ChangeState {
        match (self.id, self.modified) {
            (None, _) => ChangeState::New,
            (Some(_), false) => ChangeState::Unchanged,
            (Some(_), true) => ChangeState::Modified,
        }
    }

    /// Level as the client sees it (0-based)
    pub fn display_level(&self) -> u32 {
        self.level.saturating_sub(1)
    }

    /// Replace content with posted field values. Non-object payloads leave the
    /// content untouched.
    pub fn set_content_from_post(&mut self, fields: &Value) {
        if let Value::Object(map) = fields {
            self.content = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|messages| !messages.is_empty())
    }

    pub fn field_errors(&self, handle: &str) -> &[String] {
        self.errors.get(handle).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The persisted row for this block, once it has an id
    pub fn to_record(&self) -> Option<BlockRecord> {
        Some(BlockRecord {
            id: self.id?,
            field_id: self.field_id,
            type_id: self.type_id,
            owner_id: self.owner_id?,
            owner_locale: self.owner_locale.clone(),
            enabled: self.enabled,
            collapsed: self.collapsed,
            level: self.level,
            sort_order: self.sort_order,
        })
    }
}

/// Row shape of the block table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub id: BlockId,
    pub field_id: u64,
    pub type_id: u64,
    pub owner_id: u64,
    pub owner_locale: String,
    pub enabled: bool,
    pub collapsed: bool,
    pub level: u32,
    pub sort_order: u32,
}

impl BlockRecord {
    /// Rehydrate a stored block. Loaded blocks start out unmodified.
    pub fn into_block(self, content: BlockContent) -> Block {
        Block {
            id: Some(self.id),
            field_id: self.field_id,
            type_id: self.type_id,
            owner_id: Some(self.owner_id),
            owner_locale: self.owner_locale,
            enabled: self.enabled,
            collapsed: self.collapsed,
            level: self.level,
            sort_order: self.sort_order,
            modified: false,
            content,
            content_post_location: None,
            errors: FieldErrors::new(),
        }
    }
}
