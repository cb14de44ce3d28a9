use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::layout::FieldLayout;

/// The field a block type set (and its blocks) belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub id: u64,
    pub handle: String,
}

impl FieldRef {
    pub fn new(id: u64, handle: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
        }
    }
}

/// The record a field value is attached to, as seen during one save or render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OwnerContext {
    /// `None` until the owner has been saved for the first time
    pub id: Option<u64>,
    pub locale: String,
    /// Where the owner's own content sits in the posted form, e.g. `fields`
    pub content_post_location: Option<String>,
}

impl OwnerContext {
    pub fn new(id: Option<u64>, locale: impl Into<String>) -> Self {
        Self {
            id,
            locale: locale.into(),
            content_post_location: None,
        }
    }

    pub fn with_content_post_location(mut self, location: impl Into<String>) -> Self {
        self.content_post_location = Some(location.into());
        self
    }
}

/// Schema for one kind of block: what it contains and where it may nest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTypeDefinition {
    pub id: u64,
    pub field_id: u64,
    pub name: String,
    pub handle: String,
    /// 0 means unbounded
    pub max_blocks: u32,
    pub sort_order: i32,
    /// Handles of the types that may be nested directly under this one
    pub child_blocks: BTreeSet<String>,
    /// Whether blocks of this type may sit at level 1
    pub top_level: bool,
    pub layout: FieldLayout,
}

impl BlockTypeDefinition {
    pub fn new(id: u64, field_id: u64, name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id,
            field_id,
            name: name.into(),
            handle: handle.into(),
            max_blocks: 0,
            sort_order: 0,
            child_blocks: BTreeSet::new(),
            top_level: true,
            layout: FieldLayout::default(),
        }
    }

    pub fn allows_child(&self, handle: &str) -> bool {
        self.child_blocks.contains(handle)
    }
}

/// Visual separator in the block type palette. Has no relation to blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Option<u64>,
    pub name: String,
    pub sort_order: i32,
}

/// Assembled, immutable configuration of one block field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSettings {
    pub field: FieldRef,
    pub block_types: Vec<BlockTypeDefinition>,
    pub groups: Vec<Group>,
    /// 0 means unbounded
    pub max_blocks: u32,
}

impl FieldSettings {
    pub fn new(field: FieldRef) -> Self {
        Self {
            field,
            block_types: Vec::new(),
            groups: Vec::new(),
            max_blocks: 0,
        }
    }

    pub fn block_types(&self) -> &[BlockTypeDefinition] {
        &self.block_types
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
}
