use std::sync::Arc;

use serde::Serialize;

use crate::models::BlockId;

/// Rendered markup and errors of one layout tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDescriptor {
    pub name: String,
    pub head_html: String,
    pub body_html: String,
    pub foot_html: String,
    /// Field errors of the rendered block; always empty for templates
    pub errors: Vec<String>,
}

/// A block type as the input needs it to create new blocks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTypeInput {
    pub id: u64,
    pub field_layout_id: Option<u64>,
    pub sort_order: i32,
    pub handle: String,
    pub name: String,
    pub max_blocks: u32,
    pub child_blocks: Vec<String>,
    pub top_level: bool,
    pub tabs: Arc<Vec<TabDescriptor>>,
}

/// An existing block with its populated form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    pub id: Option<BlockId>,
    pub block_type: String,
    /// Position in the submitted sequence
    pub sort_order: u32,
    pub collapsed: bool,
    pub enabled: bool,
    /// 0-based, as the client posts it back
    pub level: u32,
    pub tabs: Arc<Vec<TabDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInput {
    pub sort_order: i32,
    pub name: String,
}

/// Everything the client needs to build the block input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPayload {
    pub namespace: String,
    pub input_id: String,
    pub block_types: Vec<BlockTypeInput>,
    pub groups: Vec<GroupInput>,
    pub max_blocks: u32,
    pub blocks: Vec<BlockInput>,
    #[serde(rename = "static")]
    pub is_static: bool,
}

/// Read-only rendering of a field value
#[derive(Debug, Clone, PartialEq)]
pub enum StaticInput {
    /// Nothing to show
    Empty,
    Blocks(InputPayload),
}

impl StaticInput {
    pub const EMPTY_MESSAGE: &'static str = "No blocks.";
}
