use neo_blocks_config::RenderConfig;
use serde::Serialize;

use super::validate::validate_settings;
use crate::models::{FieldLayout, FieldSettings};
use crate::render::{RenderContext, RenderError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguratorLayoutField {
    pub id: u64,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguratorTab {
    pub name: String,
    pub fields: Vec<ConfiguratorLayoutField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguratorBlockType {
    pub id: u64,
    pub sort_order: i32,
    pub name: String,
    pub handle: String,
    pub max_blocks: u32,
    pub child_blocks: Vec<String>,
    pub top_level: bool,
    pub errors: Vec<String>,
    pub field_layout: Vec<ConfiguratorTab>,
    pub field_layout_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguratorGroup {
    pub id: Option<u64>,
    pub sort_order: i32,
    pub name: String,
}

/// What the settings configurator needs to edit a field's block types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguratorPayload {
    pub namespace: Option<String>,
    pub block_types: Vec<ConfiguratorBlockType>,
    pub groups: Vec<ConfiguratorGroup>,
}

fn layout_tabs(layout: &FieldLayout) -> Vec<ConfiguratorTab> {
    layout
        .tabs
        .iter()
        .map(|tab| ConfiguratorTab {
            name: tab.name.clone(),
            fields: tab
                .fields
                .iter()
                .map(|field| ConfiguratorLayoutField {
                    id: field.field_id,
                    required: field.required,
                })
                .collect(),
        })
        .collect()
}

/// Build the configurator payload, with each block type's validation errors
/// attached.
pub fn configurator_payload(
    settings: &FieldSettings,
    ctx: &RenderContext,
    config: &RenderConfig,
) -> Result<ConfiguratorPayload, RenderError> {
    let depth = ctx.depth();
    if depth > config.max_settings_depth {
        return Err(RenderError::NestedField { depth });
    }

    let report = validate_settings(settings);

    let block_types = settings
        .block_types
        .iter()
        .enumerate()
        .map(|(i, block_type)| ConfiguratorBlockType {
            id: block_type.id,
            sort_order: block_type.sort_order,
            name: block_type.name.clone(),
            handle: block_type.handle.clone(),
            max_blocks: block_type.max_blocks,
            child_blocks: block_type.child_blocks.iter().cloned().collect(),
            top_level: block_type.top_level,
            errors: report.errors_for(i).to_vec(),
            field_layout: layout_tabs(&block_type.layout),
            field_layout_id: block_type.layout.id,
        })
        .collect();

    let groups = settings
        .groups
        .iter()
        .map(|group| ConfiguratorGroup {
            id: group.id,
            sort_order: group.sort_order,
            name: group.name.clone(),
        })
        .collect();

    Ok(ConfiguratorPayload {
        namespace: ctx.namespace().map(str::to_string),
        block_types,
        groups,
    })
}
