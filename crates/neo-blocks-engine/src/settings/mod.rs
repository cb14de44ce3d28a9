//! # Settings Assembler
//!
//! Turns the posted (or stored) untyped field configuration into a typed
//! [`FieldSettings`]. Assembly normalizes rather than rejects: missing or
//! malformed values fall back to empty/zero so a half-filled configurator form
//! still produces settings. Problems worth telling the user about are reported
//! separately by [`validate_settings`].

pub mod configurator;
pub mod validate;

use serde_json::Value;

use crate::host::LayoutAssembler;
use crate::lenient;
use crate::models::{BlockTypeDefinition, ElementKind, FieldRef, FieldSettings, Group};

pub use configurator::{ConfiguratorPayload, configurator_payload};
pub use validate::{SettingsReport, validate_settings};

/// Settings as they arrive at the field
#[derive(Debug, Clone)]
pub enum SettingsInput {
    /// Untyped configuration, e.g. the configurator's form post
    Raw(Value),
    /// Already assembled; passed through untouched
    Assembled(FieldSettings),
}

impl From<Value> for SettingsInput {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<FieldSettings> for SettingsInput {
    fn from(settings: FieldSettings) -> Self {
        Self::Assembled(settings)
    }
}

pub struct SettingsAssembler<'a> {
    field: &'a FieldRef,
    layouts: &'a dyn LayoutAssembler,
}

impl<'a> SettingsAssembler<'a> {
    pub fn new(field: &'a FieldRef, layouts: &'a dyn LayoutAssembler) -> Self {
        Self { field, layouts }
    }

    pub fn assemble(&self, input: SettingsInput) -> FieldSettings {
        let raw = match input {
            SettingsInput::Assembled(settings) => return settings,
            SettingsInput::Raw(raw) => raw,
        };

        let mut settings = FieldSettings::new(self.field.clone());
        settings.block_types = self.assemble_block_types(raw.get("blockTypes"));
        settings.groups = assemble_groups(raw.get("groups"));

        if !lenient::is_empty(raw.get("maxBlocks")) {
            settings.max_blocks = lenient::as_u32(raw.get("maxBlocks"));
        }

        log::debug!(
            "assembled settings for field {}: {} block types, {} groups",
            self.field.handle,
            settings.block_types.len(),
            settings.groups.len()
        );

        settings
    }

    fn assemble_block_types(&self, raw: Option<&Value>) -> Vec<BlockTypeDefinition> {
        match raw {
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(key, entry)| self.assemble_block_type(lenient::as_id(key), entry))
                .collect(),
            // A plain list carries no ids, so every entry is a new type
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| self.assemble_block_type(None, entry))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn assemble_block_type(&self, id: Option<u64>, entry: &Value) -> BlockTypeDefinition {
        let mut block_type = BlockTypeDefinition::new(
            id.unwrap_or(0),
            self.field.id,
            lenient::as_string(entry.get("name")),
            lenient::as_string(entry.get("handle")),
        );
        block_type.max_blocks = lenient::as_u32(entry.get("maxBlocks"));
        block_type.sort_order = lenient::as_i32(entry.get("sortOrder"));
        block_type.child_blocks = lenient::as_string_list(entry.get("childBlocks"))
            .into_iter()
            .collect();
        block_type.top_level = lenient::as_bool(entry.get("topLevel")).unwrap_or(false);

        if !lenient::is_empty(entry.get("fieldLayout")) {
            let layout_post = entry.get("fieldLayout").unwrap_or(&Value::Null);
            let required = entry.get("requiredFields").unwrap_or(&Value::Null);

            let mut layout = self.layouts.assemble_layout(layout_post, required);
            layout.element_kind = Some(ElementKind::NeoBlock);
            block_type.layout = layout;
        }

        block_type
    }
}

/// Groups arrive as parallel `name[]` / `sortOrder[]` arrays
fn assemble_groups(raw: Option<&Value>) -> Vec<Group> {
    let Some(raw) = raw.filter(|raw| !lenient::is_empty(Some(raw))) else {
        return Vec::new();
    };

    let names: Vec<String> = match raw.get("name") {
        Some(Value::Array(names)) => names.iter().map(|n| lenient::as_string(Some(n))).collect(),
        _ => Vec::new(),
    };
    let sort_orders = match raw.get("sortOrder") {
        Some(Value::Array(orders)) => orders.as_slice(),
        _ => &[],
    };

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Group {
            id: None,
            name,
            sort_order: lenient::as_i32(sort_orders.get(i)),
        })
        .collect()
}
