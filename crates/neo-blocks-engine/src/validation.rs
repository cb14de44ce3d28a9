//! Field-level validation of a built block sequence.
//!
//! Each block's own fields are checked by the host's [`BlockValidator`]; the
//! field-wide rules are a table evaluated in one pass. Every rule runs, so the
//! user sees all problems at once.

use crate::host::BlockValidator;
use crate::models::{Block, FieldErrors, FieldSettings};
use crate::tree::parent_indices;

pub const BLOCKS_INVALID_MESSAGE: &str = "Correct the errors listed above.";
pub const LEVEL_JUMP_MESSAGE: &str =
    "Blocks can't be nested more than one level below their parent.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Every block passes the host validator
    BlocksValid,
    /// At most `max` blocks in the field
    FieldMaxBlocks { max: u32 },
    /// At most `max` blocks of one type
    BlockTypeMaxBlocks { type_id: u64, name: String, max: u32 },
    /// Levels only ever step one deeper than the previous block
    Structure,
}

/// Rules a field's settings call for. Limits of 0 mean unbounded and produce
/// no rule.
pub fn rules_for(settings: &FieldSettings) -> Vec<ValidationRule> {
    let mut rules = vec![ValidationRule::BlocksValid];

    if settings.max_blocks != 0 {
        rules.push(ValidationRule::FieldMaxBlocks {
            max: settings.max_blocks,
        });
    }

    rules.extend(
        settings
            .block_types
            .iter()
            .filter(|block_type| block_type.max_blocks != 0)
            .map(|block_type| ValidationRule::BlockTypeMaxBlocks {
                type_id: block_type.id,
                name: block_type.name.clone(),
                max: block_type.max_blocks,
            }),
    );

    rules.push(ValidationRule::Structure);
    rules
}

fn too_many(max: u32, name: Option<&str>) -> String {
    let name = name.map(|n| format!("{n} ")).unwrap_or_default();
    if max == 1 {
        format!("There can't be more than one {name}block.")
    } else {
        format!("There can't be more than {max} {name}blocks.")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Field-level messages, in rule order
    pub errors: Vec<String>,
    /// Host validator errors by block position; only failing blocks appear
    pub block_errors: Vec<(usize, FieldErrors)>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.block_errors.is_empty()
    }

    /// Replace every block's errors with the ones found in this pass
    pub fn apply_to(&self, blocks: &mut [Block]) {
        for block in blocks.iter_mut() {
            block.errors.clear();
        }
        for (index, errors) in &self.block_errors {
            if let Some(block) = blocks.get_mut(*index) {
                block.errors = errors.clone();
            }
        }
    }
}

pub struct Validator<'a> {
    blocks: &'a dyn BlockValidator,
    rules: Vec<ValidationRule>,
}

impl<'a> Validator<'a> {
    pub fn new(blocks: &'a dyn BlockValidator, rules: Vec<ValidationRule>) -> Self {
        Self { blocks, rules }
    }

    pub fn for_settings(blocks: &'a dyn BlockValidator, settings: &FieldSettings) -> Self {
        Self::new(blocks, rules_for(settings))
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Check `blocks` without touching them
    pub fn validate(&self, blocks: &[Block]) -> ValidationReport {
        let block_errors: Vec<(usize, FieldErrors)> = blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| {
                let errors = self.blocks.validate_block(block);
                let failed = errors.values().any(|messages| !messages.is_empty());
                failed.then_some((index, errors))
            })
            .collect();

        let errors = self
            .rules
            .iter()
            .filter_map(|rule| match rule {
                ValidationRule::BlocksValid => {
                    (!block_errors.is_empty()).then(|| BLOCKS_INVALID_MESSAGE.to_string())
                }
                ValidationRule::FieldMaxBlocks { max } => {
                    (blocks.len() > *max as usize).then(|| too_many(*max, None))
                }
                ValidationRule::BlockTypeMaxBlocks { type_id, name, max } => {
                    let count = blocks.iter().filter(|b| b.type_id == *type_id).count();
                    (count > *max as usize).then(|| too_many(*max, Some(name.as_str())))
                }
                ValidationRule::Structure => {
                    let levels: Vec<u32> = blocks.iter().map(|b| b.level).collect();
                    parent_indices(&levels)
                        .err()
                        .map(|_| LEVEL_JUMP_MESSAGE.to_string())
                }
            })
            .collect();

        ValidationReport {
            errors,
            block_errors,
        }
    }
}
