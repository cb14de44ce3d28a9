use std::collections::HashMap;

use serde_json::Value;

use super::posted::{PostedBlock, parse_posted};
use crate::models::{Block, BlockId, FieldRef, OwnerContext};
use crate::registry::TypeRegistry;

/// Matches a posted block map against the owner's persisted blocks.
pub struct TreeBuilder<'a> {
    registry: &'a TypeRegistry,
    field: &'a FieldRef,
    owner: &'a OwnerContext,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry, field: &'a FieldRef, owner: &'a OwnerContext) -> Self {
        Self {
            registry,
            field,
            owner,
        }
    }

    /// Build the submitted block sequence. `previous` are the blocks currently
    /// persisted for this owner, field and locale; the ones the submission
    /// still refers to are reused, the rest are dropped.
    pub fn build(&self, previous: Vec<Block>, posted: &Value) -> Vec<Block> {
        let mut previous: HashMap<BlockId, Block> = previous
            .into_iter()
            .filter_map(|block| block.id.map(|id| (id, block)))
            .collect();

        parse_posted(posted)
            .into_iter()
            .filter_map(|entry| self.build_block(&mut previous, entry))
            .collect()
    }

    fn build_block(
        &self,
        previous: &mut HashMap<BlockId, Block>,
        entry: PostedBlock,
    ) -> Option<Block> {
        let Some(handle) = entry.type_handle.as_deref() else {
            log::debug!(
                "skipping posted block {:?} of field {}: no block type",
                entry.key,
                self.field.handle
            );
            return None;
        };
        let Some(block_type) = self.registry.resolve(handle) else {
            log::debug!(
                "skipping posted block {:?} of field {}: unknown block type {handle:?}",
                entry.key,
                self.field.handle
            );
            return None;
        };

        let existing = entry
            .candidate_id()
            .and_then(|id| previous.remove(&BlockId(id)));

        let mut block = match existing {
            Some(mut block) => {
                block.modified = entry.modified;
                block.type_id = block_type.id;
                block
            }
            None => Block::new(self.field.id, block_type.id, self.owner),
        };

        block.enabled = entry.enabled;
        block.collapsed = entry.collapsed;
        block.level = entry.level.saturating_add(1);

        if let Some(fields) = &entry.fields {
            block.set_content_from_post(fields);
        }

        if let Some(location) = &self.owner.content_post_location {
            block.content_post_location = Some(format!(
                "{location}.{}.{}.fields",
                self.field.handle, entry.key
            ));
        }

        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeState;
    use crate::tests::sample_settings;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn owner() -> OwnerContext {
        OwnerContext::new(Some(100), "en").with_content_post_location("fields")
    }

    fn persisted(id: u64, type_id: u64, level: u32, body: &str) -> Block {
        let mut block = Block::new(9, type_id, &owner());
        block.id = Some(BlockId(id));
        block.level = level;
        block.modified = false;
        block.content.insert("body".to_string(), json!(body));
        block
    }

    fn build(previous: Vec<Block>, posted: Value) -> Vec<Block> {
        let settings = sample_settings();
        let registry = TypeRegistry::from_settings(&settings).unwrap();
        let owner = owner();
        TreeBuilder::new(&registry, &settings.field, &owner).build(previous, &posted)
    }

    #[test]
    fn test_two_new_blocks_nested() {
        let blocks = build(
            vec![],
            json!({
                "new1": { "type": "text", "level": 0, "fields": { "body": "Parent" } },
                "new2": { "type": "quote", "level": 1, "fields": { "body": "Child" } },
            }),
        );

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].level, 1);
        assert_eq!(blocks[1].level, 2);
        assert_eq!(blocks[0].type_id, 1);
        assert_eq!(blocks[1].type_id, 2);
        assert!(blocks.iter().all(|b| b.change_state() == ChangeState::New));
        assert!(blocks.iter().all(|b| b.owner_id == Some(100) && b.owner_locale == "en"));
        assert_eq!(blocks[1].content.get("body"), Some(&json!("Child")));
        assert_eq!(
            blocks[1].content_post_location.as_deref(),
            Some("fields.content.new2.fields")
        );
    }

    #[test]
    fn test_existing_block_is_reused() {
        let blocks = build(
            vec![persisted(12, 1, 1, "Old")],
            json!({
                "12": { "type": "quote", "modified": "0", "collapsed": "1" },
            }),
        );

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.id, Some(BlockId(12)));
        assert_eq!(block.type_id, 2);
        assert!(!block.modified);
        assert!(block.collapsed);
        // no posted fields: persisted content stays
        assert_eq!(block.content.get("body"), Some(&json!("Old")));
    }

    #[test]
    fn test_existing_block_defaults_to_modified() {
        let blocks = build(
            vec![persisted(12, 1, 1, "Old")],
            json!({ "12": { "type": "text", "fields": { "body": "New" } } }),
        );
        assert_eq!(blocks[0].change_state(), ChangeState::Modified);
        assert_eq!(blocks[0].content.get("body"), Some(&json!("New")));
    }

    #[test]
    fn test_unknown_id_becomes_new_block() {
        let blocks = build(
            vec![persisted(12, 1, 1, "Old")],
            json!({ "99": { "type": "text" } }),
        );
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_new());
    }

    #[test]
    fn test_unresolvable_entries_are_skipped() {
        let blocks = build(
            vec![],
            json!({
                "new1": { "type": "text" },
                "new2": { "type": "gallery" },
                "new3": { "level": 1 },
                "new4": { "type": "quote", "level": 1 },
            }),
        );

        let handles: Vec<_> = blocks.iter().map(|b| b.type_id).collect();
        assert_eq!(handles, vec![1, 2]);
    }

    #[test]
    fn test_non_object_payload_is_empty() {
        assert!(build(vec![persisted(12, 1, 1, "Old")], json!("")).is_empty());
    }

    #[test]
    fn test_without_post_location() {
        let settings = sample_settings();
        let registry = TypeRegistry::from_settings(&settings).unwrap();
        let owner = OwnerContext::new(None, "en");
        let blocks = TreeBuilder::new(&registry, &settings.field, &owner)
            .build(vec![], &json!({ "new1": { "type": "text" } }));

        assert_eq!(blocks[0].content_post_location, None);
        assert_eq!(blocks[0].owner_id, None);
    }

    #[test]
    fn test_build_is_deterministic() {
        let posted = json!({
            "12": { "type": "text", "level": 0 },
            "new1": { "type": "quote", "level": 1, "fields": { "body": "x" } },
        });
        let first = build(vec![persisted(12, 1, 1, "Old")], posted.clone());
        let second = build(vec![persisted(12, 1, 1, "Old")], posted);
        assert_eq!(first, second);
    }
}
