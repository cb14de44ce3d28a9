use std::sync::Arc;

use neo_blocks_config::Config;

use super::cache::{BlockDependency, CacheEntry, CacheKey, CacheStore};
use super::descriptor::{
    BlockInput, BlockTypeInput, GroupInput, InputPayload, StaticInput, TabDescriptor,
};
use super::namespace::RenderContext;
use super::RenderError;
use crate::host::{FieldRenderer, TabRenderRequest};
use crate::models::{Block, BlockTypeDefinition, FieldSettings};

/// Produces tab descriptors for block types and blocks, going through the
/// shared cache.
pub struct BlockRenderer<'a> {
    cache: &'a dyn CacheStore,
    fields: &'a dyn FieldRenderer,
    config: &'a Config,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(cache: &'a dyn CacheStore, fields: &'a dyn FieldRenderer, config: &'a Config) -> Self {
        Self {
            cache,
            fields,
            config,
        }
    }

    /// Tabs for `block_type`. Without a block this is the empty template the
    /// client clones for new blocks; with one, the block's populated form.
    ///
    /// Unsaved blocks are always computed: they have no id to key them by.
    pub fn block_type_tabs(
        &self,
        ctx: &mut RenderContext,
        block_type: &BlockTypeDefinition,
        block: Option<&Block>,
        namespace: &str,
        is_static: bool,
    ) -> Result<Arc<Vec<TabDescriptor>>, RenderError> {
        let container = format!(
            "{namespace}[{}][fields]",
            self.config.render.block_placeholder
        );
        let block_namespace = ctx.namespace_input_name(&container);

        if !self.config.cache.enabled || block.is_some_and(Block::is_new) {
            return self
                .compute_tabs(ctx, block_type, block, block_namespace, is_static)
                .map(Arc::new);
        }

        let key = CacheKey::new(
            &self.config.cache.key_prefix,
            block_type.id,
            block.and_then(|b| b.id),
            namespace,
            is_static,
        );
        let dependency = BlockDependency::new(block_type, block, &block_namespace);

        if let Some(entry) = self.cache.get(&key) {
            if entry.dependency == dependency {
                log::debug!("render cache hit: {key}");
                return Ok(entry.tabs);
            }
            log::debug!("render cache entry is stale: {key}");
        }

        let tabs = Arc::new(self.compute_tabs(ctx, block_type, block, block_namespace, is_static)?);
        self.cache.set(
            key,
            CacheEntry {
                tabs: Arc::clone(&tabs),
                dependency,
            },
        );
        Ok(tabs)
    }

    pub fn block_tabs(
        &self,
        ctx: &mut RenderContext,
        block_type: &BlockTypeDefinition,
        block: &Block,
        namespace: &str,
        is_static: bool,
    ) -> Result<Arc<Vec<TabDescriptor>>, RenderError> {
        self.block_type_tabs(ctx, block_type, Some(block), namespace, is_static)
    }

    fn compute_tabs(
        &self,
        ctx: &mut RenderContext,
        block_type: &BlockTypeDefinition,
        block: Option<&Block>,
        block_namespace: String,
        is_static: bool,
    ) -> Result<Vec<TabDescriptor>, RenderError> {
        let scope = ctx.enter(block_namespace);
        let current = scope.namespace().unwrap_or_default();

        block_type
            .layout
            .tabs
            .iter()
            .map(|tab| {
                let errors: Vec<String> = block
                    .map(|block| {
                        tab.fields
                            .iter()
                            .flat_map(|field| block.field_errors(&field.handle).iter().cloned())
                            .collect()
                    })
                    .unwrap_or_default();

                let rendered = self.fields.render_tab(&TabRenderRequest {
                    namespace: current,
                    tab,
                    block,
                    is_fresh: block.is_none(),
                    is_static,
                })?;

                Ok(TabDescriptor {
                    name: tab.name.clone(),
                    head_html: rendered.head_html,
                    body_html: rendered.body_html,
                    foot_html: rendered.foot_html,
                    errors,
                })
            })
            .collect()
    }

    /// The full input: a template per block type plus the populated form of
    /// every block, in order.
    pub fn input_payload(
        &self,
        ctx: &mut RenderContext,
        settings: &FieldSettings,
        blocks: &[Block],
        name: &str,
        id: &str,
        is_static: bool,
    ) -> Result<InputPayload, RenderError> {
        let depth = ctx.depth();
        if depth > self.config.render.max_input_depth {
            return Err(RenderError::NestedField { depth });
        }

        let block_types = settings
            .block_types
            .iter()
            .map(|block_type| {
                Ok(BlockTypeInput {
                    id: block_type.id,
                    field_layout_id: block_type.layout.id,
                    sort_order: block_type.sort_order,
                    handle: block_type.handle.clone(),
                    name: block_type.name.clone(),
                    max_blocks: block_type.max_blocks,
                    child_blocks: block_type.child_blocks.iter().cloned().collect(),
                    top_level: block_type.top_level,
                    tabs: self.block_type_tabs(ctx, block_type, None, name, is_static)?,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        let groups = settings
            .groups
            .iter()
            .map(|group| GroupInput {
                sort_order: group.sort_order,
                name: group.name.clone(),
            })
            .collect();

        let mut block_inputs = Vec::with_capacity(blocks.len());
        for block in blocks {
            let Some(block_type) = settings.block_types.iter().find(|t| t.id == block.type_id)
            else {
                log::warn!(
                    "block {:?} has type {} which field {} no longer defines; not rendering it",
                    block.id,
                    block.type_id,
                    settings.field.handle
                );
                continue;
            };

            block_inputs.push(BlockInput {
                id: block.id,
                block_type: block_type.handle.clone(),
                sort_order: block_inputs.len() as u32,
                collapsed: block.collapsed,
                enabled: block.enabled,
                level: block.display_level(),
                tabs: self.block_tabs(ctx, block_type, block, name, is_static)?,
            });
        }

        Ok(InputPayload {
            namespace: ctx.namespace_input_name(name),
            input_id: ctx.namespace_input_id(id),
            block_types,
            groups,
            max_blocks: settings.max_blocks,
            blocks: block_inputs,
            is_static,
        })
    }

    /// Read-only rendering. Uses the field handle as input name so repeated
    /// static renders share cache entries; only the element id is random.
    pub fn static_payload(
        &self,
        ctx: &mut RenderContext,
        settings: &FieldSettings,
        blocks: &[Block],
    ) -> Result<StaticInput, RenderError> {
        if blocks.is_empty() {
            return Ok(StaticInput::Empty);
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let payload = self.input_payload(ctx, settings, blocks, &settings.field.handle, &id, true)?;
        Ok(StaticInput::Blocks(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockId, OwnerContext};
    use crate::render::MemoryCacheStore;
    use crate::tests::{RecordingRenderer, sample_settings};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stored_block(id: u64, type_id: u64, level: u32, body: &str) -> Block {
        let mut block = Block::new(9, type_id, &OwnerContext::new(Some(100), "en"));
        block.id = Some(BlockId(id));
        block.level = level;
        block.modified = false;
        block.content.insert("body".to_string(), json!(body));
        block
    }

    #[test]
    fn test_template_render_uses_placeholder_namespace() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::with_namespace("fields");

        let tabs = renderer
            .block_type_tabs(&mut ctx, &settings.block_types[0], None, "content", false)
            .unwrap();

        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].name, "Content");
        assert_eq!(
            tabs[0].body_html,
            "<fields[content][__NEOBLOCK__][fields]|Content|fresh>"
        );
        assert!(tabs[0].errors.is_empty());
        assert_eq!(ctx.namespace(), Some("fields"));
    }

    #[test]
    fn test_identical_calls_hit_the_cache() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();
        let block = stored_block(1, 1, 1, "Hello");

        let first = renderer
            .block_tabs(&mut ctx, &settings.block_types[0], &block, "content", false)
            .unwrap();
        let second = renderer
            .block_tabs(&mut ctx, &settings.block_types[0], &block, "content", false)
            .unwrap();

        assert_eq!(fields.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_outer_namespace_change_is_a_miss() {
        let settings = sample_settings();
        let text = &settings.block_types[0];
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let block = stored_block(5, 1, 1, "Hello");

        let mut fields_ctx = RenderContext::with_namespace("fields");
        let first = renderer
            .block_tabs(&mut fields_ctx, text, &block, "content", false)
            .unwrap();
        let mut global_ctx = RenderContext::with_namespace("globalFields");
        let second = renderer
            .block_tabs(&mut global_ctx, text, &block, "content", false)
            .unwrap();

        assert_eq!(
            first[0].body_html,
            "<fields[content][__NEOBLOCK__][fields]|Content|Hello>"
        );
        assert_eq!(
            second[0].body_html,
            "<globalFields[content][__NEOBLOCK__][fields]|Content|Hello>"
        );
        assert_eq!(fields.calls(), 2);

        // back under the first namespace the entry is recomputed, not reused
        let third = renderer
            .block_tabs(&mut fields_ctx, text, &block, "content", false)
            .unwrap();
        assert_eq!(third, first);
        assert_eq!(fields.calls(), 3);
    }

    #[test]
    fn test_unsaved_blocks_do_not_evict_templates() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        let mut unsaved = Block::new(9, 1, &OwnerContext::new(Some(100), "en"));
        unsaved.content.insert("body".to_string(), json!(""));
        let blocks = vec![unsaved];

        renderer
            .input_payload(&mut ctx, &settings, &blocks, "content", "content", false)
            .unwrap();
        assert_eq!(fields.calls(), 3);

        let again = renderer
            .input_payload(&mut ctx, &settings, &blocks, "content", "content", false)
            .unwrap();

        // templates come from the cache, the unsaved block is rendered again
        assert_eq!(fields.calls(), 4);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            again.block_types[0].tabs[0].body_html,
            "<content[__NEOBLOCK__][fields]|Content|fresh>"
        );
        assert_eq!(again.blocks[0].id, None);
    }

    #[test]
    fn test_content_change_invalidates_only_that_block() {
        let settings = sample_settings();
        let text = &settings.block_types[0];
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        let mut first = stored_block(1, 1, 1, "Hello");
        let second = stored_block(2, 1, 1, "World");
        renderer.block_tabs(&mut ctx, text, &first, "content", false).unwrap();
        renderer.block_tabs(&mut ctx, text, &second, "content", false).unwrap();
        assert_eq!(fields.calls(), 2);

        first.content.insert("body".to_string(), json!("Hello, edited"));
        let refreshed = renderer.block_tabs(&mut ctx, text, &first, "content", false).unwrap();
        renderer.block_tabs(&mut ctx, text, &second, "content", false).unwrap();

        assert_eq!(fields.calls(), 3);
        assert!(refreshed[0].body_html.contains("Hello, edited"));
    }

    #[test]
    fn test_layout_change_invalidates_template() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        let mut text = settings.block_types[0].clone();
        renderer.block_type_tabs(&mut ctx, &text, None, "content", false).unwrap();
        renderer.block_type_tabs(&mut ctx, &text, None, "content", false).unwrap();
        assert_eq!(fields.calls(), 1);

        text.layout.tabs[0].name = "Body".to_string();
        let tabs = renderer.block_type_tabs(&mut ctx, &text, None, "content", false).unwrap();
        assert_eq!(fields.calls(), 2);
        assert_eq!(tabs[0].name, "Body");
    }

    #[test]
    fn test_static_flag_and_namespace_are_part_of_the_key() {
        let settings = sample_settings();
        let text = &settings.block_types[0];
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        renderer.block_type_tabs(&mut ctx, text, None, "content", false).unwrap();
        renderer.block_type_tabs(&mut ctx, text, None, "content", true).unwrap();
        renderer.block_type_tabs(&mut ctx, text, None, "other", false).unwrap();

        assert_eq!(fields.calls(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failure_is_not_cached_and_namespace_is_restored() {
        let settings = sample_settings();
        let text = &settings.block_types[0];
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::failing();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::with_namespace("fields");

        let result = renderer.block_type_tabs(&mut ctx, text, None, "content", false);

        assert!(matches!(result, Err(RenderError::Delegate { .. })));
        assert!(cache.is_empty());
        assert_eq!(ctx.namespace(), Some("fields"));
    }

    #[test]
    fn test_disabled_cache_always_computes() {
        let settings = sample_settings();
        let text = &settings.block_types[0];
        let mut config = Config::default();
        config.cache.enabled = false;
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        renderer.block_type_tabs(&mut ctx, text, None, "content", false).unwrap();
        renderer.block_type_tabs(&mut ctx, text, None, "content", false).unwrap();

        assert_eq!(fields.calls(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_block_errors_are_collected_per_tab() {
        let settings = sample_settings();
        let text = &settings.block_types[0];
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        let mut block = stored_block(1, 1, 1, "");
        block
            .errors
            .insert("body".to_string(), vec!["Body cannot be blank.".to_string()]);
        block
            .errors
            .insert("unrelated".to_string(), vec!["Ignored.".to_string()]);

        let tabs = renderer.block_tabs(&mut ctx, text, &block, "content", false).unwrap();
        assert_eq!(tabs[0].errors, vec!["Body cannot be blank.".to_string()]);
    }

    #[test]
    fn test_input_payload_fans_out_over_types_and_blocks() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::with_namespace("fields");

        let blocks = vec![
            stored_block(1, 1, 1, "Parent"),
            stored_block(2, 2, 2, "Child"),
            stored_block(3, 77, 1, "Orphan"),
        ];
        let payload = renderer
            .input_payload(&mut ctx, &settings, &blocks, "content", "content", false)
            .unwrap();

        assert_eq!(payload.namespace, "fields[content]");
        assert_eq!(payload.input_id, "fields-content");
        assert_eq!(payload.block_types.len(), 2);
        assert_eq!(payload.groups.len(), 1);
        assert_eq!(payload.max_blocks, 5);

        let summary: Vec<_> = payload
            .blocks
            .iter()
            .map(|b| (b.id, b.block_type.as_str(), b.sort_order, b.level))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some(BlockId(1)), "text", 0, 0),
                (Some(BlockId(2)), "quote", 1, 1),
            ]
        );
        // two templates plus two blocks
        assert_eq!(fields.calls(), 4);
    }

    #[test]
    fn test_input_payload_refuses_nested_fields() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::with_namespace("fields[matrix][blocks][new1][fields]");

        let result = renderer.input_payload(&mut ctx, &settings, &[], "content", "content", false);

        assert_eq!(result.unwrap_err(), RenderError::NestedField { depth: 2 });
        assert_eq!(fields.calls(), 0);
    }

    #[test]
    fn test_static_payload() {
        let settings = sample_settings();
        let config = Config::default();
        let cache = MemoryCacheStore::new();
        let fields = RecordingRenderer::default();
        let renderer = BlockRenderer::new(&cache, &fields, &config);
        let mut ctx = RenderContext::new();

        assert_eq!(
            renderer.static_payload(&mut ctx, &settings, &[]).unwrap(),
            StaticInput::Empty
        );

        let blocks = vec![stored_block(1, 1, 1, "Hello")];
        let StaticInput::Blocks(first) = renderer.static_payload(&mut ctx, &settings, &blocks).unwrap()
        else {
            panic!("expected blocks");
        };
        let StaticInput::Blocks(second) = renderer.static_payload(&mut ctx, &settings, &blocks).unwrap()
        else {
            panic!("expected blocks");
        };

        assert!(first.is_static);
        assert_eq!(first.namespace, "content");
        assert_ne!(first.input_id, second.input_id);
        // second render is served entirely from cache
        assert_eq!(fields.calls(), 3);
    }
}
