//! The block field as the host sees it.
//!
//! [`NeoField`] ties the pieces together for one configured field: turning
//! submissions into blocks, validating them, rendering the input and keeping
//! storage in step through the lifecycle hooks.

use neo_blocks_config::Config;
use serde_json::Value;

use crate::criteria::{BlockCriteria, FieldValue};
use crate::eager::{EagerLoadingMap, eager_loading_map};
use crate::host::{BlockValidator, FieldRenderer, LayoutAssembler};
use crate::models::{Block, FieldRef, FieldSettings, OwnerContext};
use crate::registry::{RegistryError, TypeRegistry};
use crate::render::{
    BlockRenderer, CacheKey, CacheStore, InputPayload, RenderContext, RenderError, StaticInput,
};
use crate::settings::{ConfiguratorPayload, SettingsAssembler, SettingsInput, configurator_payload};
use crate::store::{BlockQuery, BlockStore, SettingsStore, StoreError};
use crate::tree::TreeBuilder;
use crate::validation::{ValidationReport, Validator};

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct NeoField {
    settings: FieldSettings,
    registry: TypeRegistry,
    config: Config,
}

impl NeoField {
    pub fn new(settings: FieldSettings, config: Config) -> Result<Self, RegistryError> {
        let registry = TypeRegistry::from_settings(&settings)?;
        Ok(Self {
            settings,
            registry,
            config,
        })
    }

    /// Assemble settings for `field`. Never fails; see [`crate::settings`].
    pub fn prep_settings(
        field: &FieldRef,
        layouts: &dyn LayoutAssembler,
        input: impl Into<SettingsInput>,
    ) -> FieldSettings {
        SettingsAssembler::new(field, layouts).assemble(input.into())
    }

    /// Configurator for settings as posted, before they are accepted. Unlike
    /// [`NeoField::new`] this takes duplicate or blank handles, so the
    /// configurator can show them back with their errors.
    pub fn configurator_payload_from_post(
        field: &FieldRef,
        layouts: &dyn LayoutAssembler,
        input: impl Into<SettingsInput>,
        ctx: &RenderContext,
        config: &Config,
    ) -> Result<ConfiguratorPayload, RenderError> {
        let settings = Self::prep_settings(field, layouts, input);
        configurator_payload(&settings, ctx, &config.render)
    }

    pub fn field(&self) -> &FieldRef {
        &self.settings.field
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Blocks of a submission, matched against what `owner` has stored
    pub fn prep_value_from_post(
        &self,
        store: &dyn BlockStore,
        owner: &OwnerContext,
        posted: &Value,
    ) -> Result<Vec<Block>, StoreError> {
        let previous = match owner.id {
            Some(owner_id) => store.find_blocks(
                &BlockQuery::for_field(self.field().id)
                    .owned_by(owner_id)
                    .in_locale(owner.locale.clone()),
            )?,
            None => Vec::new(),
        };

        Ok(TreeBuilder::new(&self.registry, self.field(), owner).build(previous, posted))
    }

    pub fn prepare_value(&self, owner: &OwnerContext, value: FieldValue) -> BlockCriteria {
        BlockCriteria::prepare(self.field(), owner, value)
    }

    /// Validate `blocks` and attach each block's field errors to it
    pub fn validate(&self, validator: &dyn BlockValidator, blocks: &mut [Block]) -> ValidationReport {
        let report = Validator::for_settings(validator, &self.settings).validate(blocks);
        report.apply_to(blocks);
        if !report.is_valid() {
            log::debug!(
                "field {} failed validation: {:?}",
                self.field().handle,
                report.errors
            );
        }
        report
    }

    pub fn renderer<'a>(
        &'a self,
        cache: &'a dyn CacheStore,
        fields: &'a dyn FieldRenderer,
    ) -> BlockRenderer<'a> {
        BlockRenderer::new(cache, fields, &self.config)
    }

    /// Editable input for `blocks` under the input name `name`
    pub fn input_payload(
        &self,
        ctx: &mut RenderContext,
        cache: &dyn CacheStore,
        fields: &dyn FieldRenderer,
        blocks: &[Block],
        name: &str,
    ) -> Result<InputPayload, RenderError> {
        self.renderer(cache, fields)
            .input_payload(ctx, &self.settings, blocks, name, name, false)
    }

    pub fn static_payload(
        &self,
        ctx: &mut RenderContext,
        cache: &dyn CacheStore,
        fields: &dyn FieldRenderer,
        blocks: &[Block],
    ) -> Result<StaticInput, RenderError> {
        self.renderer(cache, fields)
            .static_payload(ctx, &self.settings, blocks)
    }

    pub fn configurator_payload(&self, ctx: &RenderContext) -> Result<ConfiguratorPayload, RenderError> {
        configurator_payload(&self.settings, ctx, &self.config.render)
    }

    pub fn eager_loading_map(
        &self,
        store: &dyn BlockStore,
        owner_ids: &[u64],
    ) -> Result<EagerLoadingMap, StoreError> {
        eager_loading_map(store, self.field().id, owner_ids)
    }

    /// Persist the settings after the field itself was saved. Unsaved block
    /// types come back with ids, so the registry is rebuilt from the result.
    pub fn on_after_save(&mut self, store: &mut dyn SettingsStore) -> Result<(), FieldError> {
        let saved = store.save_settings(self.settings.clone())?;
        self.registry = TypeRegistry::from_settings(&saved)?;
        self.settings = saved;
        log::debug!(
            "saved settings of field {} ({} block types)",
            self.field().handle,
            self.settings.block_types.len()
        );
        Ok(())
    }

    /// Remove the field's blocks, settings and cached renders before the
    /// field is deleted
    pub fn on_before_delete(
        &self,
        blocks: &mut dyn BlockStore,
        settings: &mut dyn SettingsStore,
        cache: &dyn CacheStore,
    ) -> Result<(), StoreError> {
        let removed = blocks.delete_field_blocks(self.field().id)?;
        settings.delete_field(self.field().id)?;
        for block_type in &self.settings.block_types {
            cache.remove_prefix(&CacheKey::block_type_prefix(
                &self.config.cache.key_prefix,
                block_type.id,
            ));
        }
        log::debug!("deleted field {} and {removed} blocks", self.field().handle);
        Ok(())
    }

    /// Persist `blocks` as the owner's value once the owner has been saved.
    /// Renders of blocks the save deleted are dropped from `cache`.
    pub fn on_after_element_save(
        &self,
        store: &mut dyn BlockStore,
        cache: &dyn CacheStore,
        owner: &OwnerContext,
        blocks: &mut [Block],
    ) -> Result<(), StoreError> {
        let deleted = store.save_blocks(self.field(), owner, blocks)?;
        for record in &deleted {
            cache.remove_prefix(&CacheKey::block_prefix(
                &self.config.cache.key_prefix,
                record.type_id,
                record.id,
            ));
        }
        Ok(())
    }
}
