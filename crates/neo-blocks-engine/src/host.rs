//! Contracts for the collaborators the surrounding system provides.
//!
//! The engine never renders or validates leaf fields itself and never knows how
//! layouts are stored; it calls through these traits instead. Storage contracts
//! live in [`crate::store`].

use serde_json::Value;

use crate::models::{Block, FieldErrors, FieldLayout, LayoutTab};
use crate::render::RenderError;

/// Builds a field layout out of the layout designer's posted payload.
pub trait LayoutAssembler {
    /// Never fails: unusable input yields an empty layout.
    fn assemble_layout(&self, layout_post: &Value, required_fields: &Value) -> FieldLayout;
}

/// Validates a block's own field values.
pub trait BlockValidator {
    /// Errors keyed by field handle; empty when the block is valid.
    fn validate_block(&self, block: &Block) -> FieldErrors;
}

/// What the generic field renderer is asked to render for one layout tab
#[derive(Debug, Clone, Copy)]
pub struct TabRenderRequest<'a> {
    /// Namespace in effect for this render; input names must be prefixed with it
    pub namespace: &'a str,
    pub tab: &'a LayoutTab,
    /// `None` when rendering the empty template for new blocks
    pub block: Option<&'a Block>,
    /// True for the template render, where field types should show defaults
    pub is_fresh: bool,
    pub is_static: bool,
}

/// Markup produced for one tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedTab {
    pub head_html: String,
    pub body_html: String,
    pub foot_html: String,
}

/// Renders the inputs of a tab's fields.
pub trait FieldRenderer {
    fn render_tab(&self, request: &TabRenderRequest<'_>) -> Result<RenderedTab, RenderError>;
}
