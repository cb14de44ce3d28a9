//! Shared fixtures for unit tests: a small field configuration and stand-ins
//! for the host collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::host::{BlockValidator, FieldRenderer, LayoutAssembler, RenderedTab, TabRenderRequest};
use crate::lenient;
use crate::models::{
    Block, BlockTypeDefinition, FieldErrors, FieldLayout, FieldRef, FieldSettings, Group,
    LayoutField, LayoutTab,
};
use crate::render::RenderError;

pub fn field() -> FieldRef {
    FieldRef::new(9, "content")
}

fn body_layout(id: u64) -> FieldLayout {
    FieldLayout {
        id: Some(id),
        element_kind: None,
        tabs: vec![LayoutTab::new(
            "Content",
            vec![LayoutField {
                field_id: 1,
                handle: "body".to_string(),
                required: true,
            }],
        )],
    }
}

/// `text` (id 1, at most 3 per field, may contain quotes) and `quote` (id 2,
/// nested only), one group, field limit of 5
pub fn sample_settings() -> FieldSettings {
    let mut text = BlockTypeDefinition::new(1, 9, "Text", "text");
    text.max_blocks = 3;
    text.sort_order = 1;
    text.child_blocks.insert("quote".to_string());
    text.layout = body_layout(11);

    let mut quote = BlockTypeDefinition::new(2, 9, "Quote", "quote");
    quote.sort_order = 2;
    quote.top_level = false;
    quote.layout = body_layout(12);

    let mut settings = FieldSettings::new(field());
    settings.block_types = vec![text, quote];
    settings.groups = vec![Group {
        id: None,
        name: "Basics".to_string(),
        sort_order: 0,
    }];
    settings.max_blocks = 5;
    settings
}

/// Renders `<namespace|tab|body>` bodies (`fresh` for templates) and counts calls
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingRenderer {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FieldRenderer for RecordingRenderer {
    fn render_tab(&self, request: &TabRenderRequest<'_>) -> Result<RenderedTab, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::Delegate {
                tab: request.tab.name.clone(),
                reason: "template exploded".to_string(),
            });
        }

        let state = match request.block {
            None => "fresh".to_string(),
            Some(block) => lenient::as_string(block.content.get("body")),
        };
        Ok(RenderedTab {
            head_html: String::new(),
            body_html: format!("<{}|{}|{}>", request.namespace, request.tab.name, state),
            foot_html: String::new(),
        })
    }
}

/// Requires a non-empty `body`
pub struct RequiredBodyValidator;

impl BlockValidator for RequiredBodyValidator {
    fn validate_block(&self, block: &Block) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if lenient::is_empty(block.content.get("body")) {
            errors.insert("body".to_string(), vec!["Body cannot be blank.".to_string()]);
        }
        errors
    }
}

/// Reads `{ "Tab": [fieldId, ...] }` and marks ids listed in `required`.
/// Field handles are `field{id}`.
pub struct TabListAssembler;

impl LayoutAssembler for TabListAssembler {
    fn assemble_layout(&self, layout_post: &Value, required_fields: &Value) -> FieldLayout {
        let required = lenient::as_string_list(Some(required_fields));
        let tabs = layout_post
            .as_object()
            .map(|tabs| {
                tabs.iter()
                    .map(|(name, ids)| {
                        let fields = lenient::as_string_list(Some(ids))
                            .into_iter()
                            .filter_map(|id| id.parse::<u64>().ok())
                            .map(|field_id| LayoutField {
                                field_id,
                                handle: format!("field{field_id}"),
                                required: required.contains(&field_id.to_string()),
                            })
                            .collect();
                        LayoutTab::new(name.clone(), fields)
                    })
                    .collect()
            })
            .unwrap_or_default();

        FieldLayout {
            id: None,
            element_kind: None,
            tabs,
        }
    }
}
