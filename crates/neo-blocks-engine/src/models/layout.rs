use serde::{Deserialize, Serialize};

/// Element kind marker attached to a layout so the host knows which element
/// context its field types are resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    NeoBlock,
}

/// A field in a layout tab. The field itself belongs to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutField {
    pub field_id: u64,
    pub handle: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutTab {
    pub name: String,
    pub fields: Vec<LayoutField>,
}

impl LayoutTab {
    pub fn new(name: impl Into<String>, fields: Vec<LayoutField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Host-owned field layout of a block type: ordered tabs of ordered fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLayout {
    pub id: Option<u64>,
    pub element_kind: Option<ElementKind>,
    pub tabs: Vec<LayoutTab>,
}

impl FieldLayout {
    pub fn fields(&self) -> impl Iterator<Item = &LayoutField> {
        self.tabs.iter().flat_map(|tab| tab.fields.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.iter().all(|tab| tab.fields.is_empty())
    }
}
