use serde_json::Value;

use crate::lenient;

/// One entry of the posted block map, with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct PostedBlock {
    /// Map key: a block id, or a client-generated key such as `new1`
    pub key: String,
    pub type_handle: Option<String>,
    pub enabled: bool,
    pub collapsed: bool,
    /// 0-based, negative values already clamped to 0
    pub level: u32,
    pub modified: bool,
    pub fields: Option<Value>,
}

impl PostedBlock {
    pub fn from_entry(key: &str, entry: &Value) -> Self {
        let type_handle = Some(lenient::as_string(entry.get("type"))).filter(|h| !h.is_empty());
        let level = lenient::as_i64(entry.get("level")).unwrap_or(0).max(0);

        Self {
            key: key.to_string(),
            type_handle,
            enabled: lenient::as_bool(entry.get("enabled")).unwrap_or(true),
            collapsed: lenient::as_bool(entry.get("collapsed")).unwrap_or(false),
            level: u32::try_from(level).unwrap_or(u32::MAX),
            modified: lenient::as_bool(entry.get("modified")).unwrap_or(true),
            fields: entry.get("fields").filter(|f| f.is_object()).cloned(),
        }
    }

    /// Existing block id this entry refers to, if its key looks like one
    pub fn candidate_id(&self) -> Option<u64> {
        lenient::as_id(&self.key)
    }
}

/// Read the posted block map in submission order. Anything other than an
/// object of objects reads as nothing.
pub fn parse_posted(posted: &Value) -> Vec<PostedBlock> {
    let Some(entries) = posted.as_object() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|(_, entry)| entry.is_object())
        .map(|(key, entry)| PostedBlock::from_entry(key, entry))
        .collect()
}
