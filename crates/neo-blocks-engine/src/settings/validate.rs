use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::FieldSettings;

/// Problems found in a field's block type configuration, one list per block
/// type in settings order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsReport {
    pub block_types: Vec<Vec<String>>,
}

impl SettingsReport {
    pub fn is_valid(&self) -> bool {
        self.block_types.iter().all(Vec::is_empty)
    }

    pub fn errors_for(&self, index: usize) -> &[String] {
        self.block_types.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn handle_regex() -> &'static Regex {
    static HANDLE_REGEX: OnceLock<Regex> = OnceLock::new();
    HANDLE_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").expect("Invalid handle regex"))
}

pub fn validate_settings(settings: &FieldSettings) -> SettingsReport {
    let mut handle_counts: HashMap<String, usize> = HashMap::new();
    for block_type in &settings.block_types {
        *handle_counts
            .entry(block_type.handle.to_lowercase())
            .or_default() += 1;
    }

    let block_types = settings
        .block_types
        .iter()
        .map(|block_type| {
            let mut errors = Vec::new();

            if block_type.name.trim().is_empty() {
                errors.push("Name cannot be blank.".to_string());
            }

            if block_type.handle.is_empty() {
                errors.push("Handle cannot be blank.".to_string());
            } else if !handle_regex().is_match(&block_type.handle) {
                errors.push(format!(
                    "“{}” isn’t a valid handle.",
                    block_type.handle
                ));
            } else if handle_counts
                .get(&block_type.handle.to_lowercase())
                .is_some_and(|&count| count > 1)
            {
                errors.push(format!(
                    "Handle “{}” has already been taken.",
                    block_type.handle
                ));
            }

            for child in &block_type.child_blocks {
                if !handle_counts.contains_key(&child.to_lowercase()) {
                    errors.push(format!("Unknown child block type “{child}”."));
                }
            }

            errors
        })
        .collect();

    SettingsReport { block_types }
}
