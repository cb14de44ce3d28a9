//! Lookup of a field's block types by handle or id.

use std::collections::HashMap;

use crate::models::{BlockTypeDefinition, FieldSettings};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate block type handle: {0}")]
    DuplicateHandle(String),
    #[error("Duplicate block type id: {0}")]
    DuplicateId(u64),
}

/// Immutable index over the block types of one field.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<BlockTypeDefinition>,
    by_handle: HashMap<String, usize>,
    by_id: HashMap<u64, usize>,
}

impl TypeRegistry {
    pub fn new(types: Vec<BlockTypeDefinition>) -> Result<Self, RegistryError> {
        let mut by_handle = HashMap::with_capacity(types.len());
        let mut by_id = HashMap::with_capacity(types.len());

        for (index, block_type) in types.iter().enumerate() {
            if by_handle.insert(block_type.handle.clone(), index).is_some() {
                return Err(RegistryError::DuplicateHandle(block_type.handle.clone()));
            }
            // Types that haven't been saved yet all carry id 0
            if block_type.id != 0 && by_id.insert(block_type.id, index).is_some() {
                return Err(RegistryError::DuplicateId(block_type.id));
            }
        }

        Ok(Self {
            types,
            by_handle,
            by_id,
        })
    }

    pub fn from_settings(settings: &FieldSettings) -> Result<Self, RegistryError> {
        Self::new(settings.block_types.clone())
    }

    /// Resolve a posted type handle. `None` for handles the field doesn't know
    /// (typically stale client state).
    pub fn resolve(&self, handle: &str) -> Option<&BlockTypeDefinition> {
        self.by_handle.get(handle).map(|&i| &self.types[i])
    }

    pub fn get(&self, id: u64) -> Option<&BlockTypeDefinition> {
        self.by_id.get(&id).map(|&i| &self.types[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockTypeDefinition> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
