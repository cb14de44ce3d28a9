//! Batch preloading of block relations for many owners at once.

use serde::Serialize;

use crate::models::{BlockId, ElementKind};
use crate::store::{BlockStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EagerLoadPair {
    /// Owner id
    pub source: u64,
    /// Block id
    pub target: BlockId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EagerCriteria {
    pub field_id: u64,
}

/// Which blocks belong to which owner, plus the criteria to load them with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EagerLoadingMap {
    pub element_kind: ElementKind,
    pub map: Vec<EagerLoadPair>,
    pub criteria: EagerCriteria,
}

impl EagerLoadingMap {
    pub fn targets_of(&self, owner_id: u64) -> impl Iterator<Item = BlockId> + '_ {
        self.map
            .iter()
            .filter(move |pair| pair.source == owner_id)
            .map(|pair| pair.target)
    }
}

/// Map every block of `field_id` to its owner, for all `owner_ids` in one
/// store query. Pair order is whatever the store returns.
pub fn eager_loading_map(
    store: &dyn BlockStore,
    field_id: u64,
    owner_ids: &[u64],
) -> Result<EagerLoadingMap, StoreError> {
    let map = if owner_ids.is_empty() {
        Vec::new()
    } else {
        store
            .owner_block_pairs(field_id, owner_ids)?
            .into_iter()
            .map(|(source, target)| EagerLoadPair { source, target })
            .collect()
    };

    Ok(EagerLoadingMap {
        element_kind: ElementKind::NeoBlock,
        map,
        criteria: EagerCriteria { field_id },
    })
}
