//! # Render Cache
//!
//! Builds the per-tab descriptors the client uses to show block forms, and
//! memoizes them.
//!
//! ## Modules
//!
//! - **`namespace`**: input name helpers and the request-scoped [`RenderContext`]
//!   whose namespace is entered and restored through a guard
//! - **`cache`**: cache keys, dependency descriptors and the shared [`CacheStore`]
//! - **`descriptor`**: serializable payloads handed to the client
//! - **`renderer`**: [`BlockRenderer`], the compute-or-reuse path and the
//!   field-wide fan-out
//!
//! ## Key Invariants
//!
//! - A cached descriptor is only reused while its stored [`BlockDependency`]
//!   still matches the current block type layout and block content
//! - Failed renders are never cached
//! - The ambient namespace is identical before and after every render call

pub mod cache;
pub mod descriptor;
pub mod namespace;
pub mod renderer;

pub use cache::{BlockDependency, CacheEntry, CacheKey, CacheStore, MemoryCacheStore};
pub use descriptor::{
    BlockInput, BlockTypeInput, GroupInput, InputPayload, StaticInput, TabDescriptor,
};
pub use namespace::{
    NamespaceScope, RenderContext, format_input_id, namespace_depth, namespace_input_name,
};
pub use renderer::BlockRenderer;

pub const NESTED_FIELD_MESSAGE: &str = "Unable to nest Neo fields.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Unable to nest Neo fields.")]
    NestedField { depth: usize },
    #[error("Failed to render tab {tab:?}: {reason}")]
    Delegate { tab: String, reason: String },
}
