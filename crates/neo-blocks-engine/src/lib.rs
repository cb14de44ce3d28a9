pub mod criteria;
pub mod eager;
pub mod field;
pub mod host;
mod lenient;
pub mod models;
pub mod registry;
pub mod render;
pub mod settings;
pub mod store;
pub mod tree;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use criteria::*;
pub use eager::*;
pub use field::*;
pub use host::*;
pub use models::*;
pub use registry::*;
pub use render::{
    BlockRenderer, CacheStore, InputPayload, MemoryCacheStore, RenderContext, RenderError,
    StaticInput, TabDescriptor,
};
pub use settings::{SettingsAssembler, SettingsInput, SettingsReport, validate_settings};
pub use store::*;
pub use tree::{BlockSequence, StructureError, TreeBuilder};
pub use validation::{ValidationReport, ValidationRule, Validator};
