//! # Tree Builder
//!
//! Rebuilds a field's block tree from a flat form submission.
//!
//! The client posts blocks as an ordered map keyed by block id (or `new…` for
//! blocks it created), each entry carrying a type handle and a 0-based level.
//! Nesting is never posted explicitly: a block's parent is the closest earlier
//! block one level up.
//!
//! ## Modules
//!
//! - **`posted`**: lenient parsing of the posted map into [`PostedBlock`]s
//! - **`builder`**: [`TreeBuilder`], matching posted entries to persisted blocks
//! - **`sequence`**: [`BlockSequence`], the prev/next chain and the stack-based
//!   outline over a built sequence
//!
//! ## Key Invariants
//!
//! - Output order is submission order
//! - An entry whose type cannot be resolved is dropped without affecting its
//!   siblings
//! - Rebuilding from the same inputs yields the same blocks

pub mod builder;
pub mod posted;
pub mod sequence;

pub use builder::TreeBuilder;
pub use posted::{PostedBlock, parse_posted};
pub use sequence::{BlockSequence, Link, OutlineNode, StructureError, parent_indices};
