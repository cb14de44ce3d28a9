pub mod block;
pub mod block_type;
pub mod layout;

pub use block::{Block, BlockContent, BlockId, BlockRecord, ChangeState, FieldErrors};
pub use block_type::{BlockTypeDefinition, FieldRef, FieldSettings, Group, OwnerContext};
pub use layout::{ElementKind, FieldLayout, LayoutField, LayoutTab};
