//! Data model shared by every part of the core.

mod entity;
mod property;
mod tree;

pub use entity::{Entity, EntityKey, LANGUAGE_NONE, RecordRef, SlotAddress};
pub use property::{PropertyInfo, list_item_type};
pub use tree::{FieldPath, LabeledTree, Leaf, TreeNode};
