//! Shared helpers for entity XLIFF integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use serde_json::Value;
use uuid::Uuid;

use entity_xliff::{Entity, EntityXliff, LabeledTree, Leaf, SessionOptions, TreeNode};
pub use entity_xliff_test_utils::*;

/// Service with the built-in registries.
pub fn service() -> EntityXliff {
    EntityXliff::with_defaults()
}

/// Service that aborts on any diverged branch.
pub fn strict_service() -> EntityXliff {
    EntityXliff::with_defaults().with_options(SessionOptions {
        strict_structure: true,
        ..SessionOptions::default()
    })
}

/// Service following at most `max_depth` nested references.
pub fn shallow_service(max_depth: usize) -> EntityXliff {
    EntityXliff::with_defaults().with_options(SessionOptions {
        max_depth,
        ..SessionOptions::default()
    })
}

/// Leaf as it comes back from a translator, without a label.
pub fn text(value: &str) -> TreeNode {
    Leaf::new("", value).into()
}

/// Build a translated tree from `#text` JSON.
pub fn tree(value: Value) -> LabeledTree {
    serde_json::from_value(value).expect("translated tree JSON")
}

/// Id of the `language` member of `entity`'s translation group.
pub fn sibling_id(host: &MemoryHost, entity: &Entity, language: &str) -> Option<Uuid> {
    let id = entity.id.expect("stored entity");
    let group = host.reload(entity).translation_group.unwrap_or(id);
    host.translation_group(&entity.entity_type, group)
        .get(language)
        .copied()
}

/// The stored `language` sibling of `entity`.
pub fn sibling(host: &MemoryHost, entity: &Entity, language: &str) -> Entity {
    let id = sibling_id(host, entity, language).expect("translation sibling");
    host.get(&entity.entity_type, id).expect("stored sibling")
}

/// Entity referenced by `value`.
pub fn referenced(host: &MemoryHost, value: &Value) -> Entity {
    let reference = entity_xliff::RecordRef::from_value(value).expect("reference value");
    host.get(&reference.target_type, reference.target_id)
        .expect("referenced entity")
}
