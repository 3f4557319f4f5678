//! Content entities as seen by the translation core.
//!
//! An [`Entity`] is a detached, owned copy of one record from the host CMS.
//! Field values are JSON. Scalars are strings or numbers, multi-part fields
//! are objects, list fields are arrays and entity references are
//! [`RecordRef`] objects.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language code used by the host for language-neutral content.
pub const LANGUAGE_NONE: &str = "und";

/// Persisted identity of an entity: `type:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: String,
    pub id: Uuid,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// A reference to another entity, stored as the value of a reference field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub target_id: Uuid,
    pub target_type: String,
}

impl RecordRef {
    pub fn new(target_id: Uuid, target_type: impl Into<String>) -> Self {
        Self {
            target_id,
            target_type: target_type.into(),
        }
    }

    /// Read a reference out of a field slot. Returns `None` for empty slots
    /// or values that are not references.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "target_id": self.target_id,
            "target_type": self.target_type,
        })
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.target_type.clone(), self.target_id)
    }
}

/// Address of one field slot on an entity: the field name plus, for list
/// fields, the item delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAddress<'a> {
    pub field: &'a str,
    pub delta: Option<usize>,
}

impl<'a> SlotAddress<'a> {
    pub fn field(field: &'a str) -> Self {
        Self { field, delta: None }
    }

    pub fn item(field: &'a str, delta: usize) -> Self {
        Self {
            field,
            delta: Some(delta),
        }
    }
}

/// One content entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type (e.g. "node", "paragraphs_item").
    pub entity_type: String,

    /// Bundle within the type (e.g. "article").
    pub bundle: String,

    /// Identifier, `None` while the entity has never been saved.
    #[serde(default)]
    pub id: Option<Uuid>,

    /// Current revision identifier.
    #[serde(default)]
    pub revision_id: Option<Uuid>,

    /// Language code, or [`LANGUAGE_NONE`].
    pub language: String,

    /// Translation group shared by every language sibling of this content.
    #[serde(default)]
    pub translation_group: Option<Uuid>,

    /// Host entity for entities that only exist attached to a parent.
    #[serde(default)]
    pub host: Option<RecordRef>,

    /// Whether the next save should create a new revision.
    #[serde(default)]
    pub new_revision: bool,

    /// Publication status.
    #[serde(default = "default_published")]
    pub published: bool,

    /// Field values keyed by property name.
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

fn default_published() -> bool {
    true
}

impl Entity {
    /// Create a new, unsaved entity.
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id: None,
            revision_id: None,
            language: language.into(),
            translation_group: None,
            host: None,
            new_revision: false,
            published: true,
            fields: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_field(mut self, name: &str, value: serde_json::Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Persisted identity, if the entity has been saved.
    pub fn key(&self) -> Option<EntityKey> {
        self.id.map(|id| EntityKey::new(self.entity_type.clone(), id))
    }

    /// `type:id` for logging; unsaved entities render as `type:new`.
    pub fn display_key(&self) -> String {
        match self.id {
            Some(id) => format!("{}:{}", self.entity_type, id),
            None => format!("{}:new", self.entity_type),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_language_neutral(&self) -> bool {
        self.language == LANGUAGE_NONE
    }

    /// A reference pointing at this entity, if it has been saved.
    pub fn record_ref(&self) -> Option<RecordRef> {
        self.id
            .map(|id| RecordRef::new(id, self.entity_type.clone()))
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: serde_json::Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Read one slot. For list items the field must hold an array long
    /// enough to contain the delta.
    pub fn slot(&self, address: SlotAddress<'_>) -> Option<&serde_json::Value> {
        let value = self.fields.get(address.field)?;
        match address.delta {
            Some(delta) => value.as_array()?.get(delta),
            None => Some(value),
        }
    }

    /// Mutable access to one slot.
    ///
    /// A single-valued field that is absent from the entity is created as
    /// `null` so adapters can fill it; list items are never created.
    pub fn slot_mut(&mut self, address: SlotAddress<'_>) -> Option<&mut serde_json::Value> {
        match address.delta {
            Some(delta) => self
                .fields
                .get_mut(address.field)?
                .as_array_mut()?
                .get_mut(delta),
            None => Some(
                self.fields
                    .entry(address.field.to_string())
                    .or_insert(serde_json::Value::Null),
            ),
        }
    }

    /// Drop persisted identity so the next save creates a new record.
    pub fn detach_identity(&mut self) {
        self.id = None;
        self.revision_id = None;
        self.new_revision = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn display_key_marks_unsaved_entities() {
        let entity = Entity::new("node", "page", "en");
        assert_eq!(entity.display_key(), "node:new");
        assert!(entity.key().is_none());

        let id = Uuid::now_v7();
        let saved = entity.with_id(id);
        assert_eq!(saved.display_key(), format!("node:{id}"));
        assert_eq!(saved.key().unwrap().to_string(), format!("node:{id}"));
    }

    #[test]
    fn slot_reads_list_items_by_delta() {
        let entity = Entity::new("node", "page", "en")
            .with_field("field_tags", serde_json::json!(["a", "b"]));
        assert_eq!(
            entity.slot(SlotAddress::item("field_tags", 1)),
            Some(&serde_json::json!("b"))
        );
        assert!(entity.slot(SlotAddress::item("field_tags", 2)).is_none());
    }

    #[test]
    fn slot_mut_creates_missing_single_field_only() {
        let mut entity = Entity::new("node", "page", "en");
        assert!(entity.slot_mut(SlotAddress::item("field_tags", 0)).is_none());

        let slot = entity.slot_mut(SlotAddress::field("field_body")).unwrap();
        assert!(slot.is_null());
        *slot = serde_json::json!("body");
        assert_eq!(entity.field("field_body"), Some(&serde_json::json!("body")));
    }

    #[test]
    fn record_ref_parses_reference_values() {
        let id = Uuid::now_v7();
        let value = RecordRef::new(id, "paragraphs_item").to_value();
        let parsed = RecordRef::from_value(&value).unwrap();
        assert_eq!(parsed.target_id, id);
        assert_eq!(parsed.target_type, "paragraphs_item");

        assert!(RecordRef::from_value(&serde_json::Value::Null).is_none());
        assert!(RecordRef::from_value(&serde_json::json!("text")).is_none());
    }

    #[test]
    fn detach_identity_marks_new_revision() {
        let mut entity = Entity::new("node", "page", "en").with_id(Uuid::now_v7());
        entity.revision_id = Some(Uuid::now_v7());
        entity.detach_identity();
        assert!(entity.is_new());
        assert!(entity.revision_id.is_none());
        assert!(entity.new_revision);
    }
}
