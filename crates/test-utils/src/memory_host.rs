//! An in-memory content system implementing every host interface.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Result, bail};
use parking_lot::Mutex;
use uuid::Uuid;

use entity_xliff::{
    Actor, ActorContext, Entity, EntityKey, EntityMetadata, EntityStorage, Host, Paradigm,
    PropertyInfo, TranslationFeatures, TranslationHandler,
};

/// Entity types known to the default host.
pub const ENTITY_TYPES: &[&str] = &[
    "node",
    "user",
    "comment",
    "taxonomy_term",
    "field_collection_item",
    "paragraphs_item",
];

/// One call to `save` or `save_embedded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecord {
    pub key: EntityKey,
    pub language: String,
    pub embedded: bool,
    /// Stored as a field translation of an existing entity rather than
    /// replacing it.
    pub field_translation: bool,
}

/// One call to `save_field_translation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTranslationRecord {
    pub key: EntityKey,
    pub language: String,
    pub source_language: String,
}

#[derive(Debug, Default)]
struct State {
    entities: HashMap<EntityKey, Entity>,
    field_translations: HashMap<(EntityKey, String), Entity>,
    schemas: HashMap<(String, String), Vec<PropertyInfo>>,
    entity_types: HashSet<String>,
    features: HashSet<Paradigm>,
    bundles: HashSet<(Paradigm, String, String)>,
    default_language: String,
    saves: Vec<SaveRecord>,
    translation_records: Vec<FieldTranslationRecord>,
    prepare_calls: usize,
    translation_set_actors: Vec<Actor>,
}

/// Host backed by hash maps.
///
/// Saving an existing entity in a different language than the stored one
/// records a field translation instead of replacing the stored entity.
/// Translation sets hide unpublished members unless the current actor
/// bypasses access.
#[derive(Debug)]
pub struct MemoryHost {
    state: Mutex<State>,
    actor: Mutex<Actor>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let state = State {
            entity_types: ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
            default_language: "en".to_string(),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
            actor: Mutex::new(Actor::anonymous()),
        }
    }

    pub fn host(&self) -> Host<'_> {
        Host::from_backend(self)
    }

    pub fn enable_feature(&self, paradigm: Paradigm) -> &Self {
        self.state.lock().features.insert(paradigm);
        self
    }

    pub fn enable_bundle(&self, paradigm: Paradigm, entity_type: &str, bundle: &str) -> &Self {
        self.state
            .lock()
            .bundles
            .insert((paradigm, entity_type.to_string(), bundle.to_string()));
        self
    }

    pub fn define_bundle(&self, entity_type: &str, bundle: &str, properties: Vec<PropertyInfo>) -> &Self {
        self.state
            .lock()
            .schemas
            .insert((entity_type.to_string(), bundle.to_string()), properties);
        self
    }

    pub fn add_entity_type(&self, entity_type: &str) -> &Self {
        self.state.lock().entity_types.insert(entity_type.to_string());
        self
    }

    pub fn set_default_language(&self, language: &str) -> &Self {
        self.state.lock().default_language = language.to_string();
        self
    }

    /// Store an entity as-is, assigning an id when it has none.
    pub fn insert(&self, mut entity: Entity) -> Entity {
        let id = *entity.id.get_or_insert_with(Uuid::now_v7);
        entity.revision_id.get_or_insert_with(Uuid::now_v7);
        let key = EntityKey::new(entity.entity_type.clone(), id);
        self.state.lock().entities.insert(key, entity.clone());
        entity
    }

    pub fn get(&self, entity_type: &str, id: Uuid) -> Option<Entity> {
        self.state
            .lock()
            .entities
            .get(&EntityKey::new(entity_type, id))
            .cloned()
    }

    /// Reload an entity by its key, failing the test when it is gone.
    pub fn reload(&self, entity: &Entity) -> Entity {
        let key = entity.key();
        key.and_then(|k| self.get(&k.entity_type, k.id))
            .unwrap_or_else(|| panic!("{} is not stored", entity.display_key()))
    }

    /// Delete an entity, as a concurrent request would.
    pub fn forget(&self, entity: &Entity) {
        if let Some(key) = entity.key() {
            self.state.lock().entities.remove(&key);
        }
    }

    /// The field translation stored for an entity and language.
    pub fn field_translation(&self, entity: &Entity, language: &str) -> Option<Entity> {
        let key = entity.key()?;
        self.state
            .lock()
            .field_translations
            .get(&(key, language.to_string()))
            .cloned()
    }

    /// Every member of a translation group regardless of access.
    pub fn translation_group(&self, entity_type: &str, group: Uuid) -> BTreeMap<String, Uuid> {
        let state = self.state.lock();
        members(&state, entity_type, group, true)
    }

    pub fn saves(&self) -> Vec<SaveRecord> {
        self.state.lock().saves.clone()
    }

    pub fn clear_saves(&self) {
        self.state.lock().saves.clear();
    }

    pub fn translation_records(&self) -> Vec<FieldTranslationRecord> {
        self.state.lock().translation_records.clone()
    }

    pub fn prepare_calls(&self) -> usize {
        self.state.lock().prepare_calls
    }

    /// Actors in effect during each translation set lookup.
    pub fn translation_set_actors(&self) -> Vec<Actor> {
        self.state.lock().translation_set_actors.clone()
    }

    pub fn entity_count(&self, entity_type: &str) -> usize {
        self.state
            .lock()
            .entities
            .keys()
            .filter(|k| k.entity_type == entity_type)
            .count()
    }

    fn store(&self, entity: &mut Entity, embedded: bool) -> Result<()> {
        if entity.entity_type.is_empty() {
            bail!("cannot save an entity without a type");
        }
        let id = *entity.id.get_or_insert_with(Uuid::now_v7);
        if entity.revision_id.is_none() || entity.new_revision {
            entity.revision_id = Some(Uuid::now_v7());
        }
        entity.new_revision = false;

        let key = EntityKey::new(entity.entity_type.clone(), id);
        let mut state = self.state.lock();
        let field_translation = state.entities.get(&key).is_some_and(|stored| {
            !stored.is_language_neutral()
                && !entity.is_language_neutral()
                && stored.language != entity.language
        });
        if field_translation {
            state
                .field_translations
                .insert((key.clone(), entity.language.clone()), entity.clone());
        } else {
            state.entities.insert(key.clone(), entity.clone());
        }
        state.saves.push(SaveRecord {
            key,
            language: entity.language.clone(),
            embedded,
            field_translation,
        });
        Ok(())
    }
}

fn members(state: &State, entity_type: &str, group: Uuid, see_all: bool) -> BTreeMap<String, Uuid> {
    state
        .entities
        .iter()
        .filter(|(key, entity)| {
            key.entity_type == entity_type
                && entity.translation_group == Some(group)
                && (see_all || entity.published)
        })
        .map(|(key, entity)| (entity.language.clone(), key.id))
        .collect()
}

impl EntityStorage for MemoryHost {
    fn load(&self, entity_type: &str, id: Uuid) -> Result<Option<Entity>> {
        Ok(self.get(entity_type, id))
    }

    fn save(&self, entity: &mut Entity) -> Result<()> {
        self.store(entity, false)
    }

    fn save_embedded(&self, entity: &mut Entity) -> Result<()> {
        self.store(entity, true)
    }
}

impl EntityMetadata for MemoryHost {
    fn property_info(&self, entity: &Entity) -> Vec<PropertyInfo> {
        self.state
            .lock()
            .schemas
            .get(&(entity.entity_type.clone(), entity.bundle.clone()))
            .cloned()
            .unwrap_or_default()
    }

    fn is_entity_type(&self, name: &str) -> bool {
        self.state.lock().entity_types.contains(name)
    }

    fn default_language(&self) -> String {
        self.state.lock().default_language.clone()
    }
}

impl TranslationFeatures for MemoryHost {
    fn is_feature_available(&self, paradigm: Paradigm) -> bool {
        self.state.lock().features.contains(&paradigm)
    }

    fn is_bundle_enabled(&self, paradigm: Paradigm, entity_type: &str, bundle: &str) -> bool {
        self.state
            .lock()
            .bundles
            .contains(&(paradigm, entity_type.to_string(), bundle.to_string()))
    }
}

impl TranslationHandler for MemoryHost {
    fn translation_set(&self, entity_type: &str, group: Uuid) -> Result<BTreeMap<String, Uuid>> {
        let actor = self.current_actor();
        let mut state = self.state.lock();
        let see_all = actor.bypasses_access();
        state.translation_set_actors.push(actor);
        Ok(members(&state, entity_type, group, see_all))
    }

    /// Resets the target to the source's values and publication state,
    /// the way a host's translation form would pre-fill a new translation.
    fn prepare_translation(&self, target: &mut Entity, source: &Entity, _language: &str) -> Result<()> {
        target.fields = source.fields.clone();
        target.published = source.published;
        target.host = source.host.clone();
        self.state.lock().prepare_calls += 1;
        Ok(())
    }

    fn init_original_translation(&self, entity: &mut Entity, language: &str) -> Result<()> {
        entity.language = language.to_string();
        self.store(entity, false)
    }

    fn save_field_translation(
        &self,
        entity: &mut Entity,
        language: &str,
        source_language: &str,
    ) -> Result<()> {
        let Some(key) = entity.key() else {
            bail!("cannot record a translation of an unsaved entity");
        };
        self.state.lock().translation_records.push(FieldTranslationRecord {
            key,
            language: language.to_string(),
            source_language: source_language.to_string(),
        });
        Ok(())
    }
}

impl ActorContext for MemoryHost {
    fn current_actor(&self) -> Actor {
        self.actor.lock().clone()
    }

    fn set_current_actor(&self, actor: Actor) {
        *self.actor.lock() = actor;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn saving_in_another_language_records_a_field_translation() {
        let host = MemoryHost::new();
        let node = host.insert(Entity::new("node", "article", "en"));

        let mut german = node.clone();
        german.language = "de".into();
        host.save(&mut german).unwrap();

        assert_eq!(host.reload(&node).language, "en");
        assert_eq!(host.field_translation(&node, "de").unwrap().language, "de");
        assert!(host.saves()[0].field_translation);
    }

    #[test]
    fn unpublished_members_need_bypass_access() {
        let host = MemoryHost::new();
        let group = Uuid::now_v7();
        let mut draft = Entity::new("node", "article", "de");
        draft.translation_group = Some(group);
        draft.published = false;
        host.insert(draft);

        assert!(host.translation_set("node", group).unwrap().is_empty());
        host.set_current_actor(Actor::privileged());
        assert_eq!(host.translation_set("node", group).unwrap().len(), 1);
    }

    #[test]
    fn new_entities_get_identity_on_save() {
        let host = MemoryHost::new();
        let mut entity = Entity::new("paragraphs_item", "text_block", "und");
        host.save_embedded(&mut entity).unwrap();
        assert!(entity.id.is_some());
        assert!(entity.revision_id.is_some());
        assert!(host.saves()[0].embedded);
    }
}
