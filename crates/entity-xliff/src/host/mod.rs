//! Interfaces consumed from the host CMS.
//!
//! The core never talks to a database directly. Everything it needs from the
//! content system (loading and saving entities, property metadata, which
//! translation mechanisms are enabled, translation sets, the current actor)
//! goes through the traits in this module. Collaborators report failures as
//! `anyhow::Error`; the core wraps them in [`crate::XliffError::Host`].

mod actor;

use std::collections::BTreeMap;

use anyhow::Result;
use uuid::Uuid;

use crate::model::{Entity, PropertyInfo};
use crate::translatable::Paradigm;

pub use actor::{Actor, ActorContext, ElevatedActor, with_elevated_actor};

/// Entity loading and persistence.
pub trait EntityStorage: Send + Sync {
    /// Load one entity. `Ok(None)` means no such record exists.
    fn load(&self, entity_type: &str, id: Uuid) -> Result<Option<Entity>>;

    /// Persist an entity. New entities (no id) are assigned an id and a
    /// revision id; existing ones get a new revision id when
    /// `new_revision` is set.
    fn save(&self, entity: &mut Entity) -> Result<()>;

    /// Persist an entity that only exists attached to a host, without
    /// touching the host. Defaults to a plain save.
    fn save_embedded(&self, entity: &mut Entity) -> Result<()> {
        self.save(entity)
    }
}

/// Property metadata for entities.
pub trait EntityMetadata: Send + Sync {
    /// Properties of the entity in declaration order.
    fn property_info(&self, entity: &Entity) -> Vec<PropertyInfo>;

    /// Whether `name` is a known entity type (used to recognise reference
    /// fields by their declared type).
    fn is_entity_type(&self, name: &str) -> bool;

    /// The site default language.
    fn default_language(&self) -> String;
}

/// Which translation mechanisms are installed and enabled.
pub trait TranslationFeatures: Send + Sync {
    fn is_feature_available(&self, paradigm: Paradigm) -> bool;

    fn is_bundle_enabled(&self, paradigm: Paradigm, entity_type: &str, bundle: &str) -> bool;
}

/// The host's translation subsystem.
pub trait TranslationHandler: Send + Sync {
    /// Members of a translation group, keyed by language. Visibility of
    /// unpublished members depends on the current actor.
    fn translation_set(&self, entity_type: &str, group: Uuid) -> Result<BTreeMap<String, Uuid>>;

    /// Prepare `target` as a translation of `source` into `language`
    /// (duplicating embedded sub-entities and the like).
    fn prepare_translation(&self, target: &mut Entity, source: &Entity, language: &str)
    -> Result<()>;

    /// Record `language` as the original language of a previously neutral
    /// entity and persist it.
    fn init_original_translation(&self, entity: &mut Entity, language: &str) -> Result<()>;

    /// Record that `entity` now carries a translation into `language`.
    fn save_field_translation(
        &self,
        entity: &mut Entity,
        language: &str,
        source_language: &str,
    ) -> Result<()>;
}

/// Bundle of collaborator references handed to every operation.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub storage: &'a dyn EntityStorage,
    pub metadata: &'a dyn EntityMetadata,
    pub features: &'a dyn TranslationFeatures,
    pub translation: &'a dyn TranslationHandler,
    pub actors: &'a dyn ActorContext,
}

impl<'a> Host<'a> {
    /// Build a host view from one value implementing every collaborator.
    pub fn from_backend<B>(backend: &'a B) -> Self
    where
        B: EntityStorage + EntityMetadata + TranslationFeatures + TranslationHandler + ActorContext,
    {
        Self {
            storage: backend,
            metadata: backend,
            features: backend,
            translation: backend,
            actors: backend,
        }
    }
}

impl std::fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
