//! Per-entity translation strategies.
//!
//! A [`Translatable`] wraps one source entity for the duration of a
//! [`TranslationSession`](crate::TranslationSession). How its fields are
//! selected, how the parallel target entity is found or created and how that
//! target is persisted depends on the translation [`Paradigm`] in force for
//! the entity's bundle, and is delegated to a stateless
//! [`TranslatableStrategy`] chosen by the [`TranslatableRegistry`].

mod content;
mod entity_field;
mod host_scoped;
mod registry;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::XliffResult;
use crate::host::Host;
use crate::model::{Entity, EntityKey};

pub use content::ContentStrategy;
pub use entity_field::EntityFieldStrategy;
pub use host_scoped::HostScopedStrategy;
pub use registry::{TranslatableRegistry, translation_paradigm};

/// Which translation mechanism of the host governs an entity bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Paradigm {
    /// Per-field translations stored on the entity itself.
    #[serde(rename = "entity_translation")]
    EntityField,
    /// One entity per language, linked by a translation group.
    #[serde(rename = "content_translation")]
    Content,
    /// Neither mechanism applies to the bundle.
    #[serde(rename = "custom")]
    Custom,
}

impl Paradigm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Paradigm::EntityField => "entity_translation",
            Paradigm::Content => "content_translation",
            Paradigm::Custom => "custom",
        }
    }
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in strategy implementations, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Field translations on the entity itself.
    EntityField,
    /// Like `EntityField` for types without language initialization
    /// (comments, taxonomy terms).
    EntityFieldStatic,
    /// Separate sibling entities in a translation group.
    Content,
    /// Sub-entities that only exist attached to a host entity.
    HostScoped,
}

impl StrategyKind {
    pub fn strategy(self) -> Arc<dyn TranslatableStrategy> {
        match self {
            StrategyKind::EntityField => Arc::new(EntityFieldStrategy::new()),
            StrategyKind::EntityFieldStatic => Arc::new(EntityFieldStrategy::without_initialization()),
            StrategyKind::Content => Arc::new(ContentStrategy),
            StrategyKind::HostScoped => Arc::new(HostScopedStrategy),
        }
    }
}

/// Paradigm-specific behaviour of a translatable entity.
///
/// Implementations hold no per-entity state; everything they need is passed
/// in, and the session keeps the results.
pub trait TranslatableStrategy: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the entity's bundle is enabled for this strategy.
    fn is_translatable(&self, host: Host<'_>, entity: &Entity) -> bool;

    /// Names of the properties to extract, in declaration order.
    fn translatable_fields(&self, host: Host<'_>, entity: &Entity) -> Vec<String>;

    /// Language the entity's content is written in. Neutral entities fall
    /// back to the site default language.
    fn source_language(&self, host: Host<'_>, entity: &Entity) -> XliffResult<String> {
        if entity.is_language_neutral() || entity.language.is_empty() {
            Ok(host.metadata.default_language())
        } else {
            Ok(entity.language.clone())
        }
    }

    /// Promote a language-neutral entity to `source_language` and persist
    /// the promotion. Must be a no-op when already initialized.
    fn initialize_translation(
        &self,
        host: Host<'_>,
        entity: &mut Entity,
        source_language: &str,
    ) -> XliffResult<()>;

    /// Locate or create the entity that will carry the `language`
    /// translation of `source`. `parent` is the in-flight target that
    /// references the entity, when the entity is reached through a
    /// reference field.
    fn resolve_target(
        &self,
        host: Host<'_>,
        source: &mut Entity,
        source_language: &str,
        language: &str,
        parent: Option<&Entity>,
    ) -> XliffResult<Entity>;

    /// Give a freshly created target an identity before the walk continues.
    fn persist_new(&self, host: Host<'_>, target: &mut Entity) -> XliffResult<()> {
        host.storage.save(target)?;
        Ok(())
    }

    /// Persist a merged target.
    fn save(
        &self,
        host: Host<'_>,
        target: &mut Entity,
        language: &str,
        source_language: &str,
    ) -> XliffResult<()>;
}

/// Index of a [`Translatable`] inside its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslatableId(pub(crate) usize);

/// One source entity and everything derived from it during a session.
#[derive(Debug)]
pub struct Translatable {
    pub(crate) id: TranslatableId,
    pub(crate) paradigm: Paradigm,
    pub(crate) strategy: Arc<dyn TranslatableStrategy>,
    pub(crate) source: Entity,
    pub(crate) source_language: Option<String>,
    /// In-flight targets keyed by language.
    pub(crate) targets: HashMap<String, Entity>,
}

impl Translatable {
    pub(crate) fn new(
        id: TranslatableId,
        paradigm: Paradigm,
        strategy: Arc<dyn TranslatableStrategy>,
        source: Entity,
    ) -> Self {
        Self {
            id,
            paradigm,
            strategy,
            source,
            source_language: None,
            targets: HashMap::new(),
        }
    }

    pub fn id(&self) -> TranslatableId {
        self.id
    }

    pub fn paradigm(&self) -> Paradigm {
        self.paradigm
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// The wrapped source entity (after any language initialization).
    pub fn source(&self) -> &Entity {
        &self.source
    }

    pub fn key(&self) -> Option<EntityKey> {
        self.source.key()
    }

    /// The memoized source language, once it has been computed.
    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    /// The in-flight target for `language`, once resolved.
    pub fn target(&self, language: &str) -> Option<&Entity> {
        self.targets.get(language)
    }

    pub(crate) fn source_language_or_compute(&mut self, host: Host<'_>) -> XliffResult<String> {
        if let Some(language) = &self.source_language {
            return Ok(language.clone());
        }
        let language = self.strategy.source_language(host, &self.source)?;
        self.source_language = Some(language.clone());
        Ok(language)
    }
}

/// Configurable fields flagged translatable, in declaration order. Fields
/// without the flag are never walked.
fn configurable_fields(host: Host<'_>, entity: &Entity) -> Vec<String> {
    host.metadata
        .property_info(entity)
        .into_iter()
        .filter(|p| p.field && p.translatable)
        .map(|p| p.name)
        .collect()
}
