//! Per-operation state: the translatable cache, in-flight targets and the
//! save queue.
//!
//! A session is created for one request by
//! [`EntityXliff::session`](crate::EntityXliff::session) and dropped with it,
//! so no entity data outlives the operation that loaded it. Extraction and
//! merging themselves live in [`crate::walker`].

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{XliffError, XliffResult};
use crate::field::FieldHandlerRegistry;
use crate::hooks::HookRegistry;
use crate::host::Host;
use crate::model::{Entity, EntityKey};
use crate::scheduler::SaveScheduler;
use crate::translatable::{Translatable, TranslatableId, TranslatableRegistry};

/// Walk limits for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub max_depth: usize,
    pub strict_structure: bool,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_depth: config.max_depth,
            strict_structure: config.strict_structure,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// One logical extract/merge operation.
pub struct TranslationSession<'a> {
    pub(crate) host: Host<'a>,
    pub(crate) registry: &'a TranslatableRegistry,
    pub(crate) fields: &'a FieldHandlerRegistry,
    pub(crate) hooks: &'a HookRegistry,
    pub(crate) options: SessionOptions,
    pub(crate) arena: Vec<Translatable>,
    /// Resolution results by source identity; `None` caches "not
    /// translatable".
    cache: HashMap<EntityKey, Option<TranslatableId>>,
    pub(crate) scheduler: SaveScheduler,
}

impl<'a> TranslationSession<'a> {
    pub(crate) fn new(
        host: Host<'a>,
        registry: &'a TranslatableRegistry,
        fields: &'a FieldHandlerRegistry,
        hooks: &'a HookRegistry,
        options: SessionOptions,
    ) -> Self {
        Self {
            host,
            registry,
            fields,
            hooks,
            options,
            arena: Vec::new(),
            cache: HashMap::new(),
            scheduler: SaveScheduler::new(),
        }
    }

    /// The translatable wrapping `entity`, if its type and paradigm have a
    /// strategy. Repeated calls for the same persisted entity return the
    /// same instance.
    pub fn resolve_translatable(&mut self, entity: &Entity) -> Option<&Translatable> {
        let id = self.resolve(entity)?;
        self.arena.get(id.0)
    }

    /// Whether `entity` can be offered for translation at all.
    pub fn is_translatable(&mut self, entity: &Entity) -> bool {
        self.resolve(entity)
            .is_some_and(|id| self.is_translatable_id(id))
    }

    pub fn translatable(&self, id: TranslatableId) -> Option<&Translatable> {
        self.arena.get(id.0)
    }

    /// Number of entities queued for the next [`commit`](Self::commit).
    pub fn pending_saves(&self) -> usize {
        self.scheduler.len()
    }

    /// Persist every queued target, deepest first.
    ///
    /// Each entity's source is initialized for translation, the presave
    /// hooks run, then the strategy saves the target. Returns the number of
    /// entities saved.
    pub fn commit(&mut self) -> XliffResult<usize> {
        let entries = self.scheduler.drain_ordered();
        let total = entries.len();
        let host = self.host;
        let hooks = self.hooks;

        for entry in entries {
            self.initialize(entry.translatable)?;
            let translatable = self.translatable_mut(entry.translatable)?;
            let source_language = translatable.source_language_or_compute(host)?;
            let Some(target) = translatable.targets.get_mut(&entry.language) else {
                return Err(XliffError::DataGoneAway {
                    key: entry.key.to_string(),
                });
            };
            hooks.presave(target, &entry.language);
            translatable
                .strategy
                .save(host, target, &entry.language, &source_language)?;
            debug!(
                entity = %entry.key,
                language = %entry.language,
                depth = entry.depth,
                strategy = translatable.strategy.name(),
                "saved translated entity"
            );
        }

        if total > 0 {
            info!(saved = total, "committed translation");
        }
        Ok(total)
    }

    pub(crate) fn resolve(&mut self, entity: &Entity) -> Option<TranslatableId> {
        let key = entity.key();
        if let Some(key) = &key
            && let Some(cached) = self.cache.get(key)
        {
            return *cached;
        }

        let resolved = self
            .registry
            .resolve(self.host.features, entity)
            .map(|(paradigm, strategy)| {
                let id = TranslatableId(self.arena.len());
                debug!(
                    entity = %entity.display_key(),
                    paradigm = %paradigm,
                    strategy = strategy.name(),
                    "resolved translatable"
                );
                self.arena
                    .push(Translatable::new(id, paradigm, strategy, entity.clone()));
                id
            });

        if let Some(key) = key {
            self.cache.insert(key, resolved);
        }
        resolved
    }

    pub(crate) fn is_translatable_id(&self, id: TranslatableId) -> bool {
        self.arena
            .get(id.0)
            .is_some_and(|t| t.strategy.is_translatable(self.host, &t.source))
    }

    pub(crate) fn translatable_mut(&mut self, id: TranslatableId) -> XliffResult<&mut Translatable> {
        self.arena
            .get_mut(id.0)
            .ok_or_else(|| XliffError::DataGoneAway {
                key: format!("translatable #{}", id.0),
            })
    }

    /// Run the strategy's language initialization on the source entity.
    pub(crate) fn initialize(&mut self, id: TranslatableId) -> XliffResult<()> {
        let host = self.host;
        let translatable = self.translatable_mut(id)?;
        let source_language = translatable.source_language_or_compute(host)?;
        translatable
            .strategy
            .initialize_translation(host, &mut translatable.source, &source_language)
    }

    /// Resolve (once per language) the target for a translatable and make
    /// sure it has a persisted identity. `parent` is the in-flight target
    /// referencing it, for embedded entities.
    pub(crate) fn prepare_target(
        &mut self,
        id: TranslatableId,
        language: &str,
        parent: Option<&Entity>,
    ) -> XliffResult<EntityKey> {
        let host = self.host;
        let hooks = self.hooks;
        let translatable = self.translatable_mut(id)?;
        if let Some(target) = translatable.targets.get(language) {
            return target.key().ok_or_else(|| XliffError::DataGoneAway {
                key: target.display_key(),
            });
        }

        let source_language = translatable.source_language_or_compute(host)?;
        let mut target = translatable.strategy.resolve_target(
            host,
            &mut translatable.source,
            &source_language,
            language,
            parent,
        )?;
        hooks.target(&translatable.source, &mut target, language);

        if target.is_new() {
            translatable.strategy.persist_new(host, &mut target)?;
            debug!(
                source = %translatable.source.display_key(),
                target = %target.display_key(),
                language,
                "persisted new translation target"
            );
        }
        let key = target.key().ok_or_else(|| {
            XliffError::Host(anyhow::anyhow!(
                "storage assigned no identifier to {}",
                target.display_key()
            ))
        })?;
        translatable.targets.insert(language.to_string(), target);
        Ok(key)
    }

    pub(crate) fn target(&self, id: TranslatableId, language: &str) -> XliffResult<&Entity> {
        self.arena
            .get(id.0)
            .and_then(|t| t.targets.get(language))
            .ok_or_else(|| XliffError::DataGoneAway {
                key: format!("target of translatable #{} in {language}", id.0),
            })
    }

    pub(crate) fn target_mut(&mut self, id: TranslatableId, language: &str) -> XliffResult<&mut Entity> {
        self.arena
            .get_mut(id.0)
            .and_then(|t| t.targets.get_mut(language))
            .ok_or_else(|| XliffError::DataGoneAway {
                key: format!("target of translatable #{} in {language}", id.0),
            })
    }

    /// Discard in-flight work after a fatal merge error so nothing from the
    /// failed walk can be committed later.
    pub(crate) fn abandon(&mut self, err: &XliffError) {
        warn!(
            error = %err,
            pending = self.scheduler.len(),
            "merge failed, discarding pending saves"
        );
        self.scheduler.clear();
        for translatable in &mut self.arena {
            translatable.targets.clear();
        }
    }
}

impl std::fmt::Debug for TranslationSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationSession")
            .field("options", &self.options)
            .field("translatables", &self.arena.len())
            .field("pending_saves", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}
