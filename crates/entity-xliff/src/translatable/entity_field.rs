//! Field-level translation: every language lives on the same entity.

use tracing::debug;

use super::{Paradigm, TranslatableStrategy, configurable_fields};
use crate::error::XliffResult;
use crate::host::Host;
use crate::model::Entity;

/// Strategy for bundles using per-field translation.
///
/// The target is the source entity itself switched to the target language;
/// saving it records a field translation through the host's translation
/// handler. The static variant skips language initialization for entity
/// types without meaningful language information.
#[derive(Debug, Clone, Copy)]
pub struct EntityFieldStrategy {
    initialize: bool,
}

impl EntityFieldStrategy {
    pub fn new() -> Self {
        Self { initialize: true }
    }

    pub fn without_initialization() -> Self {
        Self { initialize: false }
    }
}

impl Default for EntityFieldStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslatableStrategy for EntityFieldStrategy {
    fn name(&self) -> &'static str {
        if self.initialize {
            "entity_field"
        } else {
            "entity_field_static"
        }
    }

    fn is_translatable(&self, host: Host<'_>, entity: &Entity) -> bool {
        host.features
            .is_bundle_enabled(Paradigm::EntityField, &entity.entity_type, &entity.bundle)
    }

    /// Nothing when the bundle is not enabled.
    fn translatable_fields(&self, host: Host<'_>, entity: &Entity) -> Vec<String> {
        if !self.is_translatable(host, entity) {
            return Vec::new();
        }
        configurable_fields(host, entity)
    }

    fn initialize_translation(
        &self,
        host: Host<'_>,
        entity: &mut Entity,
        source_language: &str,
    ) -> XliffResult<()> {
        if !self.initialize || !entity.is_language_neutral() {
            return Ok(());
        }
        debug!(
            entity = %entity.display_key(),
            language = source_language,
            "initializing original field translation"
        );
        entity.language = source_language.to_string();
        host.translation
            .init_original_translation(entity, source_language)?;
        Ok(())
    }

    fn resolve_target(
        &self,
        _host: Host<'_>,
        source: &mut Entity,
        _source_language: &str,
        language: &str,
        _parent: Option<&Entity>,
    ) -> XliffResult<Entity> {
        let mut target = source.clone();
        target.language = language.to_string();
        Ok(target)
    }

    fn save(
        &self,
        host: Host<'_>,
        target: &mut Entity,
        language: &str,
        source_language: &str,
    ) -> XliffResult<()> {
        host.storage.save(target)?;
        host.translation
            .save_field_translation(target, language, source_language)?;
        Ok(())
    }
}
