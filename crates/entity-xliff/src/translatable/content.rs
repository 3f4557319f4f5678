//! Content translation: one entity per language, grouped into a
//! translation set.

use tracing::debug;

use super::{Paradigm, TranslatableStrategy, configurable_fields};
use crate::error::{XliffError, XliffResult};
use crate::host::{Host, with_elevated_actor};
use crate::model::Entity;

/// Property that carries the entity label; translated alongside the
/// configurable fields when the bundle supports translation.
const TITLE_PROPERTY: &str = "title";

/// Strategy for bundles translated as separate sibling entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentStrategy;

impl ContentStrategy {
    /// Reuse an existing sibling. It is re-run through the host's prepare
    /// step so embedded sub-entities are linked correctly, then every
    /// field outside the translatable set, the publication status and the
    /// host link are put back from its stored version.
    fn reprepare_sibling(
        &self,
        host: Host<'_>,
        source: &Entity,
        stored: Entity,
        language: &str,
    ) -> XliffResult<Entity> {
        let translatable = self.translatable_fields(host, source);
        let mut target = stored.clone();
        with_elevated_actor(host.actors, || {
            host.translation.prepare_translation(&mut target, source, language)
        })?;

        for (name, value) in &stored.fields {
            if !translatable.iter().any(|f| f == name) {
                target.fields.insert(name.clone(), value.clone());
            }
        }
        target.id = stored.id;
        target.revision_id = stored.revision_id;
        target.translation_group = stored.translation_group;
        target.host = stored.host;
        target.published = stored.published;
        target.language = language.to_string();
        target.new_revision = false;
        Ok(target)
    }
}

impl TranslatableStrategy for ContentStrategy {
    fn name(&self) -> &'static str {
        "content"
    }

    fn is_translatable(&self, host: Host<'_>, entity: &Entity) -> bool {
        host.features
            .is_bundle_enabled(Paradigm::Content, &entity.entity_type, &entity.bundle)
    }

    fn translatable_fields(&self, host: Host<'_>, entity: &Entity) -> Vec<String> {
        let mut fields = configurable_fields(host, entity);
        if self.is_translatable(host, entity) && !fields.iter().any(|f| f == TITLE_PROPERTY) {
            fields.push(TITLE_PROPERTY.to_string());
        }
        fields
    }

    /// Neutral entities, or entities not yet part of a translation group,
    /// become the original of a group keyed by their own id.
    fn initialize_translation(
        &self,
        host: Host<'_>,
        entity: &mut Entity,
        source_language: &str,
    ) -> XliffResult<()> {
        if !entity.is_language_neutral() && entity.translation_group.is_some() {
            return Ok(());
        }
        let Some(key) = entity.key() else {
            return Err(XliffError::DataGoneAway {
                key: entity.display_key(),
            });
        };

        let mut fresh = host
            .storage
            .load(&key.entity_type, key.id)?
            .ok_or_else(|| XliffError::DataGoneAway {
                key: key.to_string(),
            })?;
        fresh.translation_group = Some(fresh.translation_group.unwrap_or(key.id));
        fresh.language = source_language.to_string();
        host.storage.save(&mut fresh)?;
        debug!(
            entity = %key,
            language = source_language,
            "promoted entity to original of its translation set"
        );
        *entity = fresh;
        Ok(())
    }

    fn resolve_target(
        &self,
        host: Host<'_>,
        source: &mut Entity,
        source_language: &str,
        language: &str,
        _parent: Option<&Entity>,
    ) -> XliffResult<Entity> {
        let group = source.translation_group.or(source.id);
        let siblings = match group {
            Some(group) => with_elevated_actor(host.actors, || {
                host.translation.translation_set(&source.entity_type, group)
            })?,
            None => Default::default(),
        };

        if let Some(&sibling_id) = siblings.get(language) {
            let stored = with_elevated_actor(host.actors, || {
                host.storage.load(&source.entity_type, sibling_id)
            })?
            .ok_or_else(|| XliffError::DataGoneAway {
                key: format!("{}:{}", source.entity_type, sibling_id),
            })?;
            debug!(
                source = %source.display_key(),
                target = %stored.display_key(),
                language,
                "reusing existing translation"
            );
            return self.reprepare_sibling(host, source, stored, language);
        }

        self.initialize_translation(host, source, source_language)?;
        let mut target = source.clone();
        target.detach_identity();
        target.language = language.to_string();
        target.translation_group = source.translation_group;
        with_elevated_actor(host.actors, || {
            host.translation.prepare_translation(&mut target, source, language)
        })?;
        debug!(
            source = %source.display_key(),
            language,
            "prepared new translation"
        );
        Ok(target)
    }

    fn save(
        &self,
        host: Host<'_>,
        target: &mut Entity,
        _language: &str,
        _source_language: &str,
    ) -> XliffResult<()> {
        host.storage.save(target)?;
        Ok(())
    }
}
