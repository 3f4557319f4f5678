//! Sub-entities that only exist attached to a host entity (field
//! collections, paragraphs).

use tracing::debug;

use super::{TranslatableStrategy, configurable_fields};
use crate::error::{XliffError, XliffResult};
use crate::host::{Host, with_elevated_actor};
use crate::model::Entity;

#[derive(Debug, Clone, Copy, Default)]
pub struct HostScopedStrategy;

impl HostScopedStrategy {
    /// Load the entity's stored host with a privileged actor, so unpublished
    /// hosts are still found.
    fn load_host(&self, host: Host<'_>, entity: &Entity) -> XliffResult<Option<Entity>> {
        let Some(host_ref) = &entity.host else {
            return Ok(None);
        };
        let loaded = with_elevated_actor(host.actors, || {
            host.storage.load(&host_ref.target_type, host_ref.target_id)
        })?;
        match loaded {
            Some(host_entity) => Ok(Some(host_entity)),
            None => Err(XliffError::DataGoneAway {
                key: host_ref.key().to_string(),
            }),
        }
    }
}

impl TranslatableStrategy for HostScopedStrategy {
    fn name(&self) -> &'static str {
        "host_scoped"
    }

    /// Reaching a sub-entity through its host is enough.
    fn is_translatable(&self, _host: Host<'_>, _entity: &Entity) -> bool {
        true
    }

    fn translatable_fields(&self, host: Host<'_>, entity: &Entity) -> Vec<String> {
        configurable_fields(host, entity)
    }

    /// The host's language, or the site default when the host is neutral or
    /// missing.
    fn source_language(&self, host: Host<'_>, entity: &Entity) -> XliffResult<String> {
        match self.load_host(host, entity)? {
            Some(host_entity) if !host_entity.is_language_neutral() && !host_entity.language.is_empty() => {
                Ok(host_entity.language)
            }
            _ => Ok(host.metadata.default_language()),
        }
    }

    /// Sub-entities are always initialized together with their host.
    fn initialize_translation(
        &self,
        _host: Host<'_>,
        _entity: &mut Entity,
        _source_language: &str,
    ) -> XliffResult<()> {
        Ok(())
    }

    /// When the stored host is in another language than the target, the
    /// sub-entity is duplicated; otherwise it already belongs to a target
    /// and is updated in place. Either way it is attached to the in-flight
    /// host target.
    fn resolve_target(
        &self,
        host: Host<'_>,
        source: &mut Entity,
        _source_language: &str,
        language: &str,
        parent: Option<&Entity>,
    ) -> XliffResult<Entity> {
        let stored_host = self.load_host(host, source)?;
        let attach_to = parent
            .and_then(Entity::record_ref)
            .or_else(|| stored_host.as_ref().and_then(Entity::record_ref))
            .or_else(|| source.host.clone());

        let mut target = source.clone();
        let shares_language = stored_host
            .as_ref()
            .is_some_and(|h| h.language == language);
        if shares_language {
            target.new_revision = false;
        } else {
            target.detach_identity();
        }
        target.language = language.to_string();
        target.host = attach_to;
        debug!(
            source = %source.display_key(),
            duplicated = !shares_language,
            language,
            "resolved embedded target"
        );
        Ok(target)
    }

    fn persist_new(&self, host: Host<'_>, target: &mut Entity) -> XliffResult<()> {
        host.storage.save_embedded(target)?;
        Ok(())
    }

    /// Saves only the sub-entity; the host is queued separately.
    fn save(
        &self,
        host: Host<'_>,
        target: &mut Entity,
        _language: &str,
        _source_language: &str,
    ) -> XliffResult<()> {
        host.storage.save_embedded(target)?;
        Ok(())
    }
}
