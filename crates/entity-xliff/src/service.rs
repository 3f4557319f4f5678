//! The long-lived entry point used by the XLIFF import/export layer.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{Config, TranslatableInfo};
use crate::error::{MergeReport, XliffResult};
use crate::field::{FieldHandler, FieldHandlerRegistry};
use crate::hooks::{HookRegistry, TranslationHook};
use crate::host::Host;
use crate::model::{Entity, LabeledTree};
use crate::session::{SessionOptions, TranslationSession};
use crate::translatable::{Paradigm, StrategyKind, TranslatableRegistry};

/// Registries, hooks and limits shared by every operation.
///
/// Everything here is read-only once built; per-request state lives in the
/// [`TranslationSession`] returned by [`EntityXliff::session`].
#[derive(Debug, Clone)]
pub struct EntityXliff {
    translatables: TranslatableRegistry,
    fields: FieldHandlerRegistry,
    hooks: HookRegistry,
    options: SessionOptions,
}

impl EntityXliff {
    /// Service with the built-in registries and default limits.
    pub fn with_defaults() -> Self {
        Self {
            translatables: TranslatableRegistry::with_defaults(),
            fields: FieldHandlerRegistry::with_defaults(),
            hooks: HookRegistry::new(),
            options: SessionOptions::default(),
        }
    }

    /// Service configured from `config`, applying its translatable-info
    /// file on top of the built-in registries.
    pub fn from_config(config: &Config) -> Result<Self> {
        let info = config.load_translatable_info()?;
        let service = Self::with_defaults()
            .with_options(SessionOptions::from(config))
            .with_translatable_info(&info);
        info!(
            translatables = info.translatables.len(),
            field_handlers = info.field_handlers.len(),
            max_depth = config.max_depth,
            strict = config.strict_structure,
            "entity xliff configured"
        );
        Ok(service)
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_translatable_info(mut self, info: &TranslatableInfo) -> Self {
        self.translatables.apply_config(&info.translatables);
        self.fields.apply_config(&info.field_handlers);
        self
    }

    /// Map an entity type to a strategy under one paradigm.
    pub fn register_translatable(&mut self, entity_type: &str, paradigm: Paradigm, kind: StrategyKind) {
        self.translatables.register(entity_type, paradigm, kind);
    }

    /// Register a custom field adapter.
    pub fn register_field_handler(&mut self, field_type: &str, handler: Arc<dyn FieldHandler>) {
        self.fields.register(field_type, handler);
    }

    pub fn register_hook(&mut self, name: &str, weight: i32, hook: Arc<dyn TranslationHook>) {
        self.hooks.register(name, weight, hook);
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn translatables(&self) -> &TranslatableRegistry {
        &self.translatables
    }

    pub fn field_handlers(&self) -> &FieldHandlerRegistry {
        &self.fields
    }

    /// Start an operation against `host`.
    pub fn session<'a>(&'a self, host: Host<'a>) -> TranslationSession<'a> {
        TranslationSession::new(host, &self.translatables, &self.fields, &self.hooks, self.options)
    }

    /// Extract `entity` in a one-off session.
    pub fn extract(&self, host: Host<'_>, entity: &Entity) -> XliffResult<LabeledTree> {
        self.session(host).extract(entity)
    }

    /// Merge and commit a translation in a one-off session.
    pub fn merge(
        &self,
        host: Host<'_>,
        entity: &Entity,
        tree: &LabeledTree,
        language: &str,
    ) -> XliffResult<MergeReport> {
        self.session(host).merge(entity, tree, language, true)
    }

    pub fn is_translatable(&self, host: Host<'_>, entity: &Entity) -> bool {
        self.session(host).is_translatable(entity)
    }
}

impl Default for EntityXliff {
    fn default() -> Self {
        Self::with_defaults()
    }
}
