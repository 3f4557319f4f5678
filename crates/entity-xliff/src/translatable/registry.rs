//! Entity type to strategy mapping and paradigm resolution.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Paradigm, StrategyKind, TranslatableStrategy};
use crate::host::TranslationFeatures;
use crate::model::Entity;

/// Registry mapping entity types to the strategy used for each paradigm.
///
/// Built once from the built-in defaults plus configuration and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct TranslatableRegistry {
    types: HashMap<String, HashMap<Paradigm, StrategyKind>>,
    strategies: HashMap<StrategyKind, Arc<dyn TranslatableStrategy>>,
}

impl TranslatableRegistry {
    /// An empty registry: nothing is translatable.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            strategies: HashMap::new(),
        }
    }

    /// Registry with the built-in entity types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("node", Paradigm::Content, StrategyKind::Content);
        registry.register("node", Paradigm::EntityField, StrategyKind::EntityField);
        registry.register("user", Paradigm::EntityField, StrategyKind::EntityField);
        registry.register("comment", Paradigm::EntityField, StrategyKind::EntityFieldStatic);
        registry.register("taxonomy_term", Paradigm::EntityField, StrategyKind::EntityFieldStatic);
        for embedded in ["field_collection_item", "paragraphs_item"] {
            registry.register(embedded, Paradigm::Content, StrategyKind::HostScoped);
            registry.register(embedded, Paradigm::EntityField, StrategyKind::EntityField);
        }
        registry
    }

    /// Map `entity_type` under `paradigm` to a strategy, replacing any
    /// earlier mapping.
    pub fn register(&mut self, entity_type: &str, paradigm: Paradigm, kind: StrategyKind) {
        self.types
            .entry(entity_type.to_string())
            .or_default()
            .insert(paradigm, kind);
        self.strategies.entry(kind).or_insert_with(|| kind.strategy());
    }

    /// Apply configured overrides on top of the current mappings.
    pub fn apply_config(&mut self, overrides: &HashMap<String, HashMap<Paradigm, StrategyKind>>) {
        for (entity_type, paradigms) in overrides {
            for (paradigm, kind) in paradigms {
                self.register(entity_type, *paradigm, *kind);
            }
        }
    }

    pub fn kind_for(&self, entity_type: &str, paradigm: Paradigm) -> Option<StrategyKind> {
        self.types.get(entity_type)?.get(&paradigm).copied()
    }

    /// Strategy for an entity under the paradigm in force for its bundle.
    ///
    /// `None` means the entity is not translatable: its type is unknown or
    /// has no strategy for the resolved paradigm.
    pub fn resolve(
        &self,
        features: &dyn TranslationFeatures,
        entity: &Entity,
    ) -> Option<(Paradigm, Arc<dyn TranslatableStrategy>)> {
        let paradigm = translation_paradigm(features, entity);
        let kind = self.kind_for(&entity.entity_type, paradigm)?;
        let strategy = self.strategies.get(&kind)?;
        Some((paradigm, Arc::clone(strategy)))
    }
}

impl Default for TranslatableRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Paradigm in force for an entity's bundle.
///
/// Field-level translation wins whenever it is available and enabled for
/// the bundle, even if content translation would also apply.
pub fn translation_paradigm(features: &dyn TranslationFeatures, entity: &Entity) -> Paradigm {
    let enabled = |paradigm| {
        features.is_feature_available(paradigm)
            && features.is_bundle_enabled(paradigm, &entity.entity_type, &entity.bundle)
    };
    if enabled(Paradigm::EntityField) {
        Paradigm::EntityField
    } else if enabled(Paradigm::Content) {
        Paradigm::Content
    } else {
        Paradigm::Custom
    }
}
