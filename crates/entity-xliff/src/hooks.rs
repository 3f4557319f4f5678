//! Alteration hooks invoked at fixed points of extraction and merging.
//!
//! Hooks are registered with a weight and called in weight order (lower =
//! called first). Every dispatch point is invoked even when no hook is
//! registered.

use std::sync::Arc;

use tracing::debug;

use crate::model::Entity;

/// Callbacks allowed to mutate data at the documented points. All methods
/// default to no-ops so implementors override only what they need.
pub trait TranslationHook: Send + Sync {
    /// Adjust the list of field names about to be extracted from `entity`.
    fn alter_translatable_fields(&self, _entity: &Entity, _fields: &mut Vec<String>) {}

    /// Adjust a freshly resolved target before any translated value is
    /// applied to it.
    fn alter_target(&self, _source: &Entity, _target: &mut Entity, _language: &str) {}

    /// Inspect or adjust an entity immediately before it is persisted.
    fn alter_presave(&self, _entity: &mut Entity, _language: &str) {}
}

/// A registered hook with its name and priority.
#[derive(Clone)]
pub struct HookHandler {
    pub name: String,
    /// Weight for ordering (lower = higher priority).
    pub weight: i32,
    pub hook: Arc<dyn TranslationHook>,
}

impl std::fmt::Debug for HookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookHandler")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Ordered set of hooks.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    handlers: Vec<HookHandler>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Handlers with equal weight keep registration order.
    pub fn register(&mut self, name: impl Into<String>, weight: i32, hook: Arc<dyn TranslationHook>) {
        self.handlers.push(HookHandler {
            name: name.into(),
            weight,
            hook,
        });
        self.handlers.sort_by_key(|h| h.weight);
    }

    pub fn handlers(&self) -> &[HookHandler] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn translatable_fields(&self, entity: &Entity, fields: &mut Vec<String>) {
        for handler in &self.handlers {
            handler.hook.alter_translatable_fields(entity, fields);
        }
        debug!(
            entity = %entity.display_key(),
            handlers = self.handlers.len(),
            fields = fields.len(),
            "translatable fields altered"
        );
    }

    pub fn target(&self, source: &Entity, target: &mut Entity, language: &str) {
        for handler in &self.handlers {
            handler.hook.alter_target(source, target, language);
        }
    }

    pub fn presave(&self, entity: &mut Entity, language: &str) {
        for handler in &self.handlers {
            handler.hook.alter_presave(entity, language);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct Append(&'static str);

    impl TranslationHook for Append {
        fn alter_translatable_fields(&self, _entity: &Entity, fields: &mut Vec<String>) {
            fields.push(self.0.to_string());
        }
    }

    struct DropField(&'static str);

    impl TranslationHook for DropField {
        fn alter_translatable_fields(&self, _entity: &Entity, fields: &mut Vec<String>) {
            fields.retain(|f| f != self.0);
        }
    }

    #[test]
    fn hooks_run_in_weight_order() {
        let mut hooks = HookRegistry::new();
        hooks.register("late", 10, Arc::new(Append("late")));
        hooks.register("early", -5, Arc::new(Append("early")));
        hooks.register("middle", 0, Arc::new(Append("middle")));

        let names: Vec<&str> = hooks.handlers().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["early", "middle", "late"]);

        let entity = Entity::new("node", "page", "en");
        let mut fields = Vec::new();
        hooks.translatable_fields(&entity, &mut fields);
        assert_eq!(fields, vec!["early", "middle", "late"]);
    }

    #[test]
    fn later_hooks_see_earlier_changes() {
        let mut hooks = HookRegistry::new();
        hooks.register("add", 0, Arc::new(Append("field_extra")));
        hooks.register("remove", 1, Arc::new(DropField("field_extra")));

        let entity = Entity::new("node", "page", "en");
        let mut fields = vec!["title".to_string()];
        hooks.translatable_fields(&entity, &mut fields);
        assert_eq!(fields, vec!["title"]);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let hooks = HookRegistry::new();
        let source = Entity::new("node", "page", "en");
        let mut target = source.clone();
        hooks.target(&source, &mut target, "de");
        hooks.presave(&mut target, "de");
        assert_eq!(source, target);
    }
}
