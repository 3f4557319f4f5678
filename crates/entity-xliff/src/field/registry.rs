//! Field type to adapter mapping.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    FieldHandler, FormattedHandler, ImageHandler, IntegerHandler, LinkHandler, StructuredHandler,
    SummarizedHandler, TextHandler,
};

/// Built-in adapters, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldHandlerKind {
    Text,
    Integer,
    Formatted,
    Summarized,
    Link,
    Image,
    Structured,
}

impl FieldHandlerKind {
    pub fn handler(self) -> Arc<dyn FieldHandler> {
        match self {
            FieldHandlerKind::Text => Arc::new(TextHandler),
            FieldHandlerKind::Integer => Arc::new(IntegerHandler),
            FieldHandlerKind::Formatted => Arc::new(FormattedHandler),
            FieldHandlerKind::Summarized => Arc::new(SummarizedHandler),
            FieldHandlerKind::Link => Arc::new(LinkHandler),
            FieldHandlerKind::Image => Arc::new(ImageHandler),
            FieldHandlerKind::Structured => Arc::new(StructuredHandler),
        }
    }
}

/// Adapters keyed by declared field type.
#[derive(Debug, Clone, Default)]
pub struct FieldHandlerRegistry {
    handlers: HashMap<String, Arc<dyn FieldHandler>>,
}

impl FieldHandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_kind("text", FieldHandlerKind::Text);
        registry.register_kind("integer", FieldHandlerKind::Integer);
        registry.register_kind("text_formatted", FieldHandlerKind::Formatted);
        registry.register_kind("text_with_summary", FieldHandlerKind::Summarized);
        registry.register_kind("field_item_link", FieldHandlerKind::Link);
        registry.register_kind("field_item_image", FieldHandlerKind::Image);
        registry
    }

    /// Register a custom adapter for a field type, replacing any existing one.
    pub fn register(&mut self, field_type: &str, handler: Arc<dyn FieldHandler>) {
        self.handlers.insert(field_type.to_string(), handler);
    }

    pub fn register_kind(&mut self, field_type: &str, kind: FieldHandlerKind) {
        self.register(field_type, kind.handler());
    }

    pub fn apply_config(&mut self, overrides: &HashMap<String, FieldHandlerKind>) {
        for (field_type, kind) in overrides {
            self.register_kind(field_type, *kind);
        }
    }

    pub fn get(&self, field_type: &str) -> Option<&Arc<dyn FieldHandler>> {
        self.handlers.get(field_type)
    }

    pub fn contains(&self, field_type: &str) -> bool {
        self.handlers.contains_key(field_type)
    }
}
