//! Entity property metadata.

use serde::{Deserialize, Serialize};

/// Metadata for one property of an entity, as reported by the host.
///
/// `field_type` is the declared data type: an adapter name such as
/// `"text"` or `"field_item_link"`, an entity type such as `"node"`, or a
/// list of either written `"list<...>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the property is a configurable field (as opposed to a base
    /// property such as the id or the author).
    #[serde(default)]
    pub field: bool,
    /// Whether the field is translatable per language.
    #[serde(default)]
    pub translatable: bool,
    /// Sub-properties of multi-part fields, in declaration order.
    #[serde(default)]
    pub property_info: Vec<PropertyInfo>,
}

impl PropertyInfo {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.into(),
            label: name.into(),
            field_type: field_type.into(),
            field: false,
            translatable: false,
            property_info: Vec::new(),
        }
    }

    /// Shorthand for a configurable field.
    pub fn field(name: &str, field_type: &str) -> Self {
        Self {
            field: true,
            ..Self::new(name, field_type)
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    pub fn translatable(mut self) -> Self {
        self.translatable = true;
        self
    }

    pub fn sub_property(mut self, property: PropertyInfo) -> Self {
        self.property_info.push(property);
        self
    }

    /// Look up a sub-property by name.
    pub fn sub(&self, name: &str) -> Option<&PropertyInfo> {
        self.property_info.iter().find(|p| p.name == name)
    }
}

/// Item type of a `list<...>` type, or `None` for single-valued types.
pub fn list_item_type(field_type: &str) -> Option<&str> {
    field_type
        .strip_prefix("list<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::trim)
        .filter(|inner| !inner.is_empty())
}
