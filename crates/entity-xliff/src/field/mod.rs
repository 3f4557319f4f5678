//! Field value adapters.
//!
//! An adapter reads the translatable content out of one field slot and
//! writes translated content back into it. Adapters are selected by the
//! field's declared type through a [`FieldHandlerRegistry`].

mod decode;
mod handlers;
mod registry;

use indexmap::IndexMap;
use thiserror::Error;

use crate::model::{LabeledTree, PropertyInfo, TreeNode};

pub use decode::{decode_entities, decode_translated_text};
pub use handlers::{
    FormattedHandler, ImageHandler, IntegerHandler, LinkHandler, StructuredHandler,
    SummarizedHandler, TextHandler,
};
pub use registry::{FieldHandlerKind, FieldHandlerRegistry};

/// Content read from a field slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    /// Nothing translatable; no leaf is emitted.
    Empty,
    /// One scalar string, wrapped into a leaf labeled with the field label.
    Text(String),
    /// Several labeled parts, spliced into the tree as-is.
    Tree(LabeledTree),
}

impl FieldData {
    pub(crate) fn from_tree(tree: LabeledTree) -> Self {
        if tree.is_empty() {
            FieldData::Empty
        } else {
            FieldData::Tree(tree)
        }
    }
}

/// Translated content for one field slot, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Text(String),
    Parts(IndexMap<String, String>),
}

impl Translation {
    /// Build a translation from a node of the translated tree.
    ///
    /// Leaves become [`Translation::Text`]; a branch of leaves becomes
    /// [`Translation::Parts`]. Values that are empty after trimming are
    /// skipped, and `None` is returned when nothing is left to apply.
    /// Deeper nesting is not valid for a single field slot and is reported
    /// as `Err` with the offending key.
    pub fn from_node(node: &TreeNode) -> Result<Option<Self>, String> {
        match node {
            TreeNode::Leaf(leaf) => {
                let text = decode_translated_text(&leaf.text);
                Ok((!text.is_empty()).then_some(Translation::Text(text)))
            }
            TreeNode::Branch(tree) => {
                let mut parts = IndexMap::new();
                for (key, child) in tree.iter() {
                    let Some(leaf) = child.as_leaf() else {
                        return Err(key.to_string());
                    };
                    let text = decode_translated_text(&leaf.text);
                    if !text.is_empty() {
                        parts.insert(key.to_string(), text);
                    }
                }
                Ok((!parts.is_empty()).then_some(Translation::Parts(parts)))
            }
        }
    }
}

/// Why an adapter refused a translated value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetValueError {
    /// The translation names a part the field does not have.
    #[error("field has no part named {0}")]
    UnknownPart(String),
    #[error("{0}")]
    Invalid(String),
}

/// Per-field-type get/set strategy.
pub trait FieldHandler: Send + Sync + std::fmt::Debug {
    /// Read translatable content from a slot value.
    fn get_value(&self, value: &serde_json::Value, info: &PropertyInfo) -> FieldData;

    /// Apply a translation onto a slot value. Parts not present in the
    /// translation are left untouched.
    fn set_value(
        &self,
        slot: &mut serde_json::Value,
        translation: &Translation,
        info: &PropertyInfo,
    ) -> Result<(), SetValueError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::Leaf;

    #[test]
    fn leaf_translation_is_decoded() {
        let node = TreeNode::Leaf(Leaf::new("", "  Caf&eacute; &amp; Bar "));
        assert_eq!(
            Translation::from_node(&node).unwrap(),
            Some(Translation::Text("Caf\u{e9} & Bar".into()))
        );
    }

    #[test]
    fn blank_leaves_are_skipped() {
        let node = TreeNode::Leaf(Leaf::new("Title", "   "));
        assert_eq!(Translation::from_node(&node).unwrap(), None);

        let branch = TreeNode::Branch(
            LabeledTree::new()
                .with("url", Leaf::new("", ""))
                .with("title", Leaf::new("", "Beispiel")),
        );
        let Some(Translation::Parts(parts)) = Translation::from_node(&branch).unwrap() else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(parts["title"], "Beispiel");
    }

    #[test]
    fn nested_branches_are_rejected() {
        let branch = TreeNode::Branch(
            LabeledTree::new().with("0", LabeledTree::new().with("value", Leaf::new("", "x"))),
        );
        assert_eq!(Translation::from_node(&branch).unwrap_err(), "0");
    }
}
