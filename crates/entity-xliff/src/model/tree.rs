//! The labeled tree exchanged with the XLIFF layer.
//!
//! Interior nodes are keyed by field name, sub-property name or list delta;
//! leaves carry `#label` / `#text`. Key order is the order fields were
//! walked, which the serializer preserves.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One translatable string and the label shown to the translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    #[serde(rename = "#label", default)]
    pub label: String,
    #[serde(rename = "#text")]
    pub text: String,
}

impl Leaf {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// A node is either a leaf or a nested tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf(Leaf),
    Branch(LabeledTree),
}

impl TreeNode {
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            TreeNode::Leaf(leaf) => Some(leaf),
            TreeNode::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&LabeledTree> {
        match self {
            TreeNode::Branch(tree) => Some(tree),
            TreeNode::Leaf(_) => None,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            TreeNode::Leaf(_) => false,
            TreeNode::Branch(tree) => tree.is_empty(),
        }
    }
}

impl From<Leaf> for TreeNode {
    fn from(leaf: Leaf) -> Self {
        TreeNode::Leaf(leaf)
    }
}

impl From<LabeledTree> for TreeNode {
    fn from(tree: LabeledTree) -> Self {
        TreeNode::Branch(tree)
    }
}

/// Flattened translatable representation of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabeledTree(IndexMap<String, TreeNode>);

impl LabeledTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Empty branches are dropped so the tree never carries
    /// keys without translatable content.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<TreeNode>) {
        let node = node.into();
        if node.is_empty() {
            return;
        }
        self.0.insert(key.into(), node);
    }

    /// Builder form of [`LabeledTree::insert`].
    pub fn with(mut self, key: impl Into<String>, node: impl Into<TreeNode>) -> Self {
        self.insert(key, node);
        self
    }

    pub fn get(&self, key: &str) -> Option<&TreeNode> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Follow a path of keys down to a node.
    pub fn at(&self, path: &[&str]) -> Option<&TreeNode> {
        let (first, rest) = path.split_first()?;
        let node = self.get(first)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.as_branch()?.at(rest)
    }

    /// Every leaf with its full key path, depth first in key order.
    pub fn leaves(&self) -> Vec<(FieldPath, &Leaf)> {
        let mut out = Vec::new();
        collect_leaves(self, &mut FieldPath::default(), &mut out);
        out
    }
}

fn collect_leaves<'t>(tree: &'t LabeledTree, path: &mut FieldPath, out: &mut Vec<(FieldPath, &'t Leaf)>) {
    for (key, node) in tree.iter() {
        path.push(key);
        match node {
            TreeNode::Leaf(leaf) => out.push((path.clone(), leaf)),
            TreeNode::Branch(child) => collect_leaves(child, path, out),
        }
        path.pop();
    }
}

/// Slash-separated key path used in diagnostics (`field_links/0/url`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_hash_keys_in_walk_order() {
        let tree = LabeledTree::new()
            .with("title", Leaf::new("Title", "Hello"))
            .with(
                "field_link",
                LabeledTree::new()
                    .with("url", Leaf::new("Link URL", "https://example.com"))
                    .with("title", Leaf::new("Title text", "Example")),
            );

        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(
            json,
            r##"{"title":{"#label":"Title","#text":"Hello"},"field_link":{"url":{"#label":"Link URL","#text":"https://example.com"},"title":{"#label":"Title text","#text":"Example"}}}"##
        );
    }

    #[test]
    fn deserializes_leaves_without_labels() {
        let tree: LabeledTree = serde_json::from_value(serde_json::json!({
            "field_link": {
                "url": {"#text": "https://example.de"},
                "title": {"#text": "Beispiel"}
            }
        }))
        .unwrap();

        let leaf = tree.at(&["field_link", "title"]).unwrap().as_leaf().unwrap();
        assert_eq!(leaf.text, "Beispiel");
        assert_eq!(leaf.label, "");
    }

    #[test]
    fn empty_branches_are_not_inserted() {
        let tree = LabeledTree::new().with("field_image", LabeledTree::new());
        assert!(tree.is_empty());
    }

    #[test]
    fn leaves_reports_full_paths() {
        let tree = LabeledTree::new().with(
            "field_items",
            LabeledTree::new()
                .with("0", Leaf::new("Item", "one"))
                .with("1", Leaf::new("Item", "two")),
        );
        let paths: Vec<String> = tree
            .leaves()
            .into_iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(paths, vec!["field_items/0", "field_items/1"]);
    }
}
