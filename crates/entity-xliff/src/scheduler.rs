//! Deferred, depth-ordered persistence of merged entities.
//!
//! Every target touched by a merge is registered with its distance from the
//! root target. The drain persists the deepest entities first, so a parent
//! is never saved pointing at a child revision that does not exist yet.

use std::collections::HashMap;

use tracing::debug;

use crate::model::EntityKey;
use crate::translatable::TranslatableId;

/// One entity waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveQueueEntry {
    /// Distance from the root target when first registered.
    pub depth: usize,
    pub key: EntityKey,
    pub translatable: TranslatableId,
    pub language: String,
}

/// Pending saves of one session, keyed by target identity and language.
#[derive(Debug, Default)]
pub struct SaveScheduler {
    entries: Vec<SaveQueueEntry>,
    index: HashMap<(EntityKey, String), usize>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a target for saving.
    ///
    /// Registering an identity that is already queued keeps the depth it was
    /// first registered with, even when the new depth is smaller.
    pub fn register(
        &mut self,
        key: EntityKey,
        translatable: TranslatableId,
        language: &str,
        depth: usize,
    ) {
        let slot = (key, language.to_string());
        if let Some(&pos) = self.index.get(&slot) {
            let entry = &mut self.entries[pos];
            entry.translatable = translatable;
            debug!(
                entity = %entry.key,
                language,
                depth = entry.depth,
                requested = depth,
                "entity already queued for save"
            );
            return;
        }

        debug!(entity = %slot.0, language, depth, "queued entity for save");
        self.index.insert(slot.clone(), self.entries.len());
        self.entries.push(SaveQueueEntry {
            depth,
            key: slot.0,
            translatable,
            language: slot.1,
        });
    }

    /// The queued entry for a target identity, if any.
    pub fn lookup(&self, key: &EntityKey, language: &str) -> Option<&SaveQueueEntry> {
        let pos = self.index.get(&(key.clone(), language.to_string()))?;
        self.entries.get(*pos)
    }

    pub fn depth_of(&self, key: &EntityKey, language: &str) -> Option<usize> {
        self.lookup(key, language).map(|e| e.depth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every entry in save order: depth descending, registration order
    /// among equal depths. The scheduler is empty afterwards.
    pub fn drain_ordered(&mut self) -> Vec<SaveQueueEntry> {
        self.index.clear();
        let mut entries = std::mem::take(&mut self.entries);
        entries.sort_by(|a, b| b.depth.cmp(&a.depth));
        entries
    }

    /// Drop every pending entry without saving.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn key(ty: &str) -> EntityKey {
        EntityKey::new(ty, Uuid::now_v7())
    }

    #[test]
    fn first_registered_depth_wins() {
        let mut scheduler = SaveScheduler::new();
        let paragraph = key("paragraphs_item");
        scheduler.register(paragraph.clone(), TranslatableId(1), "de", 2);
        scheduler.register(paragraph.clone(), TranslatableId(1), "de", 0);
        assert_eq!(scheduler.depth_of(&paragraph, "de"), Some(2));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn deeper_registration_later_does_not_raise_depth() {
        let mut scheduler = SaveScheduler::new();
        let node = key("node");
        scheduler.register(node.clone(), TranslatableId(0), "de", 0);
        scheduler.register(node.clone(), TranslatableId(0), "de", 3);
        assert_eq!(scheduler.depth_of(&node, "de"), Some(0));
    }

    #[test]
    fn drain_is_deepest_first_and_stable() {
        let mut scheduler = SaveScheduler::new();
        let root = key("node");
        let first = key("paragraphs_item");
        let second = key("paragraphs_item");
        let nested = key("field_collection_item");
        scheduler.register(root.clone(), TranslatableId(0), "de", 0);
        scheduler.register(first.clone(), TranslatableId(1), "de", 1);
        scheduler.register(nested.clone(), TranslatableId(2), "de", 2);
        scheduler.register(second.clone(), TranslatableId(3), "de", 1);

        let order: Vec<EntityKey> = scheduler.drain_ordered().into_iter().map(|e| e.key).collect();
        assert_eq!(order, vec![nested, first, second, root]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn languages_are_queued_separately() {
        let mut scheduler = SaveScheduler::new();
        let node = key("node");
        scheduler.register(node.clone(), TranslatableId(0), "de", 0);
        scheduler.register(node.clone(), TranslatableId(0), "fr", 1);
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.depth_of(&node, "fr"), Some(1));
        assert!(scheduler.lookup(&node, "it").is_none());
    }
}
