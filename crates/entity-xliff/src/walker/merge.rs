//! Merging: translated labeled tree onto the target entity graph.
//!
//! The translated tree is walked against the *target* entity. A key that no
//! longer resolves to a property or item of the target diverges: that
//! branch is logged, reported and skipped, and the rest of the tree is still
//! applied. Only failures that make the whole result untrustworthy (an
//! entity that can no longer be loaded, a storage error) abort the merge,
//! and they do so before anything is drained.

use tracing::{debug, info, trace, warn};

use crate::error::{MergeReport, SkipReason, SkippedBranch, XliffError, XliffResult};
use crate::field::{SetValueError, Translation};
use crate::model::{
    Entity, EntityKey, FieldPath, LabeledTree, PropertyInfo, RecordRef, SlotAddress, TreeNode,
    list_item_type,
};
use crate::session::TranslationSession;
use crate::translatable::TranslatableId;

impl TranslationSession<'_> {
    /// Apply `tree` as the `language` translation of `entity`.
    ///
    /// With `commit` the queued targets are saved deepest first before
    /// returning; without it they stay queued in the session until
    /// [`commit`](Self::commit) is called, so several merges can be saved
    /// together. A fatal error discards everything still queued.
    pub fn merge(
        &mut self,
        entity: &Entity,
        tree: &LabeledTree,
        language: &str,
        commit: bool,
    ) -> XliffResult<MergeReport> {
        let not_translatable = || XliffError::NotTranslatable {
            entity_type: entity.entity_type.clone(),
        };
        let root = self.resolve(entity).ok_or_else(not_translatable)?;
        if !self.is_translatable_id(root) {
            return Err(not_translatable());
        }

        let mut report = MergeReport::default();
        if let Err(err) = self.merge_root(root, tree, language, &mut report) {
            self.abandon(&err);
            return Err(err);
        }

        if commit {
            report.saved = self.commit()?;
        }
        info!(
            entity = %entity.display_key(),
            language,
            skipped = report.skipped.len(),
            saved = report.saved,
            pending = self.pending_saves(),
            "merged translation"
        );
        Ok(report)
    }

    fn merge_root(
        &mut self,
        root: TranslatableId,
        tree: &LabeledTree,
        language: &str,
        report: &mut MergeReport,
    ) -> XliffResult<()> {
        let target_key = self.prepare_target(root, language, None)?;
        self.scheduler.register(target_key.clone(), root, language, 0);

        let mut stack = vec![target_key];
        if let Some(source_key) = self.translatable_mut(root)?.source.key()
            && !stack.contains(&source_key)
        {
            stack.push(source_key);
        }
        self.merge_entity(root, language, tree, &FieldPath::default(), 0, &mut stack, report)?;

        if self.options.strict_structure
            && let Some(path) = report.diverged_paths().first()
        {
            return Err(XliffError::StructureDiverged {
                path: (*path).to_string(),
            });
        }
        self.initialize(root)
    }

    /// Apply every top-level key of `tree` to the target of `id`.
    #[allow(clippy::too_many_arguments)]
    fn merge_entity(
        &mut self,
        id: TranslatableId,
        language: &str,
        tree: &LabeledTree,
        path: &FieldPath,
        depth: usize,
        stack: &mut Vec<EntityKey>,
        report: &mut MergeReport,
    ) -> XliffResult<()> {
        let properties = {
            let target = self.target(id, language)?;
            self.host.metadata.property_info(target)
        };

        for (name, node) in tree.iter() {
            let field_path = path.child(name);
            let result = match properties.iter().find(|p| p.name == name) {
                Some(info) => self.merge_slot(
                    id,
                    language,
                    SlotAddress::field(name),
                    &info.field_type,
                    info,
                    node,
                    &field_path,
                    depth,
                    stack,
                    report,
                ),
                None => Err(XliffError::StructureDiverged {
                    path: field_path.to_string(),
                }),
            };
            absorb(result, &field_path, report)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_slot(
        &mut self,
        id: TranslatableId,
        language: &str,
        address: SlotAddress<'_>,
        field_type: &str,
        info: &PropertyInfo,
        node: &TreeNode,
        path: &FieldPath,
        depth: usize,
        stack: &mut Vec<EntityKey>,
        report: &mut MergeReport,
    ) -> XliffResult<()> {
        let adapters = self.fields;
        if let Some(handler) = adapters.get(field_type) {
            let translation = Translation::from_node(node).map_err(|key| XliffError::StructureDiverged {
                path: path.child(key).to_string(),
            })?;
            let Some(translation) = translation else {
                trace!(field = %path, "empty translation skipped");
                return Ok(());
            };

            let target = self.target_mut(id, language)?;
            let Some(slot) = target.slot_mut(address) else {
                return Err(XliffError::StructureDiverged {
                    path: path.to_string(),
                });
            };
            return handler
                .set_value(slot, &translation, info)
                .map_err(|err| match err {
                    SetValueError::UnknownPart(part) => XliffError::StructureDiverged {
                        path: path.child(part).to_string(),
                    },
                    SetValueError::Invalid(reason) => XliffError::InvalidValue {
                        path: path.to_string(),
                        reason,
                    },
                });
        }

        if self.host.metadata.is_entity_type(field_type) {
            return self.merge_reference(id, language, address, node, path, depth, stack, report);
        }

        if let Some(item_type) = list_item_type(field_type) {
            let (None, TreeNode::Branch(items)) = (address.delta, node) else {
                return Err(XliffError::StructureDiverged {
                    path: path.to_string(),
                });
            };
            for (key, child) in items.iter() {
                let item_path = path.child(key);
                let result = match key.parse::<usize>() {
                    Ok(delta) => self.merge_slot(
                        id,
                        language,
                        SlotAddress::item(address.field, delta),
                        item_type,
                        info,
                        child,
                        &item_path,
                        depth,
                        stack,
                        report,
                    ),
                    Err(_) => Err(XliffError::StructureDiverged {
                        path: item_path.to_string(),
                    }),
                };
                absorb(result, &item_path, report)?;
            }
            return Ok(());
        }

        warn!(
            field = %path,
            field_type,
            "could not set translated data: unknown field type"
        );
        report.skipped.push(SkippedBranch {
            path: path.to_string(),
            reason: SkipReason::UnknownFieldType {
                field_type: field_type.to_string(),
            },
        });
        Ok(())
    }

    /// Descend through a reference field.
    ///
    /// The referenced entity's target is reused when one is already in
    /// flight, otherwise resolved (and persisted when new). It is queued one
    /// level deeper than its parent, the parent's reference is pointed at
    /// it, and the same translated subtree is applied to it.
    #[allow(clippy::too_many_arguments)]
    fn merge_reference(
        &mut self,
        id: TranslatableId,
        language: &str,
        address: SlotAddress<'_>,
        node: &TreeNode,
        path: &FieldPath,
        depth: usize,
        stack: &mut Vec<EntityKey>,
        report: &mut MergeReport,
    ) -> XliffResult<()> {
        let TreeNode::Branch(subtree) = node else {
            return Err(XliffError::StructureDiverged {
                path: path.to_string(),
            });
        };
        let child_depth = depth + 1;
        if child_depth > self.options.max_depth {
            return Err(XliffError::DepthExceeded {
                path: path.to_string(),
                max: self.options.max_depth,
            });
        }

        let Some(current) = self
            .target(id, language)?
            .slot(address)
            .and_then(RecordRef::from_value)
        else {
            return Err(XliffError::StructureDiverged {
                path: path.to_string(),
            });
        };
        let current_key = current.key();
        if stack.contains(&current_key) {
            return Err(XliffError::ReferenceCycle {
                key: current_key.to_string(),
                path: path.to_string(),
            });
        }

        let (child, child_key) = match self.scheduler.lookup(&current_key, language) {
            Some(entry) => {
                trace!(field = %path, entity = %entry.key, "reusing in-flight target");
                (entry.translatable, entry.key.clone())
            }
            None => {
                let entity = self
                    .host
                    .storage
                    .load(&current.target_type, current.target_id)?
                    .ok_or_else(|| XliffError::DataGoneAway {
                        key: current_key.to_string(),
                    })?;
                let Some(child) = self.resolve(&entity) else {
                    warn!(
                        field = %path,
                        entity_type = %entity.entity_type,
                        "could not update entity reference: unknown entity type"
                    );
                    report.skipped.push(SkippedBranch {
                        path: path.to_string(),
                        reason: SkipReason::UnknownEntityType {
                            entity_type: entity.entity_type.clone(),
                        },
                    });
                    return Ok(());
                };
                let parent = self.target(id, language)?.clone();
                let key = self.prepare_target(child, language, Some(&parent))?;
                (child, key)
            }
        };
        if child_key != current_key && stack.contains(&child_key) {
            return Err(XliffError::ReferenceCycle {
                key: child_key.to_string(),
                path: path.to_string(),
            });
        }

        self.scheduler
            .register(child_key.clone(), child, language, child_depth);

        let reference = self
            .target(child, language)?
            .record_ref()
            .ok_or_else(|| XliffError::DataGoneAway {
                key: child_key.to_string(),
            })?;
        if let Some(slot) = self.target_mut(id, language)?.slot_mut(address) {
            *slot = reference.to_value();
        }
        if child_key != current_key {
            debug!(
                field = %path,
                from = %current_key,
                to = %child_key,
                depth = child_depth,
                "rewired entity reference"
            );
        }

        let pushed = if child_key == current_key { 1 } else { 2 };
        stack.push(current_key);
        if pushed == 2 {
            stack.push(child_key);
        }
        let result = self.merge_entity(child, language, subtree, path, child_depth, stack, report);
        stack.truncate(stack.len() - pushed);
        result
    }
}

/// Record a branch-local failure in the report and carry on; anything else
/// aborts the walk.
fn absorb(result: XliffResult<()>, path: &FieldPath, report: &mut MergeReport) -> XliffResult<()> {
    let Err(err) = result else {
        return Ok(());
    };
    match SkipReason::from_error(&err) {
        Some(reason) => {
            let path = err.path().map_or_else(|| path.to_string(), str::to_string);
            warn!(field = %path, error = %err, "skipping translated branch");
            report.skipped.push(SkippedBranch { path, reason });
            Ok(())
        }
        None => Err(err),
    }
}
