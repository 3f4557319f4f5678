//! Extraction: source entity graph to labeled tree.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{XliffError, XliffResult};
use crate::field::FieldData;
use crate::model::{
    Entity, EntityKey, FieldPath, LabeledTree, Leaf, PropertyInfo, RecordRef, TreeNode,
    list_item_type,
};
use crate::session::TranslationSession;
use crate::translatable::TranslatableId;

impl TranslationSession<'_> {
    /// Flatten the translatable content of `entity` and everything it
    /// references into a labeled tree.
    ///
    /// Empty values produce no leaves. Fields of unknown type and
    /// references that cannot be followed are logged and left out.
    pub fn extract(&mut self, entity: &Entity) -> XliffResult<LabeledTree> {
        let not_translatable = || XliffError::NotTranslatable {
            entity_type: entity.entity_type.clone(),
        };
        let id = self.resolve(entity).ok_or_else(not_translatable)?;
        if !self.is_translatable_id(id) {
            return Err(not_translatable());
        }

        let mut stack = Vec::new();
        let tree = self.extract_entity(id, &FieldPath::default(), &mut stack, 0)?;
        info!(
            entity = %entity.display_key(),
            leaves = tree.leaves().len(),
            "extracted translatable data"
        );
        Ok(tree)
    }

    fn extract_entity(
        &mut self,
        id: TranslatableId,
        path: &FieldPath,
        stack: &mut Vec<EntityKey>,
        depth: usize,
    ) -> XliffResult<LabeledTree> {
        let translatable = self.translatable_mut(id)?;
        let entity = translatable.source.clone();
        let strategy = translatable.strategy.clone();

        let mut fields = strategy.translatable_fields(self.host, &entity);
        self.hooks.translatable_fields(&entity, &mut fields);
        let properties = self.host.metadata.property_info(&entity);

        let key = entity.key();
        if let Some(key) = &key {
            stack.push(key.clone());
        }

        let null = Value::Null;
        let mut tree = LabeledTree::new();
        for name in &fields {
            let field_path = path.child(name.as_str());
            let Some(info) = properties.iter().find(|p| &p.name == name) else {
                warn!(
                    entity = %entity.display_key(),
                    field = %field_path,
                    "translatable field has no property metadata"
                );
                continue;
            };
            let value = entity.field(name).unwrap_or(&null);
            if let Some(node) =
                self.extract_value(value, &info.field_type, info, &field_path, stack, depth)?
            {
                tree.insert(name.clone(), node);
            }
        }

        if key.is_some() {
            stack.pop();
        }
        Ok(tree)
    }

    fn extract_value(
        &mut self,
        value: &Value,
        field_type: &str,
        info: &PropertyInfo,
        path: &FieldPath,
        stack: &mut Vec<EntityKey>,
        depth: usize,
    ) -> XliffResult<Option<TreeNode>> {
        let adapters = self.fields;
        if let Some(handler) = adapters.get(field_type) {
            return Ok(match handler.get_value(value, info) {
                FieldData::Empty => None,
                FieldData::Text(text) => Some(Leaf::new(info.label.clone(), text).into()),
                FieldData::Tree(tree) => Some(tree.into()),
            });
        }

        if self.host.metadata.is_entity_type(field_type) {
            return self.extract_reference(value, path, stack, depth);
        }

        if let Some(item_type) = list_item_type(field_type) {
            let mut items = LabeledTree::new();
            for (delta, item) in value.as_array().into_iter().flatten().enumerate() {
                let item_path = path.child(delta.to_string());
                if let Some(node) = self.extract_value(item, item_type, info, &item_path, stack, depth)? {
                    items.insert(delta.to_string(), node);
                }
            }
            return Ok(Some(items.into()));
        }

        warn!(
            field = %path,
            field_type,
            "could not pull translatable data: unknown field type"
        );
        Ok(None)
    }

    fn extract_reference(
        &mut self,
        value: &Value,
        path: &FieldPath,
        stack: &mut Vec<EntityKey>,
        depth: usize,
    ) -> XliffResult<Option<TreeNode>> {
        let Some(reference) = RecordRef::from_value(value) else {
            return Ok(None);
        };
        let key = reference.key();

        if stack.contains(&key) {
            warn!(field = %path, entity = %key, "reference cycle, not descending");
            return Ok(None);
        }
        if depth + 1 > self.options.max_depth {
            warn!(
                field = %path,
                entity = %key,
                max_depth = self.options.max_depth,
                "reference nesting too deep, not descending"
            );
            return Ok(None);
        }

        let Some(entity) = self
            .host
            .storage
            .load(&reference.target_type, reference.target_id)?
        else {
            debug!(field = %path, entity = %key, "referenced entity not found");
            return Ok(None);
        };
        let Some(id) = self.resolve(&entity) else {
            warn!(
                field = %path,
                entity_type = %entity.entity_type,
                "could not pull referenced data: entity type is not translatable"
            );
            return Ok(None);
        };
        if !self.is_translatable_id(id) {
            debug!(field = %path, entity = %key, "referenced entity not enabled for translation");
            return Ok(None);
        }

        let tree = self.extract_entity(id, path, stack, depth + 1)?;
        Ok(Some(tree.into()))
    }
}
