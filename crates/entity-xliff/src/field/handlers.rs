//! Built-in field value adapters.

use serde_json::Value;

use super::{FieldData, FieldHandler, SetValueError, Translation};
use crate::model::{LabeledTree, Leaf, PropertyInfo};

const FORMATTED_PARTS: &[&str] = &["value"];
const SUMMARIZED_PARTS: &[&str] = &["value", "summary"];
const LINK_PARTS: &[&str] = &["url", "title"];
const IMAGE_PARTS: &[&str] = &["alt", "title"];

/// Non-empty string content of a JSON scalar.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-empty string stored under `key` of an object value.
fn part_text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_text)
}

/// Collect the named parts of a multi-part value into a tree, skipping
/// empty parts.
fn parts_tree(value: &Value, parts: &[(&str, String)]) -> FieldData {
    let mut tree = LabeledTree::new();
    for (key, label) in parts {
        if let Some(text) = part_text(value, key) {
            tree.insert(*key, Leaf::new(label.clone(), text));
        }
    }
    FieldData::from_tree(tree)
}

/// Apply translated parts onto a multi-part value, keeping every part the
/// translation does not mention. `allowed` restricts which part names are
/// accepted; anything else means the translated data no longer matches the
/// field.
fn merge_parts(
    slot: &mut Value,
    translation: &Translation,
    allowed: Option<&[&str]>,
    single_part: &str,
) -> Result<(), SetValueError> {
    let updates: Vec<(&str, &str)> = match translation {
        Translation::Text(text) => vec![(single_part, text.as_str())],
        Translation::Parts(parts) => parts.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
    };

    if let Some(allowed) = allowed
        && let Some((unknown, _)) = updates.iter().find(|(k, _)| !allowed.contains(k))
    {
        return Err(SetValueError::UnknownPart((*unknown).to_string()));
    }

    if slot.is_null() {
        *slot = Value::Object(serde_json::Map::new());
    }
    let Some(object) = slot.as_object_mut() else {
        return Err(SetValueError::Invalid(
            "multi-part field holds a non-object value".to_string(),
        ));
    };
    for (key, text) in updates {
        object.insert(key.to_string(), Value::String(text.to_string()));
    }
    Ok(())
}

/// Plain scalar text.
#[derive(Debug, Default)]
pub struct TextHandler;

impl FieldHandler for TextHandler {
    fn get_value(&self, value: &Value, _info: &PropertyInfo) -> FieldData {
        scalar_text(value).map_or(FieldData::Empty, FieldData::Text)
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        _info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        let Translation::Text(text) = translation else {
            return Err(SetValueError::Invalid(
                "expected a single value for a text field".to_string(),
            ));
        };
        *slot = Value::String(text.clone());
        Ok(())
    }
}

/// Integers; translated text is parsed because storage is strictly typed.
#[derive(Debug, Default)]
pub struct IntegerHandler;

impl FieldHandler for IntegerHandler {
    fn get_value(&self, value: &Value, _info: &PropertyInfo) -> FieldData {
        scalar_text(value).map_or(FieldData::Empty, FieldData::Text)
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        _info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        let Translation::Text(text) = translation else {
            return Err(SetValueError::Invalid(
                "expected a single value for an integer field".to_string(),
            ));
        };
        let number: i64 = text
            .parse()
            .map_err(|e| SetValueError::Invalid(format!("'{text}' is not an integer: {e}")))?;
        *slot = Value::from(number);
        Ok(())
    }
}

/// Text with a format: only `value` is translatable, `format` is kept.
#[derive(Debug, Default)]
pub struct FormattedHandler;

impl FieldHandler for FormattedHandler {
    fn get_value(&self, value: &Value, _info: &PropertyInfo) -> FieldData {
        part_text(value, "value").map_or(FieldData::Empty, FieldData::Text)
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        _info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        merge_parts(slot, translation, Some(FORMATTED_PARTS), "value")
    }
}

/// Long text with a separately translatable summary.
#[derive(Debug, Default)]
pub struct SummarizedHandler;

impl FieldHandler for SummarizedHandler {
    fn get_value(&self, value: &Value, info: &PropertyInfo) -> FieldData {
        parts_tree(
            value,
            &[
                ("value", format!("{} (value)", info.label)),
                ("summary", format!("{} (summary)", info.label)),
            ],
        )
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        _info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        merge_parts(slot, translation, Some(SUMMARIZED_PARTS), "value")
    }
}

/// Links: url and title.
#[derive(Debug, Default)]
pub struct LinkHandler;

impl FieldHandler for LinkHandler {
    fn get_value(&self, value: &Value, _info: &PropertyInfo) -> FieldData {
        parts_tree(
            value,
            &[
                ("url", "Link URL".to_string()),
                ("title", "Title text".to_string()),
            ],
        )
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        _info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        merge_parts(slot, translation, Some(LINK_PARTS), "title")
    }
}

/// Images: alternate text and title; the file reference is untouched.
#[derive(Debug, Default)]
pub struct ImageHandler;

impl FieldHandler for ImageHandler {
    fn get_value(&self, value: &Value, _info: &PropertyInfo) -> FieldData {
        parts_tree(
            value,
            &[
                ("alt", "Alternate text".to_string()),
                ("title", "Title text".to_string()),
            ],
        )
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        _info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        merge_parts(slot, translation, Some(IMAGE_PARTS), "alt")
    }
}

/// Arbitrary key/value structures described by the field's sub-property
/// metadata. Without sub-property metadata every string part is exposed,
/// labeled by its key.
#[derive(Debug, Default)]
pub struct StructuredHandler;

impl FieldHandler for StructuredHandler {
    fn get_value(&self, value: &Value, info: &PropertyInfo) -> FieldData {
        let parts: Vec<(&str, String)> = if info.property_info.is_empty() {
            value
                .as_object()
                .map(|o| o.keys().map(|k| (k.as_str(), k.clone())).collect())
                .unwrap_or_default()
        } else {
            info.property_info
                .iter()
                .map(|p| (p.name.as_str(), p.label.clone()))
                .collect()
        };
        parts_tree(value, &parts)
    }

    fn set_value(
        &self,
        slot: &mut Value,
        translation: &Translation,
        info: &PropertyInfo,
    ) -> Result<(), SetValueError> {
        if matches!(translation, Translation::Text(_)) {
            return Err(SetValueError::Invalid(
                "expected named parts for a structured field".to_string(),
            ));
        }
        let names: Vec<&str> = info.property_info.iter().map(|p| p.name.as_str()).collect();
        let allowed = (!names.is_empty()).then_some(names.as_slice());
        merge_parts(slot, translation, allowed, "")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;

    fn parts(pairs: &[(&str, &str)]) -> Translation {
        Translation::Parts(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<IndexMap<_, _>>(),
        )
    }

    fn tree_of(data: FieldData) -> LabeledTree {
        match data {
            FieldData::Tree(tree) => tree,
            other => panic!("expected a tree, got {other:?}"),
        }
    }

    #[test]
    fn text_skips_blank_values() {
        let info = PropertyInfo::field("title", "text");
        assert_eq!(TextHandler.get_value(&json!("   "), &info), FieldData::Empty);
        assert_eq!(TextHandler.get_value(&Value::Null, &info), FieldData::Empty);
        assert_eq!(
            TextHandler.get_value(&json!("Hello"), &info),
            FieldData::Text("Hello".into())
        );
    }

    #[test]
    fn integer_parses_translated_text() {
        let info = PropertyInfo::field("field_count", "integer");
        let mut slot = json!(3);
        assert_eq!(
            IntegerHandler.get_value(&slot, &info),
            FieldData::Text("3".into())
        );
        IntegerHandler
            .set_value(&mut slot, &Translation::Text("42".into()), &info)
            .unwrap();
        assert_eq!(slot, json!(42));

        let err = IntegerHandler
            .set_value(&mut slot, &Translation::Text("zweiundvierzig".into()), &info)
            .unwrap_err();
        assert!(matches!(err, SetValueError::Invalid(_)));
        assert_eq!(slot, json!(42));
    }

    #[test]
    fn formatted_keeps_format() {
        let info = PropertyInfo::field("field_body", "text_formatted");
        let mut slot = json!({"value": "<p>Hello</p>", "format": "filtered_html"});
        assert_eq!(
            FormattedHandler.get_value(&slot, &info),
            FieldData::Text("<p>Hello</p>".into())
        );
        FormattedHandler
            .set_value(&mut slot, &Translation::Text("<p>Hallo</p>".into()), &info)
            .unwrap();
        assert_eq!(slot, json!({"value": "<p>Hallo</p>", "format": "filtered_html"}));
    }

    #[test]
    fn summarized_labels_follow_field_label() {
        let info = PropertyInfo::field("body", "text_with_summary").label("Body");
        let tree = tree_of(SummarizedHandler.get_value(
            &json!({"value": "Full text", "summary": "Short", "format": "plain_text"}),
            &info,
        ));
        assert_eq!(tree.get("value").unwrap().as_leaf().unwrap().label, "Body (value)");
        assert_eq!(
            tree.get("summary").unwrap().as_leaf().unwrap().label,
            "Body (summary)"
        );
    }

    #[test]
    fn summarized_without_summary_emits_value_only() {
        let info = PropertyInfo::field("body", "text_with_summary").label("Body");
        let tree = tree_of(SummarizedHandler.get_value(&json!({"value": "Full text", "summary": ""}), &info));
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["value"]);
    }

    #[test]
    fn link_extracts_url_and_title() {
        let info = PropertyInfo::field("field_link", "field_item_link");
        let tree = tree_of(LinkHandler.get_value(
            &json!({"url": "https://example.com", "title": "Example"}),
            &info,
        ));
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "url": {"#label": "Link URL", "#text": "https://example.com"},
                "title": {"#label": "Title text", "#text": "Example"}
            })
        );
    }

    #[test]
    fn link_merge_preserves_untranslated_parts() {
        let info = PropertyInfo::field("field_link", "field_item_link");
        let mut slot = json!({"url": "https://example.com", "title": "Example", "attributes": {}});
        LinkHandler
            .set_value(&mut slot, &parts(&[("title", "Beispiel")]), &info)
            .unwrap();
        assert_eq!(
            slot,
            json!({"url": "https://example.com", "title": "Beispiel", "attributes": {}})
        );
    }

    #[test]
    fn link_rejects_unknown_parts() {
        let info = PropertyInfo::field("field_link", "field_item_link");
        let mut slot = json!({"url": "https://example.com"});
        let err = LinkHandler
            .set_value(&mut slot, &parts(&[("anchor", "x")]), &info)
            .unwrap_err();
        assert!(matches!(err, SetValueError::UnknownPart(ref p) if p == "anchor"));
    }

    #[test]
    fn image_without_alt_or_title_is_empty() {
        let info = PropertyInfo::field("field_image", "field_item_image");
        assert_eq!(
            ImageHandler.get_value(&json!({"fid": 7, "alt": "", "title": null}), &info),
            FieldData::Empty
        );
    }

    #[test]
    fn structured_uses_sub_property_labels() {
        let info = PropertyInfo::field("field_address", "addressfield")
            .sub_property(PropertyInfo::new("locality", "text").label("City"))
            .sub_property(PropertyInfo::new("country", "text").label("Country"));
        let mut slot = json!({"locality": "Vienna", "country": "", "postal_code": "1010"});
        let tree = tree_of(StructuredHandler.get_value(&slot, &info));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("locality").unwrap().as_leaf().unwrap().label, "City");

        StructuredHandler
            .set_value(&mut slot, &parts(&[("locality", "Wien")]), &info)
            .unwrap();
        assert_eq!(slot["locality"], json!("Wien"));
        assert_eq!(slot["postal_code"], json!("1010"));
    }

    #[test]
    fn multi_part_fill_creates_object_for_empty_slot() {
        let info = PropertyInfo::field("field_image", "field_item_image");
        let mut slot = Value::Null;
        ImageHandler
            .set_value(&mut slot, &parts(&[("alt", "Ein Bild")]), &info)
            .unwrap();
        assert_eq!(slot, json!({"alt": "Ein Bild"}));
    }
}
