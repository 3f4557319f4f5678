//! Shared test utilities for the entity XLIFF crates.
//!
//! Provides [`MemoryHost`], a complete in-memory host, plus fixture builders
//! for the article / paragraph / caption bundles used across the test
//! suites.

mod memory_host;

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use uuid::Uuid;

use entity_xliff::{Entity, Paradigm, PropertyInfo, RecordRef};

pub use memory_host::{ENTITY_TYPES, FieldTranslationRecord, MemoryHost, SaveRecord};

/// Bundle names used by the fixtures.
pub mod bundles {
    pub const ARTICLE: &str = "article";
    pub const TEXT_BLOCK: &str = "text_block";
    pub const CAPTION: &str = "caption";
}

/// Property metadata for the fixture bundles.
pub mod schemas {
    use entity_xliff::PropertyInfo;

    /// Articles: a title, every built-in field type, and references to
    /// paragraphs and related articles.
    pub fn article() -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::new("title", "text").label("Title").translatable(),
            PropertyInfo::new("path", "text").label("URL alias"),
            PropertyInfo::field("field_body", "text_with_summary")
                .label("Body")
                .translatable(),
            PropertyInfo::field("field_link", "field_item_link")
                .label("Link")
                .translatable(),
            PropertyInfo::field("field_image", "field_item_image")
                .label("Image")
                .translatable(),
            PropertyInfo::field("field_count", "integer")
                .label("Count")
                .translatable(),
            PropertyInfo::field("field_tags", "list<text>").label("Tags"),
            PropertyInfo::field("field_paragraphs", "list<paragraphs_item>")
                .label("Paragraphs")
                .translatable(),
            PropertyInfo::field("field_related", "node")
                .label("Related")
                .translatable(),
        ]
    }

    /// Paragraphs: formatted text and one nested caption.
    pub fn text_block() -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::field("field_text", "text_formatted")
                .label("Text")
                .translatable(),
            PropertyInfo::field("field_caption", "field_collection_item")
                .label("Caption")
                .translatable(),
        ]
    }

    pub fn caption() -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::field("field_caption_text", "text")
                .label("Caption text")
                .translatable(),
        ]
    }
}

impl MemoryHost {
    fn with_fixture_bundles(paradigm: Paradigm) -> Self {
        let host = Self::new();
        host.enable_feature(paradigm);
        for (entity_type, bundle, schema) in [
            ("node", bundles::ARTICLE, schemas::article()),
            ("paragraphs_item", bundles::TEXT_BLOCK, schemas::text_block()),
            ("field_collection_item", bundles::CAPTION, schemas::caption()),
        ] {
            host.define_bundle(entity_type, bundle, schema);
            host.enable_bundle(paradigm, entity_type, bundle);
        }
        host
    }

    /// Host where every fixture bundle uses content translation.
    pub fn content_site() -> Self {
        Self::with_fixture_bundles(Paradigm::Content)
    }

    /// Host where every fixture bundle uses field-level translation.
    pub fn field_site() -> Self {
        Self::with_fixture_bundles(Paradigm::EntityField)
    }

    /// Store a caption, a paragraph holding it and an article holding the
    /// paragraph, with host links pointing upwards. Returns them outermost
    /// first.
    pub fn insert_chain(&self, title: &str) -> (Entity, Entity, Entity) {
        let article_id = Uuid::now_v7();
        let paragraph_id = Uuid::now_v7();
        let article_ref = RecordRef::new(article_id, "node");
        let paragraph_ref = RecordRef::new(paragraph_id, "paragraphs_item");

        let caption = self.insert(caption("A caption").hosted_by(paragraph_ref));
        let paragraph = self.insert(
            paragraph("<p>Hello world</p>")
                .with_id(paragraph_id)
                .with_field("field_caption", reference_to(&caption))
                .hosted_by(article_ref),
        );
        let article = self.insert(
            article(title)
                .with_id(article_id)
                .with_field("field_paragraphs", json!([reference_to(&paragraph)])),
        );
        (article, paragraph, caption)
    }
}

/// Builder helpers on fixture entities.
pub trait EntityFixture {
    fn hosted_by(self, host: RecordRef) -> Self;
}

impl EntityFixture for Entity {
    fn hosted_by(mut self, host: RecordRef) -> Self {
        self.host = Some(host);
        self
    }
}

/// An unsaved English article with a title and body.
pub fn article(title: &str) -> Entity {
    Entity::new("node", bundles::ARTICLE, "en")
        .with_field("title", json!(title))
        .with_field(
            "field_body",
            json!({"value": "<p>Body text</p>", "summary": "Summary", "format": "basic_html"}),
        )
}

/// An unsaved language-neutral paragraph.
pub fn paragraph(text: &str) -> Entity {
    Entity::new("paragraphs_item", bundles::TEXT_BLOCK, "und")
        .with_field("field_text", json!({"value": text, "format": "basic_html"}))
}

/// An unsaved language-neutral caption.
pub fn caption(text: &str) -> Entity {
    Entity::new("field_collection_item", bundles::CAPTION, "und")
        .with_field("field_caption_text", json!(text))
}

/// Reference value pointing at a stored entity.
pub fn reference_to(entity: &Entity) -> serde_json::Value {
    entity
        .record_ref()
        .map(|r| r.to_value())
        .unwrap_or_else(|| panic!("{} has no identity", entity.display_key()))
}

/// Property metadata for a field of a type no adapter handles.
pub fn unknown_field(name: &str, field_type: &str) -> PropertyInfo {
    PropertyInfo::field(name, field_type).translatable()
}

/// Run `f` with a subscriber capturing every event at debug level or above,
/// returning its result and the formatted log output.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

#[derive(Debug, Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use entity_xliff::{EntityMetadata, TranslationFeatures};

    use super::*;

    #[test]
    fn content_site_enables_every_fixture_bundle() {
        let host = MemoryHost::content_site();
        assert!(host.is_feature_available(Paradigm::Content));
        assert!(!host.is_feature_available(Paradigm::EntityField));
        assert!(host.is_bundle_enabled(Paradigm::Content, "paragraphs_item", bundles::TEXT_BLOCK));
        assert_eq!(host.property_info(&article("x")).len(), schemas::article().len());
    }

    #[test]
    fn chain_links_hosts_and_references() {
        let host = MemoryHost::content_site();
        let (article, paragraph, caption) = host.insert_chain("Hello");

        assert_eq!(paragraph.host, article.record_ref());
        assert_eq!(caption.host, paragraph.record_ref());
        let items = article.field("field_paragraphs").unwrap().as_array().unwrap();
        assert_eq!(RecordRef::from_value(&items[0]), paragraph.record_ref());
        assert_eq!(host.entity_count("node"), 1);
    }

    #[test]
    fn capture_logs_collects_events() {
        let ((), logs) = capture_logs(|| tracing::warn!(field = "field_geo", "something odd"));
        assert!(logs.contains("something odd"));
        assert!(logs.contains("field_geo"));
    }
}
