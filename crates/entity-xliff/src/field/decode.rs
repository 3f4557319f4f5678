//! Undo transport-level escaping on translated text.
//!
//! XLIFF round trips leave character references in translated strings
//! (`&amp;`, `&uuml;`, `&#39;`, `&#x2014;`). They are resolved against the
//! full HTML5 entity set before a value reaches an adapter; anything that is
//! not a reference is kept verbatim.

/// Trim and decode one translated string.
pub fn decode_translated_text(raw: &str) -> String {
    decode_entities(raw.trim())
}

/// Resolve HTML character references.
pub fn decode_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_references() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;p&gt;Hallo&lt;/p&gt;"), "<p>Hallo</p>");
        assert_eq!(decode_entities("l&#39;&eacute;t&#xE9;"), "l'\u{e9}t\u{e9}");
        assert_eq!(decode_entities("&quot;quoted&quot;"), "\"quoted\"");
    }

    #[test]
    fn decodes_accented_letters() {
        assert_eq!(
            decode_translated_text("Gr&uuml;&szlig;e aus K&ouml;ln, caf&eacute;"),
            "Grüße aus Köln, café"
        );
        assert_eq!(decode_entities("&Aring;ngstr&ouml;m &ndash; &euro;5"), "Ångström \u{2013} \u{20ac}5");
    }

    #[test]
    fn keeps_text_that_is_not_a_reference() {
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("trailing &"), "trailing &");
        assert_eq!(decode_entities("plain text"), "plain text");
    }

    #[test]
    fn trims_before_decoding() {
        assert_eq!(decode_translated_text("  Beispiel &amp; Co \n"), "Beispiel & Co");
        assert_eq!(decode_translated_text(" \t "), "");
    }
}
