//! Shared XML attribute helpers for reading and patching package parts.
//!
//! All functions match attributes on their raw (possibly prefixed) key unless
//! the name says otherwise.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key (raw, not unescaped).
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

/// Extract an attribute value by key with XML entities resolved.
///
/// Sheet names such as `R&amp;D` need this.
pub fn attr_unescaped(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Extract an attribute by local name (ignoring namespace prefix), unescaped.
pub fn attr_unescaped_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

/// All attributes of an element as raw `(key, value)` string pairs, in order.
///
/// Values stay escaped so they can be written back verbatim.
pub fn raw_attrs(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter_map(|attr| {
            let key = std::str::from_utf8(attr.key.as_ref()).ok()?;
            let value = std::str::from_utf8(&attr.value).ok()?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Namespace prefix of a qualified element name, including the colon
/// (`b"x:row"` → `"x:"`, `b"row"` → `""`).
pub fn name_prefix(qname: &[u8]) -> String {
    match qname.iter().position(|&b| b == b':') {
        Some(pos) => qname
            .get(..=pos)
            .and_then(|p| std::str::from_utf8(p).ok())
            .unwrap_or("")
            .to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<sheet name="ORDER" sheetId="2" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("ORDER".to_string()));
        assert_eq!(attr_u32(&e, b"sheetId"), Some(2));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_unescaped() {
        let e = make_start(r#"<sheet name="R&amp;D" r:id="rId3"/>"#);
        assert_eq!(attr_string(&e, b"name"), Some("R&amp;D".to_string()));
        assert_eq!(attr_unescaped(&e, b"name"), Some("R&D".to_string()));
        assert_eq!(attr_unescaped_local(&e, b"id"), Some("rId3".to_string()));
    }

    #[test]
    fn test_raw_attrs_keep_order_and_escaping() {
        let e = make_start(r#"<c r="A3" s="4" t="s"/>"#);
        assert_eq!(
            raw_attrs(&e),
            vec![
                ("r".to_string(), "A3".to_string()),
                ("s".to_string(), "4".to_string()),
                ("t".to_string(), "s".to_string()),
            ]
        );
    }

    #[test]
    fn test_name_prefix() {
        assert_eq!(name_prefix(b"x:sheetData"), "x:");
        assert_eq!(name_prefix(b"sheetData"), "");
    }
}
