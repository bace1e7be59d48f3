//! Small edits to package bookkeeping parts.
//!
//! When a patch clears template formulas the calculation chain goes stale,
//! and Excel reports a stale chain as corruption. Dropping the chain is
//! valid; Excel rebuilds it on the next recalculation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, RxOrderError};
use crate::xml_helpers::attr_unescaped;

pub(crate) const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub(crate) const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";

/// Copy `xml`, leaving out every element for which `drop` returns `true`
/// (including its children).
fn remove_elements(xml: &str, drop: impl Fn(&BytesStart) -> bool) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Empty(e) if drop(e) => continue,
            Event::Start(e) if drop(e) => {
                skip_element(&mut reader)?;
                continue;
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event)?;
    }
    Ok(writer.into_inner())
}

fn skip_element(reader: &mut Reader<&[u8]>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(RxOrderError::Malformed("unterminated element".into())),
            _ => {}
        }
    }
}

/// Remove the `<Override>` for `part_path` (an archive path without the
/// leading slash) from `[Content_Types].xml`.
pub(crate) fn strip_content_type(xml: &str, part_path: &str) -> Result<Vec<u8>> {
    let part_name = format!("/{}", part_path.trim_start_matches('/'));
    remove_elements(xml, |e| {
        e.local_name().as_ref() == b"Override"
            && attr_unescaped(e, b"PartName").is_some_and(|p| p.eq_ignore_ascii_case(&part_name))
    })
}

/// Remove relationships whose type ends with `/{kind}`.
pub(crate) fn strip_relationship(xml: &str, kind: &str) -> Result<Vec<u8>> {
    let suffix = format!("/{kind}");
    remove_elements(xml, |e| {
        e.local_name().as_ref() == b"Relationship"
            && attr_unescaped(e, b"Type").is_some_and(|t| t.ends_with(&suffix))
    })
}
