//! Patches worksheet XML in place.
//!
//! The sheet is streamed through quick-xml. Everything outside `<cols>`,
//! `<dimension>` and the touched rows of `<sheetData>` is written back event
//! for event, so template formatting (styles, merges, validations, print
//! setup) survives. Written cells keep their style index and use inline
//! strings, leaving the shared string table alone.

use std::collections::{BTreeMap, BTreeSet};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::cell_ref::{cell_ref, parse_cell_ref_bytes, parse_range};
use crate::error::{Result, RxOrderError};
use crate::xml_helpers::{attr_string, attr_u32, name_prefix, raw_attrs};

/// Cell writes grouped by destination row: `row -> [(col, value)]`.
/// `None` clears the cell's value and keeps its style.
pub(crate) type RowWrites = BTreeMap<u32, Vec<(u32, Option<String>)>>;

/// Result of patching one worksheet.
#[derive(Debug, Default)]
pub(crate) struct PatchReport {
    pub xml: Vec<u8>,
    pub cells_written: usize,
    pub cells_cleared: usize,
    /// Template formulas replaced or cleared by the patch.
    pub formulas_removed: usize,
}

type RawAttrs = Vec<(String, String)>;

struct CellNode {
    col: u32,
    start: BytesStart<'static>,
    inner: Vec<Event<'static>>,
}

struct RowNode {
    row: u32,
    start: BytesStart<'static>,
    cells: Vec<CellNode>,
    /// Non-cell children (e.g. `extLst`), written after the cells.
    extra: Vec<Event<'static>>,
}

#[derive(Debug, Clone, PartialEq)]
struct ColRange {
    min: u32,
    max: u32,
    attrs: RawAttrs,
}

/// Apply cell writes and column widths to a worksheet part.
pub(crate) fn patch_sheet_xml(
    xml: &str,
    writes: &RowWrites,
    widths: &[(u32, f64)],
) -> Result<PatchReport> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 4096));

    let mut report = PatchReport::default();
    let mut prefix = String::new();
    let mut cols_done = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"worksheet" => prefix = name_prefix(e.name().as_ref()),
                    b"dimension" => {
                        let patched = patched_dimension(e, write_bounds(writes));
                        if is_empty {
                            writer.write_event(Event::Empty(patched))?;
                        } else {
                            writer.write_event(Event::Start(patched))?;
                        }
                        continue;
                    }
                    b"cols" => {
                        let existing = if is_empty {
                            Vec::new()
                        } else {
                            read_cols(&mut reader)?
                        };
                        write_cols(&mut writer, &prefix, &merge_col_widths(existing, widths))?;
                        cols_done = true;
                        continue;
                    }
                    b"sheetData" => {
                        if !cols_done {
                            write_cols(&mut writer, &prefix, &merge_col_widths(Vec::new(), widths))?;
                            cols_done = true;
                        }
                        let mut rows = if is_empty {
                            Vec::new()
                        } else {
                            read_rows(&mut reader)?
                        };
                        let detached = detach_shared_children(&mut rows, writes);
                        if detached > 0 {
                            log::warn!(
                                "{detached} cells lose their shared formula with its overwritten master; cached values kept"
                            );
                            report.formulas_removed += detached;
                        }
                        apply_writes(&mut rows, writes, &prefix, &mut report);
                        if rows.is_empty() {
                            writer.write_event(Event::Empty(e.clone()))?;
                        } else {
                            writer.write_event(Event::Start(e.clone()))?;
                            for row in rows {
                                write_row(&mut writer, row)?;
                            }
                            writer.write_event(Event::End(e.to_end()))?;
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event)?;
    }

    report.xml = writer.into_inner();
    Ok(report)
}

// ---------------------------------------------------------------------------
// <dimension>
// ---------------------------------------------------------------------------

/// Bounding box `(min_col, min_row, max_col, max_row)` of cells receiving a value.
fn write_bounds(writes: &RowWrites) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (&row, cells) in writes {
        for (col, value) in cells {
            if value.is_none() {
                continue;
            }
            bounds = Some(match bounds {
                None => (*col, row, *col, row),
                Some((c0, r0, c1, r1)) => (c0.min(*col), r0.min(row), c1.max(*col), r1.max(row)),
            });
        }
    }
    bounds
}

fn patched_dimension(e: &BytesStart, bounds: Option<(u32, u32, u32, u32)>) -> BytesStart<'static> {
    let Some((c0, r0, c1, r1)) = bounds else {
        return e.clone().into_owned();
    };
    let mut attrs = raw_attrs(e);
    let existing = attrs
        .iter()
        .find(|(k, _)| k == "ref")
        .and_then(|(_, v)| parse_range(v));
    let (c0, r0, c1, r1) = match existing {
        Some((ec0, er0, ec1, er1)) => (c0.min(ec0), r0.min(er0), c1.max(ec1), r1.max(er1)),
        None => (c0, r0, c1, r1),
    };
    let new_ref = if (c0, r0) == (c1, r1) {
        cell_ref(c0, r0)
    } else {
        format!("{}:{}", cell_ref(c0, r0), cell_ref(c1, r1))
    };
    set_attr(&mut attrs, "ref", new_ref);
    rebuild_start(&String::from_utf8_lossy(e.name().as_ref()), &attrs)
}

// ---------------------------------------------------------------------------
// <cols>
// ---------------------------------------------------------------------------

fn read_cols(reader: &mut Reader<&[u8]>) -> Result<Vec<ColRange>> {
    let mut ranges = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"col" => {
                let min = attr_u32(&e, b"min").unwrap_or(0);
                let max = attr_u32(&e, b"max").unwrap_or(min);
                if min > 0 && max >= min {
                    ranges.push(ColRange {
                        min,
                        max,
                        attrs: raw_attrs(&e),
                    });
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"cols" => break,
            Event::Eof => return Err(RxOrderError::Malformed("unterminated <cols>".into())),
            _ => {}
        }
    }
    Ok(ranges)
}

fn format_width(width: f64) -> String {
    format!("{width}")
}

/// Give every column in `widths` its own `<col>` with the configured width.
///
/// Existing ranges covering a target column are split so the remaining
/// columns keep their original attributes, and the target keeps everything
/// but its width.
fn merge_col_widths(mut existing: Vec<ColRange>, widths: &[(u32, f64)]) -> Vec<ColRange> {
    let targets: BTreeMap<u32, f64> = widths.iter().copied().collect();
    let mut covered = BTreeSet::new();
    let mut merged = Vec::with_capacity(existing.len() + targets.len());

    existing.sort_by_key(|r| r.min);
    for range in existing {
        let mut cursor = range.min;
        for (&col, &width) in targets.range(range.min..=range.max) {
            if covered.contains(&col) {
                continue;
            }
            if cursor < col {
                merged.push(range_with_bounds(&range, cursor, col - 1));
            }
            let mut target = range_with_bounds(&range, col, col);
            set_attr(&mut target.attrs, "width", format_width(width));
            set_attr(&mut target.attrs, "customWidth", "1".to_string());
            merged.push(target);
            covered.insert(col);
            cursor = col + 1;
        }
        if cursor <= range.max {
            merged.push(range_with_bounds(&range, cursor, range.max));
        }
    }

    for (&col, &width) in &targets {
        if covered.contains(&col) {
            continue;
        }
        merged.push(ColRange {
            min: col,
            max: col,
            attrs: vec![
                ("min".to_string(), col.to_string()),
                ("max".to_string(), col.to_string()),
                ("width".to_string(), format_width(width)),
                ("customWidth".to_string(), "1".to_string()),
            ],
        });
    }

    merged.sort_by_key(|r| r.min);
    merged
}

fn range_with_bounds(range: &ColRange, min: u32, max: u32) -> ColRange {
    let mut attrs = range.attrs.clone();
    set_attr(&mut attrs, "min", min.to_string());
    set_attr(&mut attrs, "max", max.to_string());
    ColRange { min, max, attrs }
}

fn write_cols(writer: &mut Writer<Vec<u8>>, prefix: &str, ranges: &[ColRange]) -> Result<()> {
    if ranges.is_empty() {
        return Ok(());
    }
    let cols_name = format!("{prefix}cols");
    let col_name = format!("{prefix}col");
    writer.write_event(Event::Start(BytesStart::new(cols_name.as_str())))?;
    for range in ranges {
        writer.write_event(Event::Empty(rebuild_start(&col_name, &range.attrs)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(cols_name.as_str())))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// <sheetData>
// ---------------------------------------------------------------------------

fn is_whitespace(text: &BytesText) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn read_rows(reader: &mut Reader<&[u8]>) -> Result<Vec<RowNode>> {
    let mut rows: Vec<RowNode> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let row = row_number(&e, rows.last());
                let mut node = RowNode::new(row, e.into_owned());
                read_row_children(reader, &mut node)?;
                rows.push(node);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let row = row_number(&e, rows.last());
                rows.push(RowNode::new(row, e.into_owned()));
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => break,
            Event::Eof => return Err(RxOrderError::Malformed("unterminated <sheetData>".into())),
            Event::Text(t) if is_whitespace(&t) => {}
            other => {
                log::debug!("dropping stray node in sheetData: {other:?}");
            }
        }
    }
    Ok(rows)
}

fn row_number(e: &BytesStart, previous: Option<&RowNode>) -> u32 {
    attr_u32(e, b"r").unwrap_or_else(|| previous.map_or(1, |r| r.row + 1))
}

fn read_row_children(reader: &mut Reader<&[u8]>, node: &mut RowNode) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let col = cell_col(&e, &node.cells);
                let inner = read_cell_inner(reader)?;
                node.cells.push(CellNode {
                    col,
                    start: e.into_owned(),
                    inner,
                });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let col = cell_col(&e, &node.cells);
                node.cells.push(CellNode {
                    col,
                    start: e.into_owned(),
                    inner: Vec::new(),
                });
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => break,
            Event::Eof => return Err(RxOrderError::Malformed("unterminated <row>".into())),
            Event::Text(t) if is_whitespace(&t) => {}
            other => node.extra.push(other.into_owned()),
        }
    }
    Ok(())
}

fn cell_col(e: &BytesStart, previous: &[CellNode]) -> u32 {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r")
        .and_then(|a| parse_cell_ref_bytes(&a.value))
        .map_or_else(|| previous.last().map_or(1, |c| c.col + 1), |(c, _)| c)
}

/// Collect the children of a `<c>` up to (not including) its end tag.
fn read_cell_inner(reader: &mut Reader<&[u8]>) -> Result<Vec<Event<'static>>> {
    let mut inner = Vec::new();
    let mut depth = 0usize;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(RxOrderError::Malformed("unterminated <c>".into())),
            _ => {}
        }
        inner.push(event.into_owned());
    }
    Ok(inner)
}

fn is_written(writes: &RowWrites, row: u32, col: u32) -> bool {
    writes
        .get(&row)
        .is_some_and(|cells| cells.iter().any(|(c, _)| *c == col))
}

/// Turn shared-formula children into plain values when their group's master
/// cell is about to be overwritten. Returns the number of cells changed.
///
/// Children inside the write set are rewritten anyway and are left alone.
fn detach_shared_children(rows: &mut [RowNode], writes: &RowWrites) -> usize {
    let mut orphaned = BTreeSet::new();
    for row in rows.iter() {
        for cell in &row.cells {
            if let Some((si, true)) = cell.shared_group() {
                if is_written(writes, row.row, cell.col) {
                    orphaned.insert(si);
                }
            }
        }
    }
    if orphaned.is_empty() {
        return 0;
    }

    let mut detached = 0;
    for row in rows.iter_mut() {
        let row_num = row.row;
        for cell in &mut row.cells {
            if is_written(writes, row_num, cell.col) {
                continue;
            }
            if cell
                .shared_group()
                .is_some_and(|(si, _)| orphaned.contains(&si))
            {
                cell.strip_formula();
                detached += 1;
            }
        }
    }
    detached
}

fn apply_writes(rows: &mut Vec<RowNode>, writes: &RowWrites, prefix: &str, report: &mut PatchReport) {
    for (&row_num, cells) in writes {
        let idx = match rows.binary_search_by_key(&row_num, |r| r.row) {
            Ok(idx) => idx,
            Err(idx) => {
                if cells.iter().all(|(_, v)| v.is_none()) {
                    continue;
                }
                rows.insert(idx, RowNode::created(row_num, prefix));
                idx
            }
        };
        let Some(node) = rows.get_mut(idx) else {
            continue;
        };
        // The spans hint may no longer match the cells.
        node.start = without_attr(&node.start, "spans");
        for (col, value) in cells {
            node.write_cell(*col, value.as_deref(), prefix, report);
        }
    }
}

impl RowNode {
    fn new(row: u32, start: BytesStart<'static>) -> Self {
        Self {
            row,
            start,
            cells: Vec::new(),
            extra: Vec::new(),
        }
    }

    fn created(row: u32, prefix: &str) -> Self {
        let mut start = BytesStart::new(format!("{prefix}row"));
        start.push_attribute(("r", row.to_string().as_str()));
        Self::new(row, start)
    }

    fn write_cell(&mut self, col: u32, value: Option<&str>, prefix: &str, report: &mut PatchReport) {
        match self.cells.binary_search_by_key(&col, |c| c.col) {
            Ok(idx) => {
                if let Some(cell) = self.cells.get_mut(idx) {
                    if cell.has_formula() {
                        report.formulas_removed += 1;
                    }
                    cell.set_value(value, prefix);
                }
            }
            Err(idx) => {
                if value.is_none() {
                    return;
                }
                let mut start = BytesStart::new(format!("{prefix}c"));
                start.push_attribute(("r", cell_ref(col, self.row).as_str()));
                let mut cell = CellNode {
                    col,
                    start,
                    inner: Vec::new(),
                };
                cell.set_value(value, prefix);
                self.cells.insert(idx, cell);
            }
        }
        if value.is_some() {
            report.cells_written += 1;
        } else {
            report.cells_cleared += 1;
        }
    }
}

impl CellNode {
    fn formula(&self) -> Option<&BytesStart<'static>> {
        self.inner.iter().find_map(|ev| match ev {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"f" => Some(e),
            _ => None,
        })
    }

    fn has_formula(&self) -> bool {
        self.formula().is_some()
    }

    /// `si` of a shared formula and whether this cell is the group master
    /// (the one carrying `ref` and the formula text).
    fn shared_group(&self) -> Option<(String, bool)> {
        let f = self.formula()?;
        if attr_string(f, b"t").as_deref() != Some("shared") {
            return None;
        }
        let si = attr_string(f, b"si")?;
        Some((si, attr_string(f, b"ref").is_some()))
    }

    /// Remove `<f>`, keeping the cached `<v>`.
    fn strip_formula(&mut self) {
        let mut in_formula = false;
        self.inner.retain(|ev| match ev {
            Event::Empty(e) if e.local_name().as_ref() == b"f" => false,
            Event::Start(e) if e.local_name().as_ref() == b"f" => {
                in_formula = true;
                false
            }
            Event::End(e) if in_formula && e.local_name().as_ref() == b"f" => {
                in_formula = false;
                false
            }
            _ => !in_formula,
        });
    }

    /// Replace the cell's content. The style index (`s`) survives; type and
    /// value metadata go with the old value.
    fn set_value(&mut self, value: Option<&str>, prefix: &str) {
        let mut attrs = raw_attrs(&self.start);
        attrs.retain(|(k, _)| !matches!(k.as_str(), "t" | "cm" | "vm"));
        if value.is_some() {
            attrs.push(("t".to_string(), "inlineStr".to_string()));
        }
        let name = String::from_utf8_lossy(self.start.name().as_ref()).into_owned();
        self.start = rebuild_start(&name, &attrs);
        self.inner = value
            .map(|v| inline_string_events(prefix, v))
            .unwrap_or_default();
    }
}

/// Characters allowed in XML 1.0 text.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.contains(['\n', '\t'])
}

fn inline_string_events(prefix: &str, text: &str) -> Vec<Event<'static>> {
    let clean: String = text.chars().filter(|&c| is_xml_char(c)).collect();
    let is_name = format!("{prefix}is");
    let t_name = format!("{prefix}t");
    let mut t_start = BytesStart::new(t_name.clone());
    if needs_space_preserve(&clean) {
        t_start.push_attribute(("xml:space", "preserve"));
    }
    vec![
        Event::Start(BytesStart::new(is_name.clone())),
        Event::Start(t_start),
        Event::Text(BytesText::new(&clean).into_owned()),
        Event::End(BytesEnd::new(t_name)),
        Event::End(BytesEnd::new(is_name)),
    ]
}

fn write_row(writer: &mut Writer<Vec<u8>>, row: RowNode) -> Result<()> {
    if row.cells.is_empty() && row.extra.is_empty() {
        writer.write_event(Event::Empty(row.start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(row.start.clone()))?;
    for cell in row.cells {
        if cell.inner.is_empty() {
            writer.write_event(Event::Empty(cell.start))?;
        } else {
            writer.write_event(Event::Start(cell.start.clone()))?;
            for ev in cell.inner {
                writer.write_event(ev)?;
            }
            writer.write_event(Event::End(cell.start.to_end()))?;
        }
    }
    for ev in row.extra {
        writer.write_event(ev)?;
    }
    writer.write_event(Event::End(row.start.to_end()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Attribute helpers
// ---------------------------------------------------------------------------

/// Build an element from raw (already escaped) attribute pairs.
fn rebuild_start(name: &str, attrs: &[(String, String)]) -> BytesStart<'static> {
    let mut start = BytesStart::new(name.to_string());
    for (k, v) in attrs {
        start.push_attribute((k.as_bytes(), v.as_bytes()));
    }
    start
}

fn set_attr(attrs: &mut RawAttrs, key: &str, value: String) {
    match attrs.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value,
        None => attrs.push((key.to_string(), value)),
    }
}

fn without_attr(e: &BytesStart, key: &str) -> BytesStart<'static> {
    let mut attrs = raw_attrs(e);
    attrs.retain(|(k, _)| k != key);
    rebuild_start(&String::from_utf8_lossy(e.name().as_ref()), &attrs)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    const SHEET: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<dimension ref="A1:C2"/>"#,
        r#"<cols><col min="1" max="5" width="9" style="2" customWidth="1"/></cols>"#,
        r#"<sheetData>"#,
        r#"<row r="1" spans="1:3"><c r="A1" t="s"><v>0</v></c></row>"#,
        r#"<row r="3" spans="1:3" ht="20" customHeight="1"><c r="A3" s="4"/><c r="B3" s="4"><f>1+1</f><v>2</v></c></row>"#,
        r#"</sheetData>"#,
        r#"<mergeCells count="1"><mergeCell ref="A1:C1"/></mergeCells>"#,
        r#"</worksheet>"#
    );

    fn writes(entries: &[(u32, u32, Option<&str>)]) -> RowWrites {
        let mut w = RowWrites::new();
        for &(col, row, v) in entries {
            w.entry(row).or_default().push((col, v.map(str::to_string)));
        }
        w
    }

    fn patch(entries: &[(u32, u32, Option<&str>)], widths: &[(u32, f64)]) -> (String, PatchReport) {
        let mut report = patch_sheet_xml(SHEET, &writes(entries), widths).unwrap();
        let xml = String::from_utf8(std::mem::take(&mut report.xml)).unwrap();
        (xml, report)
    }

    #[test]
    fn test_untouched_parts_survive() {
        let (xml, _) = patch(&[], &[]);
        assert!(xml.starts_with(r#"<?xml version="1.0""#));
        assert!(xml.contains(r#"<mergeCell ref="A1:C1"/>"#));
        assert!(xml.contains(r#"<c r="A1" t="s"><v>0</v></c>"#));
        assert!(xml.contains(r#"<col min="1" max="5" width="9" style="2" customWidth="1"/>"#));
    }

    #[test]
    fn test_write_keeps_style_and_uses_inline_string() {
        let (xml, report) = patch(&[(1, 3, Some("ORD-1"))], &[]);
        assert!(xml.contains(r#"<c r="A3" s="4" t="inlineStr"><is><t>ORD-1</t></is></c>"#));
        assert_eq!(report.cells_written, 1);
        // Row attributes other than spans are kept.
        assert!(xml.contains(r#"<row r="3" ht="20" customHeight="1">"#));
    }

    #[test]
    fn test_new_row_is_inserted_in_order() {
        let (xml, _) = patch(&[(10, 2, Some("Plastic"))], &[]);
        let r1 = xml.find(r#"<row r="1""#).unwrap();
        let r2 = xml.find(r#"<row r="2">"#).unwrap();
        let r3 = xml.find(r#"<row r="3""#).unwrap();
        assert!(r1 < r2 && r2 < r3);
        assert!(xml.contains(r#"<c r="J2" t="inlineStr"><is><t>Plastic</t></is></c>"#));
    }

    #[test]
    fn test_clearing_keeps_style_and_counts_formula() {
        let (xml, report) = patch(&[(2, 3, None)], &[]);
        assert!(xml.contains(r#"<c r="B3" s="4"/>"#));
        assert!(!xml.contains("<f>"));
        assert_eq!(report.formulas_removed, 1);
        assert_eq!(report.cells_cleared, 1);
    }

    #[test]
    fn test_clearing_absent_cell_adds_nothing() {
        let (xml, _) = patch(&[(5, 20, None)], &[]);
        assert!(!xml.contains(r#"r="20""#));
    }

    #[test]
    fn test_text_is_escaped_and_sanitized() {
        let (xml, _) = patch(&[(3, 3, Some(" <A&B>\u{1}"))], &[]);
        assert!(xml.contains(r#"<t xml:space="preserve"> &lt;A&amp;B&gt;</t>"#));
    }

    #[test]
    fn test_dimension_grows_to_cover_writes() {
        let (xml, _) = patch(&[(19, 33, Some("x"))], &[]);
        assert!(xml.contains(r#"<dimension ref="A1:S33"/>"#));
    }

    #[test]
    fn test_widths_split_existing_range() {
        let (xml, _) = patch(&[], &[(2, 5.0), (4, 45.0), (7, 20.0)]);
        assert!(xml.contains(r#"<col min="1" max="1" width="9" style="2" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="2" max="2" width="5" style="2" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="3" max="3" width="9" style="2" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="4" max="4" width="45" style="2" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="5" max="5" width="9" style="2" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="7" max="7" width="20" customWidth="1"/>"#));
    }

    #[test]
    fn test_cols_inserted_before_sheet_data_when_missing() {
        let xml = r#"<worksheet><sheetData/></worksheet>"#;
        let report = patch_sheet_xml(xml, &RowWrites::new(), &[(1, 45.0)]).unwrap();
        let out = String::from_utf8(report.xml).unwrap();
        assert_eq!(
            out,
            r#"<worksheet><cols><col min="1" max="1" width="45" customWidth="1"/></cols><sheetData/></worksheet>"#
        );
    }

    #[test]
    fn test_prefixed_worksheet() {
        let xml = r#"<x:worksheet xmlns:x="urn:x"><x:sheetData/></x:worksheet>"#;
        let report = patch_sheet_xml(xml, &writes(&[(1, 3, Some("v"))]), &[(1, 8.5)]).unwrap();
        let out = String::from_utf8(report.xml).unwrap();
        assert!(out.contains(r#"<x:cols><x:col min="1" max="1" width="8.5" customWidth="1"/></x:cols>"#));
        assert!(out.contains(
            r#"<x:sheetData><x:row r="3"><x:c r="A3" t="inlineStr"><x:is><x:t>v</x:t></x:is></x:c></x:row></x:sheetData>"#
        ));
    }

    #[test]
    fn test_merge_col_widths_without_existing() {
        let merged = merge_col_widths(Vec::new(), &[(3, 5.0), (1, 45.0)]);
        let bounds: Vec<(u32, u32)> = merged.iter().map(|r| (r.min, r.max)).collect();
        assert_eq!(bounds, vec![(1, 1), (3, 3)]);
    }

    const SHARED: &str = concat!(
        r#"<worksheet><sheetData>"#,
        r#"<row r="3"><c r="S3" s="2"><f t="shared" ref="S3:S35" si="0">Q3*2</f><v>0</v></c></row>"#,
        r#"<row r="4"><c r="S4" s="2"><f t="shared" si="0"/><v>0</v></c></row>"#,
        r#"<row r="34"><c r="S34"><f t="shared" si="0"/><v>8</v></c>"#,
        r#"<c r="T34"><f t="shared" ref="T34:T35" si="1">S34+1</f><v>9</v></c></row>"#,
        r#"<row r="35"><c r="S35"><f t="shared" si="0"></f><v>10</v></c>"#,
        r#"<c r="T35"><f t="shared" si="1"/><v>11</v></c></row>"#,
        r#"</sheetData></worksheet>"#
    );

    #[test]
    fn test_overwritten_shared_master_detaches_children() {
        let report = patch_sheet_xml(SHARED, &writes(&[(19, 3, None), (19, 4, None)]), &[]).unwrap();
        let out = String::from_utf8(report.xml).unwrap();
        assert!(out.contains(r#"<c r="S3" s="2"/>"#));
        assert!(out.contains(r#"<c r="S4" s="2"/>"#));
        // Children outside the window keep their cached values.
        assert!(out.contains(r#"<c r="S34"><v>8</v></c>"#));
        assert!(out.contains(r#"<c r="S35"><v>10</v></c>"#));
        assert!(!out.contains(r#"si="0""#));
        // An unrelated group is untouched.
        assert!(out.contains(r#"<f t="shared" ref="T34:T35" si="1">S34+1</f>"#));
        assert!(out.contains(r#"<c r="T35"><f t="shared" si="1"/><v>11</v></c>"#));
        assert_eq!(report.formulas_removed, 4);
    }

    #[test]
    fn test_shared_children_kept_when_master_untouched() {
        let report = patch_sheet_xml(SHARED, &writes(&[(19, 4, Some("x"))]), &[]).unwrap();
        let out = String::from_utf8(report.xml).unwrap();
        assert!(out.contains(r#"<f t="shared" ref="S3:S35" si="0">Q3*2</f>"#));
        assert!(out.contains(r#"<c r="S34"><f t="shared" si="0"/><v>8</v></c>"#));
        assert_eq!(report.formulas_removed, 1);
    }

    #[test]
    fn test_unterminated_sheet_data_is_malformed() {
        let xml = r#"<worksheet><sheetData><row r="1">"#;
        assert!(patch_sheet_xml(xml, &RowWrites::new(), &[]).is_err());
    }

    #[test]
    fn test_patch_is_deterministic() {
        let entries = [(1, 3, Some("ORD-1")), (10, 4, Some("Plastic")), (2, 3, None)];
        let (a, _) = patch(&entries, &[(1, 45.0)]);
        let (b, _) = patch(&entries, &[(1, 45.0)]);
        assert_eq!(a, b);
    }
}
