//! Worksheet value reading.
//!
//! Only cell values are read here (as text, the way they would be shown to a
//! user picking from a list). Styles and layout are left to the patcher,
//! which works on the raw XML.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::xml_helpers::attr_u32;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(crate) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

/// Non-null cell values of one worksheet, keyed by row then column (1-based).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetValues {
    rows: BTreeMap<u32, BTreeMap<u32, String>>,
}

impl SheetValues {
    pub fn get(&self, col: u32, row: u32) -> Option<&str> {
        self.rows
            .get(&row)
            .and_then(|cells| cells.get(&col))
            .map(String::as_str)
    }

    /// Values of `col` from `first_row` down, top to bottom, nulls skipped.
    pub fn column_from(&self, col: u32, first_row: u32) -> Vec<String> {
        self.rows
            .range(first_row..)
            .filter_map(|(_, cells)| cells.get(&col).cloned())
            .collect()
    }

    /// Values of one row as `(col, value)` pairs, left to right.
    pub fn row(&self, row: u32) -> Vec<(u32, &str)> {
        self.rows
            .get(&row)
            .map(|cells| cells.iter().map(|(c, v)| (*c, v.as_str())).collect())
            .unwrap_or_default()
    }

    /// Highest row holding a value, or 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn insert(&mut self, col: u32, row: u32, value: String) {
        self.rows.entry(row).or_default().insert(col, value);
    }
}

/// Show a stored number the way a user would type it.
///
/// Excel writes up to 17 significant digits, so `1.56` is stored as
/// `1.5600000000000001`; the shortest round-trip form brings it back.
/// Integers stay exact; text that is not a number is returned unchanged.
fn format_number(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return int.to_string();
    }
    match raw.parse::<f64>() {
        Ok(num) if num.is_finite() => num.to_string(),
        _ => raw.to_string(),
    }
}

#[derive(Default)]
struct PendingCell {
    col: u32,
    row: u32,
    tag: Option<CellTypeTag>,
    v: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn resolve(self, shared_strings: &[String]) -> Option<String> {
        match self.tag.unwrap_or(CellTypeTag::Default) {
            CellTypeTag::Shared => {
                let idx: usize = self.v?.trim().parse().ok()?;
                shared_strings.get(idx).cloned()
            }
            CellTypeTag::Inline => self.inline.or(self.v),
            CellTypeTag::Bool => self.v.map(|v| {
                if matches!(v.trim(), "1" | "true" | "TRUE") {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }),
            CellTypeTag::Str | CellTypeTag::Error => self.v,
            CellTypeTag::Default => self.v.filter(|v| !v.is_empty()).map(|v| format_number(&v)),
        }
    }
}

/// Read the values of a worksheet part.
///
/// When `columns` is given, only those columns are kept.
pub(crate) fn read_sheet_values<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    shared_strings: &[String],
    columns: Option<&[u32]>,
) -> Result<SheetValues> {
    let file = archive.by_name(path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut values = SheetValues::default();
    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;
    let mut cell: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_is = false;
    let mut in_t = false;
    let mut in_rph = false;

    let wanted = |col: u32| columns.map_or(true, |cols| cols.contains(&col));

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = attr_u32(e, b"r").unwrap_or(current_row + 1);
                    next_col = 1;
                }
                b"c" => {
                    let mut pending = PendingCell {
                        col: next_col,
                        row: current_row,
                        ..PendingCell::default()
                    };
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                if let Some((c, r)) = parse_cell_ref_bytes(&attr.value) {
                                    pending.col = c;
                                    pending.row = r;
                                }
                            }
                            b"t" => pending.tag = Some(parse_cell_type_tag(&attr.value)),
                            _ => {}
                        }
                    }
                    next_col = pending.col + 1;
                    cell = Some(pending);
                }
                b"v" if cell.is_some() => {
                    in_v = true;
                    if let Some(c) = cell.as_mut() {
                        c.v = Some(String::new());
                    }
                }
                b"is" if cell.is_some() => {
                    in_is = true;
                    if let Some(c) = cell.as_mut() {
                        c.inline = Some(String::new());
                    }
                }
                b"rPh" => in_rph = true,
                b"t" if in_is && !in_rph => in_t = true,
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = attr_u32(e, b"r").unwrap_or(current_row + 1);
                    next_col = 1;
                }
                b"c" => {
                    let col = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"r")
                        .and_then(|a| parse_cell_ref_bytes(&a.value))
                        .map_or(next_col, |(c, _)| c);
                    next_col = col + 1;
                }
                _ => {}
            },
            Event::Text(ref e) if in_v || in_t => {
                let text = e.unescape()?;
                if let Some(c) = cell.as_mut() {
                    let target = if in_v { &mut c.v } else { &mut c.inline };
                    if let Some(s) = target.as_mut() {
                        s.push_str(&text);
                    }
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_t = false,
                b"rPh" => in_rph = false,
                b"is" => in_is = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let (col, row) = (pending.col, pending.row);
                        if wanted(col) {
                            if let Some(value) = pending.resolve(shared_strings) {
                                values.insert(col, row, value);
                            }
                        }
                    }
                    in_v = false;
                    in_is = false;
                    in_t = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(values)
}
