//! Utilities for Excel-style column letters and cell references.
//!
//! Rows and columns are 1-based everywhere in this crate, matching the
//! numbers a user sees in the spreadsheet.

/// Largest column index in the XLSX format (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// Convert a 1-based column index to its letters (`1` → `"A"`, `28` → `"AB"`).
///
/// Column `0` has no letters and yields an empty string.
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        let c = char::from(b'A' + u8::try_from(n % 26).unwrap_or(0));
        result.insert(0, c);
        n /= 26;
    }
    result
}

/// Convert column letters to a 1-based index (`"A"` → `1`, case-insensitive).
///
/// Returns `None` for empty input, non-letters, or columns past [`MAX_COL`].
pub fn letter_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let upper = b.to_ascii_uppercase();
        col = col.checked_mul(26)?.checked_add(u32::from(upper - b'A') + 1)?;
    }
    (col <= MAX_COL).then_some(col)
}

/// Format a 1-based `(col, row)` pair as an `A1` reference.
pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// Parse a cell reference from raw bytes (e.g. a quick-xml attribute value)
/// into 1-based `(col, row)`. `$` anchors are ignored.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col.saturating_mul(26).saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || col == 0 || row == 0 {
        return None;
    }

    Some((col, row))
}

/// Parse a range like `"A1:S33"` (or a single `"A1"`) into
/// `(start_col, start_row, end_col, end_row)`.
pub fn parse_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (start_col, start_row) = parse_cell_ref_bytes(start.trim().as_bytes())?;
    let (end_col, end_row) = parse_cell_ref_bytes(end.trim().as_bytes())?;
    Some((start_col, start_row, end_col, end_row))
}
