//! Patch a template ZIP archive with rewritten parts.
//!
//! Unmodified entries are copied via `raw_copy_file` (no recompression), so
//! binary parts such as `xl/vbaProject.bin` come out byte-identical. Only
//! replaced parts are deflated again.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::Result;

/// Rebuild `original` with `replacements` swapped in and `removals` left out.
///
/// Entry order is preserved. Replacement paths that are not in the
/// original archive are ignored.
pub(crate) fn patch_zip(
    original: &[u8],
    replacements: &HashMap<String, Vec<u8>>,
    removals: &HashSet<String>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(original.len())));

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().to_string();

        if removals.contains(&name) {
            log::debug!("dropping part {name}");
            continue;
        }
        if let Some(data) = replacements.get(&name) {
            let options =
                FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
            continue;
        }

        writer.raw_copy_file(entry)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
