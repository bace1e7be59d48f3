//! Template Injector: writes the edit buffer into a fresh template copy.
//!
//! The ORDER sheet is patched in place and the ZIP archive is rebuilt with
//! every other part passed through byte-identical. Workbook formatting,
//! the reference sheet and any VBA project therefore survive unchanged.

mod parts;
pub(crate) mod sheet_patcher;
pub(crate) mod zip_patcher;

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

use crate::buffer::EditBuffer;
use crate::config::{Profile, XLSM_MIME, XLSX_MIME};
use crate::error::Result;
use crate::package::Package;

use sheet_patcher::{patch_sheet_xml, RowWrites};

/// The generated workbook, ready to hand to a download or write to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl OutputArtifact {
    /// Readable stream positioned at the start of the workbook.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes.as_slice())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the workbook to `dir` under its file name and return the path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<std::path::PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Fill the Target Sheet of `template` with `buffer`.
///
/// Buffer row `i` lands on sheet row `start_row + i`; rows past `max_row`
/// are dropped. Every column of a written row is assigned, so an empty
/// buffer cell clears the template cell's value (its style stays). All
/// schema columns get their configured width.
pub fn inject(template: &[u8], buffer: &EditBuffer, profile: &Profile) -> Result<OutputArtifact> {
    let mut package = Package::open(template)?;
    let sheet_path = package.sheet_path(&profile.order_sheet)?.to_string();
    let sheet_xml = package.read_part(&sheet_path)?;

    let writes = plan_writes(buffer, profile);
    let widths = buffer.schema().width_table();
    let report = patch_sheet_xml(&sheet_xml, &writes, &widths)?;
    log::debug!(
        "patched {sheet_path}: {} cells written, {} cleared",
        report.cells_written,
        report.cells_cleared
    );

    let mut removals = HashSet::new();
    let mut replacements = HashMap::new();
    if report.formulas_removed > 0 {
        if let Some(chain) = package.calc_chain_path().map(str::to_string) {
            log::warn!(
                "{} template formulas overwritten; dropping {chain}",
                report.formulas_removed
            );
            let content_types = package.read_part(parts::CONTENT_TYPES_PATH)?;
            replacements.insert(
                parts::CONTENT_TYPES_PATH.to_string(),
                parts::strip_content_type(&content_types, &chain)?,
            );
            let rels = package.read_part(parts::WORKBOOK_RELS_PATH)?;
            replacements.insert(
                parts::WORKBOOK_RELS_PATH.to_string(),
                parts::strip_relationship(&rels, "calcChain")?,
            );
            removals.insert(chain);
        }
    }
    replacements.insert(sheet_path, report.xml);

    let mime_type = profile.output_mime_type.clone().unwrap_or_else(|| {
        if package.has_macros() {
            XLSM_MIME.to_string()
        } else {
            XLSX_MIME.to_string()
        }
    });

    let bytes = zip_patcher::patch_zip(template, &replacements, &removals)?;
    Ok(OutputArtifact {
        bytes,
        file_name: profile.output_file_name.clone(),
        mime_type,
    })
}

/// Map buffer rows onto the sheet's row window.
pub(crate) fn plan_writes(buffer: &EditBuffer, profile: &Profile) -> RowWrites {
    let mut writes = RowWrites::new();
    for (offset, row) in buffer.rows().iter().enumerate() {
        let dest = u32::try_from(offset)
            .ok()
            .and_then(|o| profile.start_row.checked_add(o))
            .filter(|&r| r <= profile.max_row);
        let Some(dest) = dest else {
            let dropped = buffer
                .rows()
                .iter()
                .skip(offset)
                .filter(|r| r.iter().any(|c| !c.is_empty()))
                .count();
            if dropped > 0 {
                log::warn!("{dropped} filled rows fall past row {} and are dropped", profile.max_row);
            }
            break;
        };
        let cells = row
            .iter()
            .zip(1u32..)
            .map(|(cell, col)| (col, cell.collapse().map(str::to_string)))
            .collect();
        writes.insert(dest, cells);
    }
    writes
}
