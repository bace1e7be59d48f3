//! Spreadsheet package access.
//!
//! Opens an XLSX/XLSM ZIP archive, maps sheet names to their XML parts and
//! reads cell values. Everything here is read-only; writing goes through
//! [`crate::export`].

mod relationships;
mod worksheet;

use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{Result, RxOrderError};

use relationships::{
    get_sheet_info, parse_shared_strings, parse_workbook_relationships, SheetInfo,
};
pub use worksheet::SheetValues;
use worksheet::read_sheet_values;

/// Conventional location of the VBA project inside a macro-enabled package.
const DEFAULT_VBA_PATH: &str = "xl/vbaProject.bin";

/// An opened template package.
pub struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    sheets: Vec<SheetInfo>,
    shared_strings: Vec<String>,
    calc_chain: Option<String>,
    vba_project: Option<String>,
}

impl<'a> Package<'a> {
    /// Open package bytes and read the sheet catalog and shared strings.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let rels = parse_workbook_relationships(&mut archive)?;
        let sheets = get_sheet_info(&mut archive, &rels.worksheets)?;
        let shared_strings = parse_shared_strings(&mut archive, rels.shared_strings.as_deref())?;

        let vba_project = rels.vba_project.or_else(|| {
            archive
                .by_name(DEFAULT_VBA_PATH)
                .ok()
                .map(|_| DEFAULT_VBA_PATH.to_string())
        });

        log::debug!(
            "opened package: {} sheets, {} shared strings, macros: {}",
            sheets.len(),
            shared_strings.len(),
            vba_project.is_some()
        );

        Ok(Self {
            archive,
            sheets,
            shared_strings,
            calc_chain: rels.calc_chain,
            vba_project,
        })
    }

    /// Archive path of the worksheet with exactly this name.
    pub fn sheet_path(&self, name: &str) -> Result<&str> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.path.as_str())
            .ok_or_else(|| RxOrderError::SheetNotFound(name.to_string()))
    }

    /// Read cell values of a sheet, optionally restricted to some columns.
    pub fn read_values(&mut self, name: &str, columns: Option<&[u32]>) -> Result<SheetValues> {
        let path = self.sheet_path(name)?.to_string();
        read_sheet_values(&mut self.archive, &path, &self.shared_strings, columns)
    }

    /// Raw text of an archive entry.
    pub fn read_part(&mut self, path: &str) -> Result<String> {
        let mut file = self.archive.by_name(path)?;
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Path of the calculation chain part, if the workbook has one.
    pub fn calc_chain_path(&self) -> Option<&str> {
        self.calc_chain.as_deref()
    }

    /// Whether the package carries a VBA project (macro-enabled workbook).
    pub fn has_macros(&self) -> bool {
        self.vba_project.is_some()
    }
}
