//! Order profile: everything that differs between form variants.
//!
//! A profile bundles the template source, sheet names, the writable row
//! window and the column schema. It is read from JSON; every field has a
//! default matching the RX order template, so `{}` is a valid profile.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RxOrderError};
use crate::schema::ColumnSchema;
use crate::source::{BaseDir, ByteSource};

/// MIME type of a plain XLSX workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// MIME type of a macro-enabled XLSM workbook.
pub const XLSM_MIME: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";

/// How the template is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateLocation {
    /// Spreadsheet file, relative to the base directory unless absolute.
    File(PathBuf),
    /// Base64 text blob file, relative to the base directory unless absolute.
    Embedded(PathBuf),
}

impl Default for TemplateLocation {
    fn default() -> Self {
        Self::File(PathBuf::from("rx_test.xlsm"))
    }
}

impl TemplateLocation {
    /// Turn the location into a byte source rooted at `base`.
    pub fn to_source(&self, base: &BaseDir) -> ByteSource {
        match self {
            Self::File(path) => ByteSource::file(base.resolve(path)),
            Self::Embedded(path) => ByteSource::embedded(base.resolve(path)),
        }
    }
}

/// A complete form variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub template: TemplateLocation,
    /// Worksheet holding the selection lists (row 1 is a header).
    pub reference_sheet: String,
    /// Worksheet receiving order lines.
    pub order_sheet: String,
    /// First writable row on the Order Sheet (1-based).
    pub start_row: u32,
    /// Last writable row on the Order Sheet (inclusive).
    pub max_row: u32,
    /// Fixed edit buffer row count.
    pub rows: usize,
    pub output_file_name: String,
    /// Overrides the MIME type derived from the template.
    pub output_mime_type: Option<String>,
    pub columns: ColumnSchema,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            template: TemplateLocation::default(),
            reference_sheet: "DATA".to_string(),
            order_sheet: "ORDER".to_string(),
            start_row: 3,
            max_row: 33,
            rows: 31,
            output_file_name: "Plazma_Order.xlsm".to_string(),
            output_mime_type: None,
            columns: ColumnSchema::rx_order(),
        }
    }
}

impl Profile {
    /// Parse and validate a profile from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_json(&text)?;
        log::debug!(
            "loaded profile {} ({} columns)",
            path.display(),
            profile.columns.len()
        );
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reference_sheet.is_empty() || self.order_sheet.is_empty() {
            return Err(RxOrderError::Config("sheet names must not be empty".into()));
        }
        if self.start_row == 0 {
            return Err(RxOrderError::Config("start_row is 1-based".into()));
        }
        if self.max_row < self.start_row {
            return Err(RxOrderError::Config(format!(
                "max_row {} is before start_row {}",
                self.max_row, self.start_row
            )));
        }
        if self.output_file_name.is_empty() {
            return Err(RxOrderError::Config("output_file_name is empty".into()));
        }
        Ok(())
    }

    pub fn template_source(&self, base: &BaseDir) -> ByteSource {
        self.template.to_source(base)
    }
}
