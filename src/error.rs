//! Structured error types for rxorder.
//!
//! Every fallible operation in the crate returns [`Result`]. Loader failures
//! are fatal for a session; injector failures abort only the current
//! generate action.

use std::path::PathBuf;

/// All errors that can occur while loading templates and producing orders.
#[derive(Debug, thiserror::Error)]
pub enum RxOrderError {
    /// XML parsing or writing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute.
    #[error("XML attribute: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// ZIP archive error (corrupt or non-spreadsheet template).
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (profile or edit buffer) error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The embedded template blob is not valid base64.
    #[error("Embedded template blob: {0}")]
    Blob(#[from] base64::DecodeError),

    /// The template file (or blob file) does not exist.
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A package part ended early or is structurally broken.
    #[error("Malformed part: {0}")]
    Malformed(String),

    /// A worksheet with the exact requested name is not in the workbook.
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid profile or column schema.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A column id or label that is not part of the column schema.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A record key that is one column's letter and another column's label.
    #[error("Ambiguous column key {0:?}: it is one column's letter and another column's label")]
    AmbiguousColumn(String),

    /// A record that assigns the same column more than once.
    #[error("Column {column} is set more than once in record {record}")]
    DuplicateColumn { column: String, record: usize },

    /// Edit buffer row index past the fixed row count.
    #[error("Row {row} is out of range (buffer has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    /// The reference option set could not be loaded; the session cannot proceed.
    #[error("Reference options unavailable: {0}")]
    OptionsUnavailable(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RxOrderError>;

impl From<RxOrderError> for wasm_bindgen::JsValue {
    fn from(e: RxOrderError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
