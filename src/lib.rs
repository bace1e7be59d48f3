//! rxorder - RX order form back end
//!
//! Fills optical-lens order lines into a prepared XLSX/XLSM template:
//! - Dropdown option lists read from the template's reference sheet
//! - A fixed-size edit buffer validated against those lists
//! - Injection into the order sheet, keeping template formatting and macros
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use rxorder::{Profile, Session};
//!
//! let mut session = Session::from_profile(Profile::default())?;
//! session.buffer_mut().set(0, "A", "ORD-1")?;
//! let artifact = session.generate()?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! # Ok::<(), rxorder::RxOrderError>(())
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { load_options, generate_order } from 'rxorder';
//! await init();
//! const options = load_options(templateBytes);
//! const xlsm = generate_order(templateBytes, JSON.stringify(rows));
//! ```

pub mod buffer;
pub mod cell_ref;
pub mod config;
pub mod error;
pub mod export;
pub mod options;
pub mod package;
pub mod schema;
pub mod session;
pub mod source;
pub mod xml_helpers;

use wasm_bindgen::prelude::*;

pub use buffer::{CellInput, EditBuffer, RowRecord, SelectionIssue};
pub use config::{Profile, TemplateLocation, XLSM_MIME, XLSX_MIME};
pub use error::{Result, RxOrderError};
pub use export::{inject, OutputArtifact};
pub use options::{load_options, load_options_or_report, load_profile_options, ReferenceOptions};
pub use schema::{ColumnRole, ColumnSchema, ColumnSpec};
pub use session::Session;
pub use source::{decode_blob, encode_blob, BaseDir, ByteSource};

/// Load the dropdown option lists of the default profile from template bytes.
///
/// # Errors
/// Returns an error if the template is unreadable or lacks the reference sheet.
#[wasm_bindgen(js_name = load_options)]
pub fn load_options_js(template: &[u8]) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let profile = Profile::default();
    let options = load_options(template, &profile.reference_sheet, &profile.columns)
        .map_err(JsValue::from)?;
    serde_wasm_bindgen::to_value(&options)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Column schema of the default profile.
///
/// # Errors
/// Returns an error if serialization fails.
#[wasm_bindgen]
pub fn column_schema() -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&ColumnSchema::rx_order())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Fill `template` with JSON row records and return the workbook bytes.
///
/// # Errors
/// Returns an error for malformed rows, unknown columns or a broken template.
#[wasm_bindgen]
pub fn generate_order(template: &[u8], rows_json: &str) -> std::result::Result<Vec<u8>, JsValue> {
    console_error_panic_hook::set_once();
    let profile = Profile::default();
    let buffer = EditBuffer::from_json(profile.columns.clone(), profile.rows, rows_json)
        .map_err(JsValue::from)?;
    inject(template, &buffer, &profile)
        .map(|artifact| artifact.bytes)
        .map_err(JsValue::from)
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
