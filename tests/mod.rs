//! Integration tests for rxorder.
//!
//! This module provides the test infrastructure for the option loader and
//! the template injector. It includes:
//!
//! - `fixtures`: Builders for creating order templates in memory
//! - `common`: Read-back helpers for generated workbooks
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::fixtures::rx_template;
//! use crate::common::sheet_values;
//!
//! fn test_first_order_line() {
//!     let mut buffer = EditBuffer::new(ColumnSchema::rx_order(), 31);
//!     buffer.set(0, "A", "ORD-1").unwrap();
//!     let artifact = inject(&rx_template(), &buffer, &Profile::default()).unwrap();
//!     assert_eq!(sheet_values(&artifact.bytes, "ORDER").get(1, 3), Some("ORD-1"));
//! }
//! ```
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

pub mod common;
pub mod fixtures;

// Re-export commonly used items at the top level
pub use common::{cell_style, col_width, entry_names, part_text, sheet_values, sheet_xml};
pub use fixtures::{rx_template, rx_template_xlsm, SheetBuilder, TemplateBuilder};
