//! Edit Buffer: the order grid a user fills in before generating.
//!
//! The buffer is rectangular: a fixed number of rows, one cell per schema
//! column. Rows are never added or removed; [`EditBuffer::reset`] clears it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RxOrderError};
use crate::options::ReferenceOptions;
use crate::schema::ColumnSchema;

/// A cell as handed over by the grid widget.
///
/// Selection widgets sometimes deliver their value wrapped in a list; that
/// shape is accepted and collapsed to its first element on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellInput {
    #[default]
    Empty,
    Text(String),
    List(Vec<String>),
}

impl CellInput {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The value to write: first element of a list, the text itself, or
    /// nothing. Empty text counts as nothing.
    pub fn collapse(&self) -> Option<&str> {
        let value = match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.as_str()),
            Self::List(items) => items.first().map(String::as_str),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.collapse().is_none()
    }
}

impl From<&str> for CellInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Option<&str>> for CellInput {
    fn from(s: Option<&str>) -> Self {
        s.map_or(Self::Empty, Self::from)
    }
}

/// One JSON row: column id (or label) to cell.
pub type RowRecord = BTreeMap<String, CellInput>;

/// A select cell holding a value outside its option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionIssue {
    /// 0-based buffer row.
    pub row: usize,
    pub column_id: String,
    pub value: String,
}

impl std::fmt::Display for SelectionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} column {}: {:?} is not a listed option",
            self.row + 1,
            self.column_id,
            self.value
        )
    }
}

/// The rectangular grid of order lines.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    schema: ColumnSchema,
    rows: Vec<Vec<CellInput>>,
}

impl EditBuffer {
    /// An empty buffer with `rows` rows.
    pub fn new(schema: ColumnSchema, rows: usize) -> Self {
        let width = schema.len();
        Self {
            rows: vec![vec![CellInput::Empty; width]; rows],
            schema,
        }
    }

    /// Build a buffer from row records keyed by column id or label.
    ///
    /// The buffer has at least `rows` rows; extra records are kept so the
    /// injector's row window decides what gets written. Keys that are
    /// ambiguous or that hit a column twice in one record are errors.
    pub fn from_records(schema: ColumnSchema, rows: usize, records: Vec<RowRecord>) -> Result<Self> {
        let mut buffer = Self::new(schema, rows.max(records.len()));
        for (row, record) in records.into_iter().enumerate() {
            let mut assigned = vec![false; buffer.schema.len()];
            for (key, cell) in record {
                let col = buffer.schema.position_by_key(&key)?;
                match assigned.get_mut(col) {
                    Some(seen) if *seen => {
                        let column = buffer
                            .schema
                            .columns()
                            .get(col)
                            .map_or(key, |c| c.id.clone());
                        return Err(RxOrderError::DuplicateColumn { column, record: row });
                    }
                    Some(seen) => *seen = true,
                    None => {}
                }
                if let Some(slot) = buffer.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
                    *slot = cell;
                }
            }
        }
        Ok(buffer)
    }

    /// Parse a JSON array of row objects.
    pub fn from_json(schema: ColumnSchema, rows: usize, json: &str) -> Result<Self> {
        let records: Vec<RowRecord> = serde_json::from_str(json)?;
        Self::from_records(schema, rows, records)
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows in order, each with one cell per schema column.
    pub fn rows(&self) -> &[Vec<CellInput>] {
        &self.rows
    }

    pub fn get(&self, row: usize, column_id: &str) -> Result<&CellInput> {
        let col = self.column(column_id)?;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(RxOrderError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            })
    }

    pub fn set(&mut self, row: usize, column_id: &str, value: impl Into<CellInput>) -> Result<()> {
        let col = self.column(column_id)?;
        let rows = self.rows.len();
        let slot = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(RxOrderError::RowOutOfRange { row, rows })?;
        *slot = value.into();
        Ok(())
    }

    /// Clear every cell; the row count stays.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.fill(CellInput::Empty);
        }
    }

    /// Number of leading rows up to and including the last non-empty one.
    pub fn used_rows(&self) -> usize {
        self.rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map_or(0, |idx| idx + 1)
    }

    /// Select cells whose value is not among their options.
    ///
    /// This is the check a form applies while editing; injection never
    /// re-validates.
    pub fn selection_issues(&self, options: &ReferenceOptions) -> Vec<SelectionIssue> {
        let mut issues = Vec::new();
        for (row_idx, row) in self.rows.iter().enumerate() {
            for (spec, cell) in self.schema.columns().iter().zip(row) {
                if !spec.is_select() {
                    continue;
                }
                if let Some(value) = cell.collapse() {
                    if !options.contains(&spec.id, value) {
                        issues.push(SelectionIssue {
                            row: row_idx,
                            column_id: spec.id.clone(),
                            value: value.to_string(),
                        });
                    }
                }
            }
        }
        issues
    }

    /// Column letter, or a label when no column has that letter.
    fn column(&self, column_id: &str) -> Result<usize> {
        self.schema
            .position(column_id)
            .or_else(|| self.schema.position_by_label(column_id))
            .ok_or_else(|| RxOrderError::UnknownColumn(column_id.to_string()))
    }
}
