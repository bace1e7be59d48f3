//! Column schema: the fixed, ordered definition of every order column.
//!
//! A schema entry binds a column letter to a user-facing label, a display
//! width in character units and a role. The position of an entry in the
//! schema is the destination column on the Order Sheet (1-based); the letter
//! keys the width table.

use serde::{Deserialize, Serialize};

use crate::cell_ref::letter_to_col;
use crate::error::{Result, RxOrderError};

/// How a column is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnRole {
    /// Free text.
    Text,
    /// Single select from the values of a Reference Sheet column.
    Select {
        /// 1-based column on the Reference Sheet supplying the options.
        source_column: u32,
    },
}

/// One column of the order grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column letter, e.g. `"J"`.
    pub id: String,
    /// Header shown to the user.
    pub label: String,
    /// Width on the Order Sheet, in character units.
    pub width: f64,
    pub role: ColumnRole,
}

impl ColumnSpec {
    fn text(id: &str, label: &str, width: f64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            width,
            role: ColumnRole::Text,
        }
    }

    fn select(id: &str, label: &str, width: f64, source_column: u32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            width,
            role: ColumnRole::Select { source_column },
        }
    }

    /// Reference Sheet column feeding this column, if it is a select column.
    pub fn source_column(&self) -> Option<u32> {
        match self.role {
            ColumnRole::Select { source_column } => Some(source_column),
            ColumnRole::Text => None,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self.role, ColumnRole::Select { .. })
    }
}

/// Ordered, validated list of columns. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnSpec>", into = "Vec<ColumnSpec>")]
pub struct ColumnSchema {
    columns: Vec<ColumnSpec>,
}

impl ColumnSchema {
    /// Build a schema, rejecting empty lists, invalid or duplicate letters,
    /// non-positive widths and select columns bound to column 0.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        if columns.is_empty() {
            return Err(RxOrderError::Config("column schema is empty".into()));
        }
        let mut seen = Vec::with_capacity(columns.len());
        for spec in &columns {
            let Some(col) = letter_to_col(&spec.id) else {
                return Err(RxOrderError::Config(format!(
                    "invalid column id {:?}",
                    spec.id
                )));
            };
            if seen.contains(&col) {
                return Err(RxOrderError::Config(format!(
                    "duplicate column id {:?}",
                    spec.id
                )));
            }
            seen.push(col);
            if !spec.width.is_finite() || spec.width <= 0.0 {
                return Err(RxOrderError::Config(format!(
                    "column {} has invalid width {}",
                    spec.id, spec.width
                )));
            }
            if spec.source_column() == Some(0) {
                return Err(RxOrderError::Config(format!(
                    "select column {} has source column 0 (columns are 1-based)",
                    spec.id
                )));
            }
        }
        Ok(Self { columns })
    }

    /// The 19-column RX order schema (A..S).
    pub fn rx_order() -> Self {
        Self {
            columns: vec![
                ColumnSpec::text("A", "Order #", 45.0),
                ColumnSpec::text("B", "Eye (R/L)", 5.0),
                ColumnSpec::text("C", "Sph", 5.0),
                ColumnSpec::text("D", "Cyl", 5.0),
                ColumnSpec::text("E", "Axis", 5.0),
                ColumnSpec::text("F", "Prism", 8.0),
                ColumnSpec::text("G", "Add", 5.0),
                ColumnSpec::text("H", "PD", 5.0),
                ColumnSpec::text("I", "HT", 5.0),
                ColumnSpec::select("J", "Material", 20.0, 1),
                ColumnSpec::select("K", "Products", 50.0, 2),
                ColumnSpec::select("L", "Tint", 20.0, 3),
                ColumnSpec::select("M", "Coating", 15.0, 4),
                ColumnSpec::text("N", "A", 20.0),
                ColumnSpec::text("O", "B", 5.0),
                ColumnSpec::text("P", "ED", 5.0),
                ColumnSpec::text("Q", "DBL", 5.0),
                ColumnSpec::text("R", "Qty", 5.0),
                ColumnSpec::text("S", "Note", 5.0),
            ],
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position (0-based) of the column with exactly this letter.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    /// Position of the column with exactly this label.
    pub fn position_by_label(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label == label)
    }

    /// Resolve a record key that may be a letter or a label.
    ///
    /// A key naming one column by letter and another by label (`"A"` is
    /// column A's letter and column N's label) is rejected.
    pub fn position_by_key(&self, key: &str) -> Result<usize> {
        match (self.position(key), self.position_by_label(key)) {
            (Some(by_id), Some(by_label)) if by_id != by_label => {
                Err(RxOrderError::AmbiguousColumn(key.to_string()))
            }
            (Some(idx), _) | (None, Some(idx)) => Ok(idx),
            (None, None) => Err(RxOrderError::UnknownColumn(key.to_string())),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ColumnSpec> {
        self.position(id).and_then(|idx| self.columns.get(idx))
    }

    /// Select-type columns in schema order.
    pub fn select_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.is_select())
    }

    /// `(column index, width)` pairs for the width table, keyed by letter.
    pub fn width_table(&self) -> Vec<(u32, f64)> {
        self.columns
            .iter()
            .filter_map(|c| letter_to_col(&c.id).map(|col| (col, c.width)))
            .collect()
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::rx_order()
    }
}

impl TryFrom<Vec<ColumnSpec>> for ColumnSchema {
    type Error = RxOrderError;

    fn try_from(columns: Vec<ColumnSpec>) -> Result<Self> {
        Self::new(columns)
    }
}

impl From<ColumnSchema> for Vec<ColumnSpec> {
    fn from(schema: ColumnSchema) -> Self {
        schema.columns
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_order_schema_shape() {
        let schema = ColumnSchema::rx_order();
        assert_eq!(schema.len(), 19);
        assert_eq!(schema.columns()[0].label, "Order #");
        assert_eq!(schema.columns()[18].id, "S");
        let selects: Vec<_> = schema.select_columns().map(|c| c.id.as_str()).collect();
        assert_eq!(selects, vec!["J", "K", "L", "M"]);
        assert_eq!(schema.get("K").and_then(ColumnSpec::source_column), Some(2));
    }

    #[test]
    fn test_rx_order_schema_is_valid() {
        let schema = ColumnSchema::rx_order();
        assert!(ColumnSchema::new(schema.columns().to_vec()).is_ok());
    }

    #[test]
    fn test_width_table() {
        let table = ColumnSchema::rx_order().width_table();
        assert_eq!(table.len(), 19);
        assert_eq!(table[0], (1, 45.0));
        assert_eq!(table[10], (11, 50.0));
    }

    #[test]
    fn test_lookup_by_label() {
        let schema = ColumnSchema::rx_order();
        assert_eq!(schema.position_by_key("Material").unwrap(), 9);
        assert_eq!(schema.position_by_key("J").unwrap(), 9);
        assert_eq!(schema.position_by_key("ED").unwrap(), 15);
        assert!(matches!(
            schema.position_by_key("Nope"),
            Err(RxOrderError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_ids_are_case_sensitive() {
        let schema = ColumnSchema::rx_order();
        assert_eq!(schema.position("J"), Some(9));
        assert_eq!(schema.position("j"), None);
        assert!(matches!(
            schema.position_by_key("j"),
            Err(RxOrderError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_letter_that_is_another_columns_label_is_ambiguous() {
        let schema = ColumnSchema::rx_order();
        // "A"/"B" are the letters of Order #/Eye and the labels of N/O.
        for key in ["A", "B"] {
            assert!(matches!(
                schema.position_by_key(key),
                Err(RxOrderError::AmbiguousColumn(k)) if k == key
            ));
        }
        assert_eq!(schema.position_by_key("N").unwrap(), 13);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let cols = vec![
            ColumnSpec::text("A", "One", 5.0),
            ColumnSpec::text("a", "Two", 5.0),
        ];
        assert!(matches!(
            ColumnSchema::new(cols),
            Err(RxOrderError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_width_and_source() {
        assert!(ColumnSchema::new(vec![ColumnSpec::text("A", "x", 0.0)]).is_err());
        assert!(ColumnSchema::new(vec![ColumnSpec::text("A", "x", f64::NAN)]).is_err());
        assert!(ColumnSchema::new(vec![ColumnSpec::select("A", "x", 5.0, 0)]).is_err());
        assert!(ColumnSchema::new(vec![ColumnSpec::text("1", "x", 5.0)]).is_err());
        assert!(ColumnSchema::new(Vec::new()).is_err());
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"[
            {"id": "A", "label": "Order #", "width": 45, "role": {"kind": "text"}},
            {"id": "B", "label": "Lens", "width": 20, "role": {"kind": "select", "source_column": 1}}
        ]"#;
        let schema: ColumnSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.columns()[1].is_select());

        let bad = r#"[{"id": "A", "label": "x", "width": 5, "role": {"kind": "text"}},
                      {"id": "A", "label": "y", "width": 5, "role": {"kind": "text"}}]"#;
        assert!(serde_json::from_str::<ColumnSchema>(bad).is_err());
    }
}
