//! Option Loader: selection lists from the Reference Sheet.
//!
//! Each select column of the schema is bound to one Reference Sheet column.
//! Its option list is every non-null value of that column from row 2 down
//! (row 1 is a header), coerced to text, in sheet order. Duplicates are kept.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Profile;
use crate::error::Result;
use crate::package::Package;
use crate::schema::ColumnSchema;
use crate::source::ByteSource;

/// First data row on the Reference Sheet.
pub const FIRST_OPTION_ROW: u32 = 2;

/// Option lists keyed by column id. An empty set means loading failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceOptions {
    lists: BTreeMap<String, Vec<String>>,
}

impl ReferenceOptions {
    /// Options for a select column, or `None` for text/unknown columns.
    pub fn get(&self, column_id: &str) -> Option<&[String]> {
        self.lists.get(column_id).map(Vec::as_slice)
    }

    /// `true` when nothing was loaded; the session cannot proceed.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.lists.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether `value` is one of the options of `column_id`.
    pub fn contains(&self, column_id: &str, value: &str) -> bool {
        self.get(column_id)
            .is_some_and(|opts| opts.iter().any(|o| o == value))
    }
}

/// Extract the option lists from template bytes.
pub fn load_options(
    template: &[u8],
    reference_sheet: &str,
    schema: &ColumnSchema,
) -> Result<ReferenceOptions> {
    let mut package = Package::open(template)?;

    let source_columns: Vec<u32> = schema
        .select_columns()
        .filter_map(|c| c.source_column())
        .collect();
    let values = package.read_values(reference_sheet, Some(source_columns.as_slice()))?;

    let mut lists = BTreeMap::new();
    for spec in schema.select_columns() {
        let Some(source) = spec.source_column() else {
            continue;
        };
        let options = values.column_from(source, FIRST_OPTION_ROW);
        log::debug!("column {}: {} options", spec.id, options.len());
        lists.insert(spec.id.clone(), options);
    }

    Ok(ReferenceOptions { lists })
}

/// Load options for a profile from its template source.
///
/// A failure is logged as the user-facing diagnostic before it is returned.
pub fn load_profile_options(source: &ByteSource, profile: &Profile) -> Result<ReferenceOptions> {
    source
        .load()
        .and_then(|bytes| load_options(&bytes, &profile.reference_sheet, &profile.columns))
        .inspect_err(|e| {
            log::error!(
                "cannot load dropdown options from {}: {e}",
                source.describe()
            );
        })
}

/// Load options for a profile, turning any failure into a diagnostic.
///
/// The error is logged and an empty [`ReferenceOptions`] returned; callers
/// must stop rendering the form when the result is empty.
pub fn load_options_or_report(source: &ByteSource, profile: &Profile) -> ReferenceOptions {
    load_profile_options(source, profile).unwrap_or_default()
}
