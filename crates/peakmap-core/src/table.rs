// ── Attribute table ──
//
// Tabular view of a merged feature set: bookkeeping columns hidden, empty
// columns dropped, null cells shown as `N/A`, sortable by any column.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{Feature, value_text};

/// Columns never shown in the attribute table.
pub const EXCLUDED_FIELDS: &[&str] = &[
    "PopupInfo",
    "ObjectID",
    "PEAK_ID",
    "Latitude",
    "Longitude",
    "Intersection_ID",
    "Intersection_Type",
    "Leg_Type",
    "Traffic_DataCollection_Date",
    "City",
    "State",
    "Intersection_Value",
    "E",
    "N",
    "S",
    "W",
];

/// Placeholder for null cells.
pub const MISSING: &str = "N/A";

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.\-]+").expect("non-numeric pattern is valid"));
static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)").expect("number prefix pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSort {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<TableSort>,
}

impl AttributeTable {
    /// Columns come from the first feature's attribute order; a column is
    /// kept only if some feature has a non-null value for it.
    pub fn from_features(features: &[Feature]) -> Self {
        let Some(first) = features.first() else {
            return Self::default();
        };

        let columns: Vec<String> = first
            .attributes
            .keys()
            .filter(|name| !EXCLUDED_FIELDS.contains(&name.as_str()))
            .filter(|name| features.iter().any(|f| f.text(name).is_some()))
            .cloned()
            .collect();

        let rows = features
            .iter()
            .map(|feature| {
                columns
                    .iter()
                    .map(|c| {
                        feature
                            .attribute(c)
                            .and_then(value_text)
                            .unwrap_or_else(|| MISSING.to_owned())
                    })
                    .collect()
            })
            .collect();

        Self {
            columns,
            rows,
            sort: None,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn sort(&self) -> Option<TableSort> {
        self.sort
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort by `column`. Sorting the current column again flips direction;
    /// a new column starts ascending. `None` for an unknown column.
    pub fn sort_by(&mut self, column: &str) -> Option<SortDirection> {
        let index = self.columns.iter().position(|c| c == column)?;
        let direction = match self.sort {
            Some(TableSort {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == index => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };

        self.rows.sort_by(|a, b| {
            let ordering = compare_cells(&a[index], &b[index]);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        self.sort = Some(TableSort {
            column: index,
            direction,
        });
        Some(direction)
    }
}

/// Leading number of `text` once non-numeric characters are stripped.
fn numeric_value(text: &str) -> Option<f64> {
    let stripped = NON_NUMERIC.replace_all(text.trim(), "");
    NUMBER_PREFIX
        .find(&stripped)
        .and_then(|m| m.as_str().parse().ok())
}

/// Numeric when both cells read as numbers, lexical otherwise.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (numeric_value(a), numeric_value(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.trim().cmp(b.trim()),
    }
}
