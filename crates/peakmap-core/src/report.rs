// ── Data report ──
//
// The tabular content of the exported traffic report. Document layout is
// the caller's business; this only decides what goes in it.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::Feature;
use crate::selection::SelectedLocations;
use crate::table::MISSING;

pub const REPORT_TITLE: &str = "Traffic Analytics Report";

/// Fields a report may include, in column order.
pub const REPORT_FIELDS: &[&str] = &[
    "Data_Type",
    "Year",
    "Period",
    "Major_Street",
    "Minor_Street",
    "EBL",
    "EBT",
    "EBR",
    "WBL",
    "WBT",
    "WBR",
    "NBL",
    "NBT",
    "NBR",
    "SBL",
    "SBT",
    "EB",
    "WB",
    "NB",
    "SB",
];

const ACTION: &str = "report";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataReport {
    pub title: String,
    pub generated_on: NaiveDate,
    /// Report fields with at least one value, in `REPORT_FIELDS` order.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn cell(feature: &Feature, field: &str) -> Option<String> {
    feature
        .text(field)
        .filter(|v| !v.is_empty() && v != MISSING)
}

impl DataReport {
    /// Build a report from the features of the current selection.
    ///
    /// Fails with `NoSelection` when nothing is selected and `NoData` when
    /// the selection matched no features or none of the report fields.
    pub fn build(
        selected: &SelectedLocations,
        features: &[Feature],
        generated_on: NaiveDate,
    ) -> Result<Self, CoreError> {
        if selected.is_empty() {
            return Err(CoreError::NoSelection {
                action: ACTION.into(),
            });
        }
        if features.is_empty() {
            return Err(CoreError::NoData {
                action: ACTION.into(),
            });
        }

        let columns: Vec<String> = REPORT_FIELDS
            .iter()
            .filter(|field| features.iter().any(|f| cell(f, field).is_some()))
            .map(|field| (*field).to_owned())
            .collect();
        if columns.is_empty() {
            return Err(CoreError::NoData {
                action: ACTION.into(),
            });
        }

        let rows = features
            .iter()
            .map(|feature| {
                columns
                    .iter()
                    .map(|c| cell(feature, c).unwrap_or_else(|| MISSING.to_owned()))
                    .collect()
            })
            .collect();

        Ok(Self {
            title: REPORT_TITLE.into(),
            generated_on,
            columns,
            rows,
        })
    }
}
