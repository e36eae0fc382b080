//! Location selection and the attribute table.

use peakmap_core::{AttributeTable, SelectionOutcome, ServiceConfig, SortDirection};

use crate::cli::{GlobalOpts, QueryArgs};
use crate::error::CliError;
use crate::output;

use super::open_session;

pub async fn handle(service: ServiceConfig, args: QueryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (session, outcome) = open_session(service, &args.selection, global).await?;

    match outcome {
        SelectionOutcome::Displayed(count) => {
            tracing::info!(
                features = count,
                highlighted = session.display().highlighted(),
                "query displayed"
            );
        }
        SelectionOutcome::Cleared | SelectionOutcome::Superseded => {
            let message = if args.selection.layer.is_empty() {
                "No locations selected; pass --layer (-l) to select one"
            } else {
                "No features match the selected locations and facets"
            };
            output::notice(message, global.quiet);
            return Ok(());
        }
    }

    let mut table = AttributeTable::from_features(&session.display().features());
    if let Some(ref column) = args.sort {
        sort_table(&mut table, column, args.desc)?;
    }

    let out = output::render_grid(&global.output, &table, table.columns(), table.rows())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Sort the way repeated header clicks do: once ascending, twice descending.
fn sort_table(table: &mut AttributeTable, column: &str, descending: bool) -> Result<(), CliError> {
    let columns = table.columns().join(", ");
    let unknown = || CliError::Validation {
        field: "sort".into(),
        reason: format!("no column named '{column}'; columns: {columns}"),
    };
    let mut direction = table.sort_by(column).ok_or_else(unknown)?;
    if descending && direction == SortDirection::Ascending {
        direction = table.sort_by(column).ok_or_else(unknown)?;
    }
    tracing::debug!(column, %direction, "attribute table sorted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use peakmap_core::{Attributes, Feature, LayerId};
    use serde_json::json;

    use super::*;

    fn feature(year: i64, ebl: i64) -> Feature {
        let mut attributes = Attributes::new();
        attributes.insert("Year".into(), json!(year));
        attributes.insert("EBL".into(), json!(ebl));
        Feature {
            layer: LayerId(1),
            attributes,
            geometry: None,
        }
    }

    #[test]
    fn desc_sorts_twice() {
        let mut table =
            AttributeTable::from_features(&[feature(2019, 9), feature(2020, 100), feature(2021, 12)]);
        sort_table(&mut table, "EBL", true).unwrap();
        let ebl: Vec<&str> = table.rows().iter().map(|r| r[1].as_str()).collect();
        assert_eq!(ebl, vec!["100", "12", "9"]);
    }

    #[test]
    fn unknown_sort_column_is_a_validation_error() {
        let mut table = AttributeTable::from_features(&[feature(2019, 9)]);
        let err = sort_table(&mut table, "WBT", false).unwrap_err();
        assert!(err.to_string().contains("sort"));
    }
}
