//! Traffic analytics report for the selected locations.

use chrono::Local;

use peakmap_core::{DataReport, ServiceConfig};

use crate::cli::{GlobalOpts, OutputFormat, SelectionArgs};
use crate::error::CliError;
use crate::output;

use super::open_session;

pub async fn handle(service: ServiceConfig, args: SelectionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (session, _) = open_session(service, &args, global).await?;
    let (selected, features) = session.query_selected().await;
    let report = DataReport::build(&selected, &features, Local::now().date_naive())?;

    let out = match global.output {
        OutputFormat::Table => format!(
            "{}\nGenerated on: {}\n{}",
            report.title,
            report.generated_on.format("%B %-d, %Y"),
            output::grid_table(&report.columns, &report.rows)
        ),
        ref format => output::render_grid(format, &report, &report.columns, &report.rows)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
