//! Map snapshot extent for the selected locations.

use peakmap_core::{ServiceConfig, snapshot_extent};

use crate::cli::{GlobalOpts, SelectionArgs};
use crate::error::CliError;
use crate::output;

use super::open_session;

pub async fn handle(service: ServiceConfig, args: SelectionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (session, _) = open_session(service, &args, global).await?;
    let (selected, features) = session.query_selected().await;
    let extent = snapshot_extent(&selected, &features)?;

    let out = output::render_single(
        &global.output,
        &extent,
        |e| {
            let (cx, cy) = e.center();
            format!(
                "xmin:   {:.2}\nymin:   {:.2}\nxmax:   {:.2}\nymax:   {:.2}\ncenter: {cx:.2}, {cy:.2}\nsize:   {:.2} x {:.2}",
                e.xmin,
                e.ymin,
                e.xmax,
                e.ymax,
                e.width(),
                e.height()
            )
        },
        |e| format!("{},{},{},{}", e.xmin, e.ymin, e.xmax, e.ymax),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
