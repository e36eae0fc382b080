//! Year options reachable under the other facets.

use serde::Serialize;
use tabled::Tabled;

use peakmap_core::{ServiceConfig, YearScope, resolve_years};

use crate::cli::{FacetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::load_layers;

#[derive(Serialize)]
struct YearEntry {
    year: String,
    selected: bool,
}

#[derive(Tabled)]
struct YearRow {
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Selected")]
    selected: &'static str,
}

impl From<&YearEntry> for YearRow {
    fn from(e: &YearEntry) -> Self {
        Self {
            year: e.year.clone(),
            selected: if e.selected { "*" } else { "" },
        }
    }
}

pub async fn handle(service: &ServiceConfig, args: &FacetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let layers = load_layers(service).await?;
    let facets = args.to_facets();
    let options = resolve_years(&layers, YearScope::Conditioned(&facets)).await;

    let mut selection = facets.years.clone();
    if selection.retain_available(&options) {
        output::notice(
            "Some requested years are not available under these facets and were dropped",
            global.quiet,
        );
    }

    let entries: Vec<YearEntry> = options
        .rendered()
        .into_iter()
        .map(|year| YearEntry {
            selected: if selection.is_active() {
                selection.active_years().contains(&year)
            } else {
                year == peakmap_core::ALL
            },
            year: year.to_owned(),
        })
        .collect();

    let out = output::render_list(&global.output, &entries, |e| YearRow::from(e), |e| e.year.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
