//! Layer catalog listing.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use peakmap_core::model::fields;
use peakmap_core::{FeatureLayer, Field, LayerId, LayerSource, ServiceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::load_layers;

// ── Serializable summary ────────────────────────────────────────────

#[derive(Serialize)]
struct LayerSummary {
    id: LayerId,
    title: String,
    fields: Vec<Field>,
}

impl From<&Arc<FeatureLayer>> for LayerSummary {
    fn from(layer: &Arc<FeatureLayer>) -> Self {
        Self {
            id: layer.id(),
            title: layer.title().to_owned(),
            fields: layer.schema().fields().to_vec(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Streets")]
    streets: String,
}

impl From<&LayerSummary> for LayerRow {
    fn from(s: &LayerSummary) -> Self {
        let has = |name: &str| s.fields.iter().any(|f| f.name == name);
        let year = s
            .fields
            .iter()
            .find(|f| f.name == fields::YEAR)
            .map_or_else(|| "-".to_owned(), |f| f.field_type.to_string());
        let streets = match (has(fields::MAJOR_STREET), has(fields::MINOR_STREET)) {
            (true, true) => "major, minor",
            (true, false) => "major",
            (false, true) => "minor",
            (false, false) => "-",
        };
        Self {
            id: s.id.0,
            title: s.title.clone(),
            fields: s.fields.len(),
            year,
            streets: streets.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(service: &ServiceConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let layers = load_layers(service).await?;
    let summaries: Vec<LayerSummary> = layers.iter().map(LayerSummary::from).collect();
    let out = output::render_list(&global.output, &summaries, |s| LayerRow::from(s), |s| {
        format!("{}\t{}", s.id, s.title)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
