//! Per-layer where clauses for a facet combination.

use serde::Serialize;
use tabled::Tabled;

use peakmap_core::{LayerId, LayerSource, Predicate, ServiceConfig, predicate};

use crate::cli::{GlobalOpts, WhereArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::load_layers;

#[derive(Serialize)]
struct LayerClause {
    layer: LayerId,
    title: String,
    where_clause: String,
    /// Set when the layer cannot honour an active facet.
    #[serde(skip_serializing_if = "Option::is_none")]
    excluded: Option<String>,
}

#[derive(Tabled)]
struct ClauseRow {
    #[tabled(rename = "Layer")]
    layer: u32,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Where")]
    where_clause: String,
}

impl From<&LayerClause> for ClauseRow {
    fn from(c: &LayerClause) -> Self {
        Self {
            layer: c.layer.0,
            title: c.title.clone(),
            where_clause: match c.excluded {
                Some(ref reason) => format!("{} ({reason})", c.where_clause),
                None => c.where_clause.clone(),
            },
        }
    }
}

pub async fn handle(
    mut service: ServiceConfig,
    args: WhereArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ids: Vec<LayerId> = args.layer.iter().copied().map(LayerId).collect();
    config::restrict_layers(&mut service, &ids);
    let layers = load_layers(&service).await?;
    let facets = args.facets.to_facets();

    let clauses: Vec<LayerClause> = layers
        .iter()
        .map(|layer| {
            let (where_clause, excluded) = match predicate::compile(layer.schema(), &facets) {
                Ok(clauses) => (Predicate::from_clauses(clauses).to_string(), None),
                Err(reason) => (
                    Predicate::MatchNone.to_string(),
                    Some(reason.to_string()),
                ),
            };
            LayerClause {
                layer: layer.id(),
                title: layer.title().to_owned(),
                where_clause,
                excluded,
            }
        })
        .collect();

    let out = output::render_list(&global.output, &clauses, |c| ClauseRow::from(c), |c| {
        format!("{}\t{}", c.layer, c.where_clause)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
