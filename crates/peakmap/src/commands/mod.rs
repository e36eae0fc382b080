//! Command dispatch: bridges CLI args -> controller events -> output formatting.

pub mod config_cmd;
pub mod display;
pub mod extent;
pub mod layers;
pub mod query;
pub mod report;
pub mod streets;
pub mod where_cmd;
pub mod years;

use std::sync::Arc;

use tracing::{debug, warn};

use peakmap_core::{FeatureLayer, FilterController, SelectionOutcome, ServiceConfig, StreetValidity};

use crate::cli::{Command, GlobalOpts, SelectionArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use self::display::TerminalDisplay;

pub type Session = FilterController<FeatureLayer, TerminalDisplay>;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    service: ServiceConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Layers => layers::handle(&service, global).await,
        Command::Where(args) => where_cmd::handle(service, args, global).await,
        Command::Years(args) => years::handle(&service, &args, global).await,
        Command::Streets(args) => streets::handle(&service, args, global).await,
        Command::Query(args) => query::handle(service, args, global).await,
        Command::Report(args) => report::handle(service, args, global).await,
        Command::Extent(args) => extent::handle(service, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}

// ── Sessions ────────────────────────────────────────────────────────

/// Load the configured layer catalog.
pub async fn load_layers(service: &ServiceConfig) -> Result<Vec<Arc<FeatureLayer>>, CliError> {
    let layers = FeatureLayer::load_all(service).await?;
    debug!(layers = layers.len(), "layer catalog loaded");
    Ok(layers)
}

/// Replay the selection flags as controller events, the way a user would
/// set the facets and then click each location.
///
/// Only the selected layers are loaded. With no `--layer` the controller
/// starts empty and every outcome is `Cleared`.
pub async fn open_session(
    mut service: ServiceConfig,
    args: &SelectionArgs,
    global: &GlobalOpts,
) -> Result<(Session, SelectionOutcome), CliError> {
    let ids = args.layer_ids();
    let layers = if ids.is_empty() {
        Vec::new()
    } else {
        config::restrict_layers(&mut service, &ids);
        load_layers(&service).await?
    };

    let session = FilterController::new(layers, TerminalDisplay::default());
    session.initialize().await;

    let facets = args.facets.to_facets();
    let mut outcome = SelectionOutcome::Cleared;
    if facets.data_type().is_some() {
        outcome = session.on_data_type_change(&facets.data_type).await;
    }
    if facets.period().is_some() {
        outcome = session.on_period_change(&facets.period).await;
    }
    if facets.street().is_some() {
        outcome = session.on_street_input(&facets.street).await;
        if session.display().street_validity() == Some(StreetValidity::Unknown)
            && !session.state().await.streets.is_empty()
        {
            output::notice(
                &format!("'{}' is not a known street; matching it as typed", facets.street.trim()),
                global.quiet,
            );
        }
    }
    if facets.years.is_active() {
        outcome = session.on_year_change(facets.years.clone()).await;
    }
    for id in ids {
        if session.layer(id).is_none() {
            warn!(layer = %id, "layer did not load; leaving it out of the selection");
            output::notice(&format!("Layer {id} could not be loaded and was skipped"), global.quiet);
            continue;
        }
        outcome = session.on_location_toggle(id).await?;
    }

    let (_, years) = session.display().years();
    if facets.years.is_active() && !session.layers().is_empty() && years != facets.years {
        output::notice(
            &format!(
                "Years narrowed to what these facets still offer: {}",
                years.selected_values().join(", ")
            ),
            global.quiet,
        );
    }

    debug!(?outcome, "selection replayed");
    Ok((session, outcome))
}
