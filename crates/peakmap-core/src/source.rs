// ── Collaborator seams ──
//
// The core reads layers and writes to displays only through these traits.
// `FeatureLayer` implements `LayerSource` over HTTP; the CLI implements the
// display traits for a terminal.

use std::future::Future;
use std::sync::Arc;

use crate::error::CoreError;
use crate::facets::YearSelection;
use crate::model::{Attributes, Feature, LayerId, LayerSchema};
use crate::predicate::Predicate;
use crate::streets::StreetValidity;
use crate::years::YearOptions;

/// One queryable layer (the Map/Layer Provider).
pub trait LayerSource: Send + Sync {
    fn id(&self) -> LayerId;

    /// Human-readable layer name.
    fn title(&self) -> &str;

    fn schema(&self) -> &LayerSchema;

    /// Distinct combinations of `fields` among rows matching `predicate`.
    fn distinct_values(
        &self,
        fields: &[&str],
        predicate: &Predicate,
    ) -> impl Future<Output = Result<Vec<Attributes>, CoreError>> + Send;

    /// All attributes of rows matching `predicate`, with geometry if asked.
    ///
    /// Read-only: never touches the persisted display filter.
    fn query_features(
        &self,
        predicate: &Predicate,
        include_geometry: bool,
    ) -> impl Future<Output = Result<Vec<Feature>, CoreError>> + Send;

    /// Replace the persisted display filter.
    fn set_display_filter(&self, predicate: Predicate);

    fn display_filter(&self) -> Arc<Predicate>;
}

/// Receives merged query results (attribute table and map highlight).
pub trait ResultsDisplay: Send + Sync {
    fn show_features(&self, features: &[Feature]);

    fn clear(&self);

    fn highlight(&self, features: &[Feature]);

    fn clear_highlight(&self);
}

/// Receives facet option updates.
pub trait FacetDisplay: Send + Sync {
    /// Refreshed year list plus the (reconciled) selection to mark.
    fn show_year_options(&self, options: &YearOptions, selection: &YearSelection);

    fn show_street_validity(&self, _validity: StreetValidity) {}
}
