// peakmap-core: Facet filtering and cross-layer query orchestration between peakmap-api and consumers (CLI).

pub mod config;
pub mod controller;
pub mod error;
pub mod extent;
pub mod facets;
pub mod layer;
pub mod model;
pub mod normalize;
pub mod predicate;
pub mod report;
pub mod selection;
pub mod settle;
pub mod source;
pub mod streets;
pub mod table;
pub mod years;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ServiceConfig, TlsVerification, parse_layer_spec};
pub use controller::{ControllerState, FilterController, SelectionOutcome};
pub use error::CoreError;
pub use layer::FeatureLayer;
pub use source::{FacetDisplay, LayerSource, ResultsDisplay};

// Re-export the domain types at the crate root for ergonomics.
pub use extent::{Extent, snapshot_extent};
pub use facets::{ALL, FacetState, YearSelection};
pub use model::{Attributes, Feature, Field, FieldType, Geometry, LayerId, LayerSchema};
pub use normalize::normalize;
pub use predicate::{Clause, Exclusion, Literal, Predicate};
pub use report::DataReport;
pub use selection::{SelectedLocations, query_features};
pub use streets::{StreetIndex, StreetValidity};
pub use table::{AttributeTable, SortDirection};
pub use years::{YearOptions, YearScope, resolve_years};
