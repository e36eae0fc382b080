//! Terminal stand-in for the map and facet widgets.
//!
//! The controller pushes results here as events settle; commands read the
//! final state once the last event has run.

use std::sync::{Mutex, MutexGuard, PoisonError};

use peakmap_core::{
    FacetDisplay, Feature, ResultsDisplay, StreetValidity, YearOptions, YearSelection,
};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TerminalDisplay {
    state: Mutex<Shown>,
}

#[derive(Debug, Default)]
struct Shown {
    features: Vec<Feature>,
    highlighted: usize,
    years: YearOptions,
    year_selection: YearSelection,
    street: Option<StreetValidity>,
}

impl TerminalDisplay {
    fn lock(&self) -> MutexGuard<'_, Shown> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Features currently in the attribute table.
    pub fn features(&self) -> Vec<Feature> {
        self.lock().features.clone()
    }

    pub fn years(&self) -> (YearOptions, YearSelection) {
        let shown = self.lock();
        (shown.years.clone(), shown.year_selection.clone())
    }

    /// Features highlighted on the map.
    pub fn highlighted(&self) -> usize {
        self.lock().highlighted
    }

    /// Validity of the last street input, if any was entered.
    pub fn street_validity(&self) -> Option<StreetValidity> {
        self.lock().street
    }
}

impl ResultsDisplay for TerminalDisplay {
    fn show_features(&self, features: &[Feature]) {
        debug!(features = features.len(), "results updated");
        self.lock().features = features.to_vec();
    }

    fn clear(&self) {
        self.lock().features.clear();
    }

    fn highlight(&self, features: &[Feature]) {
        self.lock().highlighted = features.len();
    }

    fn clear_highlight(&self) {
        self.lock().highlighted = 0;
    }
}

impl FacetDisplay for TerminalDisplay {
    fn show_year_options(&self, options: &YearOptions, selection: &YearSelection) {
        let mut shown = self.lock();
        shown.years = options.clone();
        shown.year_selection = selection.clone();
    }

    fn show_street_validity(&self, validity: StreetValidity) {
        self.lock().street = Some(validity);
    }
}
