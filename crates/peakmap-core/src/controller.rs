// ── Filter controller ──
//
// Owns facet state and the selected locations, and sequences every facet
// event: persist display filters, refresh year options, re-query the
// selection, hand results to the display.
//
// Overlapping events are ordered by generation. Each event bumps the
// selection generation under the state lock; a selection result whose
// generation is no longer current is discarded, so the display always
// reflects the most recently *triggered* event. Year refreshes carry their
// own generation, bumped only by events that refresh years.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::facets::{FacetState, YearSelection};
use crate::model::{Feature, LayerId};
use crate::predicate;
use crate::selection::{self, SelectedLocations};
use crate::source::{FacetDisplay, LayerSource, ResultsDisplay};
use crate::streets::{StreetIndex, StreetValidity};
use crate::years::{YearOptions, YearScope, resolve_years};

// ── Outcome ─────────────────────────────────────────────────────────

/// What an event did to the results display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "features")]
pub enum SelectionOutcome {
    /// Merged features were shown and highlighted.
    Displayed(usize),
    /// No selection or no matching features; displays were cleared.
    Cleared,
    /// A later event superseded this one before its query settled.
    Superseded,
}

/// Session state visible to callers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControllerState {
    pub facets: FacetState,
    pub selected: SelectedLocations,
    pub year_options: YearOptions,
    #[serde(skip)]
    pub streets: StreetIndex,
}

// ── FilterController ────────────────────────────────────────────────

/// Facet state machine over a fixed set of layers.
///
/// Cheaply cloneable; clones share state.
pub struct FilterController<L, D> {
    inner: Arc<ControllerInner<L, D>>,
}

impl<L, D> Clone for FilterController<L, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<L, D> {
    layers: Vec<Arc<L>>,
    display: D,
    state: Mutex<ControllerState>,
    selection_generation: AtomicU64,
    year_generation: AtomicU64,
}

/// Everything an event's async half needs, captured under the lock.
struct Snapshot<L> {
    facets: FacetState,
    selected: Vec<Arc<L>>,
    selection_generation: u64,
    year_generation: Option<u64>,
}

impl<L, D> FilterController<L, D>
where
    L: LayerSource,
    D: ResultsDisplay + FacetDisplay,
{
    pub fn new(layers: Vec<Arc<L>>, display: D) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                layers,
                display,
                state: Mutex::new(ControllerState::default()),
                selection_generation: AtomicU64::new(0),
                year_generation: AtomicU64::new(0),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn layers(&self) -> &[Arc<L>] {
        &self.inner.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Arc<L>> {
        self.inner.layers.iter().find(|l| l.id() == id)
    }

    pub fn display(&self) -> &D {
        &self.inner.display
    }

    pub async fn state(&self) -> ControllerState {
        self.inner.state.lock().await.clone()
    }

    pub async fn facets(&self) -> FacetState {
        self.inner.state.lock().await.facets.clone()
    }

    pub async fn selected(&self) -> SelectedLocations {
        self.inner.state.lock().await.selected.clone()
    }

    pub async fn year_options(&self) -> YearOptions {
        self.inner.state.lock().await.year_options.clone()
    }

    /// Selected layers, in selection order.
    pub async fn selected_layers(&self) -> Vec<Arc<L>> {
        let state = self.inner.state.lock().await;
        self.resolve(&state.selected)
    }

    /// Query the current selection under the current facets without
    /// touching the display. Used by report and export paths.
    pub async fn query_selected(&self) -> (SelectedLocations, Vec<Feature>) {
        let (selected, layers, facets) = {
            let state = self.inner.state.lock().await;
            (state.selected.clone(), self.resolve(&state.selected), state.facets.clone())
        };
        let features = selection::query_features(&layers, &facets).await;
        (selected, features)
    }

    // ── Startup ──────────────────────────────────────────────────────

    /// Build the street index and seed the full year list.
    pub async fn initialize(&self) {
        let year_generation = self.inner.year_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (streets, years) = tokio::join!(
            StreetIndex::load(&self.inner.layers),
            resolve_years(&self.inner.layers, YearScope::Unconditional),
        );

        let facets = {
            let mut state = self.inner.state.lock().await;
            state.streets = streets;
            state.facets.clone()
        };
        self.persist_display_filters(&facets);
        self.apply_year_options(year_generation, years).await;
        info!(layers = self.inner.layers.len(), "filter controller initialized");
    }

    // ── Facet events ─────────────────────────────────────────────────

    /// Free-text street input. The input is applied whether or not it is a
    /// known street; validity is reported to the facet display.
    pub async fn on_street_input(&self, text: &str) -> SelectionOutcome {
        let snapshot = self
            .begin(true, |state| {
                state.facets.street = text.to_owned();
                let validity = state.streets.validate(text);
                self.inner.display.show_street_validity(validity);
            })
            .await;
        self.run(snapshot).await
    }

    /// Street input submitted ("Enter"): unknown input is replaced by the
    /// index's suggestion before it is applied.
    pub async fn on_street_submit(&self, text: &str) -> SelectionOutcome {
        let completed = {
            let state = self.inner.state.lock().await;
            state.streets.complete(text).map(str::to_owned)
        };
        match completed {
            Some(suggestion) => {
                debug!(input = text, suggestion = %suggestion, "street input completed");
                self.on_street_input(&suggestion).await
            }
            None => self.on_street_input(text).await,
        }
    }

    pub async fn on_data_type_change(&self, value: &str) -> SelectionOutcome {
        let snapshot = self
            .begin(true, |state| state.facets.data_type = value.to_owned())
            .await;
        self.run(snapshot).await
    }

    pub async fn on_period_change(&self, value: &str) -> SelectionOutcome {
        let snapshot = self
            .begin(true, |state| state.facets.period = value.to_owned())
            .await;
        self.run(snapshot).await
    }

    /// Year selection changed. Year options are not refreshed.
    pub async fn on_year_change(&self, selection: YearSelection) -> SelectionOutcome {
        let snapshot = self
            .begin(false, |state| state.facets.years = selection)
            .await;
        self.run(snapshot).await
    }

    /// A map feature of layer `id` was clicked.
    pub async fn on_location_toggle(&self, id: LayerId) -> Result<SelectionOutcome, CoreError> {
        if self.layer(id).is_none() {
            return Err(CoreError::LayerNotFound { layer: id });
        }
        let snapshot = self
            .begin(true, |state| {
                let selected = state.selected.toggle(id);
                debug!(layer = %id, selected, total = state.selected.len(), "location toggled");
            })
            .await;
        Ok(self.run(snapshot).await)
    }

    /// Empty map clicked: drop every selection and clear both displays.
    /// Any in-flight selection query is superseded.
    pub async fn clear_selection(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.selection_generation.fetch_add(1, Ordering::SeqCst);
        state.selected.clear();
        self.inner.display.clear();
        self.inner.display.clear_highlight();
        debug!("selection cleared");
    }

    // ── Transition machinery ─────────────────────────────────────────

    /// Synchronous half of an event: mutate state, bump generations,
    /// persist display filters, snapshot.
    async fn begin(&self, refresh_years: bool, mutate: impl FnOnce(&mut ControllerState)) -> Snapshot<L> {
        let mut state = self.inner.state.lock().await;
        mutate(&mut state);

        let selection_generation = self.inner.selection_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let year_generation =
            refresh_years.then(|| self.inner.year_generation.fetch_add(1, Ordering::SeqCst) + 1);

        self.persist_display_filters(&state.facets);

        Snapshot {
            facets: state.facets.clone(),
            selected: self.resolve(&state.selected),
            selection_generation,
            year_generation,
        }
    }

    /// Asynchronous half: year refresh and selection query run concurrently.
    async fn run(&self, snapshot: Snapshot<L>) -> SelectionOutcome {
        let Snapshot {
            facets,
            selected,
            selection_generation,
            year_generation,
        } = snapshot;

        let years = async {
            match year_generation {
                Some(generation) => Some((
                    generation,
                    resolve_years(&self.inner.layers, YearScope::Conditioned(&facets)).await,
                )),
                None => None,
            }
        };
        let features = selection::query_features(&selected, &facets);
        let (years, features) = tokio::join!(years, features);

        if let Some((generation, options)) = years {
            self.apply_year_options(generation, options).await;
        }
        self.apply_selection(selection_generation, &features).await
    }

    /// Install refreshed year options and drop selected years that are no
    /// longer offered. Stale refreshes are ignored.
    async fn apply_year_options(&self, generation: u64, options: YearOptions) {
        let mut state = self.inner.state.lock().await;
        if self.inner.year_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale year options");
            return;
        }

        let narrowed = state.facets.years.retain_available(&options);
        state.year_options = options;
        self.inner
            .display
            .show_year_options(&state.year_options, &state.facets.years);

        if narrowed {
            debug!(years = ?state.facets.years.active_years(), "year selection narrowed");
            self.persist_display_filters(&state.facets);
        }
    }

    async fn apply_selection(&self, generation: u64, features: &[Feature]) -> SelectionOutcome {
        let _state = self.inner.state.lock().await;
        if self.inner.selection_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale selection result");
            return SelectionOutcome::Superseded;
        }

        let display = &self.inner.display;
        if features.is_empty() {
            display.clear();
            display.clear_highlight();
            SelectionOutcome::Cleared
        } else {
            display.show_features(features);
            display.highlight(features);
            SelectionOutcome::Displayed(features.len())
        }
    }

    /// Recompute and persist every layer's display filter.
    fn persist_display_filters(&self, facets: &FacetState) {
        for layer in &self.inner.layers {
            layer.set_display_filter(predicate::for_layer(layer.as_ref(), facets));
        }
    }

    fn resolve(&self, selected: &SelectedLocations) -> Vec<Arc<L>> {
        selected
            .ids()
            .iter()
            .filter_map(|id| self.layer(*id).cloned())
            .collect()
    }
}

impl ControllerState {
    pub fn street_validity(&self) -> StreetValidity {
        self.streets.validate(&self.facets.street)
    }
}
