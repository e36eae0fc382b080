// In-memory collaborators for orchestration tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwap;
use serde_json::{Value, json};

use crate::error::CoreError;
use crate::facets::YearSelection;
use crate::model::{Attributes, Feature, Field, FieldType, Geometry, LayerId, LayerSchema};
use crate::predicate::Predicate;
use crate::source::{FacetDisplay, LayerSource, ResultsDisplay};
use crate::streets::StreetValidity;
use crate::years::YearOptions;

/// A survey row with the usual facet fields.
pub(crate) fn row(data_type: &str, year: i64, major_street: &str) -> Attributes {
    let value = json!({
        "ObjectID": 1,
        "Data_Type": data_type,
        "Year": year,
        "Period": "Weekday",
        "Major_Street": major_street,
        "Minor_Street": Value::Null,
        "EBL": 12,
    });
    serde_json::from_value(value).unwrap()
}

/// Layer backed by a row vector; evaluates predicates locally.
pub(crate) struct MemoryLayer {
    id: LayerId,
    title: String,
    schema: LayerSchema,
    rows: Vec<Attributes>,
    fail: bool,
    location: Option<(f64, f64)>,
    delays: Mutex<VecDeque<Duration>>,
    distinct_delays: Mutex<VecDeque<Duration>>,
    queries: AtomicUsize,
    display_filter: ArcSwap<Predicate>,
}

impl MemoryLayer {
    /// Layer with all facet fields, `Year` typed as `year_type`.
    pub(crate) fn new(id: u32, year_type: FieldType) -> Self {
        Self::with_fields(
            id,
            &[
                ("ObjectID", FieldType::Oid),
                ("Data_Type", FieldType::String),
                ("Year", year_type),
                ("Period", FieldType::String),
                ("Major_Street", FieldType::String),
                ("Minor_Street", FieldType::String),
                ("EBL", FieldType::Integer),
            ],
        )
    }

    pub(crate) fn with_fields(id: u32, fields: &[(&str, FieldType)]) -> Self {
        Self {
            id: LayerId(id),
            title: format!("Location {id}"),
            schema: LayerSchema::new(fields.iter().map(|(n, t)| Field::new(*n, *t)).collect()),
            rows: Vec::new(),
            fail: false,
            location: Some((f64::from(id) * 1000.0, 0.0)),
            delays: Mutex::new(VecDeque::new()),
            distinct_delays: Mutex::new(VecDeque::new()),
            queries: AtomicUsize::new(0),
            display_filter: ArcSwap::from_pointee(Predicate::MatchAll),
        }
    }

    pub(crate) fn with_rows(mut self, rows: impl IntoIterator<Item = Attributes>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Every query rejects.
    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn without_geometry(mut self) -> Self {
        self.location = None;
        self
    }

    /// Delay applied to the next feature queries, one per query, in order.
    pub(crate) fn with_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.delays.lock().unwrap().extend(delays);
        self
    }

    /// Delays for successive `distinct_values` calls.
    pub(crate) fn with_distinct_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.distinct_delays.lock().unwrap().extend(delays);
        self
    }

    pub(crate) fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn matching(&self, predicate: &Predicate) -> Result<Vec<&Attributes>, CoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CoreError::Query {
                layer: self.id,
                message: "service unavailable".into(),
            });
        }
        Ok(self.rows.iter().filter(|r| predicate.matches(r)).collect())
    }
}

impl LayerSource for MemoryLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn schema(&self) -> &LayerSchema {
        &self.schema
    }

    fn distinct_values(
        &self,
        fields: &[&str],
        predicate: &Predicate,
    ) -> impl Future<Output = Result<Vec<Attributes>, CoreError>> + Send {
        let delay = self.distinct_delays.lock().unwrap().pop_front();
        let result = self.matching(predicate).map(|rows| {
            let mut distinct: Vec<Attributes> = Vec::new();
            for row in rows {
                let projected: Attributes = fields
                    .iter()
                    .map(|f| ((*f).to_owned(), row.get(*f).cloned().unwrap_or(Value::Null)))
                    .collect();
                if !distinct.contains(&projected) {
                    distinct.push(projected);
                }
            }
            distinct
        });
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    fn query_features(
        &self,
        predicate: &Predicate,
        include_geometry: bool,
    ) -> impl Future<Output = Result<Vec<Feature>, CoreError>> + Send {
        let delay = self.delays.lock().unwrap().pop_front();
        let geometry = self
            .location
            .filter(|_| include_geometry)
            .map(|(x, y)| Geometry::Point { x, y });
        let result = self.matching(predicate).map(|rows| {
            rows.into_iter()
                .map(|attributes| Feature {
                    layer: self.id,
                    attributes: attributes.clone(),
                    geometry: geometry.clone(),
                })
                .collect::<Vec<_>>()
        });
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    fn set_display_filter(&self, predicate: Predicate) {
        self.display_filter.store(Arc::new(predicate));
    }

    fn display_filter(&self) -> Arc<Predicate> {
        self.display_filter.load_full()
    }
}

/// What a display was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DisplayEvent {
    Shown(Vec<Feature>),
    Cleared,
    Highlighted(usize),
    HighlightCleared,
    Years(Vec<String>, YearSelection),
    Street(StreetValidity),
}

#[derive(Default)]
pub(crate) struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub(crate) fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Features from the most recent `show_features`, `None` if the last
    /// results event was a clear.
    pub(crate) fn shown(&self) -> Option<Vec<Feature>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|e| match e {
                DisplayEvent::Shown(features) => Some(Some(features.clone())),
                DisplayEvent::Cleared => Some(None),
                _ => None,
            })
            .flatten()
    }

    pub(crate) fn last_years(&self) -> Option<(Vec<String>, YearSelection)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|e| match e {
                DisplayEvent::Years(options, selection) => Some((options.clone(), selection.clone())),
                _ => None,
            })
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ResultsDisplay for RecordingDisplay {
    fn show_features(&self, features: &[Feature]) {
        self.push(DisplayEvent::Shown(features.to_vec()));
    }

    fn clear(&self) {
        self.push(DisplayEvent::Cleared);
    }

    fn highlight(&self, features: &[Feature]) {
        self.push(DisplayEvent::Highlighted(features.len()));
    }

    fn clear_highlight(&self) {
        self.push(DisplayEvent::HighlightCleared);
    }
}

impl FacetDisplay for RecordingDisplay {
    fn show_year_options(&self, options: &YearOptions, selection: &YearSelection) {
        self.push(DisplayEvent::Years(options.years().to_vec(), selection.clone()));
    }

    fn show_street_validity(&self, validity: StreetValidity) {
        self.push(DisplayEvent::Street(validity));
    }
}
