// ── Selected locations and the selection query ──
//
// Re-fetches every selected layer under the current facets and merges the
// results. Read-only: persisted display filters are written elsewhere.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::facets::FacetState;
use crate::model::{Feature, LayerId};
use crate::predicate;
use crate::settle::settle_all;
use crate::source::LayerSource;

/// Layers the user has toggled active, in selection order. No duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectedLocations(Vec<LayerId>);

impl SelectedLocations {
    /// Add `layer` if absent, remove it if present. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, layer: LayerId) -> bool {
        if let Some(pos) = self.0.iter().position(|id| *id == layer) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(layer);
            true
        }
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.0.contains(&layer)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn ids(&self) -> &[LayerId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<LayerId> for SelectedLocations {
    fn from_iter<I: IntoIterator<Item = LayerId>>(iter: I) -> Self {
        let mut selected = Self::default();
        for id in iter {
            if !selected.contains(id) {
                selected.0.push(id);
            }
        }
        selected
    }
}

/// Query `selected` under `facets` and concatenate the results.
///
/// Layer order is preserved, then feature order within each layer. Layers
/// the facets exclude are not queried. Failed layers are dropped; if every
/// layer fails the result is simply empty.
pub async fn query_features<L: LayerSource>(selected: &[Arc<L>], facets: &FacetState) -> Vec<Feature> {
    let tasks = selected.iter().filter_map(|layer| {
        let predicate = predicate::build(layer.schema(), facets);
        if predicate.is_match_none() {
            debug!(layer = %layer.id(), "layer excluded by facets, not queried");
            return None;
        }
        let layer = Arc::clone(layer);
        Some((layer.id(), async move {
            layer.query_features(&predicate, true).await
        }))
    });

    let settled = settle_all("query features", tasks).await;
    if settled.all_failed() {
        warn!(layers = settled.failed.len(), "every selected layer failed to query");
    }

    let features: Vec<Feature> = settled.into_values().into_iter().flatten().collect();
    debug!(layers = selected.len(), features = features.len(), "selection query merged");
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::YearSelection;
    use crate::model::FieldType;
    use crate::test_support::{MemoryLayer, row};

    fn layer_ids(features: &[Feature]) -> Vec<u32> {
        features.iter().map(|f| f.layer.0).collect()
    }

    #[test]
    fn toggle_adds_and_removes_without_duplicates() {
        let mut selected = SelectedLocations::default();
        assert!(selected.toggle(LayerId(3)));
        assert!(selected.toggle(LayerId(1)));
        assert!(!selected.toggle(LayerId(3)));
        assert!(selected.toggle(LayerId(3)));
        assert_eq!(selected.ids(), [LayerId(1), LayerId(3)]);

        let collected: SelectedLocations = [LayerId(2), LayerId(2), LayerId(5)].into_iter().collect();
        assert_eq!(collected.len(), 2);
    }

    #[tokio::test]
    async fn unfiltered_query_returns_every_feature() {
        let layer = MemoryLayer::new(1, FieldType::Integer).with_rows([
            row("AM Peak", 2019, "Main St"),
            row("PM Peak", 2020, "Oak Ave"),
        ]);
        let features = query_features(&[Arc::new(layer)], &FacetState::default()).await;
        assert_eq!(features.len(), 2);
        assert!(features.iter().all(|f| f.geometry.is_some()));
    }

    #[tokio::test]
    async fn merge_keeps_layer_order_not_completion_order() {
        let slow = MemoryLayer::new(1, FieldType::Integer)
            .with_rows([row("AM Peak", 2019, "Main St"), row("AM Peak", 2020, "Main St")])
            .with_delays([std::time::Duration::from_millis(40)]);
        let fast = MemoryLayer::new(2, FieldType::Integer).with_rows([row("AM Peak", 2021, "Elm Rd")]);

        let features = query_features(&[Arc::new(slow), Arc::new(fast)], &FacetState::default()).await;
        assert_eq!(layer_ids(&features), vec![1, 1, 2]);
        assert_eq!(features[1].text("Year").as_deref(), Some("2020"));
    }

    #[tokio::test]
    async fn match_none_layers_return_empty_without_querying() {
        let facets = FacetState {
            data_type: "AM Peak".into(),
            ..FacetState::default()
        };
        let a = MemoryLayer::with_fields(1, &[("Year", FieldType::Integer)]).with_rows([row("AM Peak", 2019, "")]);
        let b = MemoryLayer::with_fields(2, &[("Period", FieldType::String)]).with_rows([row("AM Peak", 2019, "")]);
        let layers = vec![Arc::new(a), Arc::new(b)];

        let features = query_features(&layers, &facets).await;
        assert!(features.is_empty());
        assert_eq!(features, query_features::<MemoryLayer>(&[], &facets).await);
        assert_eq!(layers[0].query_count() + layers[1].query_count(), 0);
    }

    #[tokio::test]
    async fn failed_layers_are_dropped_and_all_failed_is_empty() {
        let ok = MemoryLayer::new(1, FieldType::Integer).with_rows([row("AM Peak", 2019, "Main St")]);
        let bad = MemoryLayer::new(2, FieldType::Integer).failing();
        let features = query_features(&[Arc::new(ok), Arc::new(bad)], &FacetState::default()).await;
        assert_eq!(layer_ids(&features), vec![1]);

        let all_bad = vec![
            Arc::new(MemoryLayer::new(1, FieldType::Integer).failing()),
            Arc::new(MemoryLayer::new(2, FieldType::Integer).failing()),
        ];
        assert!(query_features(&all_bad, &FacetState::default()).await.is_empty());
    }

    #[tokio::test]
    async fn facets_filter_rows_server_side() {
        let layer = MemoryLayer::new(1, FieldType::String).with_rows([
            row("AM Peak", 2019, "Main Street"),
            row("AM Peak", 2020, "Oak Ave"),
            row("PM Peak", 2019, "Main Street"),
        ]);
        let facets = FacetState {
            data_type: "AM Peak".into(),
            years: YearSelection::from_selected(["2019", "2020"]),
            street: "main".into(),
            ..FacetState::default()
        };
        let features = query_features(&[Arc::new(layer)], &facets).await;
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].text("Major_Street").as_deref(), Some("Main Street"));
    }
}
