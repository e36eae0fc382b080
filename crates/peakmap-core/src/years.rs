// ── Year facet resolution ──
//
// Which years are reachable under the other active facets, unioned across
// every layer. A failing layer drops out of the union; it never blocks the
// refresh.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::facets::{ALL, FacetState};
use crate::model::{fields, value_text};
use crate::predicate;
use crate::settle::settle_all;
use crate::source::LayerSource;

// ── YearOptions ─────────────────────────────────────────────────────

/// Resolved year values, sorted for display. Never contains `All`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct YearOptions(Vec<String>);

impl YearOptions {
    /// Dedup and sort: integers ascending numerically, then anything else
    /// lexically. Blank values and `All` are dropped.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .map(Into::into)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty() && v != ALL)
            .collect();
        let mut years: Vec<String> = set.into_iter().collect();
        years.sort_by(|a, b| natural_cmp(a, b));
        Self(years)
    }

    pub fn years(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, year: &str) -> bool {
        self.0.iter().any(|y| y == year)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Option list as shown to the user: `All` first, then the years.
    pub fn rendered(&self) -> Vec<&str> {
        std::iter::once(ALL)
            .chain(self.0.iter().map(String::as_str))
            .collect()
    }
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

// ── Resolution ──────────────────────────────────────────────────────

/// What the year query is conditioned on.
#[derive(Debug, Clone, Copy)]
pub enum YearScope<'a> {
    /// Ignore every facet; used once at startup.
    Unconditional,
    /// Every facet except the year selection itself.
    Conditioned(&'a FacetState),
}

impl YearScope<'_> {
    fn facets(self) -> FacetState {
        match self {
            Self::Unconditional => FacetState::default(),
            Self::Conditioned(facets) => facets.without_years(),
        }
    }
}

/// Union of distinct `Year` values across `layers` under `scope`.
///
/// Layers without a `Year` field, and layers the other facets exclude,
/// are not queried. Null, blank and zero years are ignored.
pub async fn resolve_years<L: LayerSource>(layers: &[Arc<L>], scope: YearScope<'_>) -> YearOptions {
    let facets = scope.facets();

    let tasks = layers.iter().filter_map(|layer| {
        if !layer.schema().has_field(fields::YEAR) {
            debug!(layer = %layer.id(), "layer has no Year field, skipping year query");
            return None;
        }
        let predicate = predicate::build(layer.schema(), &facets);
        if predicate.is_match_none() {
            return None;
        }
        let layer = Arc::clone(layer);
        Some((layer.id(), async move {
            layer.distinct_values(&[fields::YEAR], &predicate).await
        }))
    });

    let settled = settle_all("resolve years", tasks).await;
    let failed = settled.failed.len();

    let options = YearOptions::from_values(
        settled
            .into_values()
            .into_iter()
            .flatten()
            .filter_map(|row| row.get(fields::YEAR).and_then(value_text))
            .filter(|year| year != "0"),
    );
    info!(years = options.len(), failed, "year options resolved");
    options
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::FieldType;
    use crate::test_support::{MemoryLayer, row};

    #[test]
    fn options_sort_numerically_and_render_all_first() {
        let options = YearOptions::from_values(["2021", "999", "2019", "2021", " ", "All", "FY20"]);
        assert_eq!(options.years(), ["999", "2019", "2021", "FY20"]);
        assert_eq!(options.rendered(), vec!["All", "999", "2019", "2021", "FY20"]);
    }

    #[tokio::test]
    async fn failed_layer_does_not_block_union() {
        let a = MemoryLayer::new(1, FieldType::Integer)
            .with_rows([row("AM Peak", 2019, "Main St"), row("PM Peak", 2020, "Oak Ave")]);
        let b = MemoryLayer::new(2, FieldType::Integer).failing();
        let c = MemoryLayer::new(3, FieldType::Integer)
            .with_rows([row("AM Peak", 2018, "Main St"), row("AM Peak", 2020, "Elm Rd")]);
        let layers = vec![Arc::new(a), Arc::new(b), Arc::new(c)];

        let options = resolve_years(&layers, YearScope::Unconditional).await;
        assert_eq!(options.years(), ["2018", "2019", "2020"]);
        assert_eq!(options.rendered()[0], "All");
    }

    #[tokio::test]
    async fn conditioned_scope_ignores_year_selection_only() {
        let layer = MemoryLayer::new(1, FieldType::Integer).with_rows([
            row("AM Peak", 2019, "Main St"),
            row("PM Peak", 2020, "Main St"),
            row("AM Peak", 2021, "Oak Ave"),
        ]);
        let layers = vec![Arc::new(layer)];
        let facets = FacetState {
            data_type: "AM Peak".into(),
            years: crate::facets::YearSelection::from_selected(["2020"]),
            ..FacetState::default()
        };

        let options = resolve_years(&layers, YearScope::Conditioned(&facets)).await;
        assert_eq!(options.years(), ["2019", "2021"]);
    }

    #[tokio::test]
    async fn excluded_and_yearless_layers_are_not_queried() {
        let no_data_type = MemoryLayer::with_fields(1, &[("Year", FieldType::Integer)])
            .with_rows([row("", 2019, "")]);
        let no_year = MemoryLayer::with_fields(2, &[("Data_Type", FieldType::String)]);
        let facets = FacetState {
            data_type: "AM Peak".into(),
            ..FacetState::default()
        };
        let layers = vec![Arc::new(no_data_type), Arc::new(no_year)];

        let options = resolve_years(&layers, YearScope::Conditioned(&facets)).await;
        assert!(options.is_empty());
        assert_eq!(layers[0].query_count(), 0);
        assert_eq!(layers[1].query_count(), 0);
    }

    #[tokio::test]
    async fn zero_and_null_years_are_ignored() {
        let layer = MemoryLayer::new(1, FieldType::Integer).with_rows([
            row("AM Peak", 0, "Main St"),
            row("AM Peak", 2022, "Main St"),
        ]);
        let options = resolve_years(&[Arc::new(layer)], YearScope::Unconditional).await;
        assert_eq!(options.years(), ["2022"]);
    }
}
