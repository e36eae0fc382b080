// ── Street name index ──
//
// Deduplicated street names across every layer, keyed by normalized form.
// Built once at startup; backs street autocomplete and input validation.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::model::{fields, value_text};
use crate::normalize::normalize;
use crate::predicate::Predicate;
use crate::settle::settle_all;
use crate::source::LayerSource;

/// Result of checking free-text street input against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StreetValidity {
    /// No street entered.
    Empty,
    Known,
    /// Entered text matches no indexed street.
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreetIndex {
    /// Display forms, sorted.
    names: Vec<String>,
    #[serde(skip)]
    keys: HashSet<String>,
}

impl StreetIndex {
    /// Index raw street values. The first display form seen for each
    /// normalized name wins; blank values are skipped.
    pub fn build<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = HashSet::new();
        let mut names = Vec::new();
        for value in values {
            let display = value.as_ref().trim();
            if display.is_empty() {
                continue;
            }
            if keys.insert(normalize(display)) {
                names.push(display.to_owned());
            }
        }
        names.sort();
        Self { names, keys }
    }

    /// Query distinct major and minor street names from every layer.
    pub async fn load<L: LayerSource>(layers: &[Arc<L>]) -> Self {
        let street_fields = [fields::MAJOR_STREET, fields::MINOR_STREET];
        let tasks = layers.iter().filter_map(|layer| {
            let present: Vec<&'static str> = street_fields
                .into_iter()
                .filter(|f| layer.schema().has_field(f))
                .collect();
            if present.is_empty() {
                return None;
            }
            let layer = Arc::clone(layer);
            Some((layer.id(), async move {
                layer.distinct_values(&present, &Predicate::MatchAll).await
            }))
        });

        let settled = settle_all("load street names", tasks).await;
        let values = settled.into_values().into_iter().flatten().flat_map(|row| {
            street_fields
                .iter()
                .filter_map(|f| row.get(*f).and_then(value_text))
                .collect::<Vec<_>>()
        });

        let index = Self::build(values);
        info!(streets = index.len(), "street index built");
        index
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn validate(&self, input: &str) -> StreetValidity {
        if input.trim().is_empty() {
            StreetValidity::Empty
        } else if self.keys.contains(&normalize(input)) {
            StreetValidity::Known
        } else {
            StreetValidity::Unknown
        }
    }

    /// Suggestion to substitute for unrecognized input.
    ///
    /// The first indexed name whose normalized form contains the normalized
    /// input, else the first name overall. `None` when the input is already
    /// a known street or the index is empty.
    pub fn complete(&self, input: &str) -> Option<&str> {
        if self.validate(input) == StreetValidity::Known {
            return None;
        }
        let needle = normalize(input);
        self.names
            .iter()
            .find(|name| normalize(name).contains(&needle))
            .or_else(|| self.names.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::FieldType;
    use crate::test_support::{MemoryLayer, row};

    #[test]
    fn build_dedups_by_normalized_form() {
        let index = StreetIndex::build([
            "Main Street",
            " main st. ",
            "",
            "Oak Avenue",
            "Ygnacio Valley Road",
            "oak ave",
        ]);
        assert_eq!(index.names(), ["Main Street", "Oak Avenue", "Ygnacio Valley Road"]);
    }

    #[test]
    fn validate_uses_normalized_equality() {
        let index = StreetIndex::build(["Main Street", "Oak Avenue"]);
        assert_eq!(index.validate("  "), StreetValidity::Empty);
        assert_eq!(index.validate("MAIN ST."), StreetValidity::Known);
        assert_eq!(index.validate("Main"), StreetValidity::Unknown);
    }

    #[test]
    fn complete_prefers_containing_name_then_first() {
        let index = StreetIndex::build(["Main Street", "Oak Avenue", "Broadway"]);
        assert_eq!(index.complete("oak"), Some("Oak Avenue"));
        assert_eq!(index.complete("zzz"), Some("Broadway"));
        assert_eq!(index.complete("Main St"), None);
        assert_eq!(StreetIndex::default().complete("oak"), None);
    }

    #[tokio::test]
    async fn load_collects_major_and_minor_names_and_skips_failures() {
        let mut with_minor = row("AM Peak", 2019, "Main Street");
        with_minor.insert("Minor_Street".into(), serde_json::json!("1st Avenue"));
        let a = MemoryLayer::new(1, FieldType::Integer).with_rows([with_minor, row("AM Peak", 2020, "main st")]);
        let b = MemoryLayer::new(2, FieldType::Integer).failing();
        let c = MemoryLayer::new(3, FieldType::Integer).with_rows([row("PM Peak", 2019, "Oak Ave")]);

        let index = StreetIndex::load(&[Arc::new(a), Arc::new(b), Arc::new(c)]).await;
        assert_eq!(index.names(), ["1st Avenue", "Main Street", "Oak Ave"]);
    }
}
