// ── Facet state ──
//
// The four independent filter dimensions a user can set. "All" is the
// inactive value for the choice facets; an empty street is inactive.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::years::YearOptions;

/// Sentinel shown first in every choice list; selecting it disables the facet.
pub const ALL: &str = "All";

/// Year facet selection.
///
/// Encodes the "All excludes every other year" rule in the type: there is
/// no way to hold `All` alongside concrete years.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearSelection {
    #[default]
    All,
    /// Concrete years. An empty set behaves like `All`.
    Years(BTreeSet<String>),
}

impl YearSelection {
    /// Build from the raw values selected in a multi-select list.
    pub fn from_selected<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut years = BTreeSet::new();
        for value in values {
            let value = value.as_ref().trim();
            if value == ALL {
                return Self::All;
            }
            if !value.is_empty() {
                years.insert(value.to_owned());
            }
        }
        Self::Years(years)
    }

    /// Add one option to the selection. Selecting `All` clears the rest;
    /// selecting a year while `All` is held replaces it.
    pub fn select(&mut self, value: &str) {
        if value == ALL {
            *self = Self::All;
            return;
        }
        match self {
            Self::All => *self = Self::Years(BTreeSet::from([value.to_owned()])),
            Self::Years(years) => {
                years.insert(value.to_owned());
            }
        }
    }

    pub fn deselect(&mut self, value: &str) {
        if let Self::Years(years) = self {
            years.remove(value);
        }
    }

    /// Concrete years constraining queries; empty when inactive.
    pub fn active_years(&self) -> Vec<&str> {
        match self {
            Self::All => Vec::new(),
            Self::Years(years) => years.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Years(years) if !years.is_empty())
    }

    /// Drop selected years no longer offered. Returns `true` if anything
    /// was removed.
    pub fn retain_available(&mut self, options: &YearOptions) -> bool {
        match self {
            Self::All => false,
            Self::Years(years) => {
                let before = years.len();
                years.retain(|y| options.contains(y));
                years.len() != before
            }
        }
    }

    /// Values to mark selected in a rendered option list.
    pub fn selected_values(&self) -> Vec<String> {
        match self {
            Self::All => vec![ALL.to_owned()],
            Self::Years(years) => years.iter().cloned().collect(),
        }
    }
}

/// Current facet selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetState {
    pub data_type: String,
    pub years: YearSelection,
    pub period: String,
    /// Free text, matched as a substring of either street field.
    pub street: String,
}

impl Default for FacetState {
    fn default() -> Self {
        Self {
            data_type: ALL.into(),
            years: YearSelection::All,
            period: ALL.into(),
            street: String::new(),
        }
    }
}

impl FacetState {
    /// Active data type, `None` when "All".
    pub fn data_type(&self) -> Option<&str> {
        choice(&self.data_type)
    }

    /// Active period, `None` when "All".
    pub fn period(&self) -> Option<&str> {
        choice(&self.period)
    }

    /// Trimmed street text, `None` when empty.
    pub fn street(&self) -> Option<&str> {
        choice(self.street.trim())
    }

    pub fn has_active_facet(&self) -> bool {
        self.data_type().is_some()
            || self.years.is_active()
            || self.period().is_some()
            || self.street().is_some()
    }

    /// Copy with the year facet reset, for computing which years remain
    /// reachable under the other facets.
    pub fn without_years(&self) -> Self {
        Self {
            years: YearSelection::All,
            ..self.clone()
        }
    }
}

fn choice(value: &str) -> Option<&str> {
    (!value.is_empty() && value != ALL).then_some(value)
}
