// ── Layer predicates ──
//
// Facet selections compiled against one layer's schema into a typed
// predicate, serialized to the SQL-92 subset FeatureServer `where`
// parameters accept. A layer that lacks a field an active facet needs is
// excluded outright (`1=0`) rather than partially filtered.

use std::fmt;

use serde_json::Value;
use tracing::warn;

use crate::facets::FacetState;
use crate::model::{Attributes, LayerSchema, fields, value_text};
use crate::source::LayerSource;

/// A literal in a membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Emitted unquoted; always a valid integer.
    Number(i64),
    /// Emitted single-quoted.
    Text(String),
}

/// One term of a conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `field = 'value'`
    Equals { field: String, value: String },
    /// `field LIKE '%text%'`
    Contains { field: String, text: String },
    /// `field IN (v1,v2,...)`
    In { field: String, values: Vec<Literal> },
    /// `(a OR b ...)`
    AnyOf(Vec<Clause>),
}

/// A complete layer filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Predicate {
    /// `1=1`
    #[default]
    MatchAll,
    /// `1=0`
    MatchNone,
    /// Clauses joined by `AND`. Never empty.
    All(Vec<Clause>),
}

/// Why a layer was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Active facets reference fields the layer does not declare.
    MissingFields(Vec<&'static str>),
    /// The layer's Year field is integer-typed and none of the selected years parse as integers.
    NoNumericYears,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(missing) => write!(f, "missing fields {}", missing.join(", ")),
            Self::NoNumericYears => f.write_str("no selected year matches an integer Year field"),
        }
    }
}

// ── Construction ─────────────────────────────────────────────────────

/// Compile `facets` into clauses for a layer with `schema`.
///
/// Clause order is fixed: data type, years, period, street. Every active
/// facet is checked before returning, so the exclusion lists all missing
/// fields at once.
pub fn compile(schema: &LayerSchema, facets: &FacetState) -> Result<Vec<Clause>, Exclusion> {
    let mut clauses = Vec::new();
    let mut missing = Vec::new();
    let mut no_numeric_years = false;

    if let Some(data_type) = facets.data_type() {
        if schema.has_field(fields::DATA_TYPE) {
            clauses.push(Clause::Equals {
                field: fields::DATA_TYPE.into(),
                value: data_type.into(),
            });
        } else {
            missing.push(fields::DATA_TYPE);
        }
    }

    let years = facets.years.active_years();
    if !years.is_empty() {
        match schema.field(fields::YEAR) {
            Some(field) if field.field_type.is_integer() => {
                let values: Vec<Literal> = years
                    .iter()
                    .filter_map(|y| y.trim().parse::<i64>().ok())
                    .map(Literal::Number)
                    .collect();
                if values.is_empty() {
                    no_numeric_years = true;
                } else {
                    clauses.push(Clause::In {
                        field: fields::YEAR.into(),
                        values,
                    });
                }
            }
            Some(_) => clauses.push(Clause::In {
                field: fields::YEAR.into(),
                values: years.iter().map(|y| Literal::Text((*y).to_owned())).collect(),
            }),
            None => missing.push(fields::YEAR),
        }
    }

    if let Some(period) = facets.period() {
        if schema.has_field(fields::PERIOD) {
            clauses.push(Clause::Equals {
                field: fields::PERIOD.into(),
                value: period.into(),
            });
        } else {
            missing.push(fields::PERIOD);
        }
    }

    if let Some(street) = facets.street() {
        let alternatives: Vec<Clause> = [fields::MAJOR_STREET, fields::MINOR_STREET]
            .into_iter()
            .filter(|name| schema.has_field(name))
            .map(|name| Clause::Contains {
                field: name.into(),
                text: street.into(),
            })
            .collect();
        if alternatives.is_empty() {
            missing.push(fields::MAJOR_STREET);
            missing.push(fields::MINOR_STREET);
        } else {
            clauses.push(Clause::AnyOf(alternatives));
        }
    }

    if !missing.is_empty() {
        return Err(Exclusion::MissingFields(missing));
    }
    if no_numeric_years {
        return Err(Exclusion::NoNumericYears);
    }
    Ok(clauses)
}

/// Build the predicate for one layer.
///
/// No active facet yields [`Predicate::MatchAll`]; any exclusion yields
/// [`Predicate::MatchNone`].
pub fn build(schema: &LayerSchema, facets: &FacetState) -> Predicate {
    match compile(schema, facets) {
        Ok(clauses) => Predicate::from_clauses(clauses),
        Err(_) => Predicate::MatchNone,
    }
}

/// Build the predicate for `layer`, warning when the layer is excluded.
pub fn for_layer<L: LayerSource>(layer: &L, facets: &FacetState) -> Predicate {
    match compile(layer.schema(), facets) {
        Ok(clauses) => Predicate::from_clauses(clauses),
        Err(exclusion) => {
            warn!(
                layer = %layer.id(),
                title = layer.title(),
                reason = %exclusion,
                "excluding layer from filter"
            );
            Predicate::MatchNone
        }
    }
}

impl Predicate {
    pub fn from_clauses(clauses: Vec<Clause>) -> Self {
        if clauses.is_empty() {
            Self::MatchAll
        } else {
            Self::All(clauses)
        }
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, Self::MatchNone)
    }

    /// Evaluate against a feature's attributes, the way the service would.
    ///
    /// `LIKE` is case-insensitive, as it is on hosted feature services.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            Self::MatchAll => true,
            Self::MatchNone => false,
            Self::All(clauses) => clauses.iter().all(|c| c.matches(attributes)),
        }
    }
}

impl Clause {
    pub fn matches(&self, attributes: &Attributes) -> bool {
        let text = |field: &str| attributes.get(field).and_then(value_text);
        match self {
            Self::Equals { field, value } => text(field).is_some_and(|v| v == *value),
            Self::Contains { field, text: needle } => text(field)
                .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
            Self::In { field, values } => {
                let Some(actual) = attributes.get(field) else {
                    return false;
                };
                values.iter().any(|literal| match literal {
                    Literal::Number(n) => {
                        actual.is_number() && value_text(actual).is_some_and(|v| v == n.to_string())
                    }
                    Literal::Text(t) => value_text(actual).is_some_and(|v| v == *t),
                })
            }
            Self::AnyOf(alternatives) => alternatives.iter().any(|c| c.matches(attributes)),
        }
    }
}

// ── Serialization ────────────────────────────────────────────────────

/// Single-quote a string literal, doubling embedded quotes.
fn quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(&quoted(t)),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => write!(f, "{field} = {}", quoted(value)),
            Self::Contains { field, text } => {
                write!(f, "{field} LIKE {}", quoted(&format!("%{text}%")))
            }
            Self::In { field, values } => {
                let list: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{field} IN ({})", list.join(","))
            }
            Self::AnyOf(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(" OR "))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => f.write_str("1=1"),
            Self::MatchNone => f.write_str("1=0"),
            Self::All(clauses) => {
                let parts: Vec<String> = clauses.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" AND "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::facets::{ALL, YearSelection};
    use crate::model::{Field, FieldType};

    fn schema(fields: &[(&str, FieldType)]) -> LayerSchema {
        LayerSchema::new(fields.iter().map(|(n, t)| Field::new(*n, *t)).collect())
    }

    fn full_schema(year_type: FieldType) -> LayerSchema {
        schema(&[
            ("Data_Type", FieldType::String),
            ("Year", year_type),
            ("Period", FieldType::String),
            ("Major_Street", FieldType::String),
            ("Minor_Street", FieldType::String),
        ])
    }

    fn years(values: &[&str]) -> YearSelection {
        YearSelection::from_selected(values.iter().copied())
    }

    #[test]
    fn no_active_facet_is_match_all_for_any_schema() {
        let facets = FacetState::default();
        for s in [
            full_schema(FieldType::Integer),
            LayerSchema::default(),
            schema(&[("ObjectID", FieldType::Oid)]),
        ] {
            assert_eq!(build(&s, &facets), Predicate::MatchAll);
            assert_eq!(build(&s, &facets).to_string(), "1=1");
        }
    }

    #[test]
    fn missing_field_excludes_layer_regardless_of_other_facets() {
        let s = schema(&[
            ("Year", FieldType::Integer),
            ("Period", FieldType::String),
            ("Major_Street", FieldType::String),
        ]);
        let facets = FacetState {
            data_type: "AM Peak".into(),
            years: years(&["2019"]),
            period: "Weekday".into(),
            street: "Main".into(),
        };
        assert_eq!(build(&s, &facets), Predicate::MatchNone);
        assert_eq!(build(&s, &facets).to_string(), "1=0");
        assert_eq!(
            compile(&s, &facets),
            Err(Exclusion::MissingFields(vec!["Data_Type"]))
        );
    }

    #[test]
    fn integer_year_field_emits_unquoted_list() {
        let facets = FacetState {
            years: years(&["2019", "2020"]),
            ..FacetState::default()
        };
        assert_eq!(
            build(&full_schema(FieldType::SmallInteger), &facets).to_string(),
            "Year IN (2019,2020)"
        );
    }

    #[test]
    fn string_year_field_emits_quoted_list() {
        let facets = FacetState {
            years: years(&["2019", "2020"]),
            ..FacetState::default()
        };
        assert_eq!(
            build(&full_schema(FieldType::String), &facets).to_string(),
            "Year IN ('2019','2020')"
        );
    }

    #[test]
    fn non_numeric_years_against_integer_field_exclude_layer() {
        let facets = FacetState {
            years: years(&["FY19"]),
            ..FacetState::default()
        };
        let s = full_schema(FieldType::Integer);
        assert_eq!(compile(&s, &facets), Err(Exclusion::NoNumericYears));
        assert_eq!(build(&s, &facets), Predicate::MatchNone);
    }

    #[test]
    fn floating_point_year_field_is_quoted_like_text() {
        let facets = FacetState {
            years: years(&["2019.5", "2020"]),
            ..FacetState::default()
        };
        let s = full_schema(FieldType::Double);
        assert_eq!(build(&s, &facets).to_string(), "Year IN ('2019.5','2020')");
        assert!(compile(&s, &facets).is_ok());
    }

    #[test]
    fn street_clause_only_references_present_fields() {
        let s = schema(&[("Minor_Street", FieldType::String)]);
        let facets = FacetState {
            street: "Main".into(),
            ..FacetState::default()
        };
        assert_eq!(build(&s, &facets).to_string(), "(Minor_Street LIKE '%Main%')");
    }

    #[test]
    fn street_without_either_field_excludes() {
        let s = schema(&[("Data_Type", FieldType::String)]);
        let facets = FacetState {
            street: "Main".into(),
            ..FacetState::default()
        };
        assert_eq!(
            compile(&s, &facets),
            Err(Exclusion::MissingFields(vec!["Major_Street", "Minor_Street"]))
        );
    }

    #[test]
    fn clause_order_is_data_type_years_period_street() {
        let facets = FacetState {
            data_type: "AM Peak".into(),
            years: years(&["2021"]),
            period: "Weekday".into(),
            street: "  Oak Grove ".into(),
        };
        assert_eq!(
            build(&full_schema(FieldType::Integer), &facets).to_string(),
            "Data_Type = 'AM Peak' AND Year IN (2021) AND Period = 'Weekday' AND \
             (Major_Street LIKE '%Oak Grove%' OR Minor_Street LIKE '%Oak Grove%')"
        );
    }

    #[test]
    fn all_sentinels_are_inactive() {
        let facets = FacetState {
            data_type: ALL.into(),
            years: years(&[ALL]),
            period: ALL.into(),
            street: ALL.into(),
        };
        assert_eq!(build(&LayerSchema::default(), &facets), Predicate::MatchAll);
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let facets = FacetState {
            street: "O'Hara".into(),
            ..FacetState::default()
        };
        let s = schema(&[("Major_Street", FieldType::String)]);
        assert_eq!(build(&s, &facets).to_string(), "(Major_Street LIKE '%O''Hara%')");
    }

    #[test]
    fn predicate_evaluates_like_the_service() {
        let facets = FacetState {
            data_type: "AM Peak".into(),
            years: years(&["2019", "2020"]),
            street: "main".into(),
            ..FacetState::default()
        };
        let p = build(&full_schema(FieldType::Integer), &facets);

        let hit: Attributes = serde_json::from_value(json!({
            "Data_Type": "AM Peak", "Year": 2020, "Major_Street": "Main St", "Minor_Street": null
        }))
        .unwrap_or_default();
        let wrong_year: Attributes = serde_json::from_value(json!({
            "Data_Type": "AM Peak", "Year": 2018, "Major_Street": "Main St"
        }))
        .unwrap_or_default();

        assert!(p.matches(&hit));
        assert!(!p.matches(&wrong_year));
        assert!(Predicate::MatchAll.matches(&wrong_year));
        assert!(!Predicate::MatchNone.matches(&hit));
    }
}
