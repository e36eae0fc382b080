// ── Domain model ──
//
// Layer identity, field schema, and feature rows. A `LayerSchema` is
// fetched once and never mutated; `Feature` values are disposable query
// results.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use peakmap_api::Geometry;

/// Attribute name → value, in service order.
pub type Attributes = IndexMap<String, Value>;

/// Field names the facets are backed by.
pub mod fields {
    pub const DATA_TYPE: &str = "Data_Type";
    pub const YEAR: &str = "Year";
    pub const PERIOD: &str = "Period";
    pub const MAJOR_STREET: &str = "Major_Street";
    pub const MINOR_STREET: &str = "Minor_Street";
}

// ── LayerId ─────────────────────────────────────────────────────────

/// Numeric sublayer id within a FeatureServer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LayerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ── Field schema ────────────────────────────────────────────────────

/// Attribute field type, collapsed from the esri type names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Oid,
    SmallInteger,
    Integer,
    BigInteger,
    Single,
    Double,
    String,
    Date,
    GlobalId,
    Guid,
    Other,
}

impl FieldType {
    /// Map an esri REST type (`esriFieldTypeInteger`) or a JS API type
    /// (`integer`) to a `FieldType`.
    pub fn from_esri(raw: &str) -> Self {
        let name = raw.strip_prefix("esriFieldType").unwrap_or(raw);
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "oid" => Self::Oid,
            "smallinteger" => Self::SmallInteger,
            "integer" => Self::Integer,
            "biginteger" => Self::BigInteger,
            "single" => Self::Single,
            "double" => Self::Double,
            "string" => Self::String,
            "date" => Self::Date,
            "globalid" => Self::GlobalId,
            "guid" => Self::Guid,
            _ => Self::Other,
        }
    }

    /// Integer-typed fields compare against unquoted literals; everything
    /// else, floating point included, gets quoted text.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Oid | Self::SmallInteger | Self::Integer | Self::BigInteger
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered field set of one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSchema {
    fields: Vec<Field>,
}

impl LayerSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

impl From<&[peakmap_api::FieldInfo]> for LayerSchema {
    fn from(infos: &[peakmap_api::FieldInfo]) -> Self {
        Self::new(
            infos
                .iter()
                .map(|f| Field::new(f.name.clone(), FieldType::from_esri(&f.field_type)))
                .collect(),
        )
    }
}

// ── Feature ─────────────────────────────────────────────────────────

/// One feature returned by a layer query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub layer: LayerId,
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn from_raw(layer: LayerId, raw: peakmap_api::RawFeature) -> Self {
        Self {
            layer,
            attributes: raw.attributes,
            geometry: raw.geometry,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attribute rendered as text; `None` for missing or null values.
    pub fn text(&self, name: &str) -> Option<String> {
        self.attribute(name).and_then(value_text)
    }
}

/// Render a scalar attribute value as text.
///
/// Whole-number floats print without a fractional part so a `Year` of
/// `2019.0` and `2019` compare equal.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_accepts_rest_and_js_names() {
        assert_eq!(FieldType::from_esri("esriFieldTypeSmallInteger"), FieldType::SmallInteger);
        assert_eq!(FieldType::from_esri("small-integer"), FieldType::SmallInteger);
        assert_eq!(FieldType::from_esri("integer"), FieldType::Integer);
        assert_eq!(FieldType::from_esri("esriFieldTypeString"), FieldType::String);
        assert_eq!(FieldType::from_esri("esriFieldTypeRaster"), FieldType::Other);
        assert!(FieldType::SmallInteger.is_integer());
        assert!(!FieldType::Double.is_integer());
        assert!(!FieldType::String.is_integer());
    }

    #[test]
    fn value_text_normalizes_numbers() {
        assert_eq!(value_text(&json!(2019)), Some("2019".into()));
        assert_eq!(value_text(&json!(2019.0)), Some("2019".into()));
        assert_eq!(value_text(&json!(12.5)), Some("12.5".into()));
        assert_eq!(value_text(&json!("AM Peak")), Some("AM Peak".into()));
        assert_eq!(value_text(&Value::Null), None);
    }
}
