// ── FeatureServer wire types ──
//
// Serde mirrors of the ArcGIS REST JSON payloads. Only the fields the
// dashboard reads are modelled; everything else is ignored on decode.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Service error body: `{"error": {"code": 400, "message": "...", "details": []}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceErrorEnvelope {
    pub error: Option<ServiceErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceErrorBody {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

/// A single attribute field as declared in a layer's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// Raw esri type name, e.g. `esriFieldTypeInteger`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Layer metadata returned by `GET {service}/{layerId}?f=json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub max_record_count: Option<u32>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

/// ArcGIS JSON geometry.
///
/// Variant order matters: serde tries each in turn and the first shape
/// whose required keys are present wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    Point {
        x: f64,
        y: f64,
    },
    Envelope {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
    Multipoint {
        points: Vec<Vec<f64>>,
    },
    Polyline {
        paths: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        rings: Vec<Vec<Vec<f64>>>,
    },
    Other(serde_json::Value),
}

/// One feature row in a query response. Attribute order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// Response of `GET {service}/{layerId}/query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub features: Vec<RawFeature>,
    #[serde(default)]
    pub exceeded_transfer_limit: bool,
}
