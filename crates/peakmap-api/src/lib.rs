// peakmap-api: Async Rust client for ArcGIS REST FeatureServer layers

pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod transport;

pub use client::FeatureServiceClient;
pub use error::Error;
pub use models::{FieldInfo, Geometry, LayerInfo, QueryResponse, RawFeature};
pub use query::QueryRequest;
pub use transport::{TlsMode, TransportConfig};
