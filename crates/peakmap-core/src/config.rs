// ── Runtime service configuration ──
//
// These types describe *which* feature service to read and how to reach it.
// They carry credential data and connection tuning, but never touch disk.
// The CLI constructs a `ServiceConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::model::LayerId;

/// The Traffic Analysis PEAK FeatureServer the dashboard was built against.
pub const DEFAULT_SERVICE_URL: &str = "https://services2.arcgis.com/AhHMUmDoudKVXiUl/arcgis/rest/services/Traffic_Analysis_PEAK_WFL1/FeatureServer";

/// Its sublayer ids.
pub const DEFAULT_LAYER_SPEC: &str = "1-101";

/// Web Mercator, so extent buffering can work in meters.
pub const DEFAULT_OUT_SR: u32 = 3857;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted portals with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for reading one feature service.
///
/// Built by the CLI, passed to `FeatureLayer::load_all` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// FeatureServer root URL.
    pub url: Url,
    /// Sublayers to load, in display order.
    pub layers: Vec<LayerId>,
    /// ArcGIS access token for secured services.
    pub token: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Spatial reference requested for feature geometry.
    pub out_sr: Option<u32>,
}

impl ServiceConfig {
    /// A config for `url` with every other setting at its default.
    pub fn new(url: Url, layers: Vec<LayerId>) -> Self {
        Self {
            url,
            layers,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            out_sr: Some(DEFAULT_OUT_SR),
        }
    }

    /// The built-in Traffic Analysis PEAK service.
    pub fn builtin() -> Result<Self, CoreError> {
        let url = Url::parse(DEFAULT_SERVICE_URL).map_err(|e| CoreError::Config {
            message: format!("invalid built-in service URL: {e}"),
        })?;
        Ok(Self::new(url, parse_layer_spec(DEFAULT_LAYER_SPEC)?))
    }
}

/// Parse a layer list such as `"1-101"` or `"1,2,5-9"`.
///
/// Order is preserved and duplicates are dropped, first occurrence wins.
pub fn parse_layer_spec(spec: &str) -> Result<Vec<LayerId>, CoreError> {
    let invalid = |part: &str| CoreError::Config {
        message: format!("invalid layer list entry '{part}' in '{spec}'"),
    };

    let mut layers: Vec<LayerId> = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let range = match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse().map_err(|_| invalid(part))?;
                let end: u32 = end.trim().parse().map_err(|_| invalid(part))?;
                if end < start {
                    return Err(invalid(part));
                }
                start..=end
            }
            None => {
                let id: u32 = part.parse().map_err(|_| invalid(part))?;
                id..=id
            }
        };
        for id in range {
            if !layers.contains(&LayerId(id)) {
                layers.push(LayerId(id));
            }
        }
    }

    if layers.is_empty() {
        return Err(CoreError::Config {
            message: format!("layer list '{spec}' names no layers"),
        });
    }
    Ok(layers)
}
