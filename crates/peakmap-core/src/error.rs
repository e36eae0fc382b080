// ── Core error types ──
//
// User-facing errors from peakmap-core. These are NOT transport-specific:
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<peakmap_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.
//
// Schema mismatches are deliberately absent: a layer that cannot honour
// an active facet gets a match-none predicate, not an error.

use thiserror::Error;

use crate::model::LayerId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to feature service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Feature service request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Feature service rejected the access token: {message}")]
    Unauthorized { message: String },

    // ── Layer errors ─────────────────────────────────────────────────
    #[error("Layer not found: {layer}")]
    LayerNotFound { layer: LayerId },

    #[error("Query failed on layer {layer}: {message}")]
    Query { layer: LayerId, message: String },

    // ── User-visible notices ─────────────────────────────────────────
    #[error("No locations selected. Please select locations for the {action}.")]
    NoSelection { action: String },

    #[error("No data available to generate the {action}.")]
    NoData { action: String },

    #[error("No valid geometries found in the selected features.")]
    NoGeometry,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Service error code (ArcGIS `error.code`), if any.
        code: Option<i64>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Attach a layer id to an error raised while querying that layer.
    pub(crate) fn for_layer(self, layer: LayerId) -> Self {
        match self {
            Self::Api { message, .. } | Self::Internal(message) => Self::Query { layer, message },
            Self::LayerNotFound { .. } => Self::LayerNotFound { layer },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<peakmap_api::Error> for CoreError {
    fn from(err: peakmap_api::Error) -> Self {
        if err.is_auth() {
            return CoreError::Unauthorized {
                message: err.to_string(),
            };
        }
        match err {
            peakmap_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: e.status().map(|s| i64::from(s.as_u16())),
                    }
                }
            }
            peakmap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            peakmap_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            peakmap_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            peakmap_api::Error::Http { status, message } => CoreError::Api {
                message: format!("HTTP {status}: {message}"),
                code: Some(i64::from(status)),
            },
            peakmap_api::Error::Service {
                code,
                message,
                details,
            } => CoreError::Api {
                message: if details.is_empty() {
                    message
                } else {
                    format!("{message} ({})", details.join("; "))
                },
                code: Some(code),
            },
            peakmap_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
