use thiserror::Error;

/// Top-level error type for the `peakmap-api` crate.
///
/// Covers every failure mode of talking to a FeatureServer: transport,
/// service-reported errors, and payload decoding. `peakmap-core` maps these
/// into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status that carried no service error body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Service ─────────────────────────────────────────────────────
    /// Error reported by the service inside an `{"error": {...}}` body.
    ///
    /// ArcGIS returns these with HTTP 200, so the status line alone is
    /// not enough to detect a failed query.
    #[error("Feature service error {code}: {message}")]
    Service {
        code: i64,
        message: String,
        details: Vec<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the service rejected the request as unauthorized.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: 401 | 403,
                ..
            } | Self::Service {
                code: 498 | 499 | 401 | 403,
                ..
            }
        )
    }
}
