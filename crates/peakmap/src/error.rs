//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use peakmap_config::ConfigError;
use peakmap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const NO_DATA: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to feature service at {url}: {reason}")]
    #[diagnostic(
        code(peakmap::connection_failed),
        help(
            "Check the service URL and your network connection.\n\
             URL: {url}\n\
             Try: peakmap layers --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Feature service rejected the request: {message}")]
    #[diagnostic(
        code(peakmap::auth_failed),
        help(
            "The service requires a valid access token.\n\
             Pass --token, set token_env in the service profile, or store one in the keyring."
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Layer {layer} not found")]
    #[diagnostic(
        code(peakmap::not_found),
        help("Run: peakmap layers to see the layers this service offers")
    )]
    LayerNotFound { layer: u32 },

    #[error("Query failed on layer {layer}: {message}")]
    #[diagnostic(code(peakmap::query_failed))]
    QueryFailed { layer: u32, message: String },

    // ── Empty results ────────────────────────────────────────────────

    #[error("No locations selected")]
    #[diagnostic(
        code(peakmap::no_selection),
        help("Select locations for the {action} with --layer (-l).")
    )]
    NoSelection { action: String },

    #[error("No data available to generate the {action}")]
    #[diagnostic(
        code(peakmap::no_data),
        help("Loosen the facet flags or select other locations.")
    )]
    NoData { action: String },

    #[error("No valid geometries found in the selected features")]
    #[diagnostic(code(peakmap::no_geometry))]
    NoGeometry,

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(peakmap::api_error))]
    ApiError { code: Option<i64>, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(peakmap::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Service '{name}' not found in configuration")]
    #[diagnostic(
        code(peakmap::service_not_found),
        help(
            "Available services: {available}\n\
             Add one under [services.{name}] in the config file."
        )
    )]
    ServiceNotFound { name: String, available: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(peakmap::config_exists), help("Pass --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(peakmap::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(peakmap::timeout),
        help("Increase timeout with --timeout or narrow the layer set with --layers.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(peakmap::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(peakmap::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::LayerNotFound { .. } | Self::ServiceNotFound { .. } => exit_code::NOT_FOUND,
            Self::NoSelection { .. }
            | Self::Validation { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::NoData { .. } | Self::NoGeometry => exit_code::NO_DATA,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Unauthorized { message } => CliError::AuthFailed { message },

            CoreError::LayerNotFound { layer } => CliError::LayerNotFound { layer: layer.0 },

            CoreError::Query { layer, message } => CliError::QueryFailed {
                layer: layer.0,
                message,
            },

            CoreError::NoSelection { action } => CliError::NoSelection { action },

            CoreError::NoData { action } => CliError::NoData { action },

            CoreError::NoGeometry => CliError::NoGeometry,

            CoreError::Api { message, code } => CliError::ApiError { code, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoService { name } => {
                let cfg = peakmap_config::load_config_or_default();
                let mut names: Vec<String> = cfg.services.into_keys().collect();
                if !names.iter().any(|n| n == peakmap_config::BUILTIN_SERVICE) {
                    names.push(peakmap_config::BUILTIN_SERVICE.into());
                }
                CliError::ServiceNotFound {
                    name,
                    available: names.join(", "),
                }
            }
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other),
        }
    }
}
