//! CLI configuration: thin wrapper around `peakmap_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --layers, --token, etc.).

use std::time::Duration;

use secrecy::SecretString;

use peakmap_core::{LayerId, ServiceConfig, TlsVerification, parse_layer_spec};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use peakmap_config::{
    BUILTIN_SERVICE, Config, Service, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active service profile, then apply flag overrides.
pub fn resolve_service(global: &GlobalOpts) -> Result<(String, ServiceConfig), CliError> {
    let cfg = load_config_or_default();
    let (name, service) = cfg.service(global.service.as_deref())?;
    let mut config = peakmap_config::service_to_config(&service, &name, &cfg.defaults)?;
    apply_overrides(&mut config, global)?;
    Ok((name, config))
}

/// Flag overrides take priority over profile values.
pub fn apply_overrides(config: &mut ServiceConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref url_str) = global.url {
        config.url = url_str.parse().map_err(|_| CliError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {url_str}"),
        })?;
    }

    if let Some(ref spec) = global.layers {
        config.layers = parse_layer_spec(spec).map_err(|e| CliError::Validation {
            field: "layers".into(),
            reason: e.to_string(),
        })?;
    }

    if let Some(ref token) = global.token {
        config.token = Some(SecretString::from(token.clone()));
    }

    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }

    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(())
}

/// Narrow a resolved config to the given layers. An empty list keeps the
/// configured catalog.
pub fn restrict_layers(config: &mut ServiceConfig, layers: &[LayerId]) {
    if !layers.is_empty() {
        config.layers = layers.to_vec();
    }
}
