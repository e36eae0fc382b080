//! Configuration for the peakmap CLI.
//!
//! TOML service profiles, access-token resolution (env + keyring +
//! plaintext), and translation to `peakmap_core::ServiceConfig`. The CLI
//! layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use peakmap_core::config::{DEFAULT_LAYER_SPEC, DEFAULT_SERVICE_URL};
use peakmap_core::{ServiceConfig, TlsVerification, parse_layer_spec};

/// Name of the service profile that exists without any config file.
pub const BUILTIN_SERVICE: &str = "traffic-peak";

const KEYRING_SERVICE: &str = "peakmap";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no service profile named '{name}'")]
    NoService { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Service used when `--service` is not given.
    pub default_service: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_service: Some(BUILTIN_SERVICE.into()),
            defaults: Defaults::default(),
            services: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named feature service profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Service {
    /// FeatureServer root URL.
    pub url: String,

    /// Sublayer ids: `"1-101"`, `"1,2,5-9"`.
    #[serde(default = "default_layers")]
    pub layers: String,

    /// Access token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the access token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Spatial reference for returned geometry.
    pub out_sr: Option<u32>,
}

fn default_layers() -> String {
    DEFAULT_LAYER_SPEC.into()
}

impl Service {
    /// The public Traffic Analysis PEAK service.
    pub fn builtin() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.into(),
            layers: default_layers(),
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            out_sr: None,
        }
    }
}

impl Config {
    /// Resolve a service profile: `name`, else `default_service`, else the
    /// built-in service. The built-in name always resolves, even when the
    /// file does not define it.
    pub fn service(&self, name: Option<&str>) -> Result<(String, Service), ConfigError> {
        let name = name
            .or(self.default_service.as_deref())
            .unwrap_or(BUILTIN_SERVICE);
        match self.services.get(name) {
            Some(service) => Ok((name.to_owned(), service.clone())),
            None if name == BUILTIN_SERVICE => Ok((name.to_owned(), Service::builtin())),
            None => Err(ConfigError::NoService { name: name.into() }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "peakmap", "peakmap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("peakmap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + `PEAKMAP_*` environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PEAKMAP_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve an access token from the credential chain. Public services
/// need none, so absence is not an error.
pub fn resolve_token(service: &Service, service_name: &str) -> Option<SecretString> {
    // 1. Service's token_env → env var lookup
    if let Some(val) = service
        .token_env
        .as_ref()
        .and_then(|env_name| std::env::var(env_name).ok())
    {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring::Entry::new(KEYRING_SERVICE, &format!("{service_name}/token"))
        .ok()
        .and_then(|entry| entry.get_password().ok())
    {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    service.token.clone().map(SecretString::from)
}

/// Build a `ServiceConfig` from a profile, no CLI flag overrides.
pub fn service_to_config(
    service: &Service,
    service_name: &str,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    let url: url::Url = service.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", service.url),
    })?;

    let layers = parse_layer_spec(&service.layers).map_err(|e| ConfigError::Validation {
        field: "layers".into(),
        reason: e.to_string(),
    })?;

    let tls = if service.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = service.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ServiceConfig::new(url, layers);
    config.token = resolve_token(service, service_name);
    config.tls = tls;
    config.timeout = Duration::from_secs(service.timeout.unwrap_or(defaults.timeout));
    if let Some(wkid) = service.out_sr {
        config.out_sr = Some(wkid);
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_falls_back_to_builtin_service() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        let (name, service) = cfg.service(None).unwrap();
        assert_eq!(name, BUILTIN_SERVICE);
        assert_eq!(service.url, DEFAULT_SERVICE_URL);

        let resolved = service_to_config(&service, &name, &cfg.defaults).unwrap();
        assert_eq!(resolved.layers.len(), 101);
        assert_eq!(resolved.timeout, Duration::from_secs(30));
        assert_eq!(resolved.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn named_service_from_file() {
        let (_dir, path) = write(
            r#"
default_service = "walnut-creek"

[defaults]
output = "json"
timeout = 10

[services.walnut-creek]
url = "https://example.com/arcgis/rest/services/Peak/FeatureServer"
layers = "1,2,5-7"
token = "plain-token"
insecure = true
"#,
        );
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.output, "json");

        let (name, service) = cfg.service(None).unwrap();
        assert_eq!(name, "walnut-creek");
        let resolved = service_to_config(&service, &name, &cfg.defaults).unwrap();
        let ids: Vec<u32> = resolved.layers.iter().map(|l| l.0).collect();
        assert_eq!(ids, vec![1, 2, 5, 6, 7]);
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.tls, TlsVerification::DangerAcceptInvalid);
        assert!(resolved.token.is_some());
    }

    #[test]
    fn unknown_service_and_bad_layers_are_errors() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.service(Some("nope")),
            Err(ConfigError::NoService { .. })
        ));

        let service = Service {
            layers: "9-3".into(),
            ..Service::builtin()
        };
        let err = service_to_config(&service, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "layers"));
    }

    #[test]
    fn save_then_load_keeps_services() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.services.insert("local".into(), Service {
            url: "https://gis.local/arcgis/rest/services/Counts/FeatureServer".into(),
            ..Service::builtin()
        });
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, service) = loaded.service(Some("local")).unwrap();
        assert_eq!(service.layers, DEFAULT_LAYER_SPEC);
        assert!(service.url.starts_with("https://gis.local/"));
    }
}
