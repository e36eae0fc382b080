//! Config subcommand handlers.

use secrecy::ExposeSecret;
use serde::Serialize;

use peakmap_core::TlsVerification;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, BUILTIN_SERVICE, Config, Service};
use crate::error::CliError;
use crate::output;

/// Resolved service settings, token redacted.
#[derive(Serialize)]
struct ResolvedService {
    service: String,
    config_path: String,
    url: String,
    layers: usize,
    first_layer: Option<u32>,
    last_layer: Option<u32>,
    token: &'static str,
    tls: String,
    timeout_secs: u64,
    out_sr: Option<u32>,
}

fn detail(r: &ResolvedService) -> String {
    let range = match (r.first_layer, r.last_layer) {
        (Some(first), Some(last)) => format!(" ({first}..{last})"),
        _ => String::new(),
    };
    let out_sr = r.out_sr.map_or_else(|| "service default".to_owned(), |wkid| wkid.to_string());
    [
        format!("Service:  {}", r.service),
        format!("Config:   {}", r.config_path),
        format!("URL:      {}", r.url),
        format!("Layers:   {}{range}", r.layers),
        format!("Token:    {}", r.token),
        format!("TLS:      {}", r.tls),
        format!("Timeout:  {}s", r.timeout_secs),
        format!("Out SR:   {out_sr}"),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let (name, resolved) = config::resolve_service(global)?;
            let token = match resolved.token {
                Some(ref secret) if !secret.expose_secret().is_empty() => "set",
                _ => "none",
            };
            let tls = match resolved.tls {
                TlsVerification::SystemDefaults => "system".to_owned(),
                TlsVerification::CustomCa(ref path) => format!("custom CA {}", path.display()),
                TlsVerification::DangerAcceptInvalid => "insecure".to_owned(),
            };
            let view = ResolvedService {
                service: name,
                config_path: config::config_path().display().to_string(),
                url: resolved.url.to_string(),
                layers: resolved.layers.len(),
                first_layer: resolved.layers.first().map(|l| l.0),
                last_layer: resolved.layers.last().map(|l| l.0),
                token,
                tls,
                timeout_secs: resolved.timeout.as_secs(),
                out_sr: resolved.out_sr,
            };
            let out = output::render_single(&global.output, &view, detail, |r| r.url.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            let mut cfg = Config::default();
            cfg.services.insert(BUILTIN_SERVICE.into(), Service::builtin());
            let written = config::save_config(&cfg)?;
            output::notice(
                &format!("Config written to {}", written.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
