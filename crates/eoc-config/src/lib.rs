//! Configuration for the EoC exporter.
//!
//! TOML controller targets, credential resolution (env + keyring +
//! plaintext), and translation into `eoc_api::SessionClient` builders.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use eoc_api::{Credentials, SessionClient, TlsMode, TransportConfig};

/// Keyring service name for stored controller passwords.
pub const KEYRING_SERVICE: &str = "eoc-exporter";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for controller '{alias}'")]
    NoCredentials { alias: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("cannot build client for '{alias}': {source}")]
    Client {
        alias: String,
        #[source]
        source: eoc_api::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level exporter configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Controllers to export, addressed by alias or host.
    #[serde(default, rename = "eoc-controller")]
    pub controllers: Vec<Controller>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// Listen address of the HTTP server.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Unbind a backend after this many failed re-logins in a row.
    pub renegotiate_after: Option<u32>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: default_insecure(),
            listen: default_listen(),
            renegotiate_after: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_insecure() -> bool {
    true
}
fn default_listen() -> String {
    "[::]:9809".into()
}
fn default_username() -> String {
    "admin".into()
}

/// One EoC controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Controller {
    pub alias: String,

    /// Hostname or IP address.
    pub host: String,

    /// HTTPS port; 443 when unset.
    pub port: Option<u16>,

    #[serde(default = "default_username")]
    pub username: String,

    /// Password (plaintext; prefer `password_env` or the keyring).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Pin a firmware backend ("v2" or "v3") instead of negotiating.
    pub backend: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the global TLS setting.
    pub insecure: Option<bool>,

    /// Override the global timeout.
    pub timeout: Option<u64>,
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the configuration from `path` plus `EOC_`-prefixed
/// environment variables (e.g. `EOC_DEFAULTS__TIMEOUT=10`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("EOC_").split("__"))
        .extract()?;

    config.validate()?;
    debug!(
        path = %path.display(),
        controllers = config.controllers.len(),
        "config loaded"
    );
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut aliases = HashSet::new();
        for ctrl in &self.controllers {
            if ctrl.alias.trim().is_empty() {
                return Err(validation("alias", format!("empty alias for host '{}'", ctrl.host)));
            }
            if ctrl.host.trim().is_empty() {
                return Err(validation("host", format!("empty host for '{}'", ctrl.alias)));
            }
            if !aliases.insert(ctrl.alias.as_str()) {
                return Err(validation("alias", format!("duplicate alias '{}'", ctrl.alias)));
            }
            if let Some(name) = &ctrl.backend {
                if eoc_api::backend::by_name(name).is_none() {
                    return Err(validation(
                        "backend",
                        format!(
                            "unknown backend '{name}' for '{}', expected one of {:?}",
                            ctrl.alias,
                            eoc_api::backend::BUILTIN
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Find a controller by alias, falling back to its host.
    pub fn find(&self, target: &str) -> Option<&Controller> {
        self.controllers
            .iter()
            .find(|c| c.alias == target)
            .or_else(|| self.controllers.iter().find(|c| c.host == target))
    }
}

fn validation(field: &str, reason: String) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason,
    }
}

// ── Translation ─────────────────────────────────────────────────────

impl Controller {
    /// `https://host[:port]/`
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let authority = match self.port {
            Some(port) if port > 0 => format!("{host}:{port}"),
            _ => host,
        };
        Url::parse(&format!("https://{authority}/")).map_err(|e| {
            validation("host", format!("'{}' is not a valid host: {e}", self.host))
        })
    }

    /// An explicit `insecure = true` wins, then `ca_cert`, then the
    /// global `insecure` default.
    fn transport(&self, defaults: &Defaults) -> TransportConfig {
        let tls = if self.insecure == Some(true) {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca) = &self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else if self.insecure.unwrap_or(defaults.insecure) {
            TlsMode::DangerAcceptInvalid
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_timeout(Duration::from_secs(self.timeout.unwrap_or(defaults.timeout)))
    }
}

/// Resolve the controller password: `password_env`, then the system
/// keyring (`eoc-exporter` / `{alias}/password`), then plaintext.
pub fn resolve_password(ctrl: &Controller) -> Result<SecretString, ConfigError> {
    // 1. Env var named by the config
    if let Some(var) = &ctrl.password_env {
        if let Ok(pw) = std::env::var(var) {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{}/password", ctrl.alias)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(pw) = &ctrl.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        alias: ctrl.alias.clone(),
    })
}

/// Build the session client for one controller.
pub fn build_client(ctrl: &Controller, defaults: &Defaults) -> Result<SessionClient, ConfigError> {
    let client_err = |source| ConfigError::Client {
        alias: ctrl.alias.clone(),
        source,
    };

    let credentials =
        Credentials::new(ctrl.username.clone(), resolve_password(ctrl)?).map_err(client_err)?;
    let mut builder = SessionClient::builder(ctrl.endpoint()?, credentials)
        .transport(ctrl.transport(defaults));

    if let Some(name) = &ctrl.backend {
        let backend = eoc_api::backend::by_name(name)
            .ok_or_else(|| validation("backend", format!("unknown backend '{name}'")))?;
        builder = builder.backend(backend);
    }
    if let Some(n) = defaults.renegotiate_after {
        builder = builder.renegotiate_after(n);
    }

    builder.build().map_err(client_err)
}

/// One shared session client per configured controller, keyed by alias.
pub fn build_clients(
    config: &Config,
) -> Result<Vec<(Controller, Arc<SessionClient>)>, ConfigError> {
    config
        .controllers
        .iter()
        .map(|ctrl| Ok((ctrl.clone(), Arc::new(build_client(ctrl, &config.defaults)?))))
        .collect()
}
