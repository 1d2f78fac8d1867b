//! Exporter error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use eoc_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum ExporterError {
    #[error("Configuration file {path} not found")]
    #[diagnostic(
        code(eoc::no_config),
        help(
            "Copy config.example.toml to {path} and adjust it,\n\
             or point --config (EOC_EXPORTER_CONFIG) at an existing file."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(eoc::config))]
    Config(ConfigError),

    #[error("Controller '{target}' is not configured")]
    #[diagnostic(
        code(eoc::unknown_target),
        help("Configured controllers: {available}")
    )]
    UnknownTarget { target: String, available: String },

    #[error("Could not reach controller '{target}'")]
    #[diagnostic(
        code(eoc::connection_failed),
        help("Check that the controller is reachable and that TLS settings match its certificate.")
    )]
    Connection {
        target: String,
        #[source]
        source: eoc_api::Error,
    },

    #[error("Controller '{target}' rejected the login")]
    #[diagnostic(
        code(eoc::auth_failed),
        help(
            "Verify username and password of '{target}'.\n\
             Passwords are read from password_env, the system keyring, then the config file."
        )
    )]
    AuthFailed {
        target: String,
        #[source]
        source: eoc_api::Error,
    },

    #[error("Collecting metrics from '{target}' failed")]
    #[diagnostic(code(eoc::collect_failed))]
    Collect {
        target: String,
        #[source]
        source: eoc_api::Error,
    },

    #[error("Cannot listen on {addr}")]
    #[diagnostic(
        code(eoc::listen),
        help("Choose another address with --listen or defaults.listen.")
    )]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Metrics encoding failed: {0}")]
    #[diagnostic(code(eoc::encode))]
    Encode(#[from] prometheus::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for ExporterError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(path) => Self::NoConfig {
                path: path.display().to_string(),
            },
            other => Self::Config(other),
        }
    }
}

impl ExporterError {
    /// Classify a failed collection of `target`.
    pub fn collect(target: &str, source: eoc_api::Error) -> Self {
        let target = target.to_owned();
        match &source {
            eoc_api::Error::Authentication { .. } | eoc_api::Error::MissingCredentials => {
                Self::AuthFailed { target, source }
            }
            eoc_api::Error::Transport(_) | eoc_api::Error::Tls(_) => {
                Self::Connection { target, source }
            }
            eoc_api::Error::NoBackend { failures }
                if failures
                    .iter()
                    .any(|f| matches!(*f.error, eoc_api::Error::Authentication { .. })) =>
            {
                Self::AuthFailed { target, source }
            }
            eoc_api::Error::NoBackend { failures }
                if !failures.is_empty()
                    && failures
                        .iter()
                        .all(|f| matches!(*f.error, eoc_api::Error::Transport(_))) =>
            {
                Self::Connection { target, source }
            }
            _ => Self::Collect { target, source },
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. } | Self::Config(_) => exit_code::USAGE,
            Self::UnknownTarget { .. } => exit_code::NOT_FOUND,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Connection { .. } | Self::Listen { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}
