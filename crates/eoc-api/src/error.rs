use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;

/// HTTP status the controllers answer with once a session cookie is
/// missing, expired or revoked.
pub const AUTH_FAILURE_STATUS: u16 = 401;

/// Top-level error type for the `eoc-api` crate.
///
/// Covers every failure mode of a collection: transport, authentication,
/// firmware protocol mismatches, and data decoding. The exporter maps these
/// into an `up = 0` scrape; nothing is retried here except the single
/// re-login performed by the session client.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The device answered with a non-2xx status.
    #[error("unexpected status {status} for {method} {url}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        location: Option<String>,
        status: u16,
        body: String,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// The device explicitly rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No username configured for the endpoint.
    #[error("missing username/password")]
    MissingCredentials,

    // ── Firmware protocol ───────────────────────────────────────────
    /// A response violates the shape this firmware version is expected to
    /// produce (missing session token, malformed cookie, ...).
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A numeric-as-string field failed to parse.
    #[error("unable to parse {field} value {value:?}: {source}")]
    Parse {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be JSON encoded.
    #[error("encoding body failed: {0}")]
    Encode(#[source] serde_json::Error),

    // ── Negotiation ─────────────────────────────────────────────────
    /// None of the registered backends could log in.
    #[error("no usable backend found: {}", FailureList(.failures))]
    NoBackend { failures: Vec<BackendFailure> },
}

/// Why one backend was rejected during negotiation.
#[derive(Debug)]
pub struct BackendFailure {
    pub backend: &'static str,
    pub error: Box<Error>,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

struct FailureList<'a>(&'a [BackendFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no backends registered");
        }
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl Error {
    /// Returns `true` if the device rejected the request because the
    /// session is missing or expired. This is the only status the session
    /// client answers with a re-login.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedStatus {
                status: AUTH_FAILURE_STATUS,
                ..
            }
        )
    }

    /// The HTTP status carried by an [`UnexpectedStatus`](Self::UnexpectedStatus).
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
