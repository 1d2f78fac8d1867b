// Firmware backends
//
// Each firmware generation of the controllers speaks its own dialect:
// different login endpoint, different session token delivery, different
// status documents. A backend knows one dialect and translates it into
// the canonical `Metrics`. The session client picks a backend by trying
// them in registration order (see `registry`).

mod registry;
pub mod v2;
pub mod v3;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::SessionClient;
use crate::error::Error;
use crate::metrics::MetricSink;
use crate::model::{Counters, Metrics};
use crate::quoted;

pub use registry::{Negotiated, Registry};

/// One firmware dialect.
///
/// `login` must use [`SessionClient::request_raw`] (never the
/// re-login-capable request path) and install the session token with
/// [`SessionClient::set_cookie`]. `metrics` issues authenticated requests
/// through [`SessionClient::get`].
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Short identifier used in logs, config and error reports.
    fn name(&self) -> &'static str;

    /// Path prefix of the JSON API below the controller root.
    fn api_root(&self) -> &'static str;

    async fn login(&self, client: &SessionClient) -> Result<(), Error>;

    async fn metrics(&self, client: &SessionClient) -> Result<Metrics, Error>;

    async fn collect(&self, client: &SessionClient, sink: &mut dyn MetricSink) -> Result<(), Error> {
        let metrics = self.metrics(client).await?;
        metrics.emit(sink);
        Ok(())
    }
}

/// Look up a built-in backend by name.
pub fn by_name(name: &str) -> Option<Arc<dyn Backend>> {
    match name {
        v2::NAME => Some(Arc::new(v2::V2)),
        v3::NAME => Some(Arc::new(v3::V3)),
        _ => None,
    }
}

/// Names of the built-in backends, in negotiation order.
pub const BUILTIN: &[&str] = &[v2::NAME, v3::NAME];

/// Interface counters, identical in both firmware generations.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCounters {
    #[serde(default, deserialize_with = "quoted::uint")]
    pub rx_byte: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub tx_byte: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub rx_packet: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub tx_packet: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub rx_err: u64,
    #[serde(default, deserialize_with = "quoted::uint")]
    pub tx_err: u64,
}

impl From<&RawCounters> for Counters {
    fn from(raw: &RawCounters) -> Self {
        Self {
            rx_bytes: raw.rx_byte,
            tx_bytes: raw.tx_byte,
            rx_packets: raw.rx_packet,
            tx_packets: raw.tx_packet,
            rx_errors: raw.rx_err,
            tx_errors: raw.tx_err,
        }
    }
}

#[derive(Deserialize)]
struct RejectionBody {
    #[serde(default)]
    message: String,
}

/// Turn a 401/403 from a login endpoint into an authentication error,
/// keeping the device's message when it sent one. Other errors pass
/// through untouched.
pub(crate) fn login_rejection(err: Error) -> Error {
    match err {
        Error::UnexpectedStatus {
            status: status @ (401 | 403),
            body,
            ..
        } => {
            let message = serde_json::from_str::<RejectionBody>(&body)
                .ok()
                .map(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("login rejected with HTTP {status}"));
            Error::Authentication { message }
        }
        other => other,
    }
}
