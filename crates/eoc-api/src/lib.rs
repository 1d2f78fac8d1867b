// eoc-api: Async Rust client for Triax EoC controllers (firmware 2.x and 3.x)

pub mod auth;
pub mod backend;
pub mod client;
pub mod error;
pub mod metrics;
pub mod model;
pub mod quoted;
pub mod transport;

pub use auth::Credentials;
pub use backend::{Backend, Registry};
pub use client::{RawResponse, SessionClient, SessionClientBuilder};
pub use error::{BackendFailure, Error};
pub use metrics::{MetricSink, Sample};
pub use model::Metrics;
pub use transport::{TlsMode, TransportConfig};
