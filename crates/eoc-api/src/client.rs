// Authenticated session client
//
// One `SessionClient` per controller. It owns the HTTP client and cookie
// jar, binds itself to a firmware backend on first use, and answers a
// rejected session (HTTP 401) with exactly one re-login and one retry.
// Backends issue their requests through the same client, so every
// request of a collection shares the session cookie.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::auth::{Credentials, SessionCookie};
use crate::backend::{Backend, Registry};
use crate::error::Error;
use crate::metrics::MetricSink;
use crate::model::Metrics;
use crate::transport::TransportConfig;

const JSON: &str = "application/json";

/// A completed 2xx exchange, body not yet decoded.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| {
            let body = String::from_utf8_lossy(&self.body).into_owned();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// First value of a response header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Mutable authentication state, guarded by one async lock so that
/// negotiation and re-login never run concurrently for the same client.
#[derive(Default)]
struct AuthState {
    backend: Option<Arc<dyn Backend>>,
    /// `(backend, reason)` for every backend the last negotiation rejected.
    rejected: Vec<(&'static str, String)>,
    /// Consecutive failed re-logins on the bound backend.
    login_failures: u32,
}

/// Builder for [`SessionClient`].
pub struct SessionClientBuilder {
    endpoint: Url,
    credentials: Credentials,
    transport: TransportConfig,
    registry: Option<Arc<Registry>>,
    backend: Option<Arc<dyn Backend>>,
    renegotiate_after: Option<u32>,
}

impl SessionClientBuilder {
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Negotiate against this registry instead of the built-in one.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Skip negotiation and bind to the given backend right away. The
    /// client starts without a session; the first 401 triggers the login.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Drop the bound backend after `failures` consecutive failed
    /// re-logins, so the next call negotiates again.
    pub fn renegotiate_after(mut self, failures: u32) -> Self {
        self.renegotiate_after = Some(failures).filter(|n| *n > 0);
        self
    }

    pub fn build(self) -> Result<SessionClient, Error> {
        let endpoint = normalize_endpoint(self.endpoint)?;
        let jar = Arc::new(Jar::default());
        let http = self.transport.build_client(Arc::clone(&jar))?;

        Ok(SessionClient {
            http,
            endpoint,
            credentials: self.credentials,
            jar,
            registry: self.registry.unwrap_or_else(|| Arc::new(Registry::default())),
            renegotiate_after: self.renegotiate_after,
            auth: Mutex::new(AuthState {
                backend: self.backend,
                ..AuthState::default()
            }),
            generation: AtomicU64::new(0),
        })
    }
}

/// Keep scheme, host and port; drop path, query, fragment and userinfo.
fn normalize_endpoint(mut url: Url) -> Result<Url, Error> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::InvalidUrl(url::ParseError::EmptyHost));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    // Infallible for http(s) URLs with a host.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Ok(url)
}

/// Authenticated HTTP client for one EoC controller.
pub struct SessionClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
    jar: Arc<Jar>,
    registry: Arc<Registry>,
    renegotiate_after: Option<u32>,
    auth: Mutex<AuthState>,
    /// Bumped on every successful login; lets concurrent requests that hit
    /// the same expired session share a single re-login.
    generation: AtomicU64,
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    pub fn builder(endpoint: Url, credentials: Credentials) -> SessionClientBuilder {
        SessionClientBuilder {
            endpoint,
            credentials,
            transport: TransportConfig::default(),
            registry: None,
            backend: None,
            renegotiate_after: None,
        }
    }

    /// Client with default transport, built-in registry and no pinned
    /// backend.
    pub fn new(endpoint: Url, credentials: Credentials) -> Result<Self, Error> {
        Self::builder(endpoint, credentials).build()
    }

    /// The controller root, always ending in `/`.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Name of the bound backend, if any.
    pub async fn backend_name(&self) -> Option<&'static str> {
        self.auth.lock().await.backend.as_ref().map(|b| b.name())
    }

    /// Backends rejected by the most recent negotiation, with the reason.
    pub async fn negotiation_failures(&self) -> Vec<(&'static str, String)> {
        self.auth.lock().await.rejected.clone()
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// `GET` a path relative to the controller root and decode the JSON
    /// response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::GET, path, None).await
    }

    /// Authenticated JSON request. Binds a backend first if needed and
    /// retries once after a re-login when the session was rejected.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, Error> {
        self.send(method, path, body).await?.json()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, Error> {
        let backend = self.bound_backend().await?;
        let generation = self.generation.load(Ordering::Acquire);

        match self.request_raw(method.clone(), path, body).await {
            Err(err) if err.is_auth_failure() => {
                debug!(path, backend = backend.name(), "session rejected, logging in again");
                self.relogin(&backend, generation).await?;
                self.request_raw(method, path, body).await
            }
            other => other,
        }
    }

    /// Single unauthenticated exchange: no backend binding, no re-login.
    ///
    /// `Accept: application/json` is always sent; `Content-Type` only when
    /// a body is present. Any non-2xx status is an
    /// [`Error::UnexpectedStatus`].
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, JSON);
        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(Error::Encode)?;
            builder = builder.header(CONTENT_TYPE, JSON).body(encoded);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                method: method.to_string(),
                url: url.to_string(),
                location: headers
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        trace!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// Install a session cookie for the controller host. Accepts a bare
    /// `name=value` pair or a full `Set-Cookie` header value.
    pub fn set_cookie(&self, raw: &str) -> Result<(), Error> {
        let cookie = SessionCookie::parse(raw)?;
        info!(
            host = self.endpoint.host_str().unwrap_or_default(),
            name = cookie.name(),
            "session cookie set"
        );
        self.jar.add_cookie_str(&cookie.pair(), &self.endpoint);
        Ok(())
    }

    /// Read-only `GET` of `path` below the bound backend's API root,
    /// returned as untyped JSON.
    pub async fn api_get(&self, path: &str) -> Result<serde_json::Value, Error> {
        let backend = self.bound_backend().await?;
        let path = format!("{}{}", backend.api_root(), path.trim_start_matches('/'));
        self.get(&path).await
    }

    // ── Collection ───────────────────────────────────────────────────

    /// Fetch a canonical snapshot through the bound backend.
    pub async fn metrics(&self) -> Result<Metrics, Error> {
        let backend = self.bound_backend().await?;
        backend.metrics(self).await
    }

    /// Collect one snapshot and push it into `sink`. On error the sink may
    /// have received nothing or a partial set; callers that need
    /// all-or-nothing semantics buffer.
    pub async fn collect(&self, sink: &mut dyn MetricSink) -> Result<(), Error> {
        let backend = self.bound_backend().await?;
        backend.collect(self, sink).await
    }

    // ── Internals ────────────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.endpoint.join(path.trim_start_matches('/'))?)
    }

    /// The bound backend, negotiating one if none is bound yet.
    async fn bound_backend(&self) -> Result<Arc<dyn Backend>, Error> {
        let mut state = self.auth.lock().await;
        if let Some(backend) = &state.backend {
            return Ok(Arc::clone(backend));
        }

        match self.registry.negotiate(self).await {
            Ok(negotiated) => {
                state.rejected = summarize(&negotiated.failures);
                state.login_failures = 0;
                state.backend = Some(Arc::clone(&negotiated.backend));
                self.generation.fetch_add(1, Ordering::AcqRel);
                info!(
                    host = self.endpoint.host_str().unwrap_or_default(),
                    backend = negotiated.backend.name(),
                    "backend bound"
                );
                Ok(negotiated.backend)
            }
            Err(failures) => {
                state.rejected = summarize(&failures);
                Err(Error::NoBackend { failures })
            }
        }
    }

    /// Log in again through `backend`, unless another request already did
    /// so since `seen` was sampled or `backend` is no longer bound.
    async fn relogin(&self, backend: &Arc<dyn Backend>, seen: u64) -> Result<(), Error> {
        let mut state = self.auth.lock().await;
        if self.generation.load(Ordering::Acquire) != seen {
            debug!("session already renewed");
            return Ok(());
        }
        if !state
            .backend
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, backend))
        {
            debug!(backend = backend.name(), "backend unbound meanwhile, skipping re-login");
            return Ok(());
        }

        match backend.login(self).await {
            Ok(()) => {
                state.login_failures = 0;
                self.generation.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(err) => {
                state.login_failures += 1;
                warn!(
                    backend = backend.name(),
                    failures = state.login_failures,
                    error = %err,
                    "re-login failed"
                );
                if self
                    .renegotiate_after
                    .is_some_and(|limit| state.login_failures >= limit)
                {
                    info!(backend = backend.name(), "unbinding backend");
                    state.backend = None;
                    state.login_failures = 0;
                }
                Err(err)
            }
        }
    }
}

fn summarize(failures: &[crate::error::BackendFailure]) -> Vec<(&'static str, String)> {
    failures
        .iter()
        .map(|f| (f.backend, f.error.to_string()))
        .collect()
}
