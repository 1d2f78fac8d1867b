//! HTTP surface: per-controller scrape endpoints and a read-only API
//! passthrough.

use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use eoc_api::SessionClient;
use eoc_config::Controller;

use crate::error::ExporterError;
use crate::render;

/// Configured controllers with their long-lived session clients.
#[derive(Debug)]
pub struct AppState {
    pub controllers: Vec<(Controller, Arc<SessionClient>)>,
}

impl AppState {
    /// Look up a controller by alias, falling back to its host.
    pub fn find(&self, target: &str) -> Option<&(Controller, Arc<SessionClient>)> {
        self.controllers
            .iter()
            .find(|(c, _)| c.alias == target)
            .or_else(|| self.controllers.iter().find(|(c, _)| c.host == target))
    }

    fn aliases(&self) -> Vec<String> {
        self.controllers.iter().map(|(c, _)| c.alias.clone()).collect()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/controllers", get(handle_controllers))
        .route("/controllers/{target}/metrics", get(handle_metrics))
        .route("/controllers/{target}/api/{*path}", get(handle_api))
        .with_state(state)
}

/// Bind `addr` and serve until interrupted.
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<(), ExporterError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::Listen {
            addr: addr.to_owned(),
            source,
        })?;
    info!(
        address = %listener.local_addr()?,
        controllers = state.controllers.len(),
        "exporter listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "configuration not found\n").into_response()
}

/// Landing page linking every controller's endpoints.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    controllers: Vec<String>,
    version: &'static str,
}

#[allow(clippy::unused_async)]
async fn handle_index(State(state): State<Arc<AppState>>) -> Response {
    let page = IndexTemplate {
        controllers: state.aliases(),
        version: env!("CARGO_PKG_VERSION"),
    };
    match page.render() {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render index page");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error\n").into_response()
        }
    }
}

#[allow(clippy::unused_async)]
async fn handle_controllers(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.aliases())
}

async fn handle_metrics(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
) -> Response {
    let Some((ctrl, client)) = state.find(&target) else {
        return not_found();
    };

    let (samples, _) = render::scrape(&ctrl.alias, client).await;
    match render::render(&samples) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(render::content_type()),
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(controller = %ctrl.alias, error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("metrics encoding error"),
            )
                .into_response()
        }
    }
}

async fn handle_api(
    State(state): State<Arc<AppState>>,
    Path((target, path)): Path<(String, String)>,
) -> Response {
    let Some((ctrl, client)) = state.find(&target) else {
        return not_found();
    };

    match client.api_get(&path).await {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            warn!(controller = %ctrl.alias, path = %path, error = %err, "api passthrough failed");
            (StatusCode::BAD_GATEWAY, format!("{err}\n")).into_response()
        }
    }
}
