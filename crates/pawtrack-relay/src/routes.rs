//! HTTP routes and handlers

use axum::{
    extract::{Query, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
        },
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::relay::{fetch_upstream, AppState, UpstreamError};
use crate::security::{validate_target_url, SecurityError};

/// Path of the relay endpoint
pub const RELAY_PATH: &str = "/api/proxy-model";

const ALLOW_ANY: &str = "*";
const RELAY_METHODS: &str = "GET, POST, OPTIONS";
const PREFLIGHT_METHODS: &str = "GET, OPTIONS";
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route(RELAY_PATH, get(proxy_model).options(preflight))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    url: Option<String>,
}

/// Fetch the target named by `url` and hand the bytes back with open CORS
async fn proxy_model(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, AppError> {
    metrics::counter!("pawtrack_relay_requests_total").increment(1);

    let target = params
        .url
        .filter(|url| !url.is_empty())
        .ok_or(AppError::MissingUrl)?;
    let url = validate_target_url(&target, &state.policy)?;

    info!(url = %url, "Relaying model asset");
    let (content_type, body) = fetch_upstream(&state.http_client, url).await?;
    info!(bytes = body.len(), content_type = ?content_type, "Model asset relayed");

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ANY)),
            (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(RELAY_METHODS)),
            (CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE)),
        ],
        body,
    )
        .into_response())
}

/// CORS pre-flight
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ANY),
            (ACCESS_CONTROL_ALLOW_METHODS, PREFLIGHT_METHODS),
            (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_ANY),
        ],
    )
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug, Error)]
enum AppError {
    #[error("Missing URL parameter")]
    MissingUrl,

    #[error("Invalid URL parameter: {0}")]
    InvalidUrl(#[from] SecurityError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingUrl | AppError::InvalidUrl(_) => {
                warn!(error = %self, "Rejected relay request");
                (
                    StatusCode::BAD_REQUEST,
                    [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
                    self.to_string(),
                )
                    .into_response()
            }
            AppError::Upstream(ref e) => {
                metrics::counter!("pawtrack_relay_upstream_errors_total").increment(1);
                error!(error = %e, "Upstream fetch failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ANY)],
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
