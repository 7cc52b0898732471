//! Axum routes for the JSON uplift service.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::engine::{BasicEngine, UpliftEngine};
use crate::error::{ErrorDetail, ErrorKind, UpliftError};
use crate::fetch::{HttpFetcher, RemoteFetcher};
use crate::policy::ContextFetchPolicy;
use crate::types::RenderedOutput;

use super::form::read_uplift_form;
use super::middleware::record_uplift_metric;
use super::state::ServiceState;

/// Service state with the built-in engine and the HTTP fetcher.
pub type AppState = ServiceState<BasicEngine, HttpFetcher>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// `GET /` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    /// Service name.
    pub name: String,
}

/// `GET /remote-fetch` response.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteFetchResponse {
    /// Whether any document or context definition may be fetched.
    pub enabled: bool,
    /// All allow patterns joined into one alternation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// The individual allow patterns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexes: Option<Vec<String>>,
    /// Remote JSON-LD context policy.
    pub context: ContextFetchPolicy,
}

/// Error body: `{"detail": {type, msg, ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub detail: ErrorDetail,
}

/// An [`UpliftError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub UpliftError);

impl ApiError {
    /// HTTP status for the error.
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::FetchForbidden => StatusCode::FORBIDDEN,
            ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<UpliftError> for ApiError {
    fn from(err: UpliftError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.0.detail();
        tracing::warn!(
            status = status.as_u16(),
            error_type = %detail.kind,
            error = %detail.msg,
            "Request error"
        );
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl IntoResponse for RenderedOutput {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Service identity.
async fn root_handler<E, F>(State(state): State<Arc<ServiceState<E, F>>>) -> Json<RootResponse>
where
    E: UpliftEngine + 'static,
    F: RemoteFetcher + 'static,
{
    Json(RootResponse {
        name: state.config().service_name.clone(),
    })
}

/// Effective fetch policies.
async fn remote_fetch_handler<E, F>(
    State(state): State<Arc<ServiceState<E, F>>>,
) -> Json<RemoteFetchResponse>
where
    E: UpliftEngine + 'static,
    F: RemoteFetcher + 'static,
{
    let config = state.config();
    let policy = &config.fetch_policy;
    Json(RemoteFetchResponse {
        enabled: policy.is_enabled(),
        regex: policy.combined_pattern(),
        regexes: policy
            .is_enabled()
            .then(|| policy.patterns().map(str::to_string).collect()),
        context: config.context_fetch_policy.clone(),
    })
}

/// Uplift a JSON document.
async fn uplift_handler<E, F>(
    State(state): State<Arc<ServiceState<E, F>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<RenderedOutput, ApiError>
where
    E: UpliftEngine + 'static,
    F: RemoteFetcher + 'static,
{
    let started = Instant::now();
    let multipart = multipart.map_err(|e| UpliftError::Multipart(e.body_text()))?;
    let request = read_uplift_form(multipart).await?;

    let output = state.pipeline.run(&request).await?;

    record_uplift_metric(
        request.output,
        output.body.len(),
        started.elapsed().as_millis() as u64,
    );
    Ok(output)
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router, nested under the configured root path if any.
pub fn create_router<E, F>(state: ServiceState<E, F>) -> Router
where
    E: UpliftEngine + 'static,
    F: RemoteFetcher + 'static,
{
    let root_path = state.config().root_path.clone();
    let state = Arc::new(state);

    let api = Router::new()
        .route("/", get(root_handler::<E, F>))
        .route("/remote-fetch", get(remote_fetch_handler::<E, F>))
        .route("/json-uplift", post(uplift_handler::<E, F>))
        .with_state(state);

    match root_path {
        Some(prefix) => Router::new().nest(&prefix, api),
        None => api,
    }
}
