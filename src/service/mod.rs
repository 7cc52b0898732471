//! JSON Uplift REST Service
//!
//! Exposes the uplift pipeline over HTTP.
//!
//! ## Endpoints
//!
//! - `GET /` - Service name
//! - `GET /remote-fetch` - Effective fetch allow-list and context fetch policy
//! - `POST /json-uplift` - Uplift a JSON document (multipart form)
//!
//! All routes move under `BACKEND_ROOT_PATH` when it is set.

pub mod form;
pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{cors_layer, record_uplift_metric, request_logging_middleware};
pub use routes::{
    create_router, ApiError, AppState, ErrorResponse, RemoteFetchResponse, RootResponse,
};
pub use state::ServiceState;
