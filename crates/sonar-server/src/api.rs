//! HTTP API routes and handlers.
//!
//! Endpoints are organized by domain:
//! - `device` - Simulated device state and lifecycle triggers
//! - `presentation` - Rendered presentation state and main-flow navigation
//! - `health` - Service health checks
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::SharedState;

pub mod device;
pub mod error;
pub mod health;
pub mod openapi;
pub mod presentation;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                     - Health check
/// /docs                       - Swagger UI
/// /api
/// ├── /lifecycle/active       - App came to the foreground
/// ├── /onboarding/complete    - Finish onboarding
/// ├── /radio                  - Radio power
/// ├── /permissions            - OS permissions
/// ├── /registration           - Registration presence
/// ├── /presentation           - Rendered state and command log
/// ├── /screens                - Main-flow navigation
/// └── /openapi.json           - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .route("/openapi.json", get(openapi::get_openapi_spec))
                .merge(device::router())
                .nest("/presentation", presentation::router())
                .nest("/screens", presentation::screens_router()),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
