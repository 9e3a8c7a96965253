//! OpenAPI specification generation for the sonar API.
//!
//! The document is served at `/api/openapi.json`, browsable through Swagger UI
//! at `/docs`, and written to disk by the `gen-openapi` binary.

use axum::Json;
use sonar_core::{
    PermissionSnapshot, PermissionState, PresentationCommand, RadioPower, RemediationKind,
    RootContent, Screen,
};
use utoipa::OpenApi;

use super::device::{
    CompleteOnboardingResponse, UpdatePermissionsRequest, UpdatePermissionsResponse,
    UpdateRadioRequest, UpdateRegistrationRequest, UpdateRegistrationResponse,
};
use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::presentation::{CommandLogResponse, PresentationResponse};

/// Serve the OpenAPI specification as JSON.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for sonar.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "sonar API",
        version = "0.1.0",
        description = r#"
# sonar API

sonar decides what a contact-tracing app shows at its root and whether a
remediation overlay must ask the user to fix their device setup.

## Overview

The server hosts one simulated device:

1. **Device**: Set radio power, OS permissions, and registration, then bring the app to the foreground
2. **Presentation**: Read the root content, the overlay, and the main screen the arbiter produced
3. **Screens**: Navigate the main flow once onboarding is complete

## Remediation rules

- Unregistered devices never see an overlay
- A radio that is not powered on wins over permission problems
- A denied radio permission wins over a denied notification permission
- Only the most recent permission query may change the overlay
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local sonar server")
    ),
    tags(
        (
            name = "system",
            description = "Health checks"
        ),
        (
            name = "device",
            description = "Simulated device state and lifecycle triggers"
        ),
        (
            name = "presentation",
            description = "Root content, remediation overlay, and main-flow screens"
        )
    ),
    paths(
        // Health endpoints
        super::health::health_check,
        // Device endpoints
        super::device::became_active,
        super::device::complete_onboarding,
        super::device::update_radio,
        super::device::update_permissions,
        super::device::update_registration,
        // Presentation endpoints
        super::presentation::get_presentation,
        super::presentation::get_commands,
        super::presentation::show_screen,
        super::presentation::check_symptoms,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            // Device types
            UpdateRadioRequest,
            UpdatePermissionsRequest,
            UpdatePermissionsResponse,
            UpdateRegistrationRequest,
            UpdateRegistrationResponse,
            CompleteOnboardingResponse,
            // Presentation types
            PresentationResponse,
            CommandLogResponse,
            // Domain types
            RootContent,
            RemediationKind,
            RadioPower,
            PermissionState,
            PermissionSnapshot,
            PresentationCommand,
            Screen,
        )
    )
)]
pub struct ApiDoc;
