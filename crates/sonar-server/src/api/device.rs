//! Device API endpoints.
//!
//! Drive the hosted device's radio, permissions, registration, onboarding, and
//! foreground lifecycle. Trigger endpoints wait for the arbiter to settle and
//! return the resulting presentation state.

use axum::extract::State;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sonar_core::{PermissionSnapshot, PermissionState, RadioPower};
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::ApiResult;
use crate::api::presentation::{settled, PresentationResponse};
use crate::state::SharedState;

/// Creates the device router, mounted at `/api`.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/lifecycle/active", post(became_active))
        .route("/onboarding/complete", post(complete_onboarding))
        .route("/radio", put(update_radio))
        .route("/permissions", put(update_permissions))
        .route("/registration", put(update_registration))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Radio power update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "power": "powered_off" }))]
pub struct UpdateRadioRequest {
    /// New power state.
    pub power: RadioPower,
}

/// Permission update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "radio": "allowed", "notification": "denied" }))]
pub struct UpdatePermissionsRequest {
    /// Radio permission.
    pub radio: PermissionState,
    /// Notification permission.
    pub notification: PermissionState,
}

/// Permission update result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdatePermissionsResponse {
    /// Snapshot the next query will return.
    pub permissions: PermissionSnapshot,
}

/// Registration update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "registered": true }))]
pub struct UpdateRegistrationRequest {
    /// Whether the device holds a registration record.
    pub registered: bool,
}

/// Registration update result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRegistrationResponse {
    /// Stored registration state.
    pub registered: bool,
}

/// Onboarding completion result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompleteOnboardingResponse {
    /// `false` if onboarding had already completed.
    pub completed_now: bool,
    /// Presentation state afterwards.
    pub presentation: PresentationResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// Bring the app to the foreground.
#[utoipa::path(
    post,
    path = "/api/lifecycle/active",
    tag = "device",
    operation_id = "becameActive",
    summary = "App became active",
    description = "Delivers a became-active trigger. In the main flow the \
        arbiter re-checks registration, radio power, and permissions, and \
        shows at most one remediation overlay.",
    responses(
        (status = 200, description = "Arbiter settled", body = PresentationResponse),
        (status = 503, description = "Arbiter not running")
    )
)]
pub async fn became_active(
    State(state): State<SharedState>,
) -> ApiResult<Json<PresentationResponse>> {
    state.arbiter().became_active().await?;
    settled(&state).await.map(Json)
}

/// Finish onboarding.
#[utoipa::path(
    post,
    path = "/api/onboarding/complete",
    tag = "device",
    operation_id = "completeOnboarding",
    summary = "Complete onboarding",
    description = "Fires the onboarding completion signal. The root switches \
        to the main flow; remediation is evaluated on the next became-active.",
    responses(
        (status = 200, description = "Onboarding complete", body = CompleteOnboardingResponse),
        (status = 503, description = "Arbiter not running")
    )
)]
pub async fn complete_onboarding(
    State(state): State<SharedState>,
) -> ApiResult<Json<CompleteOnboardingResponse>> {
    let completed_now = state.onboarding().complete();
    if completed_now {
        // The gate's own signal may reach the arbiter too; it mounts main once.
        state.arbiter().onboarding_completed().await?;
    }
    info!(completed_now, "Onboarding completion requested");

    Ok(Json(CompleteOnboardingResponse {
        completed_now,
        presentation: settled(&state).await?,
    }))
}

/// Change the radio power state.
#[utoipa::path(
    put,
    path = "/api/radio",
    tag = "device",
    operation_id = "updateRadio",
    summary = "Set radio power",
    description = "Reports a new power state from the radio observer. Any \
        state other than powered_on raises the radio-off overlay in the main flow.",
    request_body = UpdateRadioRequest,
    responses(
        (status = 200, description = "Arbiter settled", body = PresentationResponse),
        (status = 503, description = "Arbiter not running")
    )
)]
pub async fn update_radio(
    State(state): State<SharedState>,
    Json(request): Json<UpdateRadioRequest>,
) -> ApiResult<Json<PresentationResponse>> {
    state.radio().set(request.power);
    // Whichever of this report and the observer's notification arrives second
    // finds the power already evaluated and starts no run.
    state.arbiter().radio_power_changed(request.power).await?;
    settled(&state).await.map(Json)
}

/// Change the OS permission state.
#[utoipa::path(
    put,
    path = "/api/permissions",
    tag = "device",
    operation_id = "updatePermissions",
    summary = "Set permissions",
    description = "Changes what the next permission query returns. Takes \
        effect on the next became-active or radio change.",
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Permissions stored", body = UpdatePermissionsResponse)
    )
)]
pub async fn update_permissions(
    State(state): State<SharedState>,
    Json(request): Json<UpdatePermissionsRequest>,
) -> Json<UpdatePermissionsResponse> {
    let snapshot = PermissionSnapshot {
        radio: request.radio,
        notification: request.notification,
    };
    state.permissions().set(snapshot);
    Json(UpdatePermissionsResponse {
        permissions: state.permissions().snapshot(),
    })
}

/// Change registration presence.
#[utoipa::path(
    put,
    path = "/api/registration",
    tag = "device",
    operation_id = "updateRegistration",
    summary = "Set registration",
    description = "Records or clears the device registration. Unregistered \
        devices never see a remediation overlay.",
    request_body = UpdateRegistrationRequest,
    responses(
        (status = 200, description = "Registration stored", body = UpdateRegistrationResponse)
    )
)]
pub async fn update_registration(
    State(state): State<SharedState>,
    Json(request): Json<UpdateRegistrationRequest>,
) -> Json<UpdateRegistrationResponse> {
    state.registration().set(request.registered);
    Json(UpdateRegistrationResponse {
        registered: request.registered,
    })
}
