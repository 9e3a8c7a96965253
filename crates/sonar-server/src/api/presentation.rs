//! Presentation API endpoints.
//!
//! Reports what the arbiter has mounted and lets the main flow show screens.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sonar_core::{
    check_symptoms_target, PresentationCommand, PresentationState, RemediationKind, RootContent,
    Screen,
};
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Creates the presentation router, mounted at `/api/presentation`.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(get_presentation))
        .route("/commands", get(get_commands))
}

/// Creates the screens router, mounted at `/api/screens`.
pub fn screens_router() -> Router<SharedState> {
    Router::new()
        .route("/", post(show_screen))
        .route("/check-symptoms", post(check_symptoms))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Current presentation state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "root": "main",
    "overlay": "bluetooth_off",
    "main_child": { "screen": "status" },
    "overlays_presented": 1,
    "overlays_dismissed": 0,
    "latest_decision": 3,
    "observed_at_utc": "2025-01-15T03:30:00Z"
}))]
pub struct PresentationResponse {
    /// Mounted root, absent before the arbiter started.
    pub root: Option<RootContent>,

    /// Remediation overlay on screen.
    pub overlay: RemediationKind,

    /// Child of the main root.
    pub main_child: Option<Screen>,

    /// Overlays presented this session.
    #[schema(example = 1)]
    pub overlays_presented: u32,

    /// Overlays dismissed this session.
    #[schema(example = 0)]
    pub overlays_dismissed: u32,

    /// Sequence number of the latest decision run, when known.
    #[schema(example = 3)]
    pub latest_decision: Option<u64>,

    /// When this state was read.
    #[schema(example = "2025-01-15T03:30:00Z")]
    pub observed_at_utc: String,
}

impl PresentationResponse {
    fn new(state: PresentationState, latest_decision: Option<u64>) -> Self {
        Self {
            root: state.root,
            overlay: state.overlay,
            main_child: state.main_child,
            overlays_presented: state.overlays_presented,
            overlays_dismissed: state.overlays_dismissed,
            latest_decision,
            observed_at_utc: Utc::now().to_rfc3339(),
        }
    }
}

/// Commands received by the presentation sink, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandLogResponse {
    /// Commands in arrival order.
    pub commands: Vec<PresentationCommand>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current presentation state.
#[utoipa::path(
    get,
    path = "/api/presentation",
    tag = "presentation",
    operation_id = "getPresentation",
    summary = "Get presentation state",
    description = "Returns the root content, the remediation overlay, and the \
        main child as currently rendered. Does not wait for pending triggers.",
    responses(
        (status = 200, description = "Current state", body = PresentationResponse)
    )
)]
pub async fn get_presentation(State(state): State<SharedState>) -> Json<PresentationResponse> {
    Json(PresentationResponse::new(state.sink().state(), None))
}

/// Get the command log of the presentation sink.
#[utoipa::path(
    get,
    path = "/api/presentation/commands",
    tag = "presentation",
    operation_id = "getPresentationCommands",
    summary = "Get presentation command log",
    description = "Returns every command the arbiter issued to the view layer, \
        in order. Repeated identical triggers never add entries.",
    responses(
        (status = 200, description = "Command log", body = CommandLogResponse)
    )
)]
pub async fn get_commands(State(state): State<SharedState>) -> Json<CommandLogResponse> {
    Json(CommandLogResponse {
        commands: state.sink().commands(),
    })
}

/// Show a screen in the main flow.
#[utoipa::path(
    post,
    path = "/api/screens",
    tag = "presentation",
    operation_id = "showScreen",
    summary = "Show a screen",
    description = "Replaces the child of the main root. Rejected while \
        onboarding is still running.",
    request_body = Screen,
    responses(
        (status = 200, description = "Screen shown", body = PresentationResponse),
        (status = 409, description = "Onboarding still in progress"),
        (status = 503, description = "Arbiter not running")
    )
)]
pub async fn show_screen(
    State(state): State<SharedState>,
    Json(screen): Json<Screen>,
) -> ApiResult<Json<PresentationResponse>> {
    show(&state, screen).await
}

/// Run the "check symptoms" action of the status screen.
#[utoipa::path(
    post,
    path = "/api/screens/check-symptoms",
    tag = "presentation",
    operation_id = "checkSymptoms",
    summary = "Start checking symptoms",
    description = "Shows the symptom questionnaire selected by the \
        `new_self_diagnosis` feature flag.",
    responses(
        (status = 200, description = "Questionnaire shown", body = PresentationResponse),
        (status = 409, description = "Onboarding still in progress"),
        (status = 503, description = "Arbiter not running")
    )
)]
pub async fn check_symptoms(
    State(state): State<SharedState>,
) -> ApiResult<Json<PresentationResponse>> {
    let screen = check_symptoms_target(&state.config().features);
    show(&state, screen).await
}

// ============================================================================
// Helpers
// ============================================================================

async fn show(state: &SharedState, screen: Screen) -> ApiResult<Json<PresentationResponse>> {
    let name = screen.name();
    if !state.arbiter().show(screen).await? {
        return Err(ApiError::Conflict {
            error_code: "onboarding_in_progress".to_string(),
            message: "Screens can only be shown once onboarding is complete".to_string(),
        });
    }
    info!(screen = name, "Screen shown");
    settled(state).await.map(Json)
}

/// Wait for the arbiter to go idle, then read the rendered state.
pub(crate) async fn settled(state: &SharedState) -> ApiResult<PresentationResponse> {
    let status = state.arbiter().quiesce().await?;
    Ok(PresentationResponse::new(
        state.sink().state(),
        Some(status.latest_token.sequence()),
    ))
}
