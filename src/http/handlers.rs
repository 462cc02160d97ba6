use super::state::AppState;
use crate::session::{SessionSnapshot, SessionStage};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub action: String,
    pub stage: SessionStage,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub stage: SessionStage,
    pub utterance_count: usize,
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn accepted(action: &str, snapshot: SessionSnapshot) -> axum::response::Response {
    (
        StatusCode::ACCEPTED,
        Json(ActionResponse {
            action: action.to_string(),
            stage: snapshot.stage,
            message: format!("{} queued", action),
        }),
    )
        .into_response()
}

fn unavailable(action: &str, e: anyhow::Error) -> axum::response::Response {
    error!("Failed to queue {}: {:#}", action, e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: format!("Failed to queue {}: {}", action, e),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interview/consent
/// Accept consent and start a new attempt (no-op if one is starting)
pub async fn accept_consent(State(state): State<AppState>) -> impl IntoResponse {
    info!("Consent received");
    match state.session.accept_consent().await {
        Ok(()) => accepted("consent", state.session.snapshot()),
        Err(e) => unavailable("consent", e),
    }
}

/// POST /interview/finish
/// Finish the live interview (no-op unless active)
pub async fn finish_interview(State(state): State<AppState>) -> impl IntoResponse {
    info!("Finish requested");
    match state.session.finish().await {
        Ok(()) => accepted("finish", state.session.snapshot()),
        Err(e) => unavailable("finish", e),
    }
}

/// POST /interview/retry
/// Start over after feedback, or dismiss the error overlay
pub async fn retry(State(state): State<AppState>) -> impl IntoResponse {
    info!("Retry requested");
    match state.session.retry().await {
        Ok(()) => accepted("retry", state.session.snapshot()),
        Err(e) => unavailable("retry", e),
    }
}

/// GET /interview/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot()))
}

/// GET /interview/transcript
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session.snapshot();
    (
        StatusCode::OK,
        Json(TranscriptResponse {
            stage: snapshot.stage,
            utterance_count: snapshot.utterance_count,
            transcript: snapshot.transcript,
        }),
    )
}

/// GET /interview/feedback
/// Feedback report once the attempt reached the feedback stage
pub async fn get_feedback(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.snapshot().feedback {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No feedback available yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
