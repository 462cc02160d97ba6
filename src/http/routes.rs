use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // User actions
        .route("/interview/consent", post(handlers::accept_consent))
        .route("/interview/finish", post(handlers::finish_interview))
        .route("/interview/retry", post(handlers::retry))
        // Session queries
        .route("/interview/status", get(handlers::get_status))
        .route("/interview/transcript", get(handlers::get_transcript))
        .route("/interview/feedback", get(handlers::get_feedback))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
