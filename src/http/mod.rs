//! HTTP API for driving an interview session
//!
//! This module provides a REST API for the user actions and session state:
//! - POST /interview/consent - Accept consent and start an attempt
//! - POST /interview/finish - Finish the live interview
//! - POST /interview/retry - Start over / dismiss the error overlay
//! - GET /interview/status - Query the session snapshot
//! - GET /interview/transcript - Get the transcript so far
//! - GET /interview/feedback - Get the feedback report
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
