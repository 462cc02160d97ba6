//! Feedback/Analysis Service client
//!
//! The analysis service is an opaque request/response collaborator: it takes
//! the recorded artifact plus the transcript and returns a structured report.

mod client;
mod report;

pub use client::{AnalysisError, AnalysisService, HttpAnalysisClient};
pub use report::{AnalysisRequest, FeedbackReport};
