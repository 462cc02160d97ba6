//! Error taxonomy for an interview attempt.
//!
//! Component errors (`MediaError`, `RecordingError`, `ChannelError`,
//! `AnalysisError`) live next to their components. Everything that can end an
//! attempt is funneled into a [`SessionError`], which maps onto one
//! user-visible [`ErrorCategory`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::channel::ChannelError;
use crate::media::MediaError;
use crate::recording::RecordingError;

/// Errors that abort an interview attempt
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Media permission error: {0}")]
    Permission(MediaError),

    #[error("Media device error: {0}")]
    DeviceConstraint(MediaError),

    #[error("Failed to connect to interview agent: {0}")]
    ChannelConnect(String),

    #[error("Interview agent disconnected unexpectedly")]
    ChannelUnexpectedDisconnect,

    #[error("Recording device error: {0}")]
    RecordingDevice(String),

    #[error("Recording produced an empty artifact")]
    EmptyArtifact,

    #[error("Analysis service error: {0}")]
    AnalysisService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failure category shown on the error overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Permission,
    Device,
    Connection,
    Recording,
    Analysis,
    Configuration,
}

impl SessionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::Permission(_) => ErrorCategory::Permission,
            SessionError::DeviceConstraint(_) => ErrorCategory::Device,
            SessionError::ChannelConnect(_) | SessionError::ChannelUnexpectedDisconnect => {
                ErrorCategory::Connection
            }
            SessionError::RecordingDevice(_) | SessionError::EmptyArtifact => {
                ErrorCategory::Recording
            }
            SessionError::AnalysisService(_) => ErrorCategory::Analysis,
            SessionError::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

impl From<MediaError> for SessionError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::PermissionDenied(_) => SessionError::Permission(err),
            MediaError::CameraUnavailable(_)
            | MediaError::MicrophoneUnavailable(_)
            | MediaError::ConstraintUnsatisfied(_) => SessionError::DeviceConstraint(err),
        }
    }
}

impl From<RecordingError> for SessionError {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::EmptyArtifact => SessionError::EmptyArtifact,
            other => SessionError::RecordingDevice(other.to_string()),
        }
    }
}

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        SessionError::ChannelConnect(err.to_string())
    }
}

impl From<AnalysisError> for SessionError {
    fn from(err: AnalysisError) -> Self {
        SessionError::AnalysisService(err.to_string())
    }
}

/// Blocking overlay content for a failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub category: ErrorCategory,
    pub title: String,
    pub message: String,
    /// Label of the single recovery action
    pub action: String,
}

impl From<&SessionError> for Notification {
    fn from(err: &SessionError) -> Self {
        let title = match err.category() {
            ErrorCategory::Permission => "Camera or microphone access denied",
            ErrorCategory::Device => "Camera or microphone unavailable",
            ErrorCategory::Connection => "Lost connection to the interviewer",
            ErrorCategory::Recording => "Recording failed",
            ErrorCategory::Analysis => "Could not analyze your interview",
            ErrorCategory::Configuration => "Interview is not configured",
        };

        Self {
            category: err.category(),
            title: title.to_string(),
            message: err.to_string(),
            action: "Try Again".to_string(),
        }
    }
}
