use async_trait::async_trait;
use thiserror::Error;

use super::stream::MediaStream;

/// Typed device acquisition failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device constraints could not be satisfied: {0}")]
    ConstraintUnsatisfied(String),
}

/// Camera/microphone access
///
/// Implementations:
/// - `SyntheticDevices`: generated test-pattern tracks
/// - test fakes scripting permission prompts and failures
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request a video-only stream for the live preview
    async fn request_video(&self) -> Result<MediaStream, MediaError>;

    /// Request the combined audio+video stream
    async fn request_audio_video(&self) -> Result<MediaStream, MediaError>;

    /// Release a stream, stopping all of its tracks
    fn release(&self, stream: MediaStream) {
        stream.stop_all();
    }

    /// Get device backend name for logging
    fn name(&self) -> &str;
}
