use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::media::MediaStream;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Combined media stream is not available")]
    StreamUnavailable,

    #[error("Recorder is already running")]
    AlreadyRecording,

    #[error("Recorder device error: {0}")]
    Device(String),

    #[error("Recording produced an empty artifact")]
    EmptyArtifact,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw events emitted by a recorder device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// One encoded chunk
    Data(Vec<u8>),
    /// Mid-recording device failure; the device may still flush and stop
    Error(String),
    /// All chunks have been delivered
    Stopped,
}

/// Media recorder device trait
///
/// The recorder reads the combined stream but never owns it: it must not
/// stop the stream's tracks.
#[async_trait]
pub trait MediaRecorder: Send {
    /// Start recording `stream`, emitting one `Data` event per `chunk_interval`
    ///
    /// Returns a channel receiver that will receive recorder events. After
    /// `stop()`, remaining chunks are delivered followed by `Stopped`.
    async fn start(
        &mut self,
        stream: &MediaStream,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<RecorderEvent>, RecordingError>;

    /// Request the recorder to flush and stop
    async fn stop(&mut self) -> Result<(), RecordingError>;

    /// Check if the recorder is currently running
    fn is_recording(&self) -> bool;

    /// Get recorder name for logging
    fn name(&self) -> &str;
}
