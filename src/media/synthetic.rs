// Synthetic capture devices producing test-pattern tracks

use async_trait::async_trait;
use tracing::info;

use super::devices::{MediaDevices, MediaError};
use super::stream::{MediaStream, MediaTrack, StreamKind, TrackKind};

/// Devices that always grant access and hand out generated tracks
///
/// Used by the binary when no hardware backend is wired in, and by tests.
#[derive(Debug, Clone)]
pub struct SyntheticDevices {
    camera_label: String,
    microphone_label: String,
}

impl SyntheticDevices {
    pub fn new(camera_label: impl Into<String>, microphone_label: impl Into<String>) -> Self {
        Self {
            camera_label: camera_label.into(),
            microphone_label: microphone_label.into(),
        }
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new("Synthetic Camera", "Synthetic Microphone")
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn request_video(&self) -> Result<MediaStream, MediaError> {
        info!("Granting synthetic video stream ({})", self.camera_label);
        Ok(MediaStream::new(
            StreamKind::VideoPreview,
            vec![MediaTrack::new(TrackKind::Video, self.camera_label.clone())],
        ))
    }

    async fn request_audio_video(&self) -> Result<MediaStream, MediaError> {
        info!(
            "Granting synthetic audio+video stream ({}, {})",
            self.camera_label, self.microphone_label
        );
        Ok(MediaStream::new(
            StreamKind::Combined,
            vec![
                MediaTrack::new(TrackKind::Video, self.camera_label.clone()),
                MediaTrack::new(TrackKind::Audio, self.microphone_label.clone()),
            ],
        ))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
