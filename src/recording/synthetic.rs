// Synthetic recorder producing fixed-size chunks on an interval

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::recorder::{MediaRecorder, RecorderEvent, RecordingError};
use crate::media::{MediaStream, MediaTrack, TrackKind};

/// Recorder that emits `chunk_size` bytes per interval while the stream is live
///
/// If any track of the stream ends, it reports a device error, flushes and stops.
pub struct SyntheticRecorder {
    chunk_size: usize,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SyntheticRecorder {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            stop_tx: None,
        }
    }
}

impl Default for SyntheticRecorder {
    fn default() -> Self {
        Self::new(16 * 1024)
    }
}

#[async_trait]
impl MediaRecorder for SyntheticRecorder {
    async fn start(
        &mut self,
        stream: &MediaStream,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<RecorderEvent>, RecordingError> {
        if self.stop_tx.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        if !stream.has_track(TrackKind::Audio) || !stream.has_track(TrackKind::Video) {
            return Err(RecordingError::Device(
                "stream must carry both audio and video tracks".to_string(),
            ));
        }
        if !stream.is_live() {
            return Err(RecordingError::Device("stream has ended".to_string()));
        }

        let (tx, rx) = mpsc::channel(100);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);

        let tracks: Vec<Arc<MediaTrack>> = stream.tracks().to_vec();
        let chunk_size = self.chunk_size;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(chunk_interval);
            ticker.tick().await; // first tick completes immediately
            let mut sequence: u8 = 0;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        let _ = tx.send(RecorderEvent::Data(vec![sequence; chunk_size])).await;
                        break;
                    }
                    _ = ticker.tick() => {
                        if tracks.iter().any(|t| !t.is_live()) {
                            warn!("Synthetic recorder lost a track");
                            let _ = tx
                                .send(RecorderEvent::Error("capture track ended".to_string()))
                                .await;
                            break;
                        }
                        if tx.send(RecorderEvent::Data(vec![sequence; chunk_size])).await.is_err() {
                            return;
                        }
                        sequence = sequence.wrapping_add(1);
                    }
                }
            }

            let _ = tx.send(RecorderEvent::Stopped).await;
            info!("Synthetic recorder stopped");
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), RecordingError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already have exited after a device error
            let _ = stop_tx.send(());
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
