use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::devices::{MediaDevices, MediaError};
use super::stream::MediaStream;
use crate::session::{Epoch, SessionEvent};

/// Outcome of one acquisition stage
#[derive(Debug)]
pub enum MediaEvent {
    PreviewReady(MediaStream),
    CombinedReady(MediaStream),
    Failed(MediaError),
}

/// Streams currently held for the attempt
#[derive(Debug, Default)]
struct MediaHandles {
    preview: Option<MediaStream>,
    combined: Option<MediaStream>,
}

/// Owns the attempt's media streams and runs the staged acquisition
pub struct MediaGateway {
    devices: Arc<dyn MediaDevices>,
    handles: MediaHandles,
    /// Set on teardown so an in-flight acquisition skips its second stage
    cancel: Option<Arc<AtomicBool>>,
}

impl MediaGateway {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            handles: MediaHandles::default(),
            cancel: None,
        }
    }

    /// Start the two-stage acquisition in the background.
    ///
    /// Posts `PreviewReady`, then `CombinedReady`. If the preview request
    /// fails, the combined request is never made.
    pub fn acquire(&mut self, epoch: Epoch, events: mpsc::Sender<SessionEvent>) {
        if let Some(previous) = self.cancel.take() {
            previous.store(true, Ordering::SeqCst);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&cancel));
        let devices = Arc::clone(&self.devices);

        tokio::spawn(async move {
            info!("Requesting camera preview from {}", devices.name());

            let preview = match devices.request_video().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Camera preview request failed: {}", e);
                    let _ = events
                        .send(SessionEvent::Media {
                            epoch,
                            event: MediaEvent::Failed(e),
                        })
                        .await;
                    return;
                }
            };

            if let Err(e) = events
                .send(SessionEvent::Media {
                    epoch,
                    event: MediaEvent::PreviewReady(preview),
                })
                .await
            {
                debug!("Controller gone before preview delivery: {}", e);
                return;
            }

            if cancel.load(Ordering::SeqCst) {
                debug!("Acquisition cancelled before microphone request");
                return;
            }

            info!("Requesting camera + microphone from {}", devices.name());

            let event = match devices.request_audio_video().await {
                Ok(stream) => MediaEvent::CombinedReady(stream),
                Err(e) => {
                    warn!("Camera + microphone request failed: {}", e);
                    MediaEvent::Failed(e)
                }
            };

            let _ = events.send(SessionEvent::Media { epoch, event }).await;
        });
    }

    /// Store the preview stream, releasing any stream it replaces first
    pub fn store_preview(&mut self, stream: MediaStream) {
        if let Some(old) = self.handles.preview.take() {
            self.release(old);
        }
        info!("Preview stream {} is live", stream.id());
        self.handles.preview = Some(stream);
    }

    /// Store the combined stream. It supersedes the preview binding and
    /// drives the preview from now on, so the video-only stream is released.
    pub fn store_combined(&mut self, stream: MediaStream) {
        if let Some(old) = self.handles.combined.take() {
            self.release(old);
        }
        if let Some(preview) = self.handles.preview.take() {
            self.release(preview);
        }
        info!("Combined stream {} is live", stream.id());
        self.handles.combined = Some(stream);
    }

    pub fn combined(&self) -> Option<&MediaStream> {
        self.handles.combined.as_ref()
    }

    /// Stream currently feeding the live preview
    pub fn preview_source(&self) -> Option<&MediaStream> {
        self.handles
            .combined
            .as_ref()
            .or(self.handles.preview.as_ref())
    }

    /// Number of streams held (0..=2)
    pub fn held_count(&self) -> usize {
        self.handles.preview.is_some() as usize + self.handles.combined.is_some() as usize
    }

    /// Release a stream that is not (or no longer) held
    pub fn release(&self, stream: MediaStream) {
        info!("Releasing {:?} stream {}", stream.kind(), stream.id());
        self.devices.release(stream);
    }

    /// Release everything held and cancel any in-flight acquisition.
    /// Returns the number of streams released.
    pub fn release_all(&mut self) -> usize {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
        }

        let mut released = 0;
        if let Some(stream) = self.handles.preview.take() {
            self.release(stream);
            released += 1;
        }
        if let Some(stream) = self.handles.combined.take() {
            self.release(stream);
            released += 1;
        }
        released
    }
}

impl Drop for MediaGateway {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            warn!("Media gateway dropped while holding {} stream(s)", released);
        }
    }
}
