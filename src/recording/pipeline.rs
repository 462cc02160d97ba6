use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::buffer::{ChunkBuffer, RecordingArtifact};
use super::recorder::{MediaRecorder, RecorderEvent, RecordingError};
use crate::media::MediaStream;
use crate::session::{Epoch, SessionEvent};

/// Recorder events as seen by the session controller
#[derive(Debug)]
pub enum RecordingEvent {
    /// A chunk was buffered
    Chunk { size: usize, total_bytes: usize },
    /// The recorder device failed mid-recording
    DeviceError(String),
    /// Emitted exactly once per start, after every chunk has been flushed
    Assembled(Result<RecordingArtifact, RecordingError>),
}

/// Drives a recorder device and assembles its chunks
pub struct RecordingPipeline {
    recorder: Box<dyn MediaRecorder>,
    chunk_interval: Duration,
    running: bool,
    /// Set from a successful device start until the device is told to stop
    device_armed: bool,
    forward_task: Option<JoinHandle<()>>,
}

impl RecordingPipeline {
    pub fn new(recorder: Box<dyn MediaRecorder>, chunk_interval: Duration) -> Self {
        Self {
            recorder,
            chunk_interval,
            running: false,
            device_armed: false,
            forward_task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start recording the combined stream. Fails fast if it is absent.
    pub async fn start(
        &mut self,
        stream: Option<&MediaStream>,
        epoch: Epoch,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<(), RecordingError> {
        let stream = stream.ok_or(RecordingError::StreamUnavailable)?;
        if self.running {
            return Err(RecordingError::AlreadyRecording);
        }

        info!(
            "Starting {} recorder on stream {} ({}ms chunks)",
            self.recorder.name(),
            stream.id(),
            self.chunk_interval.as_millis()
        );

        let device_rx = self.recorder.start(stream, self.chunk_interval).await?;
        self.running = true;
        self.device_armed = true;
        self.forward_task = Some(tokio::spawn(forward_chunks(device_rx, epoch, events)));

        Ok(())
    }

    /// Ask the device to flush and stop. `Assembled` follows once the
    /// remaining chunks have arrived.
    pub async fn stop(&mut self) {
        if !self.running {
            debug!("Recorder not running, nothing to stop");
            return;
        }
        self.running = false;

        info!("Stopping {} recorder", self.recorder.name());
        self.stop_device().await;
    }

    /// Stop the device and discard whatever has been buffered
    pub async fn abort(&mut self) {
        self.running = false;
        self.stop_device().await;
        if let Some(task) = self.forward_task.take() {
            task.abort();
            debug!("Discarded buffered recording");
        }
    }

    /// Mark the pipeline idle after the artifact has been delivered.
    /// A device that stopped on its own is still told to stop so it can
    /// be started again.
    pub async fn finished(&mut self) {
        self.running = false;
        self.forward_task = None;
        self.stop_device().await;
    }

    async fn stop_device(&mut self) {
        if !self.device_armed {
            return;
        }
        self.device_armed = false;

        if let Err(e) = self.recorder.stop().await {
            warn!("{} recorder stop failed: {}", self.recorder.name(), e);
        }
    }
}

async fn forward_chunks(
    mut device_rx: mpsc::Receiver<RecorderEvent>,
    epoch: Epoch,
    events: mpsc::Sender<SessionEvent>,
) {
    let mut buffer = ChunkBuffer::new();

    loop {
        match device_rx.recv().await {
            Some(RecorderEvent::Data(chunk)) => {
                let size = chunk.len();
                buffer.push(chunk);
                let event = RecordingEvent::Chunk {
                    size,
                    total_bytes: buffer.total_bytes(),
                };
                if events.send(SessionEvent::Recording { epoch, event }).await.is_err() {
                    debug!("Controller gone, dropping recording");
                    return;
                }
            }
            Some(RecorderEvent::Error(message)) => {
                error!("Recorder device error: {}", message);
                let event = RecordingEvent::DeviceError(message);
                if events.send(SessionEvent::Recording { epoch, event }).await.is_err() {
                    return;
                }
            }
            Some(RecorderEvent::Stopped) => break,
            None => {
                warn!("Recorder closed without a stop event, assembling what was buffered");
                break;
            }
        }
    }

    let result = buffer.assemble();
    match &result {
        Ok(artifact) => info!(
            "Recording assembled: {} chunks, {} bytes",
            artifact.chunk_count,
            artifact.size()
        ),
        Err(e) => warn!("Recording assembly failed: {}", e),
    }

    let _ = events
        .send(SessionEvent::Recording {
            epoch,
            event: RecordingEvent::Assembled(result),
        })
        .await;
}
