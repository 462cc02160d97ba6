//! Recording Pipeline
//!
//! A [`MediaRecorder`] device emits encoded chunks for the combined stream.
//! [`RecordingPipeline`] forwards them into the session event queue, buffers
//! them in arrival order and assembles exactly one [`RecordingArtifact`] once
//! the device has flushed after `stop()`.

pub mod buffer;
pub mod pipeline;
pub mod recorder;
pub mod store;
pub mod synthetic;

pub use buffer::{ChunkBuffer, RecordingArtifact};
pub use pipeline::{RecordingEvent, RecordingPipeline};
pub use recorder::{MediaRecorder, RecorderEvent, RecordingError};
pub use store::ArtifactStore;
pub use synthetic::SyntheticRecorder;
