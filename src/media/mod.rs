//! Media Device Gateway
//!
//! Camera and microphone acquisition happens in two stages: a video-only
//! preview first, then the combined audio+video stream that supersedes it.
//! Streams are move-only handles, so each one is released exactly once.

pub mod devices;
pub mod gateway;
pub mod stream;
pub mod synthetic;

pub use devices::{MediaDevices, MediaError};
pub use gateway::{MediaEvent, MediaGateway};
pub use stream::{MediaStream, MediaTrack, StreamKind, TrackKind};
pub use synthetic::SyntheticDevices;
