use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Kind of a single capture track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Which acquisition stage produced a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Video-only stream used for the live preview
    VideoPreview,
    /// Audio+video stream used for both preview and recording
    Combined,
}

/// A live capture track (camera or microphone)
#[derive(Debug)]
pub struct MediaTrack {
    id: Uuid,
    kind: TrackKind,
    label: String,
    live: AtomicBool,
    stop_calls: AtomicUsize,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            live: AtomicBool::new(true),
            stop_calls: AtomicUsize::new(0),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop the track on behalf of its owner. Returns whether it was still live.
    pub fn stop(&self) -> bool {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.live.swap(false, Ordering::SeqCst)
    }

    /// Mark the track as ended by the device (unplugged, revoked, ...)
    pub fn end(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    /// Number of times the owner stopped this track
    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

/// An acquired capture stream
///
/// Not `Clone`: the holder owns the underlying device tracks. Releasing
/// consumes the stream; dropping one that was never released stops its tracks.
#[derive(Debug)]
pub struct MediaStream {
    id: Uuid,
    kind: StreamKind,
    tracks: Vec<Arc<MediaTrack>>,
    released: bool,
}

impl MediaStream {
    pub fn new(kind: StreamKind, tracks: Vec<Arc<MediaTrack>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            tracks,
            released: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn tracks(&self) -> &[Arc<MediaTrack>] {
        &self.tracks
    }

    pub fn has_track(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == kind)
    }

    /// True while every track is still delivering media
    pub fn is_live(&self) -> bool {
        !self.tracks.is_empty() && self.tracks.iter().all(|t| t.is_live())
    }

    /// Stop all tracks, consuming the stream
    pub fn stop_all(mut self) {
        self.stop_tracks();
    }

    fn stop_tracks(&mut self) {
        for track in &self.tracks {
            track.stop();
        }
        self.released = true;
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        if !self.released && self.tracks.iter().any(|t| t.is_live()) {
            warn!("Media stream {} dropped without release, stopping tracks", self.id);
            self.stop_tracks();
        }
    }
}
