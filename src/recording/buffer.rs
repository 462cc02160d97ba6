use serde::Serialize;
use tracing::debug;

use super::recorder::RecordingError;

/// The assembled recording for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingArtifact {
    #[serde(skip)]
    bytes: Vec<u8>,
    pub chunk_count: usize,
    pub mime_type: String,
}

impl RecordingArtifact {
    pub const DEFAULT_MIME_TYPE: &'static str = "video/webm";

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Ordered chunk accumulator
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Zero-length chunks are skipped.
    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            debug!("Skipping zero-length chunk");
            return;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Concatenate buffered chunks in arrival order and clear the buffer
    pub fn assemble(&mut self) -> Result<RecordingArtifact, RecordingError> {
        let chunk_count = self.chunks.len();
        let mut bytes = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;

        if bytes.is_empty() {
            return Err(RecordingError::EmptyArtifact);
        }

        Ok(RecordingArtifact {
            bytes,
            chunk_count,
            mime_type: RecordingArtifact::DEFAULT_MIME_TYPE.to_string(),
        })
    }
}
