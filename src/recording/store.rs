use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::buffer::RecordingArtifact;
use super::recorder::RecordingError;

/// Writes assembled artifacts to a recordings directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create recordings directory: {:?}", dir))?;

        info!("Artifact store initialized at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the artifact as `<attempt_id>.<ext>`
    pub async fn save(
        &self,
        attempt_id: Uuid,
        artifact: &RecordingArtifact,
    ) -> Result<PathBuf, RecordingError> {
        let extension = artifact
            .mime_type
            .split('/')
            .nth(1)
            .and_then(|sub| sub.split(';').next())
            .filter(|ext| !ext.is_empty())
            .unwrap_or("bin");
        let path = self.dir.join(format!("{}.{}", attempt_id, extension));

        tokio::fs::write(&path, artifact.bytes()).await?;
        info!("Saved recording ({} bytes) to {}", artifact.size(), path.display());

        Ok(path)
    }
}
