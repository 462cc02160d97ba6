use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::recording::RecordingArtifact;

/// Payload submitted to the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Recorded video as a base64 data URL
    pub video_data: String,
    pub transcript_text: String,
}

impl AnalysisRequest {
    pub fn new(artifact: &RecordingArtifact, transcript_text: impl Into<String>) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(artifact.bytes());
        Self {
            video_data: format!("data:{};base64,{}", artifact.mime_type, encoded),
            transcript_text: transcript_text.into(),
        }
    }
}

/// Structured interview feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub overall_assessment: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    pub communication_clarity: String,
    pub recommendation: String,
}
