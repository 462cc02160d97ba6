use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use super::report::{AnalysisRequest, FeedbackReport};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response from analysis service: {0}")]
    InvalidResponse(String),
}

/// Single request/response analysis call
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<FeedbackReport, AnalysisError>;
}

/// Analysis service reached over HTTP
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<FeedbackReport, AnalysisError> {
        info!(
            "Submitting interview for analysis ({} transcript chars)",
            request.transcript_text.len()
        );

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Analysis service returned {}: {}", status, message);
            return Err(AnalysisError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<FeedbackReport>(&body)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
    }
}
