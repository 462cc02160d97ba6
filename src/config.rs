use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::session::InterviewConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub interview: InterviewSettings,
    pub agent: AgentConfig,
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub recordings: RecordingsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct InterviewSettings {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,
    #[serde(default = "default_error_cooldown_ms")]
    pub error_cooldown_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    pub nats_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    pub endpoint: String,
    #[serde(default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordingsConfig {
    /// Directory for saved artifacts; unset disables saving
    pub path: Option<String>,
}

fn default_countdown_secs() -> u64 {
    3
}

fn default_max_duration_secs() -> u64 {
    600
}

fn default_chunk_interval_ms() -> u64 {
    1000
}

fn default_error_cooldown_ms() -> u64 {
    1000
}

fn default_analysis_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Load from `path` (any format the `config` crate understands), with
    /// `INTERVIEW__<SECTION>__<KEY>` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("INTERVIEW").separator("__"))
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn interview_config(&self) -> InterviewConfig {
        InterviewConfig {
            agent_id: self.interview.agent_id.clone(),
            countdown: Duration::from_secs(self.interview.countdown_secs),
            max_duration: Duration::from_secs(self.interview.max_duration_secs),
            chunk_interval: Duration::from_millis(self.interview.chunk_interval_ms),
            error_cooldown: Duration::from_millis(self.interview.error_cooldown_ms),
        }
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis.timeout_secs)
    }
}
