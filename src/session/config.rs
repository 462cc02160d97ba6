use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Opaque identifier of the interviewing agent
    pub agent_id: String,

    /// Pre-session countdown before the agent is connected
    /// Default: 3 seconds
    pub countdown: Duration,

    /// Hard cap on the active interview
    /// Default: 10 minutes
    pub max_duration: Duration,

    /// How often the recorder emits a chunk
    pub chunk_interval: Duration,

    /// How long the error latch stays set after a failure, absorbing
    /// straggler events from torn-down subsystems
    pub error_cooldown: Duration,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            agent_id: String::new(),
            countdown: Duration::from_secs(3),
            max_duration: Duration::from_secs(600), // 10 minutes
            chunk_interval: Duration::from_millis(1000),
            error_cooldown: Duration::from_millis(1000),
        }
    }
}
