use serde::Serialize;
use std::fmt;

/// Where the current attempt is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    #[default]
    Consent,
    AcquiringMedia,
    Countdown,
    Active,
    Finalizing,
    Submitting,
    Feedback,
    ErrorReset,
}

impl SessionStage {
    /// Feedback stays put until a new attempt is explicitly started
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStage::Feedback)
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Single-flight latches consulted by every state-changing entry point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionGuards {
    /// Set from consent until the agent reports connected (or the attempt fails)
    pub starting_in_progress: bool,
    /// Set while an error is being handled, until the cooldown elapses
    pub error_in_progress: bool,
    /// Set while the interview is live
    pub interview_active: bool,
}

/// Why an active interview was finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeReason {
    UserFinished,
    MaxDuration,
    AgentDisconnected,
    AgentError,
    RecorderError,
    RecorderStopped,
}

impl fmt::Display for FinalizeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FinalizeReason::UserFinished => "finished by candidate",
            FinalizeReason::MaxDuration => "maximum duration reached",
            FinalizeReason::AgentDisconnected => "agent disconnected",
            FinalizeReason::AgentError => "agent error",
            FinalizeReason::RecorderError => "recorder error",
            FinalizeReason::RecorderStopped => "recorder stopped",
        };
        f.write_str(reason)
    }
}
