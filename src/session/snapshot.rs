use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::stage::{FinalizeReason, SessionGuards, SessionStage};
use crate::analysis::FeedbackReport;
use crate::channel::ChannelStatus;
use crate::error::Notification;

/// Observable state of the session controller
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Current attempt
    pub attempt_id: Uuid,

    /// When the current attempt started
    pub started_at: DateTime<Utc>,

    pub stage: SessionStage,

    pub guards: SessionGuards,

    pub channel_status: ChannelStatus,

    /// Media streams currently held (0..=2)
    pub held_streams: usize,

    /// Timers currently armed
    pub armed_timers: usize,

    /// Number of recorder chunks buffered this attempt
    pub chunks_recorded: usize,

    /// Bytes buffered this attempt
    pub bytes_recorded: usize,

    /// Speaker-labeled transcript so far
    pub transcript: String,

    pub utterance_count: usize,

    /// Artifacts submitted for analysis this attempt (0 or 1)
    pub submissions: usize,

    pub finalize_reason: Option<FinalizeReason>,

    /// Error overlay, if the last attempt failed
    pub notification: Option<Notification>,

    pub feedback: Option<FeedbackReport>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            attempt_id: Uuid::nil(),
            started_at: Utc::now(),
            stage: SessionStage::Consent,
            guards: SessionGuards::default(),
            channel_status: ChannelStatus::Disconnected,
            held_streams: 0,
            armed_timers: 0,
            chunks_recorded: 0,
            bytes_recorded: 0,
            transcript: String::new(),
            utterance_count: 0,
            submissions: 0,
            finalize_reason: None,
            notification: None,
            feedback: None,
        }
    }
}

/// A stage change, broadcast to observers in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTransition {
    pub from: SessionStage,
    pub to: SessionStage,
    pub at: tokio::time::Instant,
}
