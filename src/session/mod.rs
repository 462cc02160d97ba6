//! Interview session management
//!
//! This module provides the `SessionController` state machine that manages:
//! - Consent, staged media acquisition and the pre-session countdown
//! - The realtime agent channel and the recording pipeline while active
//! - The max-duration deadline and transcript aggregation
//! - Finalization, submission for analysis and the feedback result
//! - Idempotent, reentrancy-guarded error handling and teardown

mod config;
mod controller;
mod events;
mod handle;
mod snapshot;
mod stage;
mod timer;
mod transcript;

pub use config::InterviewConfig;
pub use controller::{SessionComponents, SessionController};
pub use events::{Epoch, SessionEvent, UserAction};
pub use handle::SessionHandle;
pub use snapshot::{SessionSnapshot, StageTransition};
pub use stage::{FinalizeReason, SessionGuards, SessionStage};
pub use timer::{SessionTimers, TimerKind};
pub use transcript::{TranscriptAggregator, TranscriptLine};
