use crate::analysis::{AnalysisError, FeedbackReport};
use crate::channel::ChannelEvent;
use crate::media::MediaEvent;
use crate::recording::RecordingEvent;

use super::timer::TimerKind;

/// Attempt generation. Bumped on every new attempt and every teardown so
/// events from torn-down subsystems can be recognized and dropped.
pub type Epoch = u64;

/// User-initiated actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    AcceptConsent,
    FinishInterview,
    Retry,
    /// Dispose the controller
    Shutdown,
}

/// One message in the controller's event queue
#[derive(Debug)]
pub enum SessionEvent {
    User(UserAction),
    Media { epoch: Epoch, event: MediaEvent },
    Timer { epoch: Epoch, kind: TimerKind },
    Channel { epoch: Epoch, event: ChannelEvent },
    Recording { epoch: Epoch, event: RecordingEvent },
    Analysis {
        epoch: Epoch,
        result: Result<FeedbackReport, AnalysisError>,
    },
}
