use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::events::{Epoch, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Pre-session countdown; firing connects the agent
    Countdown,
    /// Max-duration cap; firing is equivalent to finishing the interview
    Deadline,
    /// Error latch cooldown; firing returns to consent
    ErrorCooldown,
}

/// Single-fire session timers
///
/// Each timer posts one `SessionEvent::Timer` when it elapses. The slot is
/// emptied when the fire is handled, so a timer cannot fire twice.
#[derive(Default)]
pub struct SessionTimers {
    countdown: Option<JoinHandle<()>>,
    deadline: Option<JoinHandle<()>>,
    cooldown: Option<JoinHandle<()>>,
}

impl SessionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<JoinHandle<()>> {
        match kind {
            TimerKind::Countdown => &mut self.countdown,
            TimerKind::Deadline => &mut self.deadline,
            TimerKind::ErrorCooldown => &mut self.cooldown,
        }
    }

    /// Arm a timer, replacing any previous one of the same kind
    pub fn arm(
        &mut self,
        kind: TimerKind,
        after: Duration,
        epoch: Epoch,
        events: mpsc::Sender<SessionEvent>,
    ) {
        self.clear(kind);
        debug!("Arming {:?} timer ({}ms)", kind, after.as_millis());

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(SessionEvent::Timer { epoch, kind }).await;
        });
        *self.slot(kind) = Some(handle);
    }

    /// Cancel a timer. Returns whether it was armed.
    pub fn clear(&mut self, kind: TimerKind) -> bool {
        match self.slot(kind).take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Consume a fire. Returns false if the timer was cleared in the meantime.
    pub fn fired(&mut self, kind: TimerKind) -> bool {
        self.slot(kind).take().is_some()
    }

    pub fn clear_all(&mut self) {
        for kind in [TimerKind::Countdown, TimerKind::Deadline, TimerKind::ErrorCooldown] {
            self.clear(kind);
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Countdown => self.countdown.is_some(),
            TimerKind::Deadline => self.deadline.is_some(),
            TimerKind::ErrorCooldown => self.cooldown.is_some(),
        }
    }

    pub fn armed_count(&self) -> usize {
        [TimerKind::Countdown, TimerKind::Deadline, TimerKind::ErrorCooldown]
            .into_iter()
            .filter(|kind| self.is_armed(*kind))
            .count()
    }
}

impl Drop for SessionTimers {
    fn drop(&mut self) {
        self.clear_all();
    }
}
