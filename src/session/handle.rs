use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, watch};

use super::events::{SessionEvent, UserAction};
use super::snapshot::{SessionSnapshot, StageTransition};

/// Cloneable front door to a running `SessionController`
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    snapshot: watch::Receiver<SessionSnapshot>,
    transitions: broadcast::Sender<StageTransition>,
}

impl SessionHandle {
    pub(super) fn new(
        events: mpsc::Sender<SessionEvent>,
        snapshot: watch::Receiver<SessionSnapshot>,
        transitions: broadcast::Sender<StageTransition>,
    ) -> Self {
        Self {
            events,
            snapshot,
            transitions,
        }
    }

    async fn send(&self, action: UserAction) -> Result<()> {
        self.events
            .send(SessionEvent::User(action))
            .await
            .with_context(|| format!("Session controller stopped, dropped {:?}", action))
    }

    pub async fn accept_consent(&self) -> Result<()> {
        self.send(UserAction::AcceptConsent).await
    }

    pub async fn finish(&self) -> Result<()> {
        self.send(UserAction::FinishInterview).await
    }

    pub async fn retry(&self) -> Result<()> {
        self.send(UserAction::Retry).await
    }

    /// Tear everything down and stop the controller
    pub async fn shutdown(&self) -> Result<()> {
        self.send(UserAction::Shutdown).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to stage changes from now on
    pub fn transitions(&self) -> broadcast::Receiver<StageTransition> {
        self.transitions.subscribe()
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_until<F>(&self, mut predicate: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .context("Session controller stopped")?;
        Ok(snapshot.clone())
    }
}
