use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::{parse_agent_message, Utterance};
use super::transport::{AgentControl, AgentEvent, AgentSession, AgentTransport, ChannelError};
use crate::session::{Epoch, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Channel events as seen by the session controller
pub enum ChannelEvent {
    /// The remote session exists; the controller takes ownership of its control
    Opened(Box<dyn AgentControl>),
    ConnectFailed(ChannelError),
    Connected,
    Disconnected,
    Utterance(Utterance),
    Error(String),
}

impl fmt::Debug for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelEvent::Opened(_) => f.write_str("Opened"),
            ChannelEvent::ConnectFailed(e) => f.debug_tuple("ConnectFailed").field(e).finish(),
            ChannelEvent::Connected => f.write_str("Connected"),
            ChannelEvent::Disconnected => f.write_str("Disconnected"),
            ChannelEvent::Utterance(u) => f.debug_tuple("Utterance").field(u).finish(),
            ChannelEvent::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}

/// How a disconnect should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectKind {
    /// Follows a programmatic close
    Intentional,
    Unexpected,
}

/// Adapter over the agent transport
///
/// Owns at most one remote session and at most one connect in flight.
pub struct VoiceChannel {
    transport: Arc<dyn AgentTransport>,
    status: ChannelStatus,
    control: Option<Box<dyn AgentControl>>,
    intentional_disconnect: bool,
}

impl VoiceChannel {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            transport,
            status: ChannelStatus::Disconnected,
            control: None,
            intentional_disconnect: false,
        }
    }

    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    pub fn has_session(&self) -> bool {
        self.control.is_some()
    }

    /// Connect in the background. Posts `Opened`, then forwards agent
    /// events until the remote side goes away.
    pub fn connect(
        &mut self,
        agent_id: &str,
        epoch: Epoch,
        session_tx: mpsc::Sender<SessionEvent>,
    ) -> Result<(), ChannelError> {
        if self.status != ChannelStatus::Disconnected || self.control.is_some() {
            return Err(ChannelError::AlreadyConnected);
        }

        self.status = ChannelStatus::Connecting;
        self.intentional_disconnect = false;

        let transport = Arc::clone(&self.transport);
        let agent_id = agent_id.to_string();

        tokio::spawn(async move {
            info!("Connecting to agent {} via {}", agent_id, transport.name());

            match transport.connect(&agent_id).await {
                Ok(session) => forward_agent_events(session, epoch, session_tx).await,
                Err(e) => {
                    warn!("Agent connect failed: {}", e);
                    let _ = session_tx
                        .send(SessionEvent::Channel {
                            epoch,
                            event: ChannelEvent::ConnectFailed(e),
                        })
                        .await;
                }
            }
        });

        Ok(())
    }

    /// Take ownership of the opened remote session
    pub fn attach(&mut self, control: Box<dyn AgentControl>) {
        self.control = Some(control);
    }

    pub fn mark_connected(&mut self) {
        self.status = ChannelStatus::Connected;
    }

    /// Record a disconnect. The intentional-disconnect flag is consumed.
    pub fn on_disconnected(&mut self) -> DisconnectKind {
        self.status = ChannelStatus::Disconnected;
        self.control = None;

        if self.intentional_disconnect {
            self.intentional_disconnect = false;
            DisconnectKind::Intentional
        } else {
            DisconnectKind::Unexpected
        }
    }

    /// Record a failed connect attempt
    pub fn on_connect_failed(&mut self) {
        self.status = ChannelStatus::Disconnected;
        self.control = None;
    }

    /// Close the channel programmatically. Marks the disconnect that follows
    /// as intentional. Close failures are logged, never raised.
    pub async fn close(&mut self) {
        if self.status == ChannelStatus::Disconnected && self.control.is_none() {
            debug!("Channel already closed");
            return;
        }

        self.intentional_disconnect = true;
        self.status = ChannelStatus::Disconnected;

        if let Some(control) = self.control.take() {
            info!("Closing agent session");
            if let Err(e) = control.close().await {
                warn!("Failed to close agent session: {}", e);
            }
        }
    }

    /// Forget per-attempt state
    pub fn reset(&mut self) {
        self.status = ChannelStatus::Disconnected;
        self.control = None;
        self.intentional_disconnect = false;
    }
}

async fn forward_agent_events(
    session: AgentSession,
    epoch: Epoch,
    session_tx: mpsc::Sender<SessionEvent>,
) {
    let AgentSession {
        session_id,
        events: mut agent_rx,
        control,
    } = session;

    info!("Agent session {} opened", session_id);

    let delivery = session_tx
        .send(SessionEvent::Channel {
            epoch,
            event: ChannelEvent::Opened(control),
        })
        .await;

    if let Err(mpsc::error::SendError(undelivered)) = delivery {
        debug!("Controller gone before agent session {} was delivered", session_id);
        if let SessionEvent::Channel {
            event: ChannelEvent::Opened(control),
            ..
        } = undelivered
        {
            if let Err(e) = control.close().await {
                warn!("Failed to close undelivered agent session: {}", e);
            }
        }
        return;
    }

    let mut disconnected = false;

    while let Some(agent_event) = agent_rx.recv().await {
        let event = match agent_event {
            AgentEvent::Connected => ChannelEvent::Connected,
            AgentEvent::Disconnected => {
                disconnected = true;
                ChannelEvent::Disconnected
            }
            AgentEvent::Message(payload) => match parse_agent_message(&payload) {
                Some(utterance) => ChannelEvent::Utterance(utterance),
                None => continue,
            },
            AgentEvent::Error(message) => ChannelEvent::Error(message),
        };

        if session_tx
            .send(SessionEvent::Channel { epoch, event })
            .await
            .is_err()
        {
            return;
        }

        if disconnected {
            break;
        }
    }

    if !disconnected {
        let _ = session_tx
            .send(SessionEvent::Channel {
                epoch,
                event: ChannelEvent::Disconnected,
            })
            .await;
    }

    info!("Agent session {} closed", session_id);
}
