use async_trait::async_trait;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use super::transport::{AgentControl, AgentEvent, AgentSession, AgentTransport, ChannelError};

/// Session start request published to the agent
#[derive(Debug, Serialize, Deserialize)]
struct SessionStartMessage {
    session_id: String,
    agent_id: String,
    events_subject: String,
    timestamp: String, // RFC3339 timestamp
}

/// Session end notice published on close
#[derive(Debug, Serialize, Deserialize)]
struct SessionEndMessage {
    session_id: String,
    timestamp: String,
}

/// Lifecycle messages the agent publishes on the events subject
#[derive(Debug, Deserialize)]
struct LifecycleMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
}

/// Agent transport over NATS
///
/// Subjects:
/// - `agent.<agent_id>.session.start`: session start request
/// - `agent.<agent_id>.session.<session_id>.events`: agent events
/// - `agent.<agent_id>.session.<session_id>.end`: session end notice
pub struct NatsAgentTransport {
    url: String,
}

impl NatsAgentTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl AgentTransport for NatsAgentTransport {
    async fn connect(&self, agent_id: &str) -> Result<AgentSession, ChannelError> {
        info!("Connecting to NATS at {}", self.url);

        let client = async_nats::connect(&self.url)
            .await
            .map_err(|e| ChannelError::Connect(format!("NATS connect failed: {}", e)))?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let events_subject = format!("agent.{}.session.{}.events", agent_id, session_id);

        let mut subscriber = client
            .subscribe(events_subject.clone())
            .await
            .map_err(|e| ChannelError::Connect(format!("Failed to subscribe: {}", e)))?;

        let start = SessionStartMessage {
            session_id: session_id.clone(),
            agent_id: agent_id.to_string(),
            events_subject: events_subject.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let payload = serde_json::to_vec(&start)
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        client
            .publish(format!("agent.{}.session.start", agent_id), payload.into())
            .await
            .map_err(|e| ChannelError::Connect(format!("Failed to request session: {}", e)))?;
        client
            .flush()
            .await
            .map_err(|e| ChannelError::Connect(format!("Failed to flush: {}", e)))?;

        info!("Requested agent session {} on {}", session_id, events_subject);

        let (event_tx, event_rx) = mpsc::channel(100);
        let (close_tx, mut close_rx) = oneshot::channel::<()>();

        let _ = event_tx.send(AgentEvent::Connected).await;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut close_rx => {
                        debug!("Agent session closed locally");
                        break;
                    }
                    msg = subscriber.next() => {
                        let Some(msg) = msg else {
                            warn!("Agent event subscription ended");
                            break;
                        };

                        let event = match serde_json::from_slice::<LifecycleMessage>(&msg.payload) {
                            Ok(lifecycle) if lifecycle.kind == "session_ended" => {
                                AgentEvent::Disconnected
                            }
                            Ok(lifecycle) if lifecycle.kind == "error" => AgentEvent::Error(
                                lifecycle.message.unwrap_or_else(|| "agent error".to_string()),
                            ),
                            _ => AgentEvent::Message(msg.payload.to_vec()),
                        };

                        let done = event == AgentEvent::Disconnected;
                        if event_tx.send(event).await.is_err() || done {
                            return;
                        }
                    }
                }
            }

            let _ = event_tx.send(AgentEvent::Disconnected).await;
        });

        let control = NatsAgentControl {
            client,
            end_subject: format!("agent.{}.session.{}.end", agent_id, session_id),
            session_id: session_id.clone(),
            close_tx: Mutex::new(Some(close_tx)),
        };

        Ok(AgentSession {
            session_id,
            events: event_rx,
            control: Box::new(control),
        })
    }

    fn name(&self) -> &str {
        "nats"
    }
}

struct NatsAgentControl {
    client: async_nats::Client,
    end_subject: String,
    session_id: String,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
}

#[async_trait]
impl AgentControl for NatsAgentControl {
    async fn close(&self) -> Result<(), ChannelError> {
        let Some(close_tx) = self.close_tx.lock().await.take() else {
            return Ok(());
        };

        let end = SessionEndMessage {
            session_id: self.session_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let payload =
            serde_json::to_vec(&end).map_err(|e| ChannelError::Transport(e.to_string()))?;

        let published = self
            .client
            .publish(self.end_subject.clone(), payload.into())
            .await;

        // Stop forwarding even if the end notice could not be sent
        let _ = close_tx.send(());

        if let Err(e) = published {
            error!("Failed to publish session end: {}", e);
            return Err(ChannelError::Transport(e.to_string()));
        }

        info!("Ended agent session {}", self.session_id);
        Ok(())
    }
}
