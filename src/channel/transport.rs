use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("A connection is already active or in flight")]
    AlreadyConnected,
}

/// Raw events from the agent service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Connected,
    Disconnected,
    /// JSON speech-turn payload
    Message(Vec<u8>),
    Error(String),
}

/// Closes an open agent session
#[async_trait]
pub trait AgentControl: Send + Sync {
    async fn close(&self) -> Result<(), ChannelError>;
}

/// An established remote session
pub struct AgentSession {
    pub session_id: String,
    /// Channel receiver that will receive agent events until disconnect
    pub events: mpsc::Receiver<AgentEvent>,
    pub control: Box<dyn AgentControl>,
}

/// Connection to the conversational agent service
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn connect(&self, agent_id: &str) -> Result<AgentSession, ChannelError>;

    /// Get transport name for logging
    fn name(&self) -> &str;
}
