//! Realtime Voice Channel
//!
//! This module provides the connection to the conversational interview agent:
//! - `AgentTransport`: pluggable connection to the agent service
//! - `VoiceChannel`: status tracking, single in-flight connect, intentional
//!   disconnect handling
//! - Agent message parsing into speaker-labeled utterances
//! - `NatsAgentTransport`: NATS-backed transport

mod messages;
mod nats;
mod transport;
mod voice;

pub use messages::{parse_agent_message, AgentMessage, Speaker, Utterance};
pub use nats::NatsAgentTransport;
pub use transport::{AgentControl, AgentEvent, AgentSession, AgentTransport, ChannelError};
pub use voice::{ChannelEvent, ChannelStatus, DisconnectKind, VoiceChannel};
