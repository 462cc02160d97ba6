use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who spoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Agent,
    Candidate,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Agent => "Interviewer",
            Speaker::Candidate => "Candidate",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "agent" | "ai" | "assistant" | "interviewer" => Some(Speaker::Agent),
            "user" | "candidate" => Some(Speaker::Candidate),
            _ => None,
        }
    }
}

/// One speech turn (or a partial of one)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
    pub is_final: bool,
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    pub fn new(speaker: Speaker, text: impl Into<String>, is_final: bool) -> Self {
        Self {
            speaker,
            text: text.into(),
            is_final,
            timestamp: Utc::now(),
        }
    }
}

/// Speech-turn message received from the agent service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_final: Option<bool>,
    #[serde(default)]
    pub speaker: Option<String>,
}

/// Parse a speech-turn payload. Unknown or malformed shapes yield `None`.
pub fn parse_agent_message(payload: &[u8]) -> Option<Utterance> {
    let message: AgentMessage = match serde_json::from_slice(payload) {
        Ok(m) => m,
        Err(e) => {
            debug!("Ignoring unparseable agent message: {}", e);
            return None;
        }
    };

    let speaker = match message.kind.as_str() {
        "agent_response" => Speaker::Agent,
        "user_transcript" => Speaker::Candidate,
        "transcript" => message.speaker.as_deref().and_then(Speaker::parse)?,
        other => {
            debug!("Ignoring agent message of type {:?}", other);
            return None;
        }
    };

    let text = message.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return None;
    }

    Some(Utterance::new(speaker, text, message.is_final.unwrap_or(true)))
}
