pub mod analysis;
pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod recording;
pub mod session;

pub use analysis::{AnalysisRequest, AnalysisService, FeedbackReport, HttpAnalysisClient};
pub use channel::{AgentTransport, NatsAgentTransport, Speaker, Utterance, VoiceChannel};
pub use config::Config;
pub use error::{ErrorCategory, Notification, SessionError};
pub use http::{create_router, AppState};
pub use media::{MediaDevices, MediaError, MediaGateway, MediaStream, SyntheticDevices};
pub use recording::{
    ArtifactStore, ChunkBuffer, MediaRecorder, RecordingArtifact, RecordingPipeline,
    SyntheticRecorder,
};
pub use session::{
    InterviewConfig, SessionComponents, SessionController, SessionHandle, SessionSnapshot,
    SessionStage, TranscriptAggregator,
};
