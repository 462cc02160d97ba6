use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::InterviewConfig;
use super::events::{Epoch, SessionEvent, UserAction};
use super::handle::SessionHandle;
use super::snapshot::{SessionSnapshot, StageTransition};
use super::stage::{FinalizeReason, SessionGuards, SessionStage};
use super::timer::{SessionTimers, TimerKind};
use super::transcript::TranscriptAggregator;
use crate::analysis::{AnalysisError, AnalysisRequest, AnalysisService, FeedbackReport};
use crate::channel::{AgentTransport, ChannelEvent, ChannelStatus, DisconnectKind, VoiceChannel};
use crate::error::{Notification, SessionError};
use crate::media::{MediaDevices, MediaEvent, MediaGateway};
use crate::recording::{
    ArtifactStore, MediaRecorder, RecordingArtifact, RecordingError, RecordingEvent,
    RecordingPipeline,
};

const EVENT_QUEUE_CAPACITY: usize = 256;
const TRANSITION_CAPACITY: usize = 64;

/// External collaborators the controller drives
pub struct SessionComponents {
    pub devices: Arc<dyn MediaDevices>,
    pub recorder: Box<dyn MediaRecorder>,
    pub transport: Arc<dyn AgentTransport>,
    pub analysis: Arc<dyn AnalysisService>,
    /// Optional on-disk copy of each artifact
    pub store: Option<ArtifactStore>,
}

/// The interview session state machine
///
/// Consumes one event at a time from a single queue. Every asynchronous
/// operation runs in a spawned task that posts its outcome back, tagged with
/// the epoch of the attempt that started it.
pub struct SessionController {
    config: InterviewConfig,

    stage: SessionStage,
    guards: SessionGuards,
    epoch: Epoch,

    attempt_id: Uuid,
    started_at: chrono::DateTime<Utc>,

    media: MediaGateway,
    channel: VoiceChannel,
    recorder: RecordingPipeline,
    transcript: TranscriptAggregator,
    timers: SessionTimers,

    analysis: Arc<dyn AnalysisService>,
    store: Option<ArtifactStore>,

    chunks_recorded: usize,
    bytes_recorded: usize,
    submissions: usize,
    finalize_reason: Option<FinalizeReason>,
    notification: Option<Notification>,
    feedback: Option<FeedbackReport>,

    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    transitions_tx: broadcast::Sender<StageTransition>,
}

impl SessionController {
    pub fn new(config: InterviewConfig, components: SessionComponents) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let (transitions_tx, _) = broadcast::channel(TRANSITION_CAPACITY);

        let handle = SessionHandle::new(events_tx.clone(), snapshot_rx, transitions_tx.clone());

        let controller = Self {
            recorder: RecordingPipeline::new(components.recorder, config.chunk_interval),
            config,
            stage: SessionStage::Consent,
            guards: SessionGuards::default(),
            epoch: 0,
            attempt_id: Uuid::nil(),
            started_at: Utc::now(),
            media: MediaGateway::new(components.devices),
            channel: VoiceChannel::new(components.transport),
            transcript: TranscriptAggregator::new(),
            timers: SessionTimers::new(),
            analysis: components.analysis,
            store: components.store,
            chunks_recorded: 0,
            bytes_recorded: 0,
            submissions: 0,
            finalize_reason: None,
            notification: None,
            feedback: None,
            events_tx,
            events_rx,
            snapshot_tx,
            transitions_tx,
        };

        (controller, handle)
    }

    /// Create a controller and run it on the current runtime
    pub fn spawn(
        config: InterviewConfig,
        components: SessionComponents,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(config, components);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    /// Process events until shutdown
    pub async fn run(mut self) {
        info!("Session controller started");
        self.publish();

        while let Some(event) = self.events_rx.recv().await {
            if let SessionEvent::User(UserAction::Shutdown) = event {
                self.dispose().await;
                self.publish();
                break;
            }

            self.handle(event).await;
            self.publish();
        }

        info!("Session controller stopped");
    }

    async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::User(action) => self.on_user(action).await,

            SessionEvent::Media { epoch, event } if epoch == self.epoch => {
                self.on_media(event).await
            }
            SessionEvent::Media { event, .. } => self.discard_media(event),

            SessionEvent::Timer { epoch, kind } if epoch == self.epoch => {
                if self.timers.fired(kind) {
                    self.on_timer(kind).await;
                } else {
                    debug!("Ignoring fire of cleared {:?} timer", kind);
                }
            }

            SessionEvent::Channel { epoch, event } if epoch == self.epoch => {
                self.on_channel(event).await
            }
            SessionEvent::Channel { event, .. } => self.discard_channel(event).await,

            SessionEvent::Recording { epoch, event } if epoch == self.epoch => {
                self.on_recording(event).await
            }

            SessionEvent::Analysis { epoch, result } if epoch == self.epoch => {
                self.on_analysis(result).await
            }

            other => debug!("Dropping stale event: {:?}", other),
        }
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    async fn on_user(&mut self, action: UserAction) {
        match action {
            UserAction::AcceptConsent => self.accept().await,
            UserAction::FinishInterview => self.finish().await,
            UserAction::Retry => self.retry().await,
            UserAction::Shutdown => self.dispose().await,
        }
    }

    async fn accept(&mut self) {
        if self.guards.starting_in_progress || self.guards.error_in_progress {
            debug!("Consent ignored, guards {:?}", self.guards);
            return;
        }
        if self.stage != SessionStage::Consent {
            debug!("Consent ignored in stage {}", self.stage);
            return;
        }

        self.begin_attempt();
        self.guards.starting_in_progress = true;

        if self.config.agent_id.trim().is_empty() {
            self.fail(SessionError::Configuration(
                "interview agent id is not configured".to_string(),
            ))
            .await;
            return;
        }

        info!("Consent accepted, starting attempt {}", self.attempt_id);
        self.transition(SessionStage::AcquiringMedia);
        self.media.acquire(self.epoch, self.events_tx.clone());
    }

    async fn finish(&mut self) {
        if self.stage != SessionStage::Active || !self.guards.interview_active {
            debug!("Finish ignored in stage {}", self.stage);
            return;
        }
        self.enter_finalizing(FinalizeReason::UserFinished).await;
    }

    async fn retry(&mut self) {
        match self.stage {
            SessionStage::Feedback => {
                info!("Starting over after feedback");
                self.teardown().await;
                self.reset_attempt_state();
                self.attempt_id = Uuid::nil();
                self.transition(SessionStage::Consent);
            }
            SessionStage::Consent => {
                if self.notification.take().is_some() {
                    info!("Error notification dismissed");
                }
            }
            SessionStage::ErrorReset => debug!("Retry ignored until the error cooldown completes"),
            other => debug!("Retry ignored in stage {}", other),
        }
    }

    /// Same teardown as the error path, used when the controller is disposed
    async fn dispose(&mut self) {
        info!("Disposing session controller");
        self.teardown().await;
    }

    // ------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------

    async fn on_media(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::PreviewReady(stream) => {
                if self.stage != SessionStage::AcquiringMedia {
                    debug!("Preview arrived in stage {}, releasing", self.stage);
                    self.media.release(stream);
                    return;
                }
                self.media.store_preview(stream);
            }
            MediaEvent::CombinedReady(stream) => {
                if self.stage != SessionStage::AcquiringMedia {
                    debug!("Combined stream arrived in stage {}, releasing", self.stage);
                    self.media.release(stream);
                    return;
                }
                self.media.store_combined(stream);
                self.transition(SessionStage::Countdown);
                self.timers.arm(
                    TimerKind::Countdown,
                    self.config.countdown,
                    self.epoch,
                    self.events_tx.clone(),
                );
            }
            MediaEvent::Failed(err) => {
                if self.stage == SessionStage::AcquiringMedia {
                    self.fail(err.into()).await;
                } else {
                    debug!("Ignoring media failure in stage {}: {}", self.stage, err);
                }
            }
        }
    }

    fn discard_media(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::PreviewReady(stream) | MediaEvent::CombinedReady(stream) => {
                debug!("Releasing stream from a torn-down attempt");
                self.media.release(stream);
            }
            MediaEvent::Failed(err) => debug!("Ignoring stale media failure: {}", err),
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    async fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Countdown => {
                if self.stage != SessionStage::Countdown {
                    return;
                }
                info!("Countdown elapsed, connecting to agent {}", self.config.agent_id);
                if let Err(e) =
                    self.channel
                        .connect(&self.config.agent_id, self.epoch, self.events_tx.clone())
                {
                    self.fail(e.into()).await;
                }
            }
            TimerKind::Deadline => {
                if self.stage == SessionStage::Active && self.guards.interview_active {
                    info!(
                        "Maximum interview duration ({}s) reached",
                        self.config.max_duration.as_secs()
                    );
                    self.enter_finalizing(FinalizeReason::MaxDuration).await;
                }
            }
            TimerKind::ErrorCooldown => {
                if self.stage == SessionStage::ErrorReset {
                    self.guards.error_in_progress = false;
                    self.transition(SessionStage::Consent);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Agent channel
    // ------------------------------------------------------------------

    async fn on_channel(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened(control) => {
                if self.stage == SessionStage::Countdown
                    && self.channel.status() == ChannelStatus::Connecting
                {
                    self.channel.attach(control);
                } else {
                    warn!("Agent session opened in stage {}, closing it", self.stage);
                    if let Err(e) = control.close().await {
                        warn!("Failed to close unexpected agent session: {}", e);
                    }
                }
            }
            ChannelEvent::Connected => {
                if self.stage != SessionStage::Countdown {
                    debug!("Connected ignored in stage {}", self.stage);
                    return;
                }
                self.channel.mark_connected();
                self.start_interview().await;
            }
            ChannelEvent::ConnectFailed(err) => {
                self.channel.on_connect_failed();
                if self.stage == SessionStage::Countdown {
                    self.fail(err.into()).await;
                }
            }
            ChannelEvent::Disconnected => match self.channel.on_disconnected() {
                DisconnectKind::Intentional => debug!("Agent disconnected as requested"),
                DisconnectKind::Unexpected if self.guards.interview_active => {
                    warn!("Agent disconnected during the interview, salvaging recording");
                    self.enter_finalizing(FinalizeReason::AgentDisconnected).await;
                }
                DisconnectKind::Unexpected if self.stage == SessionStage::Countdown => {
                    self.fail(SessionError::ChannelUnexpectedDisconnect).await;
                }
                DisconnectKind::Unexpected => {
                    debug!("Agent disconnected in stage {}", self.stage)
                }
            },
            ChannelEvent::Utterance(utterance) => {
                if self.stage == SessionStage::Active {
                    self.transcript.apply(utterance);
                } else {
                    debug!("Dropping utterance received in stage {}", self.stage);
                }
            }
            ChannelEvent::Error(message) => match self.stage {
                SessionStage::Countdown => self.fail(SessionError::ChannelConnect(message)).await,
                SessionStage::Active => {
                    error!("Agent error during the interview: {}", message);
                    self.enter_finalizing(FinalizeReason::AgentError).await;
                }
                other => debug!("Ignoring agent error in stage {}: {}", other, message),
            },
        }
    }

    async fn discard_channel(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened(control) => {
                debug!("Closing agent session from a torn-down attempt");
                if let Err(e) = control.close().await {
                    warn!("Failed to close stale agent session: {}", e);
                }
            }
            other => debug!("Dropping stale channel event: {:?}", other),
        }
    }

    /// Agent connected: go live, then arm the recorder and the deadline
    async fn start_interview(&mut self) {
        self.transition(SessionStage::Active);
        self.guards.starting_in_progress = false;
        self.guards.interview_active = true;

        let started = self
            .recorder
            .start(self.media.combined(), self.epoch, self.events_tx.clone())
            .await;

        match started {
            Ok(()) => {
                self.timers.arm(
                    TimerKind::Deadline,
                    self.config.max_duration,
                    self.epoch,
                    self.events_tx.clone(),
                );
                info!("Interview is live");
            }
            Err(e) => {
                error!("Failed to arm recorder: {}", e);
                self.fail(e.into()).await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    async fn on_recording(&mut self, event: RecordingEvent) {
        match event {
            RecordingEvent::Chunk { size, total_bytes } => {
                self.chunks_recorded += 1;
                self.bytes_recorded = total_bytes;
                debug!("Buffered chunk of {} bytes ({} total)", size, total_bytes);
            }
            RecordingEvent::DeviceError(message) => {
                if self.stage == SessionStage::Active {
                    warn!("Recording device failed: {}", message);
                    self.enter_finalizing(FinalizeReason::RecorderError).await;
                } else {
                    debug!("Recorder error in stage {}: {}", self.stage, message);
                }
            }
            RecordingEvent::Assembled(result) => match self.stage {
                SessionStage::Active => {
                    warn!("Recorder stopped on its own during the interview");
                    self.recorder.finished().await;
                    self.enter_finalizing(FinalizeReason::RecorderStopped).await;
                    self.on_assembled(result).await;
                }
                SessionStage::Finalizing => {
                    self.recorder.finished().await;
                    self.on_assembled(result).await;
                }
                other => debug!("Ignoring assembled recording in stage {}", other),
            },
        }
    }

    /// Leave Active: close the agent (intentionally), then stop the
    /// recorder. Its `Assembled` event drives submission.
    async fn enter_finalizing(&mut self, reason: FinalizeReason) {
        info!("Finalizing interview: {}", reason);

        self.guards.interview_active = false;
        self.finalize_reason = Some(reason);
        self.timers.clear(TimerKind::Deadline);
        self.channel.close().await;
        self.transition(SessionStage::Finalizing);
        self.recorder.stop().await;
    }

    async fn on_assembled(&mut self, result: Result<RecordingArtifact, RecordingError>) {
        // The recorder is done with the combined stream
        self.media.release_all();

        let artifact = match result {
            Ok(artifact) => artifact,
            Err(e) => {
                self.fail(e.into()).await;
                return;
            }
        };

        if self.submissions > 0 {
            warn!("Artifact already submitted for attempt {}", self.attempt_id);
            return;
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save(self.attempt_id, &artifact).await {
                warn!("Failed to save recording: {}", e);
            }
        }

        let request = AnalysisRequest::new(&artifact, self.transcript.text());
        self.submissions += 1;
        self.transition(SessionStage::Submitting);

        info!(
            "Submitting {} byte recording with {} transcript lines",
            artifact.size(),
            self.transcript.len()
        );

        let analysis = Arc::clone(&self.analysis);
        let events = self.events_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = analysis.analyze(request).await;
            let _ = events.send(SessionEvent::Analysis { epoch, result }).await;
        });
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    async fn on_analysis(&mut self, result: Result<FeedbackReport, AnalysisError>) {
        if self.stage != SessionStage::Submitting {
            debug!("Ignoring analysis result in stage {}", self.stage);
            return;
        }

        match result {
            Ok(report) => {
                info!("Feedback received: {}", report.recommendation);
                self.feedback = Some(report);
                self.transition(SessionStage::Feedback);
            }
            Err(e) => self.fail(e.into()).await,
        }
    }

    // ------------------------------------------------------------------
    // Error path and teardown
    // ------------------------------------------------------------------

    /// The single error handler. Reentrant reports are dropped.
    async fn fail(&mut self, err: SessionError) {
        if self.guards.error_in_progress {
            debug!("Dropping error while another is being handled: {}", err);
            return;
        }
        if self.stage.is_terminal() {
            warn!("Ignoring error after feedback: {}", err);
            return;
        }

        error!("Interview attempt {} failed: {}", self.attempt_id, err);
        self.guards.error_in_progress = true;

        self.teardown().await;

        self.notification = Some(Notification::from(&err));
        self.transition(SessionStage::ErrorReset);
        self.timers.arm(
            TimerKind::ErrorCooldown,
            self.config.error_cooldown,
            self.epoch,
            self.events_tx.clone(),
        );
    }

    /// Stop the recorder, close the channel and release all media, then
    /// clear the start/active guards. Best effort; never raises.
    async fn teardown(&mut self) {
        self.epoch += 1;

        self.timers.clear_all();
        self.recorder.abort().await;
        self.channel.close().await;
        self.channel.reset();

        let released = self.media.release_all();
        if released > 0 {
            info!("Released {} media stream(s)", released);
        }

        self.guards.starting_in_progress = false;
        self.guards.interview_active = false;
    }

    // ------------------------------------------------------------------
    // Attempt bookkeeping
    // ------------------------------------------------------------------

    fn begin_attempt(&mut self) {
        self.epoch += 1;
        self.reset_attempt_state();
        self.attempt_id = Uuid::new_v4();
        self.started_at = Utc::now();
    }

    fn reset_attempt_state(&mut self) {
        self.channel.reset();
        self.transcript.clear();
        self.chunks_recorded = 0;
        self.bytes_recorded = 0;
        self.submissions = 0;
        self.finalize_reason = None;
        self.notification = None;
        self.feedback = None;
    }

    fn transition(&mut self, to: SessionStage) {
        if self.stage == to {
            return;
        }

        info!("Session stage: {} -> {}", self.stage, to);
        let transition = StageTransition {
            from: self.stage,
            to,
            at: tokio::time::Instant::now(),
        };
        self.stage = to;

        // No subscribers is fine
        let _ = self.transitions_tx.send(transition);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            attempt_id: self.attempt_id,
            started_at: self.started_at,
            stage: self.stage,
            guards: self.guards,
            channel_status: self.channel.status(),
            held_streams: self.media.held_count(),
            armed_timers: self.timers.armed_count(),
            chunks_recorded: self.chunks_recorded,
            bytes_recorded: self.bytes_recorded,
            transcript: self.transcript.text(),
            utterance_count: self.transcript.len(),
            submissions: self.submissions,
            finalize_reason: self.finalize_reason,
            notification: self.notification.clone(),
            feedback: self.feedback.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
