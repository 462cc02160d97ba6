// Shared fakes for session controller tests
//
// Each fake records what the controller did to it so tests can assert on
// acquisition/release counts and open agent sessions.

#![allow(dead_code)]

use async_trait::async_trait;
use interview_session::analysis::{AnalysisError, AnalysisRequest, AnalysisService, FeedbackReport};
use interview_session::channel::{
    AgentControl, AgentEvent, AgentSession, AgentTransport, ChannelError,
};
use interview_session::media::{
    MediaDevices, MediaError, MediaStream, MediaTrack, StreamKind, TrackKind,
};
use interview_session::recording::{MediaRecorder, RecorderEvent, RecordingError};
use interview_session::session::{
    InterviewConfig, SessionComponents, SessionController, SessionHandle, SessionSnapshot,
    SessionStage, StageTransition,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

pub fn test_config() -> InterviewConfig {
    InterviewConfig {
        agent_id: "agent-test".to_string(),
        countdown: Duration::from_millis(100),
        max_duration: Duration::from_secs(60),
        chunk_interval: Duration::from_millis(100),
        error_cooldown: Duration::from_millis(500),
    }
}

// ============================================================================
// Media devices
// ============================================================================

#[derive(Default)]
pub struct FakeDevices {
    video_error: Mutex<Option<MediaError>>,
    audio_error: Mutex<Option<MediaError>>,
    audio_delay: Mutex<Duration>,
    video_requests: AtomicUsize,
    audio_requests: AtomicUsize,
    streams_acquired: AtomicUsize,
    releases: AtomicUsize,
    tracks: Mutex<Vec<Arc<MediaTrack>>>,
    microphones: Mutex<Vec<Arc<MediaTrack>>>,
}

impl FakeDevices {
    pub fn denying_video(err: MediaError) -> Self {
        let devices = Self::default();
        *devices.video_error.lock().unwrap() = Some(err);
        devices
    }

    pub fn denying_audio(err: MediaError) -> Self {
        let devices = Self::default();
        *devices.audio_error.lock().unwrap() = Some(err);
        devices
    }

    pub fn with_audio_delay(delay: Duration) -> Self {
        let devices = Self::default();
        *devices.audio_delay.lock().unwrap() = delay;
        devices
    }

    pub fn video_requests(&self) -> usize {
        self.video_requests.load(Ordering::SeqCst)
    }

    pub fn audio_requests(&self) -> usize {
        self.audio_requests.load(Ordering::SeqCst)
    }

    pub fn streams_acquired(&self) -> usize {
        self.streams_acquired.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Every track handed out has been stopped exactly once
    pub fn all_tracks_stopped_once(&self) -> bool {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .all(|t| !t.is_live() && t.stop_count() == 1)
    }

    /// Simulate the microphone being unplugged
    pub fn end_microphone(&self) {
        if let Some(track) = self.microphones.lock().unwrap().last() {
            track.end();
        }
    }

    fn hand_out(&self, kind: StreamKind, tracks: Vec<Arc<MediaTrack>>) -> MediaStream {
        self.tracks.lock().unwrap().extend(tracks.iter().cloned());
        self.streams_acquired.fetch_add(1, Ordering::SeqCst);
        MediaStream::new(kind, tracks)
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn request_video(&self) -> Result<MediaStream, MediaError> {
        self.video_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.video_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.hand_out(
            StreamKind::VideoPreview,
            vec![MediaTrack::new(TrackKind::Video, "fake camera")],
        ))
    }

    async fn request_audio_video(&self) -> Result<MediaStream, MediaError> {
        self.audio_requests.fetch_add(1, Ordering::SeqCst);
        let delay = *self.audio_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.audio_error.lock().unwrap().clone() {
            return Err(err);
        }

        let microphone = MediaTrack::new(TrackKind::Audio, "fake microphone");
        self.microphones.lock().unwrap().push(Arc::clone(&microphone));
        Ok(self.hand_out(
            StreamKind::Combined,
            vec![MediaTrack::new(TrackKind::Video, "fake camera"), microphone],
        ))
    }

    fn release(&self, stream: MediaStream) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        stream.stop_all();
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Agent transport
// ============================================================================

struct OpenSession {
    tx: mpsc::Sender<AgentEvent>,
    open: Arc<AtomicBool>,
}

#[derive(Default)]
struct AgentState {
    connects: AtomicUsize,
    open: AtomicUsize,
    max_open: AtomicUsize,
    closes: AtomicUsize,
    current: Mutex<Option<OpenSession>>,
    fail_connect: Mutex<Option<ChannelError>>,
    connect_delay: Mutex<Duration>,
    early_message: Mutex<Option<String>>,
    hang_up_before_connected: AtomicBool,
}

impl AgentState {
    fn mark_closed(&self, open: &AtomicBool) {
        if open.swap(false, Ordering::SeqCst) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
pub struct FakeAgent {
    state: Arc<AgentState>,
}

impl FakeAgent {
    pub fn failing(err: ChannelError) -> Self {
        let agent = Self::default();
        *agent.state.fail_connect.lock().unwrap() = Some(err);
        agent
    }

    pub fn with_connect_delay(delay: Duration) -> Self {
        let agent = Self::default();
        *agent.state.connect_delay.lock().unwrap() = delay;
        agent
    }

    /// Deliver a speech message before reporting connected
    pub fn with_early_message(json: &str) -> Self {
        let agent = Self::default();
        *agent.state.early_message.lock().unwrap() = Some(json.to_string());
        agent
    }

    /// The remote session opens, then goes away before reporting connected
    pub fn hanging_up_before_connected() -> Self {
        let agent = Self::default();
        agent
            .state
            .hang_up_before_connected
            .store(true, Ordering::SeqCst);
        agent
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    pub fn max_open_sessions(&self) -> usize {
        self.state.max_open.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    fn current_tx(&self) -> Option<mpsc::Sender<AgentEvent>> {
        self.state
            .current
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.tx.clone())
    }

    /// Send a speech-turn message on the open session
    pub async fn say(&self, json: &str) {
        let tx = self.current_tx().expect("no open agent session");
        tx.send(AgentEvent::Message(json.as_bytes().to_vec()))
            .await
            .expect("agent session closed");
    }

    pub async fn report_error(&self, message: &str) {
        let tx = self.current_tx().expect("no open agent session");
        tx.send(AgentEvent::Error(message.to_string()))
            .await
            .expect("agent session closed");
    }

    /// The remote side goes away without being asked to
    pub async fn drop_connection(&self) {
        let session = self.state.current.lock().unwrap().take();
        if let Some(session) = session {
            self.state.mark_closed(&session.open);
            let _ = session.tx.send(AgentEvent::Disconnected).await;
        }
    }
}

#[async_trait]
impl AgentTransport for FakeAgent {
    async fn connect(&self, _agent_id: &str) -> Result<AgentSession, ChannelError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.state.fail_connect.lock().unwrap().clone() {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel(32);

        if self.state.hang_up_before_connected.load(Ordering::SeqCst) {
            let _ = tx.send(AgentEvent::Disconnected).await;
            return Ok(AgentSession {
                session_id: format!("fake-{}", self.connects()),
                events: rx,
                control: Box::new(FakeControl {
                    state: Arc::clone(&self.state),
                    open: Arc::new(AtomicBool::new(false)),
                }),
            });
        }

        let early = self.state.early_message.lock().unwrap().clone();
        if let Some(json) = early {
            let _ = tx.send(AgentEvent::Message(json.into_bytes())).await;
        }
        let _ = tx.send(AgentEvent::Connected).await;

        let open_now = self.state.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_open.fetch_max(open_now, Ordering::SeqCst);

        let open = Arc::new(AtomicBool::new(true));
        *self.state.current.lock().unwrap() = Some(OpenSession {
            tx,
            open: Arc::clone(&open),
        });

        Ok(AgentSession {
            session_id: format!("fake-{}", self.connects()),
            events: rx,
            control: Box::new(FakeControl {
                state: Arc::clone(&self.state),
                open,
            }),
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeControl {
    state: Arc<AgentState>,
    open: Arc<AtomicBool>,
}

#[async_trait]
impl AgentControl for FakeControl {
    async fn close(&self) -> Result<(), ChannelError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        self.state.mark_closed(&self.open);

        // Dropping the last sender ends the event stream
        let mut current = self.state.current.lock().unwrap();
        if current
            .as_ref()
            .map(|s| Arc::ptr_eq(&s.open, &self.open))
            .unwrap_or(false)
        {
            current.take();
        }
        Ok(())
    }
}

// ============================================================================
// Analysis service
// ============================================================================

#[derive(Default)]
pub struct FakeAnalysis {
    fail: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl FakeAnalysis {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

pub fn sample_report() -> FeedbackReport {
    FeedbackReport {
        overall_assessment: "Strong systems background".to_string(),
        strengths: vec!["Concrete examples".to_string()],
        areas_for_improvement: vec!["Shorter answers".to_string()],
        communication_clarity: "Clear".to_string(),
        recommendation: "Advance to onsite".to_string(),
    }
}

#[async_trait]
impl AnalysisService for FakeAnalysis {
    async fn analyze(&self, request: AnalysisRequest) -> Result<FeedbackReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if self.fail {
            return Err(AnalysisError::Server {
                status: 503,
                message: "analysis backend overloaded".to_string(),
            });
        }
        Ok(sample_report())
    }
}

// ============================================================================
// Recorder that never produces data
// ============================================================================

#[derive(Default)]
pub struct SilentRecorder {
    tx: Option<mpsc::Sender<RecorderEvent>>,
}

#[async_trait]
impl MediaRecorder for SilentRecorder {
    async fn start(
        &mut self,
        _stream: &MediaStream,
        _chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<RecorderEvent>, RecordingError> {
        let (tx, rx) = mpsc::channel(8);
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), RecordingError> {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(RecorderEvent::Stopped).await;
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Recorder that flushes one chunk and stops without being asked.
/// Refuses to start again until `stop()` has been called.
pub struct SelfStoppingRecorder {
    armed: bool,
    stops: Arc<AtomicUsize>,
}

impl SelfStoppingRecorder {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        let recorder = Self {
            armed: false,
            stops: Arc::clone(&stops),
        };
        (recorder, stops)
    }
}

#[async_trait]
impl MediaRecorder for SelfStoppingRecorder {
    async fn start(
        &mut self,
        _stream: &MediaStream,
        _chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<RecorderEvent>, RecordingError> {
        if self.armed {
            return Err(RecordingError::AlreadyRecording);
        }
        self.armed = true;

        let (tx, rx) = mpsc::channel(8);
        let _ = tx.send(RecorderEvent::Data(vec![7u8; 64])).await;
        let _ = tx.send(RecorderEvent::Stopped).await;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), RecordingError> {
        self.armed = false;
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.armed
    }

    fn name(&self) -> &str {
        "self-stopping"
    }
}

/// Recorder whose device cannot be started
#[derive(Default)]
pub struct BrokenRecorder;

#[async_trait]
impl MediaRecorder for BrokenRecorder {
    async fn start(
        &mut self,
        _stream: &MediaStream,
        _chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<RecorderEvent>, RecordingError> {
        Err(RecordingError::Device("encoder unavailable".to_string()))
    }

    async fn stop(&mut self) -> Result<(), RecordingError> {
        Ok(())
    }

    fn is_recording(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "broken"
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub handle: SessionHandle,
    pub task: JoinHandle<()>,
    pub devices: Arc<FakeDevices>,
    pub agent: Arc<FakeAgent>,
    pub analysis: Arc<FakeAnalysis>,
    transitions: broadcast::Receiver<StageTransition>,
}

impl Harness {
    pub fn start(
        config: InterviewConfig,
        devices: FakeDevices,
        agent: FakeAgent,
        analysis: FakeAnalysis,
        recorder: Box<dyn MediaRecorder>,
    ) -> Self {
        let devices = Arc::new(devices);
        let agent = Arc::new(agent);
        let analysis = Arc::new(analysis);

        let components = SessionComponents {
            devices: devices.clone(),
            recorder,
            transport: agent.clone(),
            analysis: analysis.clone(),
            store: None,
        };

        let (handle, task) = SessionController::spawn(config, components);
        let transitions = handle.transitions();

        Self {
            handle,
            task,
            devices,
            agent,
            analysis,
            transitions,
        }
    }

    /// Wait for the next transition into `stage`
    pub async fn next_stage(&mut self, stage: SessionStage) -> StageTransition {
        let wait = async {
            loop {
                match self.transitions.recv().await {
                    Ok(t) if t.to == stage => return t,
                    Ok(_) => continue,
                    Err(e) => panic!("transition stream failed: {}", e),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(3600), wait)
            .await
            .unwrap_or_else(|_| panic!("stage {} never reached", stage))
    }

    /// Collect every transition up to and including the next one into `stage`
    pub async fn transitions_until(&mut self, stage: SessionStage) -> Vec<StageTransition> {
        let wait = async {
            let mut seen = Vec::new();
            loop {
                match self.transitions.recv().await {
                    Ok(t) => {
                        seen.push(t);
                        if t.to == stage {
                            return seen;
                        }
                    }
                    Err(e) => panic!("transition stream failed: {}", e),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(3600), wait)
            .await
            .unwrap_or_else(|_| panic!("stage {} never reached", stage))
    }

    /// Wait until the published snapshot shows `stage`
    pub async fn settled(&self, stage: SessionStage) -> SessionSnapshot {
        tokio::time::timeout(
            Duration::from_secs(3600),
            self.handle.wait_until(|s| s.stage == stage),
        )
        .await
        .unwrap_or_else(|_| panic!("snapshot never showed {}", stage))
        .expect("controller stopped")
    }

    /// Drive a fresh attempt to Active
    pub async fn go_live(&mut self) {
        self.handle.accept_consent().await.unwrap();
        self.next_stage(SessionStage::Active).await;
    }

    pub async fn shutdown(self) -> (Arc<FakeDevices>, Arc<FakeAgent>, Arc<FakeAnalysis>) {
        self.handle.shutdown().await.unwrap();
        self.task.await.unwrap();
        (self.devices, self.agent, self.analysis)
    }
}
