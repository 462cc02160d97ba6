// Integration tests for the recording pipeline
//
// A scripted recorder device emits a fixed list of chunks; the pipeline must
// forward chunk events and assemble exactly one artifact after stop().

use anyhow::Result;
use async_trait::async_trait;
use interview_session::media::{MediaStream, MediaTrack, StreamKind, TrackKind};
use interview_session::recording::{
    ArtifactStore, MediaRecorder, RecorderEvent, RecordingError, RecordingEvent,
    RecordingPipeline,
};
use interview_session::session::SessionEvent;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

struct ScriptedRecorder {
    chunks: Vec<Vec<u8>>,
    tx: Option<mpsc::Sender<RecorderEvent>>,
    /// Send `Stopped` right after the scripted chunks, without waiting for stop()
    stops_by_itself: bool,
    stop_calls: Arc<AtomicUsize>,
}

impl ScriptedRecorder {
    fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            tx: None,
            stops_by_itself: false,
            stop_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn stopping_by_itself(chunks: Vec<Vec<u8>>) -> (Self, Arc<AtomicUsize>) {
        let recorder = Self {
            stops_by_itself: true,
            ..Self::new(chunks)
        };
        let stop_calls = Arc::clone(&recorder.stop_calls);
        (recorder, stop_calls)
    }
}

#[async_trait]
impl MediaRecorder for ScriptedRecorder {
    async fn start(
        &mut self,
        _stream: &MediaStream,
        _chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<RecorderEvent>, RecordingError> {
        let (tx, rx) = mpsc::channel(64);
        for chunk in self.chunks.drain(..) {
            tx.send(RecorderEvent::Data(chunk))
                .await
                .map_err(|e| RecordingError::Device(e.to_string()))?;
        }
        if self.stops_by_itself {
            let _ = tx.send(RecorderEvent::Stopped).await;
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), RecordingError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(RecorderEvent::Stopped).await;
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn combined_stream() -> MediaStream {
    MediaStream::new(
        StreamKind::Combined,
        vec![
            MediaTrack::new(TrackKind::Video, "camera"),
            MediaTrack::new(TrackKind::Audio, "microphone"),
        ],
    )
}

/// Drain recording events until the artifact arrives
async fn collect(
    rx: &mut mpsc::Receiver<SessionEvent>,
) -> (Vec<usize>, Result<interview_session::RecordingArtifact, RecordingError>) {
    let mut sizes = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Recording {
                event: RecordingEvent::Chunk { size, .. },
                ..
            } => sizes.push(size),
            SessionEvent::Recording {
                event: RecordingEvent::Assembled(result),
                ..
            } => return (sizes, result),
            other => panic!("unexpected event: {:?}", other),
        }
    }
    panic!("pipeline ended without assembling");
}

#[tokio::test]
async fn test_chunks_assemble_into_one_artifact() -> Result<()> {
    let chunks = vec![vec![1u8; 100], vec![2u8; 250], vec![3u8; 50]];
    let mut pipeline = RecordingPipeline::new(
        Box::new(ScriptedRecorder::new(chunks)),
        Duration::from_millis(1000),
    );
    let (tx, mut rx) = mpsc::channel(64);
    let stream = combined_stream();

    pipeline.start(Some(&stream), 7, tx).await?;
    assert!(pipeline.is_running());
    pipeline.stop().await;

    let (sizes, result) = collect(&mut rx).await;
    let artifact = result?;

    assert_eq!(sizes, vec![100, 250, 50]);
    assert_eq!(artifact.size(), 400);
    assert_eq!(artifact.chunk_count, 3);
    assert_eq!(artifact.mime_type, "video/webm");

    // Chunks are concatenated in arrival order
    let bytes = artifact.bytes();
    assert_eq!(bytes[0], 1);
    assert_eq!(bytes[100], 2);
    assert_eq!(bytes[399], 3);

    stream.stop_all();
    Ok(())
}

#[tokio::test]
async fn test_events_carry_start_epoch() -> Result<()> {
    let mut pipeline = RecordingPipeline::new(
        Box::new(ScriptedRecorder::new(vec![vec![0u8; 10]])),
        Duration::from_millis(1000),
    );
    let (tx, mut rx) = mpsc::channel(64);
    let stream = combined_stream();

    pipeline.start(Some(&stream), 42, tx).await?;
    pipeline.stop().await;

    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Recording { epoch, .. } => assert_eq!(epoch, 42),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    stream.stop_all();
    Ok(())
}

#[tokio::test]
async fn test_no_chunks_is_empty_artifact() -> Result<()> {
    let mut pipeline = RecordingPipeline::new(
        Box::new(ScriptedRecorder::new(Vec::new())),
        Duration::from_millis(1000),
    );
    let (tx, mut rx) = mpsc::channel(64);
    let stream = combined_stream();

    pipeline.start(Some(&stream), 1, tx).await?;
    pipeline.stop().await;

    let (sizes, result) = collect(&mut rx).await;
    assert!(sizes.is_empty());
    assert!(matches!(result, Err(RecordingError::EmptyArtifact)));

    stream.stop_all();
    Ok(())
}

#[tokio::test]
async fn test_device_that_stopped_by_itself_is_still_stopped_once() -> Result<()> {
    let (recorder, stop_calls) = ScriptedRecorder::stopping_by_itself(vec![vec![5u8; 20]]);
    let mut pipeline = RecordingPipeline::new(Box::new(recorder), Duration::from_millis(1000));
    let (tx, mut rx) = mpsc::channel(64);
    let stream = combined_stream();

    pipeline.start(Some(&stream), 1, tx).await?;
    let (_, result) = collect(&mut rx).await;
    assert_eq!(result?.size(), 20);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 0);

    pipeline.finished().await;
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
    assert!(!pipeline.is_running());

    // Later stop/abort calls do not reach the device again
    pipeline.stop().await;
    pipeline.abort().await;
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);

    stream.stop_all();
    Ok(())
}

#[tokio::test]
async fn test_abort_stops_device_once() -> Result<()> {
    let recorder = ScriptedRecorder::new(vec![vec![1u8; 10]]);
    let stop_calls = Arc::clone(&recorder.stop_calls);
    let mut pipeline = RecordingPipeline::new(Box::new(recorder), Duration::from_millis(1000));
    let (tx, _rx) = mpsc::channel(64);
    let stream = combined_stream();

    pipeline.start(Some(&stream), 1, tx).await?;
    pipeline.abort().await;
    pipeline.abort().await;

    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
    assert!(!pipeline.is_running());

    stream.stop_all();
    Ok(())
}

#[tokio::test]
async fn test_start_without_stream_fails_fast() {
    let mut pipeline = RecordingPipeline::new(
        Box::new(ScriptedRecorder::new(vec![vec![1u8; 10]])),
        Duration::from_millis(1000),
    );
    let (tx, _rx) = mpsc::channel(8);

    let result = pipeline.start(None, 1, tx).await;
    assert!(matches!(result, Err(RecordingError::StreamUnavailable)));
    assert!(!pipeline.is_running());
}

#[tokio::test]
async fn test_second_start_is_rejected() -> Result<()> {
    let mut pipeline = RecordingPipeline::new(
        Box::new(ScriptedRecorder::new(vec![vec![1u8; 10]])),
        Duration::from_millis(1000),
    );
    let (tx, _rx) = mpsc::channel(64);
    let stream = combined_stream();

    pipeline.start(Some(&stream), 1, tx.clone()).await?;
    let again = pipeline.start(Some(&stream), 1, tx).await;
    assert!(matches!(again, Err(RecordingError::AlreadyRecording)));

    pipeline.abort().await;
    stream.stop_all();
    Ok(())
}

#[tokio::test]
async fn test_artifact_store_writes_webm() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = ArtifactStore::new(temp_dir.path().join("recordings"))?;

    let mut pipeline = RecordingPipeline::new(
        Box::new(ScriptedRecorder::new(vec![vec![9u8; 32], vec![8u8; 32]])),
        Duration::from_millis(1000),
    );
    let (tx, mut rx) = mpsc::channel(64);
    let stream = combined_stream();
    pipeline.start(Some(&stream), 1, tx).await?;
    pipeline.stop().await;

    let (_, result) = collect(&mut rx).await;
    let artifact = result?;

    let attempt_id = uuid::Uuid::new_v4();
    let path = store.save(attempt_id, &artifact).await?;

    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("webm"));
    assert_eq!(std::fs::read(&path)?.len(), 64);

    stream.stop_all();
    Ok(())
}
