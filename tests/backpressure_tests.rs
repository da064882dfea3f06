// Integration tests for queue saturation behavior
//
// With a stage worker parked inside its blocking call, a bounded queue
// of capacity C accepts exactly C further submissions and rejects the
// rest with QueueSaturated; producers are never parked.

use live_transcribe::config::PipelineConfig;
use live_transcribe::pipeline::{PersistRequest, TranscribeRequest};
use live_transcribe::{
    AudioStore, PipelineError, PipelineSupervisor, Result, SessionRegistry, Transcriber,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

const CAPACITY: usize = 4;

fn small_config() -> PipelineConfig {
    PipelineConfig {
        persist_queue_capacity: CAPACITY,
        transcribe_queue_capacity: CAPACITY,
        poll_interval_ms: 20,
        ..Default::default()
    }
}

/// Store that parks on every call until released.
struct GatedStore {
    entered: crossbeam_channel::Sender<()>,
    release: crossbeam_channel::Receiver<()>,
}

impl AudioStore for GatedStore {
    fn store(&self, _session_id: Uuid, _payload: &[u8], _timestamp: f64) -> Result<String> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        Ok("mem://gated".to_string())
    }
}

struct InstantStore;

impl AudioStore for InstantStore {
    fn store(&self, _session_id: Uuid, _payload: &[u8], _timestamp: f64) -> Result<String> {
        Ok("mem://instant".to_string())
    }
}

/// Transcriber that parks on every call until released.
struct GatedTranscriber {
    entered: crossbeam_channel::Sender<()>,
    release: crossbeam_channel::Receiver<()>,
}

impl Transcriber for GatedTranscriber {
    fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        Ok("gated".to_string())
    }
}

struct InstantTranscriber;

impl Transcriber for InstantTranscriber {
    fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok("instant".to_string())
    }
}

fn persist_request(
    session_id: Uuid,
) -> (PersistRequest, oneshot::Receiver<Result<String>>) {
    let (reply, reply_rx) = oneshot::channel();
    (
        PersistRequest {
            session_id,
            payload: vec![0u8; 32],
            timestamp: 1000.0,
            reply,
        },
        reply_rx,
    )
}

#[test]
fn test_persist_queue_accepts_exactly_capacity_when_worker_is_busy() {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();

    let registry = Arc::new(SessionRegistry::new(16));
    let pipeline = PipelineSupervisor::start(
        &small_config(),
        Arc::new(GatedStore {
            entered: entered_tx,
            release: release_rx,
        }),
        Arc::new(InstantTranscriber),
        Arc::clone(&registry),
    )
    .unwrap();

    let (session, _outbound_rx) = registry.register();

    // Occupy the worker so nothing drains the queue
    let (request, _busy_reply) = persist_request(session.id);
    pipeline.submit_persist(request).unwrap();
    entered_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("worker never entered the store");

    // Keep reply slots alive so drops cannot be mistaken for rejects
    let mut replies = Vec::new();
    let mut accepted = 0;
    let mut rejected = 0;

    for _ in 0..CAPACITY + 3 {
        let (request, reply_rx) = persist_request(session.id);
        match pipeline.submit_persist(request) {
            Ok(()) => {
                accepted += 1;
                replies.push(reply_rx);
            }
            Err(PipelineError::QueueSaturated { stage }) => {
                assert_eq!(stage, "persist");
                rejected += 1;
            }
            Err(other) => panic!("Unexpected error: {}", other),
        }
    }

    assert_eq!(accepted, CAPACITY, "accepted count never exceeds capacity");
    assert_eq!(rejected, 3);

    // Unblock every parked and queued save, then shut down cleanly
    for _ in 0..CAPACITY + 1 {
        let _ = release_tx.send(());
    }
    pipeline.stop(Duration::from_secs(2)).unwrap();
}

#[test]
fn test_transcribe_queue_accepts_exactly_capacity_when_worker_is_busy() {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();

    let registry = Arc::new(SessionRegistry::new(16));
    let pipeline = PipelineSupervisor::start(
        &small_config(),
        Arc::new(InstantStore),
        Arc::new(GatedTranscriber {
            entered: entered_tx,
            release: release_rx,
        }),
        Arc::clone(&registry),
    )
    .unwrap();

    let (session, _outbound_rx) = registry.register();

    let submit = |locator: &str| {
        pipeline.submit_transcribe(TranscribeRequest {
            session_id: session.id,
            payload: vec![0u8; 32],
            timestamp: 1000.0,
            locator: locator.to_string(),
        })
    };

    submit("busy.wav").unwrap();
    entered_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("worker never entered the transcriber");

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..CAPACITY + 3 {
        match submit(&format!("chunk-{i}.wav")) {
            Ok(()) => accepted += 1,
            Err(PipelineError::QueueSaturated { stage }) => {
                assert_eq!(stage, "transcribe");
                rejected += 1;
            }
            Err(other) => panic!("Unexpected error: {}", other),
        }
    }

    assert_eq!(accepted, CAPACITY, "accepted count never exceeds capacity");
    assert_eq!(rejected, 3);

    for _ in 0..CAPACITY + 1 {
        let _ = release_tx.send(());
    }
    pipeline.stop(Duration::from_secs(2)).unwrap();
}
