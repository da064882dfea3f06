use super::bridge::ResultBridge;
use super::types::{TranscribeJob, TranscriptionOutcome};
use crate::stt::Transcriber;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info};

/// Transcription stage: worker thread(s) draining the bounded
/// transcription queue and invoking the blocking engine.
///
/// The default single worker bounds concurrent load on the engine to
/// exactly one in-flight call and makes results strictly globally
/// ordered by submission; a session behind a large backlog from other
/// sessions waits behind it. That head-of-line blocking is the
/// documented trade-off of the sequential design. Additional workers
/// (configurable) share the same queue receiver.
pub struct TranscriptionStage;

impl TranscriptionStage {
    pub fn spawn(
        transcriber: Arc<dyn Transcriber>,
        jobs: Receiver<TranscribeJob>,
        bridge: ResultBridge,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
        worker_index: usize,
    ) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(format!("transcribe-worker-{worker_index}"))
            .spawn(move || Self::run(transcriber, jobs, bridge, running, poll_interval))
    }

    fn run(
        transcriber: Arc<dyn Transcriber>,
        jobs: Receiver<TranscribeJob>,
        bridge: ResultBridge,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
    ) {
        info!("Transcription worker started");

        while running.load(Ordering::SeqCst) {
            let job = match jobs.recv_timeout(poll_interval) {
                Ok(job) => job,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let request = match job {
                TranscribeJob::Chunk(request) => request,
                TranscribeJob::Shutdown => break,
            };

            // Blocking call by design: the engine may be CPU/GPU-bound
            // or network-bound, and this thread exists to absorb that.
            let text = match transcriber.transcribe(&request.payload) {
                Ok(text) => text,
                Err(e) => {
                    // One failed request never stops processing of
                    // subsequent requests.
                    error!(
                        "Error transcribing chunk for session {}: {}",
                        request.session_id, e
                    );
                    continue;
                }
            };

            let outcome = TranscriptionOutcome {
                session_id: request.session_id,
                text,
                timestamp: request.timestamp,
                locator: request.locator,
            };

            // Discarded outcomes (departed session, full channel) are
            // wasted work, not errors; the bridge already logged them.
            let _ = bridge.deliver(outcome);
        }

        info!("Transcription worker stopped");
    }
}
