use super::types::PersistJob;
use crate::storage::AudioStore;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

/// Persistence stage: a single worker thread that drains the bounded
/// save queue and writes each chunk through the audio store.
///
/// Exactly one worker consumes this queue, which serializes all disk
/// writes. A storage failure is reported to the one caller awaiting
/// that request and never stops the loop.
pub struct PersistenceStage;

impl PersistenceStage {
    pub fn spawn(
        store: Arc<dyn AudioStore>,
        jobs: Receiver<PersistJob>,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("persist-worker".to_string())
            .spawn(move || Self::run(store, jobs, running, poll_interval))
    }

    fn run(
        store: Arc<dyn AudioStore>,
        jobs: Receiver<PersistJob>,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
    ) {
        info!("Persistence worker started");

        while running.load(Ordering::SeqCst) {
            // Bounded wait so a stop signal is observed within one interval
            let job = match jobs.recv_timeout(poll_interval) {
                Ok(job) => job,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let request = match job {
                PersistJob::Chunk(request) => request,
                PersistJob::Shutdown => break,
            };

            let result = store.store(request.session_id, &request.payload, request.timestamp);
            match &result {
                Ok(locator) => info!("Saved audio chunk: {}", locator),
                Err(e) => error!(
                    "Error saving audio chunk for session {}: {}",
                    request.session_id, e
                ),
            }

            // Per-request single-slot reply; a dropped receiver means
            // the submitting session already went away.
            if request.reply.send(result).is_err() {
                debug!(
                    "Persist reply dropped, session {} gone",
                    request.session_id
                );
            }
        }

        info!("Persistence worker stopped");
    }
}
