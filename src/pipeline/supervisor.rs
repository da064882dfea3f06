use super::bridge::ResultBridge;
use super::persist::PersistenceStage;
use super::transcribe::TranscriptionStage;
use super::types::{PersistJob, PersistRequest, TranscribeJob, TranscribeRequest};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::session::SessionRegistry;
use crate::storage::AudioStore;
use crate::stt::Transcriber;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Owns the lifecycle of both pipeline stages.
///
/// Built once at process start and handed to every connection handler
/// by reference; there is no hidden global. `start` spawns the worker
/// threads, `stop` shuts them down cooperatively with a bounded wait
/// and abandons (never force-kills) workers that miss the deadline —
/// forced termination mid-write or mid-inference could corrupt state.
pub struct PipelineSupervisor {
    persist_tx: Sender<PersistJob>,
    transcribe_tx: Sender<TranscribeJob>,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    transcribe_workers: usize,
}

impl PipelineSupervisor {
    /// Spawn the persistence and transcription workers.
    pub fn start(
        config: &PipelineConfig,
        store: Arc<dyn AudioStore>,
        transcriber: Arc<dyn Transcriber>,
        registry: Arc<SessionRegistry>,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let poll_interval = config.poll_interval();

        let (persist_tx, persist_rx) = bounded(config.persist_queue_capacity);
        let (transcribe_tx, transcribe_rx) = bounded(config.transcribe_queue_capacity);

        let mut workers = Vec::new();

        let handle =
            PersistenceStage::spawn(store, persist_rx, Arc::clone(&running), poll_interval)?;
        workers.push(("persist", handle));

        let bridge = ResultBridge::new(registry);
        let worker_count = config.transcribe_workers.max(1);
        for index in 0..worker_count {
            let handle = TranscriptionStage::spawn(
                Arc::clone(&transcriber),
                transcribe_rx.clone(),
                bridge.clone(),
                Arc::clone(&running),
                poll_interval,
                index,
            )?;
            workers.push(("transcribe", handle));
        }

        info!(
            "Pipeline started (1 persist worker, {} transcribe worker{})",
            worker_count,
            if worker_count == 1 { "" } else { "s" }
        );

        Ok(Self {
            persist_tx,
            transcribe_tx,
            running,
            workers: Mutex::new(workers),
            transcribe_workers: worker_count,
        })
    }

    /// Non-blocking submission to the persistence queue. A full queue
    /// rejects the chunk; the producer is never parked.
    pub fn submit_persist(&self, request: PersistRequest) -> Result<()> {
        self.persist_tx
            .try_send(PersistJob::Chunk(request))
            .map_err(|e| match e {
                TrySendError::Full(_) => PipelineError::QueueSaturated { stage: "persist" },
                TrySendError::Disconnected(_) => PipelineError::Transport {
                    message: "persistence stage is not running".to_string(),
                },
            })
    }

    /// Non-blocking submission to the transcription queue.
    pub fn submit_transcribe(&self, request: TranscribeRequest) -> Result<()> {
        self.transcribe_tx
            .try_send(TranscribeJob::Chunk(request))
            .map_err(|e| match e {
                TrySendError::Full(_) => PipelineError::QueueSaturated { stage: "transcribe" },
                TrySendError::Disconnected(_) => PipelineError::Transport {
                    message: "transcription stage is not running".to_string(),
                },
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Graceful shutdown: flip the cooperative stop flag, push one
    /// sentinel per worker to unblock empty-queue waits, then wait up
    /// to `timeout` for the workers to finish.
    ///
    /// Workers still running at the deadline are logged and abandoned;
    /// they die with the process. Idempotent — a second call finds no
    /// workers left to join.
    pub fn stop(&self, timeout: Duration) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);

        // Sentinels are best-effort: if a queue is full the stop flag
        // still ends the worker within one poll interval.
        let _ = self.persist_tx.try_send(PersistJob::Shutdown);
        for _ in 0..self.transcribe_workers {
            let _ = self.transcribe_tx.try_send(TranscribeJob::Shutdown);
        }

        let mut workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        let deadline = Instant::now() + timeout;
        let poll = Duration::from_millis(50);
        let mut abandoned: Option<&'static str> = None;

        loop {
            let mut remaining = Vec::new();
            for (stage, handle) in workers.drain(..) {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        error!("{} worker panicked during shutdown", stage);
                    }
                } else {
                    remaining.push((stage, handle));
                }
            }
            workers = remaining;

            if workers.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                for (stage, _) in &workers {
                    warn!("{} worker did not stop within {:?}, abandoning", stage, timeout);
                    abandoned.get_or_insert(*stage);
                }
                // Dropping the JoinHandles detaches the threads
                break;
            }

            std::thread::sleep(poll.min(deadline.saturating_duration_since(Instant::now())));
        }

        match abandoned {
            None => {
                info!("Pipeline stopped");
                Ok(())
            }
            Some(stage) => Err(PipelineError::ShutdownIncomplete { stage }),
        }
    }
}
