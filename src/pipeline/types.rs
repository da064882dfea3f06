//! Queue items moving through the pipeline.

use crate::error::Result;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Request to durably store one audio chunk.
///
/// `reply` is a single-slot rendezvous scoped to this request alone,
/// so multiple in-flight saves never cross-deliver results. The worker
/// resolves it with the locator (or the storage failure) and the
/// submitting coroutine awaits it without ever blocking the runtime.
pub struct PersistRequest {
    pub session_id: Uuid,
    pub payload: Vec<u8>,
    pub timestamp: f64,
    pub reply: oneshot::Sender<Result<String>>,
}

/// Request to transcribe a chunk that has already been persisted.
pub struct TranscribeRequest {
    pub session_id: Uuid,
    pub payload: Vec<u8>,
    pub timestamp: f64,
    pub locator: String,
}

/// The unit delivered into a session's outbound channel.
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    pub session_id: Uuid,
    pub text: String,
    pub timestamp: f64,
    pub locator: String,
}

/// Work item on the persistence queue. The sentinel unblocks a worker
/// parked on an empty-queue wait during shutdown.
pub enum PersistJob {
    Chunk(PersistRequest),
    Shutdown,
}

/// Work item on the transcription queue.
pub enum TranscribeJob {
    Chunk(TranscribeRequest),
    Shutdown,
}
