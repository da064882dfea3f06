use super::types::TranscriptionOutcome;
use crate::session::{ServerMessage, SessionRegistry};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Moves a worker-thread completion into the originating session's
/// outbound channel, which is drained on the runtime.
///
/// Safe to call from any worker thread. Never blocks: the outbound
/// channel is bounded and a full channel rejects the outcome (logged)
/// instead of stalling the shared worker — a stalled worker would
/// propagate backpressure to every other session's transcription.
#[derive(Clone)]
pub struct ResultBridge {
    registry: Arc<SessionRegistry>,
}

/// What became of a delivered outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The session disconnected mid-flight; the outcome is discarded.
    SessionGone,
    /// The session's outbound channel is at capacity; the outcome is
    /// rejected rather than queued.
    ChannelFull,
}

impl ResultBridge {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver one outcome, preserving per-session FIFO order (single
    /// writer per completion, bounded channel).
    pub fn deliver(&self, outcome: TranscriptionOutcome) -> Delivery {
        let Some(session) = self.registry.lookup(outcome.session_id) else {
            debug!(
                "Discarding transcription for departed session {}",
                outcome.session_id
            );
            return Delivery::SessionGone;
        };

        let message = ServerMessage::Transcription {
            text: outcome.text,
            timestamp: outcome.timestamp,
            audio_file: outcome.locator,
        };

        match session.try_send(message) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Outbound channel full for session {}, rejecting transcription",
                    outcome.session_id
                );
                Delivery::ChannelFull
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    "Outbound channel closed for session {}, discarding transcription",
                    outcome.session_id
                );
                Delivery::SessionGone
            }
        }
    }
}
