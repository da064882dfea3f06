//! Error types for live-transcribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    // Backpressure: a bounded stage queue rejected the submission
    #[error("{stage} queue is full, chunk rejected")]
    QueueSaturated { stage: &'static str },

    // One chunk failed to persist; its transcription is skipped
    #[error("Failed to store audio chunk: {message}")]
    Storage { message: String },

    // One chunk failed to transcribe; its outcome is dropped
    #[error("Transcription inference failed: {message}")]
    Inference { message: String },

    // Connection-level failure; triggers session teardown
    #[error("Transport error: {message}")]
    Transport { message: String },

    // A stage worker missed the shutdown deadline and was abandoned
    #[error("{stage} worker did not stop within the shutdown timeout")]
    ShutdownIncomplete { stage: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PipelineError>;
