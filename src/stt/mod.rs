//! Speech-to-text collaborator boundary
//!
//! The transcription stage treats the engine as an opaque blocking
//! function from audio bytes to text. It is invoked from a dedicated
//! worker thread and assumed single-call-at-a-time safe; whether it is
//! a local model or a remote API is this module's concern alone.

mod http;

pub use http::HttpTranscriber;

use crate::error::{PipelineError, Result};

/// Blocking speech-to-text engine.
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio chunk to text. May block for as long as
    /// inference takes; callers own the thread they run this on.
    fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Mock transcriber for testing and offline runs.
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    response: String,
    should_fail: bool,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            response: "mock transcription".to_string(),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        if self.should_fail {
            Err(PipelineError::Inference {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }
}
