pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod session;
pub mod storage;
pub mod stt;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use http::{create_router, AppState};
pub use pipeline::{
    PersistRequest, PipelineSupervisor, ResultBridge, TranscribeRequest, TranscriptionOutcome,
};
pub use session::{ServerMessage, Session, SessionInfo, SessionRegistry};
pub use storage::{AudioStore, WavStore};
pub use stt::{HttpTranscriber, MockTranscriber, Transcriber};
