//! Persistence and transcription pipeline
//!
//! Two sequential stages behind bounded queues, each consumed by
//! dedicated blocking worker threads, plus the bridge that moves a
//! worker's completion back onto the runtime owning the originating
//! connection. Submission from the runtime is always non-blocking;
//! saturation rejects the chunk rather than parking the producer.

mod bridge;
mod persist;
mod supervisor;
mod transcribe;
mod types;

pub use bridge::{Delivery, ResultBridge};
pub use persist::PersistenceStage;
pub use supervisor::PipelineSupervisor;
pub use transcribe::TranscriptionStage;
pub use types::{
    PersistJob, PersistRequest, TranscribeJob, TranscribeRequest, TranscriptionOutcome,
};
