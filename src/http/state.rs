use crate::pipeline::PipelineSupervisor;
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Shared application state for HTTP handlers.
///
/// The composition root (registry + supervisor) is built once in main
/// and cloned into every handler; no hidden globals.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub pipeline: Arc<PipelineSupervisor>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, pipeline: Arc<PipelineSupervisor>) -> Self {
        Self { registry, pipeline }
    }
}
