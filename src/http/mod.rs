//! HTTP / WebSocket transport
//!
//! - GET /ws/transcribe - WebSocket stream: binary audio chunks in,
//!   JSON transcription results out
//! - GET /sessions - list live sessions
//! - GET /health - health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
