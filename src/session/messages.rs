use serde::{Deserialize, Serialize};

/// JSON messages sent to the client over its WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once, immediately after registration
    SessionInit { session_id: String },
    /// One per successfully transcribed chunk
    Transcription {
        text: String,
        timestamp: f64,
        audio_file: String,
    },
    /// A chunk was dropped due to saturation or a processing error;
    /// the connection stays open
    Warning { message: String },
}
