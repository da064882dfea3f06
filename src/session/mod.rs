//! Live session management
//!
//! A session is one logical client connection: a unique id, an inbound
//! stream of audio chunks, and a bounded outbound channel of results.
//! The registry is the only structure shared between the runtime and
//! the stage worker threads.

mod messages;
mod registry;

pub use messages::ServerMessage;
pub use registry::{Session, SessionInfo, SessionRegistry};
