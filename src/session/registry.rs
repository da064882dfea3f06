use super::messages::ServerMessage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Handle to a live session: its id and the producer side of its
/// outbound result channel.
///
/// Cloneable so the registry, the connection handler, and the
/// transcription workers can all hold one; the channel closes once the
/// session is unregistered and the handler's copy is dropped.
#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    outbound: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Non-blocking enqueue into the session's outbound channel.
    ///
    /// Safe to call from worker threads; never waits on the runtime.
    pub fn try_send(
        &self,
        message: ServerMessage,
    ) -> std::result::Result<(), mpsc::error::TrySendError<ServerMessage>> {
        self.outbound.try_send(message)
    }
}

/// Summary of a live session, exposed by `GET /sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Owns the set of live sessions and, per session, the sender half of
/// its bounded outbound channel.
///
/// Shared between the tokio runtime and the stage worker threads, so
/// the map sits behind a `std::sync::RwLock`; every method only holds
/// the lock for a map operation and never blocks beyond that.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Session>>,
    outbound_capacity: usize,
}

impl SessionRegistry {
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            outbound_capacity,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Create a session with a fresh unique id and an empty bounded
    /// outbound channel, and record it.
    ///
    /// Returns the session handle plus the consumer side of the
    /// channel, which belongs to the connection's outbound loop.
    pub fn register(&self) -> (Session, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let session = Session {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            outbound: tx,
        };

        let mut sessions = self.write();
        sessions.insert(session.id, session.clone());
        info!("Session {} registered ({} live)", session.id, sessions.len());

        (session, rx)
    }

    /// Remove the session and drop the registry's sender, closing the
    /// channel once the handler's copy goes away.
    ///
    /// Idempotent: returns true only for the call that actually removed
    /// the session; later calls are no-ops.
    pub fn unregister(&self, id: Uuid) -> bool {
        let removed = {
            let mut sessions = self.write();
            sessions.remove(&id).is_some()
        };
        if removed {
            info!("Session {} unregistered", id);
        } else {
            debug!("Session {} already unregistered", id);
        }
        removed
    }

    /// Look up a live session. Workers use the `None` branch to
    /// silently drop completions for sessions that disconnected
    /// mid-flight.
    pub fn lookup(&self, id: Uuid) -> Option<Session> {
        self.read().get(&id).cloned()
    }

    /// Snapshot of live sessions for the status endpoint.
    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.read()
            .values()
            .map(|s| SessionInfo {
                session_id: s.id,
                created_at: s.created_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
