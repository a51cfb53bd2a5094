//! Session registry and fan-out
//!
//! Every live session owns an unbounded outbound channel of encoded frames.
//! Fan-out pushes one frame into every channel except the originator's.
//! Sends never block and are never retried: a peer whose channel is gone
//! is logged, pruned, and skipped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::message::Event;
use super::session::{SessionId, SessionState};
use crate::error::BroadcastError;

/// Receiving end of a session's outbound frames
pub type Outbound = mpsc::UnboundedReceiver<String>;

struct SessionHandle {
    tx: mpsc::UnboundedSender<String>,
    connected_at: DateTime<Utc>,
}

/// Result of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Sessions the frame was queued for
    pub delivered: usize,
    /// Sessions found closed and pruned
    pub failed: usize,
}

/// Registry of live sessions
#[derive(Default)]
pub struct Broadcaster {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session
    ///
    /// The returned channel already holds a `connected` frame carrying the
    /// session id.
    pub async fn connect(&self) -> (SessionId, Outbound) {
        let id = SessionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        match (Event::Connected { session_id: id }).encode() {
            Ok(frame) => {
                let _ = tx.send(frame);
            }
            Err(e) => warn!("{}", BroadcastError::Encode(e)),
        }

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            SessionHandle {
                tx,
                connected_at: Utc::now(),
            },
        );
        info!("Client connected: {} ({} live)", id, sessions.len());

        (id, rx)
    }

    /// Remove a session; always ends in `Disconnected`
    pub async fn disconnect(&self, id: SessionId) -> SessionState {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(&id) {
            Some(handle) => {
                let lifetime = Utc::now() - handle.connected_at;
                info!(
                    "Client disconnected: {} after {}s ({} live)",
                    id,
                    lifetime.num_seconds(),
                    sessions.len()
                );
            }
            None => debug!("Disconnect for unknown session {}", id),
        }
        SessionState::Disconnected
    }

    pub async fn state(&self, id: SessionId) -> SessionState {
        if self.sessions.read().await.contains_key(&id) {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Handle an event received from session `origin`
    ///
    /// Board updates and chat messages go to every other session.
    /// `connected` is server-to-client only and is dropped.
    pub async fn dispatch(&self, origin: SessionId, event: Event) -> FanOut {
        match event {
            Event::UpdateBoard(_) | Event::NewChatMessage(_) => {
                debug!("Relaying {} from {}", event.name(), origin);
                self.fan_out(&event, Some(origin)).await
            }
            Event::Connected { .. } => {
                warn!("Ignoring client-sent connected event from {}", origin);
                FanOut::default()
            }
        }
    }

    /// Send `event` to every live session except `exclude`
    pub async fn fan_out(&self, event: &Event, exclude: Option<SessionId>) -> FanOut {
        let frame = match event.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{}", BroadcastError::Encode(e));
                return FanOut::default();
            }
        };

        let mut report = FanOut::default();
        let mut closed = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, handle) in sessions.iter() {
                if Some(*id) == exclude {
                    continue;
                }
                if handle.tx.send(frame.clone()).is_ok() {
                    report.delivered += 1;
                } else {
                    warn!("{}", BroadcastError::SessionClosed(*id));
                    closed.push(*id);
                }
            }
        }

        if !closed.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &closed {
                sessions.remove(id);
            }
            report.failed = closed.len();
        }

        report
    }
}
