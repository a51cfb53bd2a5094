//! Realtime event frames
//!
//! Frames are JSON text messages of the form
//! `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::session::SessionId;

/// Events exchanged over the realtime channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    /// Sent once to a new session; carries its identity
    #[serde(rename = "connected")]
    Connected { session_id: SessionId },

    /// Board snapshot, relayed verbatim
    #[serde(rename = "updateBoard")]
    UpdateBoard(Value),

    /// Opaque chat message, relayed verbatim
    #[serde(rename = "newChatMessage")]
    NewChatMessage(Value),
}

impl Event {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::UpdateBoard(_) => "updateBoard",
            Event::NewChatMessage(_) => "newChatMessage",
        }
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a JSON text frame
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
