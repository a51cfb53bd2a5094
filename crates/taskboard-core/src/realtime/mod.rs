//! Realtime channel
//!
//! Live sessions over WebSocket. Events received from one session are
//! relayed to every other session; the board service uses the same
//! registry to push committed board updates.
//!
//! ## Events
//!
//! - `connected` - Greeting sent to a new session with its id
//! - `updateBoard` - Board snapshot, relayed verbatim
//! - `newChatMessage` - Chat message, relayed verbatim
//!
//! Connects and disconnects are logged, never relayed.

mod broadcaster;
mod gateway;
mod message;
mod session;

pub use broadcaster::{Broadcaster, FanOut, Outbound};
pub use gateway::Gateway;
pub use message::Event;
pub use session::{SessionId, SessionState};
