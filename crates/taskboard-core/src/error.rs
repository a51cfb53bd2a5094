//! Board operation errors
//!
//! `BoardError` is what fetch and update surface to callers. Broadcast
//! failures have their own type because they never reach the caller: they
//! are logged per peer after the store has already committed.

use thiserror::Error;

use crate::realtime::SessionId;
use crate::storage::StorageError;

/// Errors returned by board fetch/update
#[derive(Error, Debug)]
pub enum BoardError {
    /// Update targeted a board row that does not exist
    #[error("Board not found: {board_id}")]
    NotFound { board_id: i64 },

    /// Snapshot is malformed; nothing was written
    #[error("Invalid board snapshot: {0}")]
    Validation(String),

    /// Store failure; the transaction was rolled back
    #[error(transparent)]
    Store(#[from] StorageError),
}

impl From<rusqlite::Error> for BoardError {
    fn from(error: rusqlite::Error) -> Self {
        BoardError::Store(StorageError::Database(error))
    }
}

/// Failure delivering an event to one peer
#[derive(Error, Debug)]
pub enum BroadcastError {
    /// The peer's connection went away before the send
    #[error("Session {0} is closed")]
    SessionClosed(SessionId),

    /// The event could not be encoded as a frame
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rusqlite_error_becomes_store_error() {
        let err: BoardError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(
            err,
            BoardError::Store(StorageError::Database(
                rusqlite::Error::QueryReturnedNoRows
            ))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = BoardError::NotFound { board_id: 3 };
        assert_eq!(err.to_string(), "Board not found: 3");

        let err = BoardError::Validation("lists[0].title must not be blank".into());
        assert!(err.to_string().contains("lists[0].title"));
    }
}
