//! Board service
//!
//! The one place where store and broadcaster meet. Holds the configured
//! board identifier (the board is created lazily on first fetch) and
//! serialises every store access through a single async mutex, so a
//! reconciliation is never observed half-applied.
//!
//! Concurrent updates are last-committed-wins: there is no version check.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{BoardError, BroadcastError};
use crate::realtime::{Broadcaster, Event, FanOut, SessionId};
use crate::reconcile::ReconcileOutcome;
use crate::snapshot::BoardSnapshot;
use crate::storage::{BoardStore, StorageError};

/// Result of a committed update
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub outcome: ReconcileOutcome,
    /// Board as stored after the commit
    pub board: BoardSnapshot,
    pub fan_out: FanOut,
}

/// Fetch and update operations over the single board
#[derive(Clone)]
pub struct BoardService {
    store: Arc<Mutex<BoardStore>>,
    broadcaster: Arc<Broadcaster>,
    board_id: i64,
    default_title: String,
}

impl BoardService {
    pub fn new(store: BoardStore, broadcaster: Arc<Broadcaster>, config: &Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            broadcaster,
            board_id: config.board_id,
            default_title: config.default_board_title.clone(),
        }
    }

    pub fn board_id(&self) -> i64 {
        self.board_id
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Get a handle to the shared store
    pub fn shared_store(&self) -> Arc<Mutex<BoardStore>> {
        self.store.clone()
    }

    /// Return the board, creating it on first use
    pub async fn fetch_board(&self) -> Result<BoardSnapshot, BoardError> {
        let store = self.store.lock().await;
        store.ensure_board(self.board_id, &self.default_title)?;
        let snapshot = store
            .load_snapshot(self.board_id)?
            .ok_or(BoardError::NotFound {
                board_id: self.board_id,
            })?;
        Ok(snapshot)
    }

    /// Reconcile `snapshot` into the store, then push the result to peers
    ///
    /// `origin` is the caller's realtime session, if known; it is left out
    /// of the fan-out. Broadcast problems are logged and never turn a
    /// committed update into an error.
    pub async fn update_board(
        &self,
        snapshot: BoardSnapshot,
        origin: Option<SessionId>,
    ) -> Result<UpdateReport, BoardError> {
        snapshot.validate()?;
        let board_id = snapshot.board_id.unwrap_or(self.board_id);

        // Publishing under the store lock keeps fan-outs in commit order
        let mut store = self.store.lock().await;
        let outcome = store.apply_snapshot(board_id, &snapshot)?;
        let board = store
            .load_snapshot(board_id)?
            .ok_or(BoardError::Store(StorageError::Database(
                rusqlite::Error::QueryReturnedNoRows,
            )))?;

        info!(
            "Board {} updated: lists +{} ~{}, cards +{} ~{} moved {}",
            board_id,
            outcome.lists_created(),
            outcome.lists_updated(),
            outcome.cards_created(),
            outcome.cards_updated(),
            outcome.cards_moved()
        );

        let fan_out = self.publish(&board, origin).await;
        drop(store);

        Ok(UpdateReport {
            outcome,
            board,
            fan_out,
        })
    }

    async fn publish(&self, board: &BoardSnapshot, origin: Option<SessionId>) -> FanOut {
        let payload = match serde_json::to_value(board) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("{}", BroadcastError::Encode(e));
                return FanOut::default();
            }
        };
        self.broadcaster
            .fan_out(&Event::UpdateBoard(payload), origin)
            .await
    }
}
