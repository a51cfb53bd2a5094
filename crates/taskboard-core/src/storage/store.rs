//! SQLite board store
//!
//! Owns the connection and exposes the two things the service needs: a
//! nested read of the board and an all-or-nothing application of a
//! snapshot.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::BoardError;
use crate::models::{Board, Card, List};
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::snapshot::{BoardSnapshot, CardSnapshot, ListSnapshot};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::rows;
use crate::storage::schema::{init_schema, needs_init};

/// Persistent store for the board, its lists and cards
pub struct BoardStore {
    conn: Connection,
}

impl BoardStore {
    /// Open or create the SQLite database
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
            }
        }

        let conn = Connection::open(&path).map_err(|source| StorageError::Open {
            path: path.clone(),
            source,
        })?;
        debug!("Opened board database at {:?}", path);

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if needs_init(&conn) {
            init_schema(&conn)?;
            info!("Initialized board database schema");
        }

        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the board if it is missing and return it
    ///
    /// Idempotent: an existing board keeps its title and timestamps.
    pub fn ensure_board(&self, board_id: i64, default_title: &str) -> StorageResult<Board> {
        if rows::insert_board_if_missing(&self.conn, board_id, default_title, Utc::now())? {
            info!("Created board {} ({:?})", board_id, default_title);
        }
        rows::get_board(&self.conn, board_id)?.ok_or(StorageError::Database(
            rusqlite::Error::QueryReturnedNoRows,
        ))
    }

    pub fn get_board(&self, board_id: i64) -> StorageResult<Option<Board>> {
        Ok(rows::get_board(&self.conn, board_id)?)
    }

    /// Lists of the board in display order
    pub fn lists(&self, board_id: i64) -> StorageResult<Vec<List>> {
        Ok(rows::lists_for_board(&self.conn, board_id)?)
    }

    /// Cards of the board grouped by owning list
    pub fn cards_by_list(&self, board_id: i64) -> StorageResult<HashMap<i64, Vec<Card>>> {
        let mut index: HashMap<i64, Vec<Card>> = HashMap::new();
        for card in rows::cards_for_board(&self.conn, board_id)? {
            index.entry(card.list_id).or_default().push(card);
        }
        Ok(index)
    }

    /// Read the nested board
    ///
    /// Returns `None` if the board row does not exist.
    pub fn load_snapshot(&self, board_id: i64) -> StorageResult<Option<BoardSnapshot>> {
        let Some(board) = self.get_board(board_id)? else {
            return Ok(None);
        };

        let mut cards_by_list = self.cards_by_list(board_id)?;
        let lists = self
            .lists(board_id)?
            .into_iter()
            .map(|list| {
                let cards = cards_by_list
                    .remove(&list.list_id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(card_snapshot)
                    .collect();
                ListSnapshot {
                    list_id: Some(list.list_id),
                    title: list.title,
                    position: Some(list.position),
                    cards,
                }
            })
            .collect();

        Ok(Some(BoardSnapshot {
            board_id: Some(board.board_id),
            title: Some(board.title),
            lists,
        }))
    }

    /// Merge a snapshot into the board in one transaction
    ///
    /// Either every upsert is committed or none is: the transaction rolls
    /// back when dropped on an error path.
    pub fn apply_snapshot(
        &mut self,
        board_id: i64,
        snapshot: &BoardSnapshot,
    ) -> Result<ReconcileOutcome, BoardError> {
        let tx = self.conn.transaction()?;
        let outcome = reconcile(&tx, board_id, snapshot)?;
        tx.commit()?;
        Ok(outcome)
    }

    pub fn list_count(&self) -> StorageResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM lists", [], |row| row.get(0))?)
    }

    pub fn card_count(&self) -> StorageResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?)
    }
}

fn card_snapshot(card: Card) -> CardSnapshot {
    CardSnapshot {
        card_id: Some(card.card_id),
        title: card.title,
        description: card.description,
        position: Some(card.position),
    }
}
