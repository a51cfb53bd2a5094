//! Taskboard Core Library
//!
//! This crate provides the core of Taskboard, a single-board task board
//! with live updates: storage, snapshot reconciliation and realtime fan-out.
//!
//! # Architecture
//!
//! - **SQLite**: Boards, lists and cards with enforced foreign keys
//! - **Reconciler**: Merges a submitted board snapshot in one transaction
//! - **Broadcaster**: Relays events to every live session but the sender
//!
//! # Quick Start
//!
//! ```text
//! let store = BoardStore::open(&config)?;
//! let service = BoardService::new(store, Arc::new(Broadcaster::new()), &config);
//!
//! // Fetch (creates the board on first use)
//! let board = service.fetch_board().await?;
//!
//! // Submit an edited snapshot; other sessions receive the result
//! service.update_board(edited, Some(session_id)).await?;
//! ```
//!
//! # Modules
//!
//! - `service`: Fetch/update entry point
//! - `reconcile`: Snapshot reconciliation
//! - `snapshot`: Nested board representation exchanged with clients
//! - `models`: Stored rows
//! - `storage`: SQLite persistence
//! - `realtime`: Session registry, event frames and WebSocket gateway
//! - `config`: Server configuration

pub mod config;
pub mod error;
pub mod models;
pub mod realtime;
pub mod reconcile;
pub mod service;
pub mod snapshot;
pub mod storage;

pub use config::Config;
pub use error::{BoardError, BroadcastError};
pub use models::{Board, Card, List};
pub use realtime::{Broadcaster, Event, Gateway, SessionId, SessionState};
pub use reconcile::{Change, ReconcileOutcome, Touched};
pub use service::{BoardService, UpdateReport};
pub use snapshot::{BoardSnapshot, CardSnapshot, ListSnapshot};
pub use storage::{BoardStore, StorageError};
