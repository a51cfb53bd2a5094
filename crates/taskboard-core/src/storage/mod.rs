//! Storage layer
//!
//! SQLite persistence for the board, its lists and cards.
//!
//! ## Tables
//!
//! - `boards` - The single board served by the process
//! - `lists` - Lists, owned by a board via `board_id`
//! - `cards` - Cards, owned by a list via `list_id`
//!
//! Foreign keys are enforced on every connection.

pub mod error;
pub(crate) mod rows;
pub mod schema;
mod store;

pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use store::BoardStore;
