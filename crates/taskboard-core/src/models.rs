//! Data models for Taskboard
//!
//! Stored rows for the board, its lists and their cards. Ownership is
//! expressed only through owner-identifier fields (`List::board_id`,
//! `Card::list_id`); nothing holds a pointer back to its children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The board row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub board_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A list row, owned by a board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct List {
    pub list_id: i64,
    pub board_id: i64,
    pub title: String,
    /// Ordering hint among sibling lists; not unique
    pub position: i64,
}

/// A card row, owned by a list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub card_id: i64,
    pub list_id: i64,
    pub title: String,
    pub description: String,
    /// Ordering hint among sibling cards; not unique
    pub position: i64,
}

/// Convert a stored millisecond timestamp back to UTC
///
/// Out of range values clamp to the epoch rather than failing the read.
pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_out_of_range() {
        assert_eq!(from_millis(i64::MAX), DateTime::<Utc>::default());
    }
}
