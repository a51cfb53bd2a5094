//! Board snapshots
//!
//! A snapshot is the full nested representation of a board (lists under the
//! board, cards under each list) exchanged over HTTP and the realtime
//! channel. Inbound snapshots may omit identifiers (new rows), positions
//! (index order) and descriptions; outbound snapshots always carry them.

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Full nested board
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Target board; `None` means the configured board
    #[serde(default)]
    pub board_id: Option<i64>,
    /// Board title; ignored when reconciling
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lists: Vec<ListSnapshot>,
}

/// A list together with its cards, in display order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListSnapshot {
    /// `None` or an unknown identifier creates a new list
    #[serde(default)]
    pub list_id: Option<i64>,
    pub title: String,
    /// Defaults to the list's index in the snapshot
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub cards: Vec<CardSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSnapshot {
    /// `None` or an unknown identifier creates a new card
    #[serde(default)]
    pub card_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the card's index within its list
    #[serde(default)]
    pub position: Option<i64>,
}

impl BoardSnapshot {
    /// Reject snapshots that must not reach the store
    ///
    /// Only checks what serde cannot: blank titles. Duplicate identifiers
    /// are allowed; the last occurrence wins during reconciliation.
    pub fn validate(&self) -> Result<(), BoardError> {
        for (li, list) in self.lists.iter().enumerate() {
            if list.title.trim().is_empty() {
                return Err(BoardError::Validation(format!(
                    "lists[{}].title must not be blank",
                    li
                )));
            }
            for (ci, card) in list.cards.iter().enumerate() {
                if card.title.trim().is_empty() {
                    return Err(BoardError::Validation(format!(
                        "lists[{}].cards[{}].title must not be blank",
                        li, ci
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of cards across all lists
    #[cfg(test)]
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }

    /// Find a list by identifier
    #[cfg(test)]
    pub fn list(&self, list_id: i64) -> Option<&ListSnapshot> {
        self.lists.iter().find(|l| l.list_id == Some(list_id))
    }
}

impl ListSnapshot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, list_id: i64) -> Self {
        self.list_id = Some(list_id);
        self
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn card(mut self, card: CardSnapshot) -> Self {
        self.cards.push(card);
        self
    }

    /// Position to store: the explicit one, or the index among siblings
    pub(crate) fn effective_position(&self, index: usize) -> i64 {
        self.position.unwrap_or(index as i64)
    }
}

impl CardSnapshot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, card_id: i64) -> Self {
        self.card_id = Some(card_id);
        self
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub(crate) fn effective_position(&self, index: usize) -> i64 {
        self.position.unwrap_or(index as i64)
    }
}
