//! Board reconciliation
//!
//! Merges a client-submitted snapshot into the stored board:
//!
//! - Lists and cards are matched by identifier; unknown or missing
//!   identifiers create new rows with store-assigned ids.
//! - A matched card is reassigned to the list it is nested under in the
//!   snapshot. This is how a move between lists is expressed.
//! - Matched lists keep their board; only title and position change.
//! - Nothing is deleted. Rows absent from the snapshot stay as they are.
//! - Input order is processing order, so a duplicated identifier ends up
//!   with its last occurrence. This holds for unmatched identifiers too: a
//!   repeat of one resolves to the row its first occurrence created.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::Transaction;
use tracing::debug;

use crate::error::BoardError;
use crate::snapshot::BoardSnapshot;
use crate::storage::rows;

/// What happened to one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    /// Card reassigned from another list
    Moved { from_list: i64 },
}

/// A row touched by a reconciliation, by stored identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touched {
    pub id: i64,
    pub change: Change,
}

/// Rows touched by one reconciliation, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub board_id: i64,
    pub lists: Vec<Touched>,
    pub cards: Vec<Touched>,
}

impl ReconcileOutcome {
    pub fn lists_created(&self) -> usize {
        count(&self.lists, |c| matches!(c, Change::Created))
    }

    pub fn lists_updated(&self) -> usize {
        count(&self.lists, |c| matches!(c, Change::Updated))
    }

    pub fn cards_created(&self) -> usize {
        count(&self.cards, |c| matches!(c, Change::Created))
    }

    pub fn cards_updated(&self) -> usize {
        count(&self.cards, |c| matches!(c, Change::Updated))
    }

    pub fn cards_moved(&self) -> usize {
        count(&self.cards, |c| matches!(c, Change::Moved { .. }))
    }
}

fn count(rows: &[Touched], pred: impl Fn(Change) -> bool) -> usize {
    rows.iter().filter(|t| pred(t.change)).count()
}

/// Apply `snapshot` to `board_id` within `tx`
///
/// Fails with `NotFound` before writing anything if the board row is
/// missing. The caller owns the transaction and decides whether to commit.
pub fn reconcile(
    tx: &Transaction<'_>,
    board_id: i64,
    snapshot: &BoardSnapshot,
) -> Result<ReconcileOutcome, BoardError> {
    if rows::get_board(tx, board_id)?.is_none() {
        return Err(BoardError::NotFound { board_id });
    }

    let mut outcome = ReconcileOutcome {
        board_id,
        ..Default::default()
    };

    // Submitted id -> row created for it during this call
    let mut created_lists: HashMap<i64, i64> = HashMap::new();
    let mut created_cards: HashMap<i64, i64> = HashMap::new();

    for (list_index, list) in snapshot.lists.iter().enumerate() {
        let position = list.effective_position(list_index);
        let existing = match list.list_id {
            Some(id) => rows::find_list(tx, resolve(&created_lists, id))?,
            None => None,
        };

        let list_id = match existing {
            None => {
                let id = rows::insert_list(tx, board_id, &list.title, position)?;
                if let Some(submitted) = list.list_id {
                    created_lists.insert(submitted, id);
                }
                outcome.lists.push(Touched {
                    id,
                    change: Change::Created,
                });
                id
            }
            Some(stored) => {
                rows::update_list(tx, stored.list_id, &list.title, position)?;
                outcome.lists.push(Touched {
                    id: stored.list_id,
                    change: Change::Updated,
                });
                stored.list_id
            }
        };

        for (card_index, card) in list.cards.iter().enumerate() {
            let position = card.effective_position(card_index);
            let existing = match card.card_id {
                Some(id) => rows::find_card(tx, resolve(&created_cards, id))?,
                None => None,
            };

            let touched = match existing {
                None => {
                    let id =
                        rows::insert_card(tx, list_id, &card.title, &card.description, position)?;
                    if let Some(submitted) = card.card_id {
                        created_cards.insert(submitted, id);
                    }
                    Touched {
                        id,
                        change: Change::Created,
                    }
                }
                Some(stored) => {
                    rows::update_card(
                        tx,
                        stored.card_id,
                        list_id,
                        &card.title,
                        &card.description,
                        position,
                    )?;
                    let change = if stored.list_id == list_id {
                        Change::Updated
                    } else {
                        Change::Moved {
                            from_list: stored.list_id,
                        }
                    };
                    Touched {
                        id: stored.card_id,
                        change,
                    }
                }
            };
            outcome.cards.push(touched);
        }
    }

    rows::touch_board(tx, board_id, Utc::now())?;

    debug!(
        "Reconciled board {}: {} lists, {} cards touched",
        board_id,
        outcome.lists.len(),
        outcome.cards.len()
    );

    Ok(outcome)
}

fn resolve(created: &HashMap<i64, i64>, submitted: i64) -> i64 {
    created.get(&submitted).copied().unwrap_or(submitted)
}
