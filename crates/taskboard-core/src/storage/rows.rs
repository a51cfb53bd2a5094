//! Row-level queries
//!
//! Free functions over a `Connection` so they run the same inside or
//! outside a transaction (`Transaction` derefs to `Connection`).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::models::{from_millis, Board, Card, List};

pub(crate) fn get_board(conn: &Connection, board_id: i64) -> Result<Option<Board>> {
    conn.query_row(
        "SELECT board_id, title, created_at, updated_at FROM boards WHERE board_id = ?",
        params![board_id],
        board_from_row,
    )
    .optional()
}

/// Insert the board unless a row with this id already exists
///
/// Returns true when a row was created.
pub(crate) fn insert_board_if_missing(
    conn: &Connection,
    board_id: i64,
    title: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let millis = now.timestamp_millis();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO boards (board_id, title, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        params![board_id, title, millis],
    )?;
    Ok(inserted > 0)
}

pub(crate) fn touch_board(conn: &Connection, board_id: i64, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE boards SET updated_at = ?1 WHERE board_id = ?2",
        params![now.timestamp_millis(), board_id],
    )?;
    Ok(())
}

pub(crate) fn find_list(conn: &Connection, list_id: i64) -> Result<Option<List>> {
    conn.query_row(
        "SELECT list_id, board_id, title, position FROM lists WHERE list_id = ?",
        params![list_id],
        list_from_row,
    )
    .optional()
}

pub(crate) fn insert_list(
    conn: &Connection,
    board_id: i64,
    title: &str,
    position: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO lists (board_id, title, position) VALUES (?1, ?2, ?3)",
        params![board_id, title, position],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_list(conn: &Connection, list_id: i64, title: &str, position: i64) -> Result<()> {
    conn.execute(
        "UPDATE lists SET title = ?1, position = ?2 WHERE list_id = ?3",
        params![title, position, list_id],
    )?;
    Ok(())
}

pub(crate) fn find_card(conn: &Connection, card_id: i64) -> Result<Option<Card>> {
    conn.query_row(
        "SELECT card_id, list_id, title, description, position FROM cards WHERE card_id = ?",
        params![card_id],
        card_from_row,
    )
    .optional()
}

pub(crate) fn insert_card(
    conn: &Connection,
    list_id: i64,
    title: &str,
    description: &str,
    position: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO cards (list_id, title, description, position) VALUES (?1, ?2, ?3, ?4)",
        params![list_id, title, description, position],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite a card, including its owning list
pub(crate) fn update_card(
    conn: &Connection,
    card_id: i64,
    list_id: i64,
    title: &str,
    description: &str,
    position: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE cards SET list_id = ?1, title = ?2, description = ?3, position = ?4
         WHERE card_id = ?5",
        params![list_id, title, description, position, card_id],
    )?;
    Ok(())
}

/// Lists of a board in display order
pub(crate) fn lists_for_board(conn: &Connection, board_id: i64) -> Result<Vec<List>> {
    let mut stmt = conn.prepare(
        "SELECT list_id, board_id, title, position FROM lists
         WHERE board_id = ? ORDER BY position, list_id",
    )?;
    let rows = stmt.query_map(params![board_id], list_from_row)?;
    rows.collect()
}

/// Every card on a board, ordered by position within each list
pub(crate) fn cards_for_board(conn: &Connection, board_id: i64) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT c.card_id, c.list_id, c.title, c.description, c.position
        FROM cards c
        JOIN lists l ON c.list_id = l.list_id
        WHERE l.board_id = ?
        ORDER BY c.list_id, c.position, c.card_id
        "#,
    )?;
    let rows = stmt.query_map(params![board_id], card_from_row)?;
    rows.collect()
}

fn board_from_row(row: &Row<'_>) -> Result<Board> {
    Ok(Board {
        board_id: row.get(0)?,
        title: row.get(1)?,
        created_at: from_millis(row.get(2)?),
        updated_at: from_millis(row.get(3)?),
    })
}

fn list_from_row(row: &Row<'_>) -> Result<List> {
    Ok(List {
        list_id: row.get(0)?,
        board_id: row.get(1)?,
        title: row.get(2)?,
        position: row.get(3)?,
    })
}

fn card_from_row(row: &Row<'_>) -> Result<Card> {
    Ok(Card {
        card_id: row.get(0)?,
        list_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        position: row.get(4)?,
    })
}
