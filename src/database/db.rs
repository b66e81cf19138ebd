//! Database operations for the review app
//!
//! Handles SQLite database initialization, deck and flashcard storage,
//! and the `app_state` key-value table that review progress is persisted into.

use super::medium::KeyValueMedium;
use crate::error::MediumError;
use crate::models::{Deck, Flashcard};
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Opens (or creates) the database file and makes sure all tables exist
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Same schema as [`init_database`], kept in memory
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            front_text TEXT NOT NULL,
            back_text TEXT NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name),
            UNIQUE(deck_name, front_text)
        );

        -- review progress lives here as one serialized record per key
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )
}

/// Creates a new deck in the database
pub fn new_deck(name: &str, conn: &Connection) -> Result<()> {
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    log::info!("Deck '{}' created", name);
    Ok(())
}

pub fn deck_exists(name: &str, conn: &Connection) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM decks WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Adds a flashcard to a deck and returns its ID.
///
/// A card whose front already exists in the deck is left as it is and its
/// existing ID is returned. No review state is created; the card starts new.
pub fn add_flashcard(
    deck_name: &str,
    front_text: &str,
    back_text: &str,
    conn: &Connection,
) -> Result<i64> {
    insert_flashcard(deck_name, front_text, back_text, conn)?;

    conn.query_row(
        "SELECT id FROM flashcards WHERE deck_name = ?1 AND front_text = ?2",
        params![deck_name, front_text],
        |row| row.get(0),
    )
}

/// Returns false when the deck already has a card with this front
fn insert_flashcard(
    deck_name: &str,
    front_text: &str,
    back_text: &str,
    conn: &Connection,
) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_name, front_text, back_text) VALUES (?1, ?2, ?3)",
        params![deck_name, front_text, back_text],
    )?;
    Ok(changed > 0)
}

/// Retrieves all flashcards of a deck in insertion order
pub fn get_flashcards_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT id, front_text, back_text FROM flashcards WHERE deck_name = ?1 ORDER BY id ASC",
    )?;

    let flashcards = stmt
        .query_map(params![deck_name], |row| {
            Ok(Flashcard {
                id: row.get::<_, i64>(0)?.to_string(),
                front_text: row.get(1)?,
                back_text: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<Flashcard>>>()?;

    Ok(flashcards)
}

/// Returns every deck name with its card count, sorted by name
pub fn get_deck_summaries(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT d.name, COUNT(f.id)
         FROM decks d
         LEFT JOIN flashcards f ON f.deck_name = d.name
         GROUP BY d.name
         ORDER BY d.name",
    )?;
    let decks = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(decks)
}

/// Stores a whole deck in one transaction. Fails if a deck with the same name exists.
///
/// Returns how many cards were stored. Cards repeating an earlier front are
/// skipped, and file ids are replaced by database row ids.
pub fn import_deck(deck: &Deck, conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction()?;
    new_deck(&deck.name, &tx)?;
    let mut inserted = 0;
    for flashcard in &deck.flashcards {
        if insert_flashcard(&deck.name, &flashcard.front_text, &flashcard.back_text, &tx)? {
            inserted += 1;
        }
    }
    tx.commit()?;
    let skipped = deck.flashcards.len() - inserted;
    if skipped > 0 {
        log::warn!("Skipped {} duplicate cards in deck '{}'", skipped, deck.name);
    }
    Ok(inserted)
}

/// Review progress medium backed by the `app_state` table
#[derive(Clone)]
pub struct SqliteMedium {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMedium {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl KeyValueMedium for SqliteMedium {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::LockPoisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO app_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> std::result::Result<(), MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::LockPoisoned)?;
        conn.execute("DELETE FROM app_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}
