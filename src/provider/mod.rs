//! Sources of flashcards for a review session.

pub mod json;

pub use json::JsonDeckProvider;

use crate::database::db;
use crate::error::ProviderError;
use crate::models::{Deck, Flashcard};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Lists the cards of one collection in a stable order.
pub trait FlashcardProvider {
    fn list_cards(&self) -> Result<Vec<Flashcard>, ProviderError>;
}

impl FlashcardProvider for Deck {
    fn list_cards(&self) -> Result<Vec<Flashcard>, ProviderError> {
        Ok(self.flashcards.clone())
    }
}

/// Cards of one deck in the app database.
#[derive(Clone)]
pub struct SqliteDeckProvider {
    deck_name: String,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDeckProvider {
    pub fn new(deck_name: impl Into<String>, conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            deck_name: deck_name.into(),
            conn,
        }
    }

    pub fn deck_name(&self) -> &str {
        &self.deck_name
    }
}

impl FlashcardProvider for SqliteDeckProvider {
    fn list_cards(&self) -> Result<Vec<Flashcard>, ProviderError> {
        let conn = self.conn.lock().map_err(|_| ProviderError::LockPoisoned)?;
        if !db::deck_exists(&self.deck_name, &conn)? {
            return Err(ProviderError::DeckNotFound(self.deck_name.clone()));
        }
        Ok(db::get_flashcards_for_deck(&self.deck_name, &conn)?)
    }
}
