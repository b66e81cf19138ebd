//! JSON deck files.
//! A deck file holds a name and its flashcards, each with an `id`, `frontText` and `backText`.
//!
//! `JsonDeckProvider` keys review progress by the file's `id`s, so they are required.
//! Importing into the database (`db::import_deck`) stores cards under new row ids instead,
//! and progress recorded against the file ids does not carry over.

use super::FlashcardProvider;
use crate::error::ProviderError;
use crate::models::{Deck, Flashcard};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads a deck from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: &Path) -> Result<Deck, ProviderError> {
    let contents = fs::read_to_string(path)?;
    let deck: Deck = serde_json::from_str(&contents)?;

    log::info!("Deck '{}' read from '{}'", deck.name, path.display());
    Ok(deck)
}

/// Reads the deck file on every listing, so edits to the file show up in the next session.
#[derive(Clone, Debug)]
pub struct JsonDeckProvider {
    path: PathBuf,
}

impl JsonDeckProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FlashcardProvider for JsonDeckProvider {
    fn list_cards(&self) -> Result<Vec<Flashcard>, ProviderError> {
        Ok(import_json(&self.path)?.flashcards)
    }
}
