//! Deck is a named, ordered set of flashcards
use super::Flashcard;
use serde::{Deserialize, Serialize};

/// Card ids are kept as read. The database import assigns its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            name: "My Deck".to_string(),
            flashcards: Vec::new(),
        }
    }
}
