//! Error types shared across the scheduler, the card state store and the
//! review session.

use thiserror::Error;

/// A rating outside Hard (1), Good (2), Easy (3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid rating {0}: expected 1 (hard), 2 (good) or 3 (easy)")]
pub struct InvalidRating(pub u8);

/// Failure while computing the next review state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlgorithmError {
    #[error("Failed to calculate next review: {0}")]
    InvalidRating(#[from] InvalidRating),

    #[error("Failed to calculate next review: {0}")]
    Internal(String),
}

/// Failure of the underlying key-value medium.
#[derive(Debug, Error)]
pub enum MediumError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to load review progress, progress may be reset: {0}")]
    Read(#[source] MediumError),

    #[error("Stored review progress is unreadable, progress may be reset: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Failed to encode review progress, progress may not be saved: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to save review progress, progress may not be saved: {0}")]
    Write(#[source] MediumError),

    #[error("Failed to clear review progress, progress may not be saved: {0}")]
    Delete(#[source] MediumError),
}

/// Failure of a flashcard source.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No cards are due for review")]
    NoCardsAvailable,

    #[error("Failed to load flashcards: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Text suitable for showing to the person reviewing.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NoCardsAvailable => {
                "Nothing to review right now. Come back when cards are due.".to_string()
            }
            SessionError::Provider(e) => format!("Could not load your cards: {}", e),
            SessionError::Algorithm(e) => e.to_string(),
            SessionError::Storage(e) => e.to_string(),
        }
    }

    /// `NoCardsAvailable` is an expected outcome rather than a failure.
    pub fn is_fault(&self) -> bool {
        !matches!(self, SessionError::NoCardsAvailable)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_messages_distinguish_read_and_write() {
        let read = StorageError::Read(MediumError::LockPoisoned);
        let write = StorageError::Write(MediumError::LockPoisoned);

        assert!(read.to_string().contains("may be reset"));
        assert!(write.to_string().contains("may not be saved"));
    }

    #[test]
    fn test_algorithm_error_keeps_rating_message() {
        let err: AlgorithmError = InvalidRating(4).into();
        assert!(err.to_string().contains("Invalid rating 4"));
    }

    #[test]
    fn test_no_cards_is_not_a_fault() {
        assert!(!SessionError::NoCardsAvailable.is_fault());
        let err = SessionError::from(ProviderError::DeckNotFound("Spanish".to_string()));
        assert!(err.is_fault());
        assert!(err.user_message().contains("Spanish"));
    }
}
