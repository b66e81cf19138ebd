pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod provider;

pub use clock::{Clock, FixedClock, SystemClock};
pub use database::{CardStateStore, KeyValueMedium, MemoryMedium, SqliteMedium};
pub use error::{AlgorithmError, InvalidRating, SessionError, StorageError};
pub use models::{CardState, Deck, Flashcard, Rating, ReviewSession, Scheduler};
pub use provider::{FlashcardProvider, JsonDeckProvider, SqliteDeckProvider};
