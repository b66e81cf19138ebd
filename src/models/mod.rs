pub mod card_state;
pub mod deck;
pub mod flashcard;
pub mod review_session;
pub mod scheduler;

pub use card_state::{CardState, CardStats, DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL, PersistedState};
pub use deck::Deck;
pub use flashcard::Flashcard;
pub use review_session::{RatingCounts, ReviewSession, SessionPhase, SessionView};
pub use scheduler::{Rating, Scheduler, SchedulerConfig, get_stats, is_due};
