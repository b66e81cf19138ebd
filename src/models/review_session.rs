//! Review session management.
//! Walks the cards that were due when the session started, one at a time,
//! and records each rating through the scheduler and the card state store.

use super::scheduler::{Rating, Scheduler, get_stats, is_due};
use super::{CardStats, Flashcard};
use crate::clock::Clock;
use crate::database::medium::KeyValueMedium;
use crate::database::store::CardStateStore;
use crate::error::{AlgorithmError, SessionError, StorageError};
use crate::provider::FlashcardProvider;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadState {
    Loading,
    Ready,
    Failed,
}

/// Where the session is, as seen by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Error,
    AwaitingShow,
    AnswerShown,
    Complete,
}

/// How many of each rating were given in this session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RatingCounts {
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl RatingCounts {
    fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }
}

/// Everything a presentation layer needs to draw the session.
#[derive(Clone, Debug)]
pub struct SessionView<'a> {
    pub phase: SessionPhase,
    pub current_card: Option<&'a Flashcard>,
    pub is_answer_visible: bool,
    pub is_complete: bool,
    pub total_cards: usize,
    pub current_card_index: usize,
    pub stats: Option<CardStats>,
    pub error_message: Option<String>,
}

/// One pass over the due cards of a collection.
///
/// The queue is decided once, when the session is initialized. A card that
/// becomes due while the session runs waits for the next session, and a card
/// rated Hard is not shown again in this one.
pub struct ReviewSession<P, M> {
    provider: P,
    store: CardStateStore<M>,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    state: LoadState,
    all_cards: Vec<Flashcard>,
    review_queue: Vec<Flashcard>,
    current_index: usize,
    is_answer_visible: bool,
    is_complete: bool,
    error: Option<SessionError>,
    rating_counts: RatingCounts,
}

impl<P: FlashcardProvider, M: KeyValueMedium> ReviewSession<P, M> {
    /// Creates a session in the loading state. Nothing is fetched until
    /// [`fetch_and_initialize_session`](Self::fetch_and_initialize_session).
    pub fn new(provider: P, medium: M, scheduler: Scheduler, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            store: CardStateStore::new(medium, Arc::clone(&clock)),
            scheduler,
            clock,
            state: LoadState::Loading,
            all_cards: Vec::new(),
            review_queue: Vec::new(),
            current_index: 0,
            is_answer_visible: false,
            is_complete: false,
            error: None,
            rating_counts: RatingCounts::default(),
        }
    }

    /// Creates a session and loads its queue right away.
    pub fn start(provider: P, medium: M, scheduler: Scheduler, clock: Arc<dyn Clock>) -> Self {
        let mut session = Self::new(provider, medium, scheduler, clock);
        session.fetch_and_initialize_session();
        session
    }

    pub fn store(&self) -> &CardStateStore<M> {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetches all cards and freezes the due ones into the review queue.
    pub fn fetch_and_initialize_session(&mut self) {
        self.reset_ephemeral();
        match self.initialize() {
            Ok(()) => {
                self.state = LoadState::Ready;
                log::info!(
                    "Review session ready: {} of {} cards due",
                    self.review_queue.len(),
                    self.all_cards.len()
                );
            }
            Err(err) => self.fail(err),
        }
    }

    fn initialize(&mut self) -> Result<(), SessionError> {
        self.all_cards = self.provider.list_cards()?;
        let stored = self.store.load_state()?;

        // one instant for the whole partition
        let now = self.clock.now();
        self.review_queue = self
            .all_cards
            .iter()
            .filter(|card| is_due(stored.cards.get(&card.id), now))
            .cloned()
            .collect();

        if self.review_queue.is_empty() {
            return Err(SessionError::NoCardsAvailable);
        }
        Ok(())
    }

    pub fn show_answer(&mut self) {
        if self.phase() == SessionPhase::AwaitingShow {
            self.is_answer_visible = true;
        }
    }

    /// Rates the current card (1 = hard, 2 = good, 3 = easy) and moves to the next one.
    ///
    /// Ignored unless the answer is showing. If reading, scheduling or saving
    /// fails, the error is kept on the session and the card stays current.
    pub fn handle_rating(&mut self, rating: u8) {
        if self.phase() != SessionPhase::AnswerShown {
            log::debug!("Ignoring rating {} in phase {:?}", rating, self.phase());
            return;
        }
        let Some(card) = self.review_queue.get(self.current_index) else {
            return;
        };
        let card_id = card.id.clone();

        match self.apply_rating(&card_id, rating) {
            Ok(rating) => {
                self.rating_counts.record(rating);
                self.error = None;
                self.current_index += 1;
                self.is_answer_visible = false;
                if self.current_index == self.review_queue.len() {
                    self.is_complete = true;
                    log::info!("Review session complete: {} cards reviewed", self.current_index);
                }
            }
            Err(err) => {
                log::warn!("Rating card {} failed: {}", card_id, err);
                self.error = Some(err);
            }
        }
    }

    fn apply_rating(&self, card_id: &str, rating: u8) -> Result<Rating, SessionError> {
        let current = self.store.get_card_state(card_id)?;
        let rating = Rating::try_from(rating).map_err(AlgorithmError::from)?;
        let next = self
            .scheduler
            .schedule(card_id, rating, current.as_ref(), self.clock.now())?;

        log::debug!(
            "Card {} rated {}: next review in {} days (ease {:.2})",
            card_id,
            rating.label(),
            next.interval,
            next.ease_factor
        );
        self.store.update_card_state(card_id, next)?;
        Ok(rating)
    }

    /// Forgets all review progress and starts over as if every card were new.
    pub fn reset_session(&mut self) {
        log::info!("Resetting review progress");
        self.reset_ephemeral();
        if let Err(err) = self.store.clear_state() {
            self.fail(err.into());
            return;
        }
        self.fetch_and_initialize_session();
    }

    fn reset_ephemeral(&mut self) {
        self.state = LoadState::Loading;
        self.all_cards.clear();
        self.review_queue.clear();
        self.current_index = 0;
        self.is_answer_visible = false;
        self.is_complete = false;
        self.error = None;
        self.rating_counts = RatingCounts::default();
    }

    fn fail(&mut self, err: SessionError) {
        if err.is_fault() {
            log::warn!("Review session failed to start: {}", err);
        } else {
            log::info!("{}", err);
        }
        self.review_queue.clear();
        self.state = LoadState::Failed;
        self.error = Some(err);
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            LoadState::Loading => SessionPhase::Loading,
            LoadState::Failed => SessionPhase::Error,
            LoadState::Ready if self.is_complete => SessionPhase::Complete,
            LoadState::Ready if self.is_answer_visible => SessionPhase::AnswerShown,
            LoadState::Ready => SessionPhase::AwaitingShow,
        }
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        if self.state != LoadState::Ready {
            return None;
        }
        self.review_queue.get(self.current_index)
    }

    /// Stats of the current card as stored right now.
    pub fn current_stats(&self) -> Result<Option<CardStats>, StorageError> {
        let Some(card) = self.current_card() else {
            return Ok(None);
        };
        let state = self.store.get_card_state(&card.id)?;
        Ok(Some(get_stats(state.as_ref(), self.clock.now())))
    }

    /// Snapshot for drawing. A stats read failure leaves `stats` empty and is logged.
    pub fn view(&self) -> SessionView<'_> {
        let stats = match self.current_stats() {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!("Card stats unavailable: {}", e);
                None
            }
        };
        SessionView {
            phase: self.phase(),
            current_card: self.current_card(),
            is_answer_visible: self.is_answer_visible,
            is_complete: self.is_complete,
            total_cards: self.total_cards(),
            current_card_index: self.current_index,
            stats,
            error_message: self.error_message(),
        }
    }

    pub fn all_cards(&self) -> &[Flashcard] {
        &self.all_cards
    }

    pub fn review_queue(&self) -> &[Flashcard] {
        &self.review_queue
    }

    pub fn total_cards(&self) -> usize {
        self.review_queue.len()
    }

    pub fn current_card_index(&self) -> usize {
        self.current_index
    }

    pub fn is_answer_visible(&self) -> bool {
        self.is_answer_visible
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(SessionError::user_message)
    }

    pub fn reviewed_count(&self) -> usize {
        self.current_index
    }

    pub fn remaining_count(&self) -> usize {
        self.total_cards() - self.reviewed_count()
    }

    pub fn rating_counts(&self) -> RatingCounts {
        self.rating_counts
    }
}
