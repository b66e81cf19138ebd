//! Durable `card id -> CardState` mapping.
//!
//! The whole mapping is kept as a single JSON record under [`STATE_KEY`], so
//! every save rewrites it in one medium write. Updates to one card are a
//! read-modify-write of that record; two writers racing on the same medium
//! end with whichever saved last.

use super::medium::KeyValueMedium;
use crate::clock::Clock;
use crate::error::StorageError;
use crate::models::{CardState, PersistedState};
use std::sync::Arc;

pub const STATE_KEY: &str = "spaced-review-state";

pub struct CardStateStore<M> {
    medium: M,
    clock: Arc<dyn Clock>,
}

impl<M: KeyValueMedium> CardStateStore<M> {
    pub fn new(medium: M, clock: Arc<dyn Clock>) -> Self {
        Self { medium, clock }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn load_state(&self) -> Result<PersistedState, StorageError> {
        let Some(raw) = self.medium.get(STATE_KEY).map_err(StorageError::Read)? else {
            return Ok(PersistedState::default());
        };
        serde_json::from_str(&raw).map_err(StorageError::Corrupt)
    }

    /// Writes the full record, stamping `last_sync` with the current time.
    pub fn save_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        let stamped = PersistedState {
            cards: state.cards.clone(),
            last_sync: Some(self.clock.now()),
        };
        let raw = serde_json::to_string(&stamped).map_err(StorageError::Serialize)?;
        self.medium.set(STATE_KEY, &raw).map_err(StorageError::Write)?;
        log::debug!("Saved review progress for {} cards", stamped.cards.len());
        Ok(())
    }

    pub fn get_card_state(&self, card_id: &str) -> Result<Option<CardState>, StorageError> {
        let mut state = self.load_state()?;
        Ok(state.cards.remove(card_id))
    }

    pub fn update_card_state(&self, card_id: &str, new_state: CardState) -> Result<(), StorageError> {
        let mut state = self.load_state()?;
        state.cards.insert(card_id.to_string(), new_state);
        self.save_state(&state)
    }

    /// Forgets all review progress.
    pub fn clear_state(&self) -> Result<(), StorageError> {
        self.medium.delete(STATE_KEY).map_err(StorageError::Delete)?;
        log::info!("Cleared all review progress");
        Ok(())
    }
}
