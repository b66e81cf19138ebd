//! Spaced repetition state of a single card.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const DEFAULT_INTERVAL: u32 = 1;

fn default_ease_factor() -> f64 {
    DEFAULT_EASE_FACTOR
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL
}

/// Written on the first rating of a card and rewritten on every rating after.
/// A card without a stored state is new and due immediately.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    pub card_id: String,
    pub due_date: DateTime<Local>,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    #[serde(default)]
    pub repetitions: u32,
}

/// The whole persisted record: every card's state plus the time of the last save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub cards: BTreeMap<String, CardState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Local>>,
}

/// Read-only projection of a card state for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardStats {
    pub is_new: bool,
    pub days_until_review: i64,
    pub total_reviews: u32,
}

impl CardStats {
    pub fn new_card() -> Self {
        Self {
            is_new: true,
            days_until_review: 0,
            total_reviews: 0,
        }
    }
}
