//! Flashcard is a pair <front, back> with a stable identifier. Only text is used on both sides
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    pub front_text: String,
    pub back_text: String,
}

impl Flashcard {
    pub fn new(id: impl Into<String>, front_text: impl Into<String>, back_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            front_text: front_text.into(),
            back_text: back_text.into(),
        }
    }
}
