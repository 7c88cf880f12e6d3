//! Round model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CompetitorId, Pairing};

/// One round of a tournament: its boards plus at most one bye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Round number, 1-based
    pub number: u32,

    /// Boards in order; a bye entry, if any, is last
    pub pairings: Vec<Pairing>,

    /// No repeat-free matching existed for this round
    #[serde(default)]
    pub forced_repeat: bool,

    /// Number of repeat pairings used
    #[serde(default)]
    pub repeat_count: u32,

    /// Every game has a result
    #[serde(default)]
    pub completed: bool,

    /// When the caller generated this round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Create a round from engine output.
    pub fn new(number: u32, pairings: Vec<Pairing>, forced_repeat: bool, repeat_count: u32) -> Self {
        let mut round = Self {
            number,
            pairings,
            forced_repeat,
            repeat_count,
            completed: false,
            generated_at: None,
        };
        round.refresh_completed();
        round
    }

    /// Builder method to stamp the generation time.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// The bye entry, if any.
    pub fn bye(&self) -> Option<&Pairing> {
        self.pairings.iter().find(|p| p.is_bye)
    }

    /// Non-bye boards.
    pub fn games(&self) -> impl Iterator<Item = &Pairing> {
        self.pairings.iter().filter(|p| !p.is_bye)
    }

    /// Board lookup by number.
    pub fn board_mut(&mut self, board_number: u32) -> Option<&mut Pairing> {
        self.pairings
            .iter_mut()
            .find(|p| p.board_number == board_number)
    }

    /// The pairing `id` takes part in.
    pub fn pairing_of(&self, id: &CompetitorId) -> Option<&Pairing> {
        self.pairings.iter().find(|p| p.involves(id))
    }

    /// Recompute `completed` from the boards.
    pub fn refresh_completed(&mut self) -> bool {
        self.completed = self.pairings.iter().all(|p| p.is_decided());
        self.completed
    }
}
