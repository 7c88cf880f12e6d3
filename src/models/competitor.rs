//! Competitor model, a player's per-round snapshot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{CompetitorId, EntityId, TournamentId};

/// Board color, i.e. which of the two roles a competitor takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other color.
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Contribution to the running color balance.
    pub fn balance_delta(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A competitor as seen by the pairing engine for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    /// Stable unique identifier
    pub id: CompetitorId,

    /// Display name
    pub name: String,

    /// Rating, absent for unrated players
    #[serde(default)]
    pub rating: Option<u32>,

    /// Cumulative score (win 1, draw 0.5, loss 0)
    #[serde(default)]
    pub score: f64,

    /// Whites minus blacks
    #[serde(default)]
    pub color_balance: i32,

    /// Past colors, oldest first
    #[serde(default)]
    pub color_history: Vec<Color>,

    /// Opponents already played
    #[serde(default)]
    pub previous_opponents: BTreeSet<CompetitorId>,

    /// Byes already received
    #[serde(default)]
    pub bye_count: u32,
}

impl Competitor {
    /// Create a fresh competitor with no history.
    pub fn new(id: impl Into<CompetitorId>, name: impl Into<String>, rating: Option<u32>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rating,
            score: 0.0,
            color_balance: 0,
            color_history: Vec::new(),
            previous_opponents: BTreeSet::new(),
            bye_count: 0,
        }
    }

    /// Create a competitor whose id is derived from the tournament and name.
    pub fn register(tournament_id: &TournamentId, name: &str, rating: Option<u32>) -> Self {
        let id = EntityId::generate(&[tournament_id.as_str(), "competitor", name]);
        Self::new(id, name, rating)
    }

    /// Builder method to set the score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Builder method to set the color history (balance follows from it).
    pub fn with_colors(mut self, colors: Vec<Color>) -> Self {
        self.color_balance = colors.iter().map(|c| c.balance_delta()).sum();
        self.color_history = colors;
        self
    }

    /// Rating with unrated players treated as 0.
    pub fn rating_or_zero(&self) -> u32 {
        self.rating.unwrap_or(0)
    }

    /// Score in half points. Scores are half-integers, so this is exact.
    pub fn score_half_points(&self) -> i64 {
        (self.score * 2.0).round() as i64
    }

    /// Most recent color, if any.
    pub fn last_color(&self) -> Option<Color> {
        self.color_history.last().copied()
    }

    /// True when the last two colors are identical, so a third would
    /// make a streak.
    pub fn needs_opposite(&self) -> bool {
        let n = self.color_history.len();
        n >= 2 && self.color_history[n - 1] == self.color_history[n - 2]
    }

    /// Lightweight reference used inside pairings.
    pub fn to_ref(&self) -> CompetitorRef {
        CompetitorRef {
            id: self.id.clone(),
            name: self.name.clone(),
            rating: self.rating,
        }
    }
}

/// The `{id, name, rating}` triple embedded in serialized pairings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorRef {
    pub id: CompetitorId,
    pub name: String,
    #[serde(default)]
    pub rating: Option<u32>,
}
