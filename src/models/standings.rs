//! Standings models.

use serde::{Deserialize, Serialize};

use super::{Color, CompetitorId};

/// Win/loss/draw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WinLossRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl WinLossRecord {
    /// Create a new record.
    pub fn new(wins: u32, losses: u32, draws: u32) -> Self {
        Self {
            wins,
            losses,
            draws,
        }
    }

    /// Total games played.
    pub fn total_games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Win rate as a fraction (0.0 to 1.0).
    pub fn win_rate(&self) -> f64 {
        let total = self.total_games();
        if total == 0 {
            0.0
        } else {
            self.wins as f64 / total as f64
        }
    }
}

/// One line of the standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCompetitor {
    /// Position, 1-based, unique
    pub rank: u32,

    pub id: CompetitorId,

    pub name: String,

    pub rating: Option<u32>,

    /// Points from games plus byes
    pub score: f64,

    /// Games actually played (byes excluded)
    pub record: WinLossRecord,

    pub byes: u32,

    pub color_balance: i32,

    pub color_history: Vec<Color>,

    /// Opponents in the order they were met
    pub opponents: Vec<CompetitorId>,

    /// Sum of opponents' scores
    pub buchholz: f64,

    /// Sum of beaten opponents' scores plus half of drawn opponents' scores
    pub sonneborn_berger: f64,
}

impl RankedCompetitor {
    /// Games played, byes excluded.
    pub fn games_played(&self) -> u32 {
        self.record.total_games()
    }
}
