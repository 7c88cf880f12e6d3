//! Pairing model: one board of a round, or a bye.

use serde::{Deserialize, Serialize};

use super::{Color, Competitor, CompetitorId, CompetitorRef, EntityId, PairingId};

/// Outcome of a played game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    /// Points earned by the side playing `color`.
    pub fn points_for(self, color: Color) -> f64 {
        match (self, color) {
            (GameResult::Draw, _) => 0.5,
            (GameResult::WhiteWins, Color::White) | (GameResult::BlackWins, Color::Black) => 1.0,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
        }
    }
}

impl std::str::FromStr for GameResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1-0" | "white" => Ok(GameResult::WhiteWins),
            "0-1" | "black" => Ok(GameResult::BlackWins),
            "1/2-1/2" | "1/2" | "draw" | "=" => Ok(GameResult::Draw),
            other => Err(format!("unknown result '{}', expected 1-0, 0-1 or 1/2-1/2", other)),
        }
    }
}

/// Unordered pair of competitor ids, stored as (min, max).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(CompetitorId, CompetitorId);

impl PairKey {
    pub fn new(a: &CompetitorId, b: &CompetitorId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }

    pub fn first(&self) -> &CompetitorId {
        &self.0
    }

    pub fn second(&self) -> &CompetitorId {
        &self.1
    }
}

/// A single board: two competitors with colors, or one competitor with a bye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    /// Unique identifier (derived from round + player ids)
    pub id: PairingId,

    /// Round number
    pub round: u32,

    /// Board number, 1-based; the bye comes last
    pub board_number: u32,

    /// White player, or the bye recipient
    pub player1: CompetitorRef,

    /// Black player, absent for a bye
    pub player2: Option<CompetitorRef>,

    pub white_player_id: Option<CompetitorId>,

    pub black_player_id: Option<CompetitorId>,

    pub is_bye: bool,

    /// The two players had already met before this round
    pub is_repeat: bool,

    /// Filled in once the game is played
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
}

impl Pairing {
    /// Create a game between `white` and `black`.
    pub fn game(
        round: u32,
        board_number: u32,
        white: &Competitor,
        black: &Competitor,
        is_repeat: bool,
    ) -> Self {
        let id = EntityId::generate(&[
            &round.to_string(),
            white.id.as_str(),
            black.id.as_str(),
        ]);

        Self {
            id,
            round,
            board_number,
            player1: white.to_ref(),
            player2: Some(black.to_ref()),
            white_player_id: Some(white.id.clone()),
            black_player_id: Some(black.id.clone()),
            is_bye: false,
            is_repeat,
            result: None,
        }
    }

    /// Create a bye entry.
    pub fn bye(round: u32, board_number: u32, competitor: &Competitor) -> Self {
        let id = EntityId::generate(&[&round.to_string(), competitor.id.as_str(), "bye"]);

        Self {
            id,
            round,
            board_number,
            player1: competitor.to_ref(),
            player2: None,
            white_player_id: None,
            black_player_id: None,
            is_bye: true,
            is_repeat: false,
            result: None,
        }
    }

    /// True if `id` sits at this board.
    pub fn involves(&self, id: &CompetitorId) -> bool {
        &self.player1.id == id || self.player2.as_ref().is_some_and(|p| &p.id == id)
    }

    /// Ids of everyone at this board.
    pub fn competitor_ids(&self) -> impl Iterator<Item = &CompetitorId> {
        std::iter::once(&self.player1.id).chain(self.player2.as_ref().map(|p| &p.id))
    }

    /// The other player at the board, if any.
    pub fn opponent_of(&self, id: &CompetitorId) -> Option<&CompetitorId> {
        let other = self.player2.as_ref()?;
        if &self.player1.id == id {
            Some(&other.id)
        } else if &other.id == id {
            Some(&self.player1.id)
        } else {
            None
        }
    }

    /// Color played by `id`, if it played a game here.
    pub fn color_of(&self, id: &CompetitorId) -> Option<Color> {
        if self.white_player_id.as_ref() == Some(id) {
            Some(Color::White)
        } else if self.black_player_id.as_ref() == Some(id) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Canonical key of the two players, absent for a bye.
    pub fn pair_key(&self) -> Option<PairKey> {
        self.player2
            .as_ref()
            .map(|other| PairKey::new(&self.player1.id, &other.id))
    }

    /// Points scored by `id` at this board. A bye is always worth a win;
    /// an unplayed game is worth nothing yet.
    pub fn points_for(&self, id: &CompetitorId) -> Option<f64> {
        if self.is_bye {
            return (&self.player1.id == id).then_some(1.0);
        }
        let color = self.color_of(id)?;
        self.result.map(|r| r.points_for(color))
    }

    /// A bye needs no result; a game is decided once a result is recorded.
    pub fn is_decided(&self) -> bool {
        self.is_bye || self.result.is_some()
    }
}
