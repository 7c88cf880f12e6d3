//! Tournament aggregate: roster, rounds and lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Competitor, CompetitorId, EntityId, Round, TournamentId};
use crate::pairing::Variant;

/// Lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentStatus {
    #[default]
    Registration,
    InProgress,
    Completed,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Registration => write!(f, "registration"),
            TournamentStatus::InProgress => write!(f, "in-progress"),
            TournamentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// How rounds are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TournamentFormat {
    Swiss { variant: Variant },
    RoundRobin { double: bool },
}

impl std::fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentFormat::Swiss { variant } => write!(f, "swiss ({})", variant),
            TournamentFormat::RoundRobin { double: false } => write!(f, "round-robin"),
            TournamentFormat::RoundRobin { double: true } => write!(f, "double round-robin"),
        }
    }
}

/// A tournament record.
///
/// Rounds are only ever appended; a round's pairings are frozen once it is
/// completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,

    pub name: String,

    pub format: TournamentFormat,

    /// Declared number of rounds
    pub total_rounds: u32,

    /// Number of the latest generated round, 0 before the first
    #[serde(default)]
    pub current_round: u32,

    #[serde(default)]
    pub status: TournamentStatus,

    #[serde(default)]
    pub competitors: Vec<Competitor>,

    #[serde(default)]
    pub rounds: Vec<Round>,

    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a tournament in registration.
    pub fn new(
        id: TournamentId,
        name: impl Into<String>,
        format: TournamentFormat,
        total_rounds: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            format,
            total_rounds,
            current_round: 0,
            status: TournamentStatus::Registration,
            competitors: Vec::new(),
            rounds: Vec::new(),
            created_at,
        }
    }

    /// Create a tournament with a random id, stamped now.
    pub fn create(name: impl Into<String>, format: TournamentFormat, total_rounds: u32) -> Self {
        let id = EntityId::new(uuid::Uuid::new_v4().to_string());
        Self::new(id, name, format, total_rounds, Utc::now())
    }

    /// The most recently generated round.
    pub fn latest_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.number == number)
    }

    pub fn round_mut(&mut self, number: u32) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.number == number)
    }

    pub fn competitor(&self, id: &CompetitorId) -> Option<&Competitor> {
        self.competitors.iter().find(|c| &c.id == id)
    }

    /// Completed rounds in round-number order.
    pub fn completed_rounds(&self) -> Vec<&Round> {
        let mut rounds: Vec<&Round> = self.rounds.iter().filter(|r| r.completed).collect();
        rounds.sort_by_key(|r| r.number);
        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tournament {
        Tournament::new(
            EntityId::from("t-1"),
            "Club Championship",
            TournamentFormat::Swiss {
                variant: Variant::Standard,
            },
            5,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_tournament_is_in_registration() {
        let t = sample();
        assert_eq!(t.status, TournamentStatus::Registration);
        assert_eq!(t.current_round, 0);
        assert!(t.latest_round().is_none());
    }

    #[test]
    fn test_create_generates_unique_ids() {
        let format = TournamentFormat::RoundRobin { double: false };
        let a = Tournament::create("A", format, 3);
        let b = Tournament::create("A", format, 3);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_format_serialization() {
        let json = serde_json::to_string(&TournamentFormat::Swiss {
            variant: Variant::Accelerated,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"swiss","variant":"accelerated"}"#);

        let rr: TournamentFormat =
            serde_json::from_str(r#"{"type":"round-robin","double":true}"#).unwrap();
        assert_eq!(rr, TournamentFormat::RoundRobin { double: true });
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", TournamentStatus::InProgress), "in-progress");
        let json = serde_json::to_string(&TournamentStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_tournament_round_trip_json() {
        let mut t = sample();
        t.competitors.push(Competitor::new("a", "Alice", Some(1900)));
        let json = serde_json::to_string(&t).unwrap();
        let back: Tournament = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, t.id);
        assert_eq!(back.competitors, t.competitors);
        assert_eq!(back.format, t.format);
    }
}
