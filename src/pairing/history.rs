//! Pairing history derived from already generated rounds.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Competitor, CompetitorId, PairKey, Round};

/// Who has played whom, who has had byes, and who met last round.
#[derive(Debug, Clone, Default)]
pub struct PairingHistory {
    played: BTreeSet<PairKey>,
    opponents: BTreeMap<CompetitorId, BTreeSet<CompetitorId>>,
    byes: BTreeMap<CompetitorId, u32>,
    last_round: BTreeSet<PairKey>,
}

impl PairingHistory {
    /// Build from prior rounds. Order of `rounds` does not matter; the
    /// last-round set comes from the highest round number.
    pub fn from_rounds(rounds: &[Round]) -> Self {
        let mut history = Self::default();
        let latest = rounds.iter().map(|r| r.number).max();

        for round in rounds {
            for pairing in &round.pairings {
                if pairing.is_bye {
                    *history.byes.entry(pairing.player1.id.clone()).or_insert(0) += 1;
                    continue;
                }
                let Some(key) = pairing.pair_key() else {
                    continue;
                };
                if Some(round.number) == latest {
                    history.last_round.insert(key.clone());
                }
                history.record_pair(key);
            }
        }

        history
    }

    /// Fold in what competitor snapshots already know. Callers that track
    /// opponents on the competitor rather than through rounds still get
    /// repeat avoidance this way.
    pub fn absorb_snapshots(&mut self, competitors: &[Competitor]) {
        for competitor in competitors {
            for opponent in &competitor.previous_opponents {
                if opponent != &competitor.id {
                    self.record_pair(PairKey::new(&competitor.id, opponent));
                }
            }
            if competitor.bye_count > 0 {
                let count = self.byes.entry(competitor.id.clone()).or_insert(0);
                *count = (*count).max(competitor.bye_count);
            }
        }
    }

    fn record_pair(&mut self, key: PairKey) {
        self.opponents
            .entry(key.first().clone())
            .or_default()
            .insert(key.second().clone());
        self.opponents
            .entry(key.second().clone())
            .or_default()
            .insert(key.first().clone());
        self.played.insert(key);
    }

    pub fn has_played(&self, a: &CompetitorId, b: &CompetitorId) -> bool {
        self.played.contains(&PairKey::new(a, b))
    }

    /// True when `a` and `b` met in the most recent round.
    pub fn played_last_round(&self, a: &CompetitorId, b: &CompetitorId) -> bool {
        self.last_round.contains(&PairKey::new(a, b))
    }

    pub fn opponents_of(&self, id: &CompetitorId) -> Option<&BTreeSet<CompetitorId>> {
        self.opponents.get(id)
    }

    pub fn bye_count(&self, id: &CompetitorId) -> u32 {
        self.byes.get(id).copied().unwrap_or(0)
    }

    pub fn played_pairs(&self) -> impl Iterator<Item = &PairKey> {
        self.played.iter()
    }

    pub fn last_round_pairs(&self) -> impl Iterator<Item = &PairKey> {
        self.last_round.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.played.is_empty() && self.byes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, Pairing};

    fn c(id: &str) -> Competitor {
        Competitor::new(id, id.to_uppercase(), None)
    }

    fn id(s: &str) -> CompetitorId {
        EntityId::from(s)
    }

    fn two_rounds() -> Vec<Round> {
        let r1 = Round::new(
            1,
            vec![
                Pairing::game(1, 1, &c("a"), &c("b"), false),
                Pairing::game(1, 2, &c("c"), &c("d"), false),
                Pairing::bye(1, 3, &c("e")),
            ],
            false,
            0,
        );
        let r2 = Round::new(
            2,
            vec![
                Pairing::game(2, 1, &c("c"), &c("a"), false),
                Pairing::game(2, 2, &c("e"), &c("b"), false),
                Pairing::bye(2, 3, &c("d")),
            ],
            false,
            0,
        );
        vec![r1, r2]
    }

    #[test]
    fn test_empty_history() {
        let history = PairingHistory::from_rounds(&[]);
        assert!(history.is_empty());
        assert_eq!(history.bye_count(&id("a")), 0);
        assert!(history.opponents_of(&id("a")).is_none());
        assert_eq!(history.last_round_pairs().count(), 0);
    }

    #[test]
    fn test_played_pairs_and_opponents() {
        let history = PairingHistory::from_rounds(&two_rounds());

        assert!(history.has_played(&id("a"), &id("b")));
        assert!(history.has_played(&id("b"), &id("a")));
        assert!(!history.has_played(&id("a"), &id("d")));
        assert_eq!(history.played_pairs().count(), 4);

        let a_opponents: Vec<_> = history
            .opponents_of(&id("a"))
            .unwrap()
            .iter()
            .map(|o| o.as_str())
            .collect();
        assert_eq!(a_opponents, vec!["b", "c"]);
    }

    #[test]
    fn test_bye_counts() {
        let history = PairingHistory::from_rounds(&two_rounds());
        assert_eq!(history.bye_count(&id("e")), 1);
        assert_eq!(history.bye_count(&id("d")), 1);
        assert_eq!(history.bye_count(&id("a")), 0);
    }

    #[test]
    fn test_last_round_pairs_use_highest_round_number() {
        let mut rounds = two_rounds();
        rounds.reverse();
        let history = PairingHistory::from_rounds(&rounds);

        assert!(history.played_last_round(&id("a"), &id("c")));
        assert!(history.played_last_round(&id("b"), &id("e")));
        assert!(!history.played_last_round(&id("a"), &id("b")));
        assert_eq!(history.last_round_pairs().count(), 2);
    }

    #[test]
    fn test_absorb_snapshots() {
        let mut history = PairingHistory::from_rounds(&two_rounds());
        let mut x = c("x");
        x.previous_opponents.insert(id("a"));
        x.bye_count = 2;
        let mut e = c("e");
        e.bye_count = 0;

        history.absorb_snapshots(&[x, e]);

        assert!(history.has_played(&id("a"), &id("x")));
        assert!(!history.played_last_round(&id("a"), &id("x")));
        assert_eq!(history.bye_count(&id("x")), 2);
        assert_eq!(history.bye_count(&id("e")), 1);
    }
}
