//! Standings calculation.
//!
//! Replays completed rounds to derive, per competitor:
//! - Score, win/loss/draw record and byes
//! - Color balance and color history
//! - Opponents met
//! - Buchholz and Sonneborn-Berger figures (informational only)

use std::collections::BTreeMap;

use tracing::warn;

use crate::models::{
    Color, Competitor, CompetitorId, GameResult, RankedCompetitor, Round, Tournament,
    WinLossRecord,
};

/// Running totals for one competitor.
#[derive(Debug, Default)]
struct Tally {
    score: f64,
    record: WinLossRecord,
    byes: u32,
    color_balance: i32,
    color_history: Vec<Color>,
    opponents: Vec<CompetitorId>,
    /// Points scored against each opponent, for Sonneborn-Berger
    results: Vec<(CompetitorId, f64)>,
}

impl Tally {
    fn play(&mut self, color: Color, opponent: &CompetitorId, result: GameResult) {
        let points = result.points_for(color);
        self.score += points;
        match points {
            p if p >= 1.0 => self.record.wins += 1,
            p if p <= 0.0 => self.record.losses += 1,
            _ => self.record.draws += 1,
        }
        self.color_balance += color.balance_delta();
        self.color_history.push(color);
        self.opponents.push(opponent.clone());
        self.results.push((opponent.clone(), points));
    }
}

/// Standings for a tournament, best first.
pub fn calculate_standings(tournament: &Tournament) -> Vec<RankedCompetitor> {
    replay_standings(&tournament.competitors, &tournament.completed_rounds())
}

/// Fold `rounds` into standings for `roster`.
///
/// Rounds are replayed in round-number order whatever order they are given
/// in. Pairings naming competitors outside the roster are skipped, as are
/// games without a result.
pub fn replay_standings(roster: &[Competitor], rounds: &[&Round]) -> Vec<RankedCompetitor> {
    let mut tallies: BTreeMap<&CompetitorId, Tally> =
        roster.iter().map(|c| (&c.id, Tally::default())).collect();

    let mut ordered: Vec<&Round> = rounds.to_vec();
    ordered.sort_by_key(|r| r.number);

    for round in ordered {
        for pairing in &round.pairings {
            if pairing.is_bye {
                match tallies.get_mut(&pairing.player1.id) {
                    Some(tally) => {
                        tally.score += 1.0;
                        tally.byes += 1;
                    }
                    None => warn!(
                        "Round {}: bye for unknown competitor {}",
                        round.number, pairing.player1.id
                    ),
                }
                continue;
            }

            let (Some(white), Some(black), Some(result)) = (
                pairing.white_player_id.as_ref(),
                pairing.black_player_id.as_ref(),
                pairing.result,
            ) else {
                continue;
            };
            if !tallies.contains_key(white) || !tallies.contains_key(black) {
                warn!(
                    "Round {} board {}: skipping game with unknown competitor",
                    round.number, pairing.board_number
                );
                continue;
            }
            if let Some(tally) = tallies.get_mut(white) {
                tally.play(Color::White, black, result);
            }
            if let Some(tally) = tallies.get_mut(black) {
                tally.play(Color::Black, white, result);
            }
        }
    }

    let final_scores: BTreeMap<CompetitorId, f64> = tallies
        .iter()
        .map(|(id, tally)| ((*id).clone(), tally.score))
        .collect();
    let score_of = |id: &CompetitorId| final_scores.get(id).copied().unwrap_or(0.0);

    let mut table: Vec<RankedCompetitor> = roster
        .iter()
        .filter_map(|competitor| {
            let tally = tallies.remove(&competitor.id)?;
            let buchholz = tally.opponents.iter().map(|id| score_of(id)).sum();
            let sonneborn_berger = tally
                .results
                .iter()
                .map(|(id, points)| points * score_of(id))
                .sum();
            Some(RankedCompetitor {
                rank: 0,
                id: competitor.id.clone(),
                name: competitor.name.clone(),
                rating: competitor.rating,
                score: tally.score,
                record: tally.record,
                byes: tally.byes,
                color_balance: tally.color_balance,
                color_history: tally.color_history,
                opponents: tally.opponents,
                buchholz,
                sonneborn_berger,
            })
        })
        .collect();

    table.sort_by(|a, b| {
        half_points(b.score)
            .cmp(&half_points(a.score))
            .then(b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)))
            .then(b.color_balance.cmp(&a.color_balance))
            .then(a.id.cmp(&b.id))
    });
    for (i, row) in table.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }

    table
}

/// Competitor snapshots carrying the state the pairing engine reads:
/// score, colors, opponents and byes as of the given standings.
pub fn competitor_snapshots(
    roster: &[Competitor],
    standings: &[RankedCompetitor],
) -> Vec<Competitor> {
    let by_id: BTreeMap<&CompetitorId, &RankedCompetitor> =
        standings.iter().map(|row| (&row.id, row)).collect();

    roster
        .iter()
        .map(|competitor| {
            let mut snapshot = competitor.clone();
            if let Some(row) = by_id.get(&competitor.id) {
                snapshot.score = row.score;
                snapshot.color_balance = row.color_balance;
                snapshot.color_history = row.color_history.clone();
                snapshot.previous_opponents = row.opponents.iter().cloned().collect();
                snapshot.bye_count = row.byes;
            }
            snapshot
        })
        .collect()
}

fn half_points(score: f64) -> i64 {
    (score * 2.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, Pairing, TournamentFormat};
    use crate::pairing::Variant;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn c(id: &str, rating: Option<u32>) -> Competitor {
        Competitor::new(id, id.to_uppercase(), rating)
    }

    fn decided(mut pairing: Pairing, result: GameResult) -> Pairing {
        pairing.result = Some(result);
        pairing
    }

    fn tournament(competitors: Vec<Competitor>, rounds: Vec<Round>) -> Tournament {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut t = Tournament::new(
            EntityId::from("t1"),
            "Club Open",
            TournamentFormat::Swiss {
                variant: Variant::Standard,
            },
            3,
            created,
        );
        t.competitors = competitors;
        t.rounds = rounds;
        t
    }

    #[test]
    fn test_empty_tournament_ranks_by_rating() {
        let t = tournament(vec![c("a", None), c("b", Some(1500)), c("c", Some(1700))], vec![]);
        let table = calculate_standings(&t);
        let order: Vec<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        let ranks: Vec<u32> = table.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_results_and_bye_accumulate() {
        let (a, b, x) = (c("a", Some(1800)), c("b", Some(1600)), c("x", Some(1400)));
        let round1 = Round::new(
            1,
            vec![
                decided(Pairing::game(1, 1, &a, &b, false), GameResult::WhiteWins),
                Pairing::bye(1, 2, &x),
            ],
            false,
            0,
        );
        let round2 = Round::new(
            2,
            vec![
                decided(Pairing::game(2, 1, &x, &a, false), GameResult::Draw),
                Pairing::bye(2, 2, &b),
            ],
            false,
            0,
        );
        let t = tournament(vec![a, b, x], vec![round2, round1]);
        let table = calculate_standings(&t);

        let a_row = table.iter().find(|r| r.id.as_str() == "a").unwrap();
        assert_eq!(a_row.rank, 1);
        assert_eq!(a_row.score, 1.5);
        assert_eq!(a_row.record, WinLossRecord::new(1, 0, 1));
        assert_eq!(a_row.color_history, vec![Color::White, Color::Black]);
        assert_eq!(a_row.color_balance, 0);
        assert_eq!(a_row.opponents.len(), 2);

        let x_row = table.iter().find(|r| r.id.as_str() == "x").unwrap();
        assert_eq!(x_row.score, 1.5);
        assert_eq!(x_row.byes, 1);
        assert_eq!(x_row.games_played(), 1);
        assert_eq!(x_row.color_balance, 1);

        let b_row = table.iter().find(|r| r.id.as_str() == "b").unwrap();
        assert_eq!(b_row.score, 1.0);
        assert_eq!(b_row.record, WinLossRecord::new(0, 1, 0));
        assert_eq!(b_row.rank, 3);
    }

    #[test]
    fn test_incomplete_rounds_are_ignored() {
        let (a, b) = (c("a", None), c("b", None));
        let open = Round::new(1, vec![Pairing::game(1, 1, &a, &b, false)], false, 0);
        let t = tournament(vec![a, b], vec![open]);
        let table = calculate_standings(&t);
        assert!(table.iter().all(|r| r.score == 0.0 && r.games_played() == 0));
    }

    #[test]
    fn test_color_balance_breaks_score_and_rating_ties() {
        let (a, b) = (c("a", Some(1500)), c("b", Some(1500)));
        let round = Round::new(
            1,
            vec![decided(Pairing::game(1, 1, &a, &b, false), GameResult::Draw)],
            false,
            0,
        );
        let table = replay_standings(&[a, b], &[&round]);
        assert_eq!(table[0].id.as_str(), "a");
        assert_eq!(table[0].color_balance, 1);
    }

    #[test]
    fn test_tie_break_figures() {
        let (a, b, d) = (c("a", Some(1900)), c("b", Some(1800)), c("d", Some(1700)));
        let r1 = Round::new(
            1,
            vec![
                decided(Pairing::game(1, 1, &a, &b, false), GameResult::WhiteWins),
                Pairing::bye(1, 2, &d),
            ],
            false,
            0,
        );
        let r2 = Round::new(
            2,
            vec![
                decided(Pairing::game(2, 1, &d, &a, false), GameResult::Draw),
                Pairing::bye(2, 2, &b),
            ],
            false,
            0,
        );
        let table = replay_standings(&[a, b, d], &[&r1, &r2]);
        let a_row = table.iter().find(|r| r.id.as_str() == "a").unwrap();
        // b finishes on 1, d on 1.5
        assert!((a_row.buchholz - 2.5).abs() < 1e-9);
        assert!((a_row.sonneborn_berger - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_competitor_snapshots() {
        let (a, b) = (c("a", None), c("b", None));
        let round = Round::new(
            1,
            vec![decided(Pairing::game(1, 1, &a, &b, false), GameResult::BlackWins)],
            false,
            0,
        );
        let roster = vec![a, b];
        let table = replay_standings(&roster, &[&round]);
        let snapshots = competitor_snapshots(&roster, &table);

        assert_eq!(snapshots[0].score, 0.0);
        assert_eq!(snapshots[0].color_history, vec![Color::White]);
        assert!(snapshots[0].previous_opponents.contains(&roster[1].id));
        assert_eq!(snapshots[1].score, 1.0);
        assert_eq!(snapshots[1].color_balance, -1);
    }
}
