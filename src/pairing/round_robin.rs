//! Round-robin schedule by the circle (Berger) method.
//!
//! Competitors are seeded by rating and placed on slots. The last slot is
//! fixed and the others rotate one step per round, so every pair meets
//! once per cycle. An odd field gets a dummy in the fixed slot; whoever
//! faces it has the bye, and the bye visits every competitor once per
//! cycle.

use std::collections::BTreeSet;

use tracing::debug;

use super::PairingError;
use crate::models::{Competitor, Pairing};

/// Rounds in a full schedule for `competitors` entrants.
pub fn round_robin_rounds(competitors: usize, double: bool) -> u32 {
    if competitors < 2 {
        return 0;
    }
    let slots = competitors + competitors % 2;
    let cycle = (slots - 1) as u32;
    if double {
        2 * cycle
    } else {
        cycle
    }
}

/// Pairings for `round_number` of a single or double round-robin.
///
/// Pools of fewer than two competitors yield no pairings.
pub fn generate_round_robin(
    pool: &[Competitor],
    round_number: u32,
    double: bool,
) -> Result<Vec<Pairing>, PairingError> {
    let mut seen = BTreeSet::new();
    for competitor in pool {
        if !seen.insert(&competitor.id) {
            return Err(PairingError::DuplicateCompetitor(competitor.id.clone()));
        }
    }
    if pool.len() < 2 {
        return Ok(Vec::new());
    }

    let rounds = round_robin_rounds(pool.len(), double);
    if round_number == 0 || round_number > rounds {
        return Err(PairingError::RoundOutOfRange {
            round: round_number,
            rounds,
        });
    }

    let mut seeded: Vec<&Competitor> = pool.iter().collect();
    seeded.sort_by(|a, b| {
        b.rating_or_zero()
            .cmp(&a.rating_or_zero())
            .then(a.id.cmp(&b.id))
    });
    // None is the dummy opponent of an odd field
    let mut slots: Vec<Option<&Competitor>> = seeded.into_iter().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let n = slots.len();
    let m = n - 1;
    let cycle = m as u32;
    let rr = ((round_number - 1) % cycle) as usize;
    let second_cycle = round_number > cycle;

    // (white slot, black slot)
    let mut tables: Vec<(usize, usize)> = Vec::with_capacity(n / 2);
    tables.push(if rr % 2 == 1 { (m, rr) } else { (rr, m) });
    for i in 1..n / 2 {
        let a = (rr + i) % m;
        let b = (rr + m - i) % m;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        tables.push(if (lo + hi) % 2 == 1 { (lo, hi) } else { (hi, lo) });
    }

    let mut pairings = Vec::with_capacity(n / 2);
    let mut bye = None;
    for (white, black) in tables {
        let (white, black) = if second_cycle {
            (black, white)
        } else {
            (white, black)
        };
        match (slots[white], slots[black]) {
            (Some(w), Some(b)) => {
                let board = pairings.len() as u32 + 1;
                pairings.push(Pairing::game(round_number, board, w, b, false));
            }
            (Some(c), None) | (None, Some(c)) => bye = Some(c),
            (None, None) => {}
        }
    }
    if let Some(competitor) = bye {
        let board = pairings.len() as u32 + 1;
        pairings.push(Pairing::bye(round_number, board, competitor));
    }

    debug!(
        "Round-robin round {}/{}: {} boards",
        round_number,
        rounds,
        pairings.len()
    );
    Ok(pairings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PairKey;
    use std::collections::BTreeMap;

    fn field(n: usize) -> Vec<Competitor> {
        (0..n)
            .map(|i| Competitor::new(format!("p{}", i), format!("P{}", i), Some(2000 - i as u32)))
            .collect()
    }

    fn tally(pool: &[Competitor], double: bool) -> (BTreeMap<PairKey, u32>, BTreeMap<String, u32>) {
        let mut pairs = BTreeMap::new();
        let mut byes = BTreeMap::new();
        for round in 1..=round_robin_rounds(pool.len(), double) {
            let pairings = generate_round_robin(pool, round, double).unwrap();
            let mut present = BTreeSet::new();
            for p in &pairings {
                for id in p.competitor_ids() {
                    assert!(present.insert(id.clone()), "{} twice in round {}", id, round);
                }
                match p.pair_key() {
                    Some(key) => *pairs.entry(key).or_insert(0) += 1,
                    None => *byes.entry(p.player1.id.to_string()).or_insert(0) += 1,
                }
            }
            assert_eq!(present.len(), pool.len());
        }
        (pairs, byes)
    }

    #[test]
    fn test_round_counts() {
        assert_eq!(round_robin_rounds(0, false), 0);
        assert_eq!(round_robin_rounds(1, true), 0);
        assert_eq!(round_robin_rounds(4, false), 3);
        assert_eq!(round_robin_rounds(5, false), 5);
        assert_eq!(round_robin_rounds(6, true), 10);
    }

    #[test]
    fn test_even_field_meets_everyone_once() {
        let pool = field(6);
        let (pairs, byes) = tally(&pool, false);
        assert_eq!(pairs.len(), 15);
        assert!(pairs.values().all(|&n| n == 1));
        assert!(byes.is_empty());
    }

    #[test]
    fn test_odd_field_rotates_bye() {
        let pool = field(5);
        let (pairs, byes) = tally(&pool, false);
        assert_eq!(pairs.len(), 10);
        assert!(pairs.values().all(|&n| n == 1));
        assert_eq!(byes.len(), 5);
        assert!(byes.values().all(|&n| n == 1));
    }

    #[test]
    fn test_double_round_robin_swaps_colors() {
        let pool = field(4);
        let (pairs, _) = tally(&pool, true);
        assert!(pairs.values().all(|&n| n == 2));

        let first = generate_round_robin(&pool, 1, true).unwrap();
        let second = generate_round_robin(&pool, 4, true).unwrap();
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.white_player_id, b.black_player_id);
            assert_eq!(a.black_player_id, b.white_player_id);
        }
    }

    #[test]
    fn test_round_out_of_range() {
        let pool = field(4);
        assert!(matches!(
            generate_round_robin(&pool, 0, false),
            Err(PairingError::RoundOutOfRange { round: 0, rounds: 3 })
        ));
        assert!(matches!(
            generate_round_robin(&pool, 4, false),
            Err(PairingError::RoundOutOfRange { round: 4, rounds: 3 })
        ));
    }

    #[test]
    fn test_tiny_pool_is_empty() {
        assert!(generate_round_robin(&field(1), 1, false).unwrap().is_empty());
        assert!(generate_round_robin(&[], 7, true).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_seed_alternates_colors() {
        let pool = field(4);
        // p3 sits in the fixed slot
        let colors: Vec<bool> = (1..=3)
            .map(|round| {
                generate_round_robin(&pool, round, false)
                    .unwrap()
                    .iter()
                    .any(|p| p.white_player_id.as_ref().map(|id| id.as_str()) == Some("p3"))
            })
            .collect();
        assert_eq!(colors, vec![false, true, false]);
    }
}
