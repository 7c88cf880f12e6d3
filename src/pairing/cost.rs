//! Pair cost model.
//!
//! Costs are integers so that totals compare exactly and runs are
//! reproducible. Each tier's weight is larger than everything the lower
//! tiers can add up to over a whole round, for pools of up to
//! [`MAX_POOL_SIZE`] competitors and tournaments of up to [`MAX_ROUNDS`]
//! rounds:
//!
//! consecutive repeat > repeat > score gap > color, streak and seed bias

use serde::{Deserialize, Serialize};

use super::color::assign_colors;
use crate::models::Competitor;

/// Largest pool the weights are calibrated for.
pub const MAX_POOL_SIZE: usize = 1024;

/// Longest tournament the weights are calibrated for.
pub const MAX_ROUNDS: u32 = 99;

/// Largest virtual bonus an accelerated pairing may add, in half points.
pub const MAX_BONUS_HALF_POINTS: i64 = 4;

/// Tier weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Per unit of combined color balance
    pub color: u64,
    /// A side would get the same color three times running
    pub streak: u64,
    /// Per rank step away from the top-half/bottom-half ideal
    pub seed_bias: u64,
    /// Per half point of score difference
    pub score: u64,
    pub repeat: u64,
    pub consecutive_repeat: u64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            color: 1,
            streak: 400,
            seed_bias: 1,
            score: 5_000_000,
            repeat: 10_000_000_000_000,
            consecutive_repeat: 10_000_000_000_000_000,
        }
    }
}

impl CostWeights {
    /// Charge for dropping a competitor `drop` half points into a lower
    /// score group.
    pub fn float_charge(&self, drop: u64) -> u64 {
        drop * self.score
    }

    /// Check that each tier outweighs the worst-case total of all tiers
    /// below it, and that a worst-case round total still fits in a `u64`.
    /// Float charges count towards the score tier.
    pub fn dominance_holds(&self) -> bool {
        let pool = MAX_POOL_SIZE as u128;
        let pairs = pool / 2;
        let max_balance_sum = 2 * MAX_ROUNDS as u128;
        let max_rank_step = (MAX_POOL_SIZE - 1) as u128;
        let max_gap = 2 * MAX_ROUNDS as u128 + MAX_BONUS_HALF_POINTS as u128;

        let low_per_pair = self.color as u128 * max_balance_sum
            + self.streak as u128
            + self.seed_bias as u128 * max_rank_step;
        let low_total = pairs * low_per_pair;
        let score_total = (pairs + pool) * self.score as u128 * max_gap + low_total;
        let repeat_total = pairs * self.repeat as u128 + score_total;
        let grand_total = pairs * self.consecutive_repeat as u128 + repeat_total;

        self.score as u128 > low_total
            && self.repeat as u128 > score_total
            && self.consecutive_repeat as u128 > repeat_total
            && grand_total <= u64::MAX as u128
    }
}

/// A competitor together with the score it is paired on.
///
/// The pairing score equals the real score except under acceleration.
#[derive(Debug, Clone, Copy)]
pub struct Entrant<'a> {
    pub competitor: &'a Competitor,
    /// Pairing score in half points
    pub score: i64,
}

impl<'a> Entrant<'a> {
    pub fn new(competitor: &'a Competitor, score: i64) -> Self {
        Self { competitor, score }
    }
}

/// Flags describing a candidate pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostContext {
    pub is_repeat: bool,
    pub is_consecutive_repeat: bool,
    pub seed_bias_penalty: u64,
}

/// Cost of pairing `a` with `b` in `round_number`.
pub fn pairing_cost(
    a: &Entrant<'_>,
    b: &Entrant<'_>,
    round_number: u32,
    context: CostContext,
    weights: &CostWeights,
) -> u64 {
    let score_gap = a.score.abs_diff(b.score);
    let balance = (a.competitor.color_balance as i64 + b.competitor.color_balance as i64)
        .unsigned_abs();

    let mut cost = score_gap * weights.score + balance * weights.color;

    if assign_colors(a.competitor, b.competitor, round_number).creates_streak() {
        cost += weights.streak;
    }
    if context.is_repeat {
        cost += weights.repeat;
    }
    if context.is_consecutive_repeat {
        cost += weights.consecutive_repeat;
    }

    cost + context.seed_bias_penalty
}

/// Seed-bias penalty for two members at `rank_a` and `rank_b` of a bracket
/// of `bracket_len`: zero when they sit exactly half a bracket apart, the
/// way a top-half player meets the matching bottom-half player.
pub fn seed_bias_penalty(weight: u64, rank_a: usize, rank_b: usize, bracket_len: usize) -> u64 {
    let distance = rank_a.abs_diff(rank_b);
    weight * distance.abs_diff(bracket_len / 2) as u64
}
