//! Score-group pairing search.
//!
//! Competitors arrive in ranking order (pairing score descending, rating
//! descending, id ascending) and are cut into score groups. Groups are
//! solved top-down. A group that cannot or should not be paired completely
//! hands some of its members down to the next group as floaters. Every
//! floater set is tried, lowest-ranked members first, and the cheapest
//! complete round wins.
//!
//! Inside a group a depth-first search builds the matching, always
//! expanding the member with the fewest repeat-free opponents left and
//! trying its opponents cheapest first. Branches whose cost plus an
//! admissible lower bound cannot beat the incumbent are cut.
//!
//! The first pass forbids repeats. If it cannot pair the round, a second
//! pass allows them and minimizes the repeat count before the cost.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cost::{pairing_cost, seed_bias_penalty, CostContext, Entrant};
use super::history::PairingHistory;
use super::variant::Strategy;

/// Search-node budget for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Nodes spent optimizing. Past this the search only finishes the
    /// round it is building.
    pub max_nodes: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self { max_nodes: 250_000 }
    }
}

/// (repeat count, cost), compared lexicographically.
type Key = (u32, u64);

fn add(a: Key, b: Key) -> Key {
    (a.0 + b.0, a.1 + b.1)
}

/// The solver's answer, as pairs of indices into the entrant slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvedRound {
    pub pairs: Vec<(usize, usize)>,
    pub repeat_count: u32,
    pub cost: u64,
    pub forced_repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Strict,
    Relaxed,
}

/// Node counter. After `soft` nodes the search stops optimizing; after
/// `hard` nodes a strict pass gives up altogether.
#[derive(Debug)]
struct Budget {
    spent: u64,
    soft: u64,
    hard: u64,
}

impl Budget {
    fn new(limits: SearchLimits) -> Self {
        let soft = limits.max_nodes.max(1);
        Self {
            spent: 0,
            soft,
            hard: soft.saturating_mul(2),
        }
    }

    fn tick(&mut self) {
        self.spent += 1;
    }

    fn soft_exhausted(&self) -> bool {
        self.spent >= self.soft
    }

    fn hard_exhausted(&self) -> bool {
        self.spent >= self.hard
    }
}

/// Pairs the entrants of one round (bye already removed).
pub struct Solver<'a> {
    entrants: &'a [Entrant<'a>],
    history: &'a PairingHistory,
    strategy: &'a Strategy,
    round_number: u32,
    limits: SearchLimits,
    groups: Vec<Vec<usize>>,
}

impl<'a> Solver<'a> {
    /// `entrants` must already be in ranking order and even in number.
    pub fn new(
        entrants: &'a [Entrant<'a>],
        history: &'a PairingHistory,
        strategy: &'a Strategy,
        round_number: u32,
        limits: SearchLimits,
    ) -> Self {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, entrant) in entrants.iter().enumerate() {
            match groups.last_mut() {
                Some(group) if entrants[group[0]].score == entrant.score => group.push(i),
                _ => groups.push(vec![i]),
            }
        }

        Self {
            entrants,
            history,
            strategy,
            round_number,
            limits,
            groups,
        }
    }

    /// Score groups as index lists, highest score first.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn solve(&self) -> SolvedRound {
        if self.entrants.len() < 2 {
            return SolvedRound::default();
        }

        let (strict, strict_nodes) = self.run(Pass::Strict);
        if let Some(plan) = strict {
            debug!(
                "Round {}: {} groups paired without repeats ({} nodes)",
                self.round_number,
                self.groups.len(),
                strict_nodes
            );
            return self.finish(plan, false);
        }

        let (relaxed, relaxed_nodes) = self.run(Pass::Relaxed);
        match relaxed {
            Some(plan) => {
                debug!(
                    "Round {}: relaxed pass used {} nodes after {} strict nodes",
                    self.round_number, relaxed_nodes, strict_nodes
                );
                self.finish(plan, true)
            }
            None => {
                // Unreachable for an even pool: every pair is legal here.
                warn!(
                    "Round {}: no pairing found for {} entrants",
                    self.round_number,
                    self.entrants.len()
                );
                SolvedRound::default()
            }
        }
    }

    fn finish(&self, plan: Plan, relaxed: bool) -> SolvedRound {
        let mut pairs = plan.pairs;
        for pair in &mut pairs {
            if pair.0 > pair.1 {
                *pair = (pair.1, pair.0);
            }
        }
        pairs.sort_unstable();
        SolvedRound {
            pairs,
            repeat_count: plan.key.0,
            cost: plan.key.1,
            forced_repeat: relaxed && plan.key.0 > 0,
        }
    }

    fn run(&self, pass: Pass) -> (Option<Plan>, u64) {
        let mut search = GroupSearch {
            solver: self,
            pass,
            budget: Budget::new(self.limits),
            stack: Vec::new(),
            best: None,
        };
        search.descend(0, Vec::new(), (0, 0));

        if search.budget.soft_exhausted() {
            warn!(
                "Round {}: {:?} pass hit its search budget of {} nodes",
                self.round_number, pass, self.limits.max_nodes
            );
        }
        (search.best, search.budget.spent)
    }
}

#[derive(Debug, Clone)]
struct Plan {
    pairs: Vec<(usize, usize)>,
    key: Key,
}

/// A matching of one bracket, in entrant indices.
struct Matching {
    pairs: Vec<(usize, usize)>,
    key: Key,
}

/// Walks the score groups choosing floaters.
struct GroupSearch<'s, 'a> {
    solver: &'s Solver<'a>,
    pass: Pass,
    budget: Budget,
    stack: Vec<(usize, usize)>,
    best: Option<Plan>,
}

impl GroupSearch<'_, '_> {
    fn beats_best(&self, key: Key) -> bool {
        self.best.as_ref().map_or(true, |b| key < b.key)
    }

    fn should_stop(&self) -> bool {
        (self.pass == Pass::Strict && self.budget.hard_exhausted())
            || (self.budget.soft_exhausted() && self.best.is_some())
    }

    /// Pair group `gi` together with `carried` floaters from above.
    /// Returns true if a complete round was reached below this point.
    fn descend(&mut self, gi: usize, carried: Vec<usize>, acc: Key) -> bool {
        let solver = self.solver;
        if !self.beats_best(acc) {
            return false;
        }

        let mut members = carried;
        members.extend(solver.groups[gi].iter().copied());
        members.sort_unstable();

        if gi + 1 == solver.groups.len() {
            return self.close(&members, acc);
        }

        let next_score = solver.entrants[solver.groups[gi + 1][0]].score;
        let weights = &solver.strategy.weights;
        let float_charge = |floaters: &[usize]| -> u64 {
            floaters
                .iter()
                .map(|&f| weights.float_charge(solver.entrants[f].score.abs_diff(next_score)))
                .sum()
        };

        let mut reached = false;
        let n = members.len();
        for k in (n % 2..=n).step_by(2) {
            // The k lowest-ranked members are the cheapest floaters; if even
            // they cannot beat the incumbent, no larger k can either.
            let cheapest: Vec<usize> = members[n - k..].to_vec();
            if !self.beats_best((acc.0, acc.1 + float_charge(&cheapest))) {
                break;
            }

            let mut combo: Vec<usize> = (0..k).collect();
            loop {
                if self.should_stop() {
                    return reached;
                }
                self.budget.tick();

                // positions count from the bottom of the group
                let mut floaters: Vec<usize> = combo.iter().map(|&p| members[n - 1 - p]).collect();
                floaters.sort_unstable();
                let base = (acc.0, acc.1 + float_charge(&floaters));

                if self.beats_best(base) {
                    let staying: Vec<usize> = members
                        .iter()
                        .copied()
                        .filter(|m| floaters.binary_search(m).is_err())
                        .collect();
                    let local = if staying.is_empty() {
                        Some(Matching {
                            pairs: Vec::new(),
                            key: (0, 0),
                        })
                    } else {
                        self.search_bracket(&staying, base)
                    };

                    if let Some(local) = local {
                        let depth = self.stack.len();
                        self.stack.extend(local.pairs);
                        if self.descend(gi + 1, floaters, add(base, local.key)) {
                            reached = true;
                        }
                        self.stack.truncate(depth);
                    }
                }

                if !next_combination(&mut combo, n) {
                    break;
                }
            }
        }

        reached
    }

    /// Pair the last group completely.
    fn close(&mut self, members: &[usize], acc: Key) -> bool {
        if members.is_empty() {
            self.offer(acc);
            return true;
        }
        match self.search_bracket(members, acc) {
            Some(local) => {
                let depth = self.stack.len();
                self.stack.extend(local.pairs);
                self.offer(add(acc, local.key));
                self.stack.truncate(depth);
                true
            }
            None => false,
        }
    }

    fn offer(&mut self, key: Key) {
        if self.beats_best(key) {
            self.best = Some(Plan {
                pairs: self.stack.clone(),
                key,
            });
        }
    }

    /// Best matching of `members` whose total, added to `offset`, beats the
    /// incumbent round.
    fn search_bracket(&mut self, members: &[usize], offset: Key) -> Option<Matching> {
        let solver = self.solver;
        let m = members.len();
        let weights = &solver.strategy.weights;
        let mut cost = vec![0u64; m * m];
        let mut repeat = vec![false; m * m];

        for p in 0..m {
            for q in p + 1..m {
                let a = &solver.entrants[members[p]];
                let b = &solver.entrants[members[q]];
                let (a_id, b_id) = (&a.competitor.id, &b.competitor.id);
                let is_repeat = solver.history.has_played(a_id, b_id);
                let context = CostContext {
                    is_repeat,
                    is_consecutive_repeat: is_repeat && solver.history.played_last_round(a_id, b_id),
                    seed_bias_penalty: seed_bias_penalty(weights.seed_bias, p, q, m),
                };
                let c = pairing_cost(a, b, solver.round_number, context, weights);
                cost[p * m + q] = c;
                cost[q * m + p] = c;
                repeat[p * m + q] = is_repeat;
                repeat[q * m + p] = is_repeat;
            }
        }

        let ceiling = self.best.as_ref().map(|b| b.key);
        let mut bracket = BracketSearch {
            m,
            cost,
            repeat,
            allow_repeats: self.pass == Pass::Relaxed,
            unpaired: vec![true; m],
            stack: Vec::with_capacity(m / 2),
            best: None,
            offset,
            ceiling,
            budget: &mut self.budget,
        };
        bracket.descend(m, (0, 0));

        bracket.best.map(|(key, pairs)| Matching {
            pairs: pairs
                .into_iter()
                .map(|(p, q)| (members[p], members[q]))
                .collect(),
            key,
        })
    }
}

/// Depth-first perfect matching search over one bracket, in local indices.
struct BracketSearch<'b> {
    m: usize,
    cost: Vec<u64>,
    repeat: Vec<bool>,
    allow_repeats: bool,
    unpaired: Vec<bool>,
    stack: Vec<(usize, usize)>,
    best: Option<(Key, Vec<(usize, usize)>)>,
    offset: Key,
    ceiling: Option<Key>,
    budget: &'b mut Budget,
}

impl BracketSearch<'_> {
    fn legal(&self, p: usize, q: usize) -> bool {
        self.allow_repeats || !self.repeat[p * self.m + q]
    }

    /// Could a bracket total of `key` still improve on what is known?
    fn promising(&self, key: Key) -> bool {
        if let Some((best, _)) = &self.best {
            if key >= *best {
                return false;
            }
        }
        match self.ceiling {
            Some(ceiling) => add(self.offset, key) < ceiling,
            None => true,
        }
    }

    fn should_stop(&self) -> bool {
        (!self.allow_repeats && self.budget.hard_exhausted())
            || (self.budget.soft_exhausted() && (self.best.is_some() || self.ceiling.is_some()))
    }

    /// Half the sum of each unpaired member's cheapest legal partner, or
    /// None if some member has no legal partner left.
    fn lower_bound(&self) -> Option<u64> {
        let m = self.m;
        let mut total = 0u64;
        for r in (0..m).filter(|&r| self.unpaired[r]) {
            let cheapest = (0..m)
                .filter(|&s| s != r && self.unpaired[s] && self.legal(r, s))
                .map(|s| self.cost[r * m + s])
                .min()?;
            total += cheapest;
        }
        Some(total / 2)
    }

    fn descend(&mut self, remaining: usize, acc: Key) {
        if remaining == 0 {
            if self.promising(acc) {
                self.best = Some((acc, self.stack.clone()));
            }
            return;
        }
        if self.should_stop() {
            return;
        }
        self.budget.tick();

        let m = self.m;

        // Most constrained first: fewest repeat-free partners left.
        let mut pivot = None;
        let mut fewest = usize::MAX;
        for p in (0..m).filter(|&p| self.unpaired[p]) {
            let options = (0..m)
                .filter(|&q| q != p && self.unpaired[q] && !self.repeat[p * m + q])
                .count();
            if options < fewest {
                fewest = options;
                pivot = Some(p);
            }
        }
        let Some(p) = pivot else {
            return;
        };
        if fewest == 0 && !self.allow_repeats {
            return;
        }

        let mut candidates: Vec<usize> = (0..m)
            .filter(|&q| q != p && self.unpaired[q] && self.legal(p, q))
            .collect();
        candidates.sort_by_key(|&q| (self.repeat[p * m + q], self.cost[p * m + q], q));

        self.unpaired[p] = false;
        for q in candidates {
            if self.should_stop() {
                break;
            }
            let next = (
                acc.0 + u32::from(self.repeat[p * m + q]),
                acc.1 + self.cost[p * m + q],
            );

            self.unpaired[q] = false;
            if let Some(bound) = self.lower_bound() {
                if self.promising((next.0, next.1 + bound)) {
                    self.stack.push((p, q));
                    self.descend(remaining - 2, next);
                    self.stack.pop();
                }
            }
            self.unpaired[q] = true;
        }
        self.unpaired[p] = true;
    }
}

/// Advance `combo` (strictly increasing positions below `n`) to the next
/// combination in lexicographic order.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    for i in (0..k).rev() {
        if combo[i] < n - k + i {
            combo[i] += 1;
            for j in i + 1..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
