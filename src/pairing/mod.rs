//! Pairing engine.
//!
//! Pure, synchronous and deterministic: the same competitors, history and
//! round number always produce the same pairings.
//!
//! - **history**: played pairs, byes and last-round pairs from prior rounds
//! - **bye**: who sits out an odd round
//! - **color**: white/black assignment for a pair
//! - **cost**: tiered integer cost of a candidate pair
//! - **solver**: score groups, floaters and the backtracking search
//! - **variant**: Standard, Accelerated, USCF and FIDE settings
//! - **round_robin**: the closed-form Berger schedule

pub mod bye;
pub mod color;
pub mod cost;
pub mod history;
pub mod round_robin;
pub mod solver;
pub mod variant;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Competitor, CompetitorId, Pairing, Round};

pub use bye::select_bye;
pub use color::{assign_colors, ColorAssignment};
pub use cost::{CostWeights, MAX_POOL_SIZE, MAX_ROUNDS};
pub use history::PairingHistory;
pub use round_robin::{generate_round_robin, round_robin_rounds};
pub use solver::SearchLimits;
pub use variant::{Strategy, Variant, VariantSettings};

use cost::Entrant;
use solver::Solver;

/// Rejected engine input.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("Competitor {0} appears more than once in the pool")]
    DuplicateCompetitor(CompetitorId),

    #[error("Competitor {id} has invalid score {score}")]
    InvalidScore { id: CompetitorId, score: f64 },

    #[error("Round numbers start at 1")]
    InvalidRound,

    #[error("Pool of {size} competitors exceeds the supported maximum of {max}")]
    PoolTooLarge { size: usize, max: usize },

    #[error("Accelerated pairing needs the total number of rounds")]
    MissingTotalRounds,

    #[error("Round {round} is outside a schedule of {rounds} rounds")]
    RoundOutOfRange { round: u32, rounds: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Everything one round's pairing depends on.
#[derive(Debug, Clone, Copy)]
pub struct PairingRequest<'a> {
    /// Competitors to pair this round, with current scores and colors
    pub pool: &'a [Competitor],
    pub round_number: u32,
    /// Whole field; accelerated seeding ranks this instead of the pool
    pub full_roster: Option<&'a [Competitor]>,
    pub prior_rounds: &'a [Round],
    /// Needed by Accelerated only
    pub total_rounds: Option<u32>,
}

impl<'a> PairingRequest<'a> {
    pub fn new(pool: &'a [Competitor], round_number: u32, prior_rounds: &'a [Round]) -> Self {
        Self {
            pool,
            round_number,
            full_roster: None,
            prior_rounds,
            total_rounds: None,
        }
    }

    pub fn with_roster(mut self, roster: &'a [Competitor]) -> Self {
        self.full_roster = Some(roster);
        self
    }

    pub fn with_total_rounds(mut self, total_rounds: u32) -> Self {
        self.total_rounds = Some(total_rounds);
        self
    }
}

/// One round of pairings plus repeat metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingOutcome {
    pub pairings: Vec<Pairing>,
    pub forced_repeat: bool,
    pub repeat_count: u32,
}

impl PairingOutcome {
    fn empty() -> Self {
        Self {
            pairings: Vec::new(),
            forced_repeat: false,
            repeat_count: 0,
        }
    }

    /// Wrap as a fresh round numbered `number`.
    pub fn into_round(self, number: u32) -> Round {
        Round::new(number, self.pairings, self.forced_repeat, self.repeat_count)
    }
}

/// Swiss pairing engine for one variant.
#[derive(Debug, Clone)]
pub struct SwissPairer {
    variant: Variant,
    settings: VariantSettings,
    limits: SearchLimits,
}

impl SwissPairer {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            settings: VariantSettings::default(),
            limits: SearchLimits::default(),
        }
    }

    pub fn with_settings(mut self, settings: VariantSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Pair one round.
    pub fn generate_pairings(
        &self,
        request: &PairingRequest<'_>,
    ) -> Result<PairingOutcome, PairingError> {
        validate(request)?;

        let round = request.round_number;
        let roster = request.full_roster.unwrap_or(request.pool);
        let strategy =
            Strategy::resolve(self.variant, &self.settings, roster, request.total_rounds)?;

        let mut history = PairingHistory::from_rounds(request.prior_rounds);
        history.absorb_snapshots(request.pool);

        if request.pool.is_empty() {
            return Ok(PairingOutcome::empty());
        }

        let bye = select_bye(request.pool, &history);
        let mut entrants: Vec<Entrant<'_>> = request
            .pool
            .iter()
            .filter(|c| bye.map_or(true, |b| b.id != c.id))
            .map(|c| Entrant::new(c, strategy.pairing_score(c, round)))
            .collect();
        entrants.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.competitor.rating_or_zero().cmp(&a.competitor.rating_or_zero()))
                .then(a.competitor.id.cmp(&b.competitor.id))
        });

        let solved = Solver::new(&entrants, &history, &strategy, round, self.limits).solve();

        // pairs come back sorted by their higher-ranked member
        let mut pairings = Vec::with_capacity(solved.pairs.len() + 1);
        for (board, &(a, b)) in solved.pairs.iter().enumerate() {
            let (x, y) = (entrants[a].competitor, entrants[b].competitor);
            let colors = assign_colors(x, y, round);
            let is_repeat = history.has_played(&x.id, &y.id);
            pairings.push(Pairing::game(
                round,
                board as u32 + 1,
                colors.white,
                colors.black,
                is_repeat,
            ));
        }
        if let Some(competitor) = bye {
            pairings.push(Pairing::bye(round, pairings.len() as u32 + 1, competitor));
        }

        if solved.forced_repeat {
            warn!(
                "Round {}: no repeat-free pairing exists, {} repeat pairing(s) used",
                round, solved.repeat_count
            );
        }
        info!(
            "Round {} paired with {} variant: {} boards{}",
            round,
            self.variant,
            solved.pairs.len(),
            if bye.is_some() { " plus a bye" } else { "" }
        );

        Ok(PairingOutcome {
            pairings,
            forced_repeat: solved.forced_repeat,
            repeat_count: solved.repeat_count,
        })
    }
}

/// Pair one round with default settings.
pub fn generate_pairings(
    variant: Variant,
    request: &PairingRequest<'_>,
) -> Result<PairingOutcome, PairingError> {
    SwissPairer::new(variant).generate_pairings(request)
}

fn validate(request: &PairingRequest<'_>) -> Result<(), PairingError> {
    if request.round_number == 0 {
        return Err(PairingError::InvalidRound);
    }
    if request.round_number > MAX_ROUNDS {
        return Err(PairingError::RoundOutOfRange {
            round: request.round_number,
            rounds: MAX_ROUNDS,
        });
    }
    if request.pool.len() > MAX_POOL_SIZE {
        return Err(PairingError::PoolTooLarge {
            size: request.pool.len(),
            max: MAX_POOL_SIZE,
        });
    }

    let mut seen = BTreeSet::new();
    for competitor in request.pool {
        if !seen.insert(&competitor.id) {
            return Err(PairingError::DuplicateCompetitor(competitor.id.clone()));
        }
        let doubled = competitor.score * 2.0;
        if !competitor.score.is_finite()
            || competitor.score < 0.0
            || competitor.score > MAX_ROUNDS as f64
            || doubled.fract() != 0.0
        {
            return Err(PairingError::InvalidScore {
                id: competitor.id.clone(),
                score: competitor.score,
            });
        }
        if competitor.color_balance.unsigned_abs() > MAX_ROUNDS {
            return Err(PairingError::InvalidInput(format!(
                "competitor {} has color balance {}",
                competitor.id, competitor.color_balance
            )));
        }
    }

    Ok(())
}
