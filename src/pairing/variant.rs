//! Swiss variants as plain configuration for the shared solver.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::cost::{CostWeights, MAX_BONUS_HALF_POINTS};
use super::PairingError;
use crate::models::{Competitor, CompetitorId};

/// Swiss flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Raw scores, moderate top-half/bottom-half bias
    #[default]
    Standard,
    /// Early rounds give the top seeds virtual points
    Accelerated,
    /// Strong top-half/bottom-half bias
    Uscf,
    /// Colors weigh double
    Fide,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Standard => write!(f, "standard"),
            Variant::Accelerated => write!(f, "accelerated"),
            Variant::Uscf => write!(f, "uscf"),
            Variant::Fide => write!(f, "fide"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "swiss" => Ok(Variant::Standard),
            "accelerated" => Ok(Variant::Accelerated),
            "uscf" => Ok(Variant::Uscf),
            "fide" | "dutch" => Ok(Variant::Fide),
            other => Err(format!(
                "unknown variant '{}', expected standard, accelerated, uscf or fide",
                other
            )),
        }
    }
}

/// Tunable numbers behind the variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantSettings {
    /// Virtual bonus for accelerated top seeds, in half points
    pub acceleration_bonus: i64,
    pub standard_bias_weight: u64,
    pub uscf_bias_weight: u64,
    pub fide_color_weight: u64,
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self {
            acceleration_bonus: 2,
            standard_bias_weight: 1,
            uscf_bias_weight: 3,
            fide_color_weight: 2,
        }
    }
}

/// Acceleration window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceleration {
    /// Bonus in half points
    pub bonus: i64,
    /// Rounds 1..=last_round are accelerated
    pub last_round: u32,
    /// Competitors receiving the bonus
    pub seeds: BTreeSet<CompetitorId>,
}

/// Everything the solver needs to know about the variant in play.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub variant: Variant,
    pub weights: CostWeights,
    pub acceleration: Option<Acceleration>,
}

impl Strategy {
    /// Resolve `variant` for one pairing request.
    ///
    /// `roster` is the whole field; accelerated seeding ranks all of it,
    /// not just the players present this round.
    pub fn resolve(
        variant: Variant,
        settings: &VariantSettings,
        roster: &[Competitor],
        total_rounds: Option<u32>,
    ) -> Result<Self, PairingError> {
        let defaults = CostWeights::default();
        let weights = match variant {
            Variant::Standard | Variant::Accelerated => CostWeights {
                seed_bias: settings.standard_bias_weight,
                ..defaults
            },
            Variant::Uscf => CostWeights {
                seed_bias: settings.uscf_bias_weight,
                ..defaults
            },
            Variant::Fide => CostWeights {
                seed_bias: settings.standard_bias_weight,
                color: settings.fide_color_weight,
                ..defaults
            },
        };
        if !weights.dominance_holds() {
            return Err(PairingError::InvalidInput(format!(
                "cost weights for {} break the tier ordering",
                variant
            )));
        }

        let acceleration = match variant {
            Variant::Accelerated => {
                let total = total_rounds.ok_or(PairingError::MissingTotalRounds)?;
                if settings.acceleration_bonus <= 0
                    || settings.acceleration_bonus > MAX_BONUS_HALF_POINTS
                {
                    return Err(PairingError::InvalidInput(format!(
                        "acceleration bonus of {} half points is out of range",
                        settings.acceleration_bonus
                    )));
                }
                Some(Acceleration {
                    bonus: settings.acceleration_bonus,
                    last_round: accelerated_rounds(total),
                    seeds: top_seeds(roster),
                })
            }
            _ => None,
        };

        Ok(Self {
            variant,
            weights,
            acceleration,
        })
    }

    /// Score used for grouping and score-gap costs, in half points.
    pub fn pairing_score(&self, competitor: &Competitor, round_number: u32) -> i64 {
        let real = competitor.score_half_points();
        match &self.acceleration {
            Some(acc) if round_number <= acc.last_round && acc.seeds.contains(&competitor.id) => {
                real + acc.bonus
            }
            _ => real,
        }
    }
}

/// Number of accelerated rounds: `min(2, total / 3)`.
pub fn accelerated_rounds(total_rounds: u32) -> u32 {
    (total_rounds / 3).min(2)
}

/// Top half of the field by rating, rounded down. An odd top half is
/// evened out by the solver's floaters like any other score group.
pub fn top_seeds(roster: &[Competitor]) -> BTreeSet<CompetitorId> {
    let mut order: Vec<&Competitor> = roster.iter().collect();
    order.sort_by(|a, b| {
        b.rating_or_zero()
            .cmp(&a.rating_or_zero())
            .then(a.id.cmp(&b.id))
    });
    let size = roster.len() / 2;
    order
        .into_iter()
        .take(size)
        .map(|c| c.id.clone())
        .collect()
}
