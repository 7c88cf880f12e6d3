//! Tournament lifecycle.
//!
//! The director owns the sequencing the engine leaves to its caller:
//! registration, one round at a time, results, completion.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::calculate::{calculate_standings, competitor_snapshots};
use crate::models::{
    Competitor, CompetitorId, GameResult, RankedCompetitor, Round, Tournament, TournamentFormat,
    TournamentStatus,
};
use crate::pairing::{
    generate_round_robin, round_robin_rounds, PairingError, PairingRequest, SearchLimits,
    SwissPairer, VariantSettings, MAX_POOL_SIZE, MAX_ROUNDS,
};

/// Lifecycle violations.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament is {0}, expected registration")]
    NotInRegistration(TournamentStatus),

    #[error("Tournament is {0}, expected in-progress")]
    NotInProgress(TournamentStatus),

    #[error("A competitor named '{0}' is already registered")]
    DuplicateCompetitor(String),

    #[error("Roster is full at {0} competitors")]
    RosterFull(usize),

    #[error("Need at least 2 competitors to start, have {0}")]
    NotEnoughCompetitors(usize),

    #[error("Total rounds must be between 1 and {max}, got {got}")]
    InvalidTotalRounds { got: u32, max: u32 },

    #[error("Round {0} still has games without a result")]
    RoundIncomplete(u32),

    #[error("All {0} rounds have been paired")]
    AllRoundsPaired(u32),

    #[error("Round {0} not found")]
    RoundNotFound(u32),

    #[error("Round {round} has no board {board}")]
    BoardNotFound { round: u32, board: u32 },

    #[error("Board {board} of round {round} is a bye")]
    ByeHasNoResult { round: u32, board: u32 },

    #[error("Round {0} is completed and can no longer change")]
    RoundCompleted(u32),

    #[error("Pairing failed: {0}")]
    Pairing(#[from] PairingError),
}

/// Drives tournaments through their lifecycle.
#[derive(Debug, Clone, Default)]
pub struct Director {
    settings: VariantSettings,
    limits: SearchLimits,
}

impl Director {
    pub fn new(settings: VariantSettings, limits: SearchLimits) -> Self {
        Self { settings, limits }
    }

    /// Register a competitor. The id is derived from the tournament id and
    /// the name, so names must be unique.
    pub fn add_competitor(
        &self,
        tournament: &mut Tournament,
        name: &str,
        rating: Option<u32>,
    ) -> Result<CompetitorId, TournamentError> {
        if tournament.status != TournamentStatus::Registration {
            return Err(TournamentError::NotInRegistration(tournament.status));
        }
        if tournament.competitors.len() >= MAX_POOL_SIZE {
            return Err(TournamentError::RosterFull(MAX_POOL_SIZE));
        }

        let competitor = Competitor::register(&tournament.id, name.trim(), rating);
        if tournament.competitor(&competitor.id).is_some() {
            return Err(TournamentError::DuplicateCompetitor(name.trim().to_string()));
        }

        let id = competitor.id.clone();
        info!("Registered {} ({}) in {}", competitor.name, id, tournament.id);
        tournament.competitors.push(competitor);
        Ok(id)
    }

    /// Close registration.
    ///
    /// Round-robin formats fix the round count to the schedule length.
    pub fn start(&self, tournament: &mut Tournament) -> Result<(), TournamentError> {
        if tournament.status != TournamentStatus::Registration {
            return Err(TournamentError::NotInRegistration(tournament.status));
        }
        let entrants = tournament.competitors.len();
        if entrants < 2 {
            return Err(TournamentError::NotEnoughCompetitors(entrants));
        }

        if let TournamentFormat::RoundRobin { double } = tournament.format {
            tournament.total_rounds = round_robin_rounds(entrants, double);
        }
        if tournament.total_rounds == 0 || tournament.total_rounds > MAX_ROUNDS {
            return Err(TournamentError::InvalidTotalRounds {
                got: tournament.total_rounds,
                max: MAX_ROUNDS,
            });
        }

        tournament.status = TournamentStatus::InProgress;
        info!(
            "Started {} ({}): {} competitors, {} rounds",
            tournament.name, tournament.format, entrants, tournament.total_rounds
        );
        Ok(())
    }

    /// Pair the next round and append it.
    pub fn next_round<'t>(
        &self,
        tournament: &'t mut Tournament,
    ) -> Result<&'t Round, TournamentError> {
        if tournament.status != TournamentStatus::InProgress {
            return Err(TournamentError::NotInProgress(tournament.status));
        }
        if let Some(latest) = tournament.latest_round() {
            if !latest.completed {
                return Err(TournamentError::RoundIncomplete(latest.number));
            }
        }
        if tournament.current_round >= tournament.total_rounds {
            return Err(TournamentError::AllRoundsPaired(tournament.total_rounds));
        }

        let number = tournament.current_round + 1;
        let round = match tournament.format {
            TournamentFormat::Swiss { variant } => {
                let standings = calculate_standings(tournament);
                let pool = competitor_snapshots(&tournament.competitors, &standings);
                let request = PairingRequest::new(&pool, number, &tournament.rounds)
                    .with_roster(&tournament.competitors)
                    .with_total_rounds(tournament.total_rounds);
                SwissPairer::new(variant)
                    .with_settings(self.settings)
                    .with_limits(self.limits)
                    .generate_pairings(&request)?
                    .into_round(number)
            }
            TournamentFormat::RoundRobin { double } => {
                let pairings = generate_round_robin(&tournament.competitors, number, double)?;
                Round::new(number, pairings, false, 0)
            }
        };

        info!(
            "{}: round {} of {} paired ({} boards)",
            tournament.name,
            number,
            tournament.total_rounds,
            round.pairings.len()
        );
        tournament.rounds.push(round.with_generated_at(Utc::now()));
        tournament.current_round = number;
        self.finish_if_done(tournament);

        tournament
            .latest_round()
            .ok_or(TournamentError::RoundNotFound(number))
    }

    /// Record the result of one board.
    pub fn record_result(
        &self,
        tournament: &mut Tournament,
        round_number: u32,
        board_number: u32,
        result: GameResult,
    ) -> Result<(), TournamentError> {
        if tournament.status != TournamentStatus::InProgress {
            return Err(TournamentError::NotInProgress(tournament.status));
        }

        let round = tournament
            .round_mut(round_number)
            .ok_or(TournamentError::RoundNotFound(round_number))?;
        if round.completed {
            return Err(TournamentError::RoundCompleted(round_number));
        }
        let pairing = round
            .board_mut(board_number)
            .ok_or(TournamentError::BoardNotFound {
                round: round_number,
                board: board_number,
            })?;
        if pairing.is_bye {
            return Err(TournamentError::ByeHasNoResult {
                round: round_number,
                board: board_number,
            });
        }

        pairing.result = Some(result);
        if round.refresh_completed() {
            info!("Round {} completed", round_number);
        }
        self.finish_if_done(tournament);
        Ok(())
    }

    pub fn standings(&self, tournament: &Tournament) -> Vec<RankedCompetitor> {
        calculate_standings(tournament)
    }

    fn finish_if_done(&self, tournament: &mut Tournament) {
        let done = tournament.current_round >= tournament.total_rounds
            && tournament.latest_round().is_some_and(|r| r.completed);
        if done && tournament.status == TournamentStatus::InProgress {
            tournament.status = TournamentStatus::Completed;
            info!("{} completed after {} rounds", tournament.name, tournament.current_round);
        }
    }
}
