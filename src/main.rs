use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiss_pairing::config::AppConfig;
use swiss_pairing::director::Director;
use swiss_pairing::models::{
    CompetitorId, GameResult, Pairing, RankedCompetitor, Round, Tournament, TournamentFormat,
    TournamentId,
};
use swiss_pairing::pairing::Variant;
use swiss_pairing::storage::{StorageConfig, TournamentStore};

#[derive(Parser)]
#[command(name = "swiss-pairing")]
#[command(about = "Swiss-system and round-robin tournament pairing")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print command output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Swiss,
    RoundRobin,
    DoubleRoundRobin,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tournament
    New {
        /// Tournament name
        #[arg(long)]
        name: String,

        /// Pairing format
        #[arg(long, value_enum, default_value = "swiss")]
        format: FormatArg,

        /// Swiss variant: standard, accelerated, uscf or fide
        #[arg(long, default_value = "standard")]
        variant: Variant,

        /// Number of rounds (Swiss only; round-robin derives it)
        #[arg(long, default_value = "5")]
        rounds: u32,
    },

    /// Register a player
    AddPlayer {
        tournament: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        rating: Option<u32>,
    },

    /// Close registration
    Start { tournament: String },

    /// Pair the next round
    Pair { tournament: String },

    /// Record a game result
    Result {
        tournament: String,

        #[arg(long)]
        round: u32,

        #[arg(long)]
        board: u32,

        /// 1-0, 0-1 or 1/2-1/2
        #[arg(long)]
        result: GameResult,
    },

    /// Show the standings
    Standings { tournament: String },

    /// Show a tournament, or one round of it
    Show {
        tournament: String,

        #[arg(long)]
        round: Option<u32>,
    },

    /// List stored tournaments
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let (plain, json) = if cli.json_logs {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();

    tracing::debug!("Starting swiss-pairing v{}", env!("CARGO_PKG_VERSION"));

    let store = TournamentStore::new(StorageConfig::new(config.data_dir.clone()));
    let director = Director::new(
        config.pairing.variant_settings(),
        config.pairing.search_limits(),
    );

    match cli.command {
        Commands::New {
            name,
            format,
            variant,
            rounds,
        } => {
            let format = match format {
                FormatArg::Swiss => TournamentFormat::Swiss { variant },
                FormatArg::RoundRobin => TournamentFormat::RoundRobin { double: false },
                FormatArg::DoubleRoundRobin => TournamentFormat::RoundRobin { double: true },
            };
            let tournament = Tournament::create(name, format, rounds);
            store.save(&tournament)?;

            if cli.json {
                print_json(&tournament)?;
            } else {
                println!("Created {} ({})", tournament.name, tournament.format);
                println!("Id: {}", tournament.id);
            }
        }

        Commands::AddPlayer {
            tournament,
            name,
            rating,
        } => {
            let mut t = load(&store, &tournament)?;
            let id = director.add_competitor(&mut t, &name, rating)?;
            store.save_metadata(&t)?;

            if cli.json {
                print_json(&t.competitor(&id))?;
            } else {
                println!("Registered {} as {}", name, id);
            }
        }

        Commands::Start { tournament } => {
            let mut t = load(&store, &tournament)?;
            director.start(&mut t)?;
            store.save_metadata(&t)?;

            if cli.json {
                print_json(&t)?;
            } else {
                println!(
                    "{} started: {} players, {} rounds",
                    t.name,
                    t.competitors.len(),
                    t.total_rounds
                );
            }
        }

        Commands::Pair { tournament } => {
            let mut t = load(&store, &tournament)?;
            let round = director.next_round(&mut t)?.clone();
            store.append_round(&t.id, &round)?;
            store.save_metadata(&t)?;

            if cli.json {
                print_json(&round)?;
            } else {
                print_round(&round);
            }
        }

        Commands::Result {
            tournament,
            round,
            board,
            result,
        } => {
            let mut t = load(&store, &tournament)?;
            director.record_result(&mut t, round, board, result)?;
            store.save(&t)?;

            let updated = t.round(round).context("round vanished after update")?;
            if cli.json {
                print_json(&updated)?;
            } else {
                println!("Round {} board {}: {}", round, board, result);
                if updated.completed {
                    println!("Round {} is complete", round);
                }
            }
        }

        Commands::Standings { tournament } => {
            let t = load(&store, &tournament)?;
            let table = director.standings(&t);

            if cli.json {
                print_json(&table)?;
            } else {
                print_standings(&t, &table);
            }
        }

        Commands::Show { tournament, round } => {
            let t = load(&store, &tournament)?;
            match round {
                Some(number) => {
                    let Some(r) = t.round(number) else {
                        bail!("{} has no round {}", t.name, number);
                    };
                    if cli.json {
                        print_json(r)?;
                    } else {
                        print_round(r);
                    }
                }
                None if cli.json => print_json(&t)?,
                None => {
                    println!("{} [{}]", t.name, t.id);
                    println!("Format:  {}", t.format);
                    println!("Status:  {}", t.status);
                    println!("Round:   {} of {}", t.current_round, t.total_rounds);
                    println!("Players: {}", t.competitors.len());
                    for r in &t.rounds {
                        println!();
                        print_round(r);
                    }
                }
            }
        }

        Commands::List => {
            let ids = store.list()?;
            let mut rows = Vec::with_capacity(ids.len());
            for id in &ids {
                rows.push(store.load(id)?);
            }

            if cli.json {
                let summaries: Vec<Summary<'_>> = rows.iter().map(Summary::from).collect();
                print_json(&summaries)?;
            } else if rows.is_empty() {
                println!("No tournaments in {}", config.data_dir.display());
            } else {
                for t in &rows {
                    println!(
                        "{}  {:<30} {:<24} {:<12} round {}/{}",
                        t.id,
                        t.name,
                        t.format.to_string(),
                        t.status.to_string(),
                        t.current_round,
                        t.total_rounds
                    );
                }
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    id: &'a TournamentId,
    name: &'a str,
    status: String,
    current_round: u32,
    total_rounds: u32,
}

impl<'a> From<&'a Tournament> for Summary<'a> {
    fn from(t: &'a Tournament) -> Self {
        Self {
            id: &t.id,
            name: &t.name,
            status: t.status.to_string(),
            current_round: t.current_round,
            total_rounds: t.total_rounds,
        }
    }
}

fn load(store: &TournamentStore, id: &str) -> Result<Tournament> {
    let id = TournamentId::from(id);
    store
        .load(&id)
        .with_context(|| format!("loading tournament {}", id))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_round(round: &Round) {
    let status = if round.completed { "completed" } else { "in play" };
    println!("Round {} ({})", round.number, status);
    if round.forced_repeat {
        println!("  note: {} repeat pairing(s) could not be avoided", round.repeat_count);
    }
    for pairing in &round.pairings {
        println!("  {}", describe(pairing));
    }
}

fn describe(pairing: &Pairing) -> String {
    if pairing.is_bye {
        return format!("{:>3}. {} has a bye", pairing.board_number, pairing.player1.name);
    }

    let name_of = |id: Option<&CompetitorId>| {
        [Some(&pairing.player1), pairing.player2.as_ref()]
            .into_iter()
            .flatten()
            .find(|p| Some(&p.id) == id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    };
    let white = name_of(pairing.white_player_id.as_ref());
    let black = name_of(pairing.black_player_id.as_ref());
    let result = pairing
        .result
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let repeat = if pairing.is_repeat { "  (repeat)" } else { "" };

    format!(
        "{:>3}. {:<24} {:^9} {}{}",
        pairing.board_number, white, result, black, repeat
    )
}

fn print_standings(t: &Tournament, table: &[RankedCompetitor]) {
    println!("{} after round {}", t.name, t.completed_rounds().len());
    println!(
        "{:>4}  {:<24} {:>6} {:>5}  {:<7} {:>4} {:>8} {:>6}",
        "Rank", "Name", "Rating", "Score", "W-L-D", "Bye", "Buchholz", "SB"
    );
    for row in table {
        let rating = row
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<24} {:>6} {:>5.1}  {:<7} {:>4} {:>8.1} {:>6.2}",
            row.rank,
            row.name,
            rating,
            row.score,
            format!("{}-{}-{}", row.record.wins, row.record.losses, row.record.draws),
            row.byes,
            row.buchholz,
            row.sonneborn_berger
        );
    }
}
