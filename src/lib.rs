//! # Swiss Pairing
//!
//! Pairing engine for Swiss-system and round-robin tournaments.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (competitors, pairings, rounds, tournaments)
//! - **pairing**: The engine: history, byes, colors, costs, search, variants, round-robin
//! - **calculate**: Standings and tie-break figures
//! - **director**: Tournament lifecycle on top of the engine
//! - **storage**: Filesystem tournament store (JSON + JSONL)
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod director;
pub mod models;
pub mod pairing;
pub mod storage;

pub use models::*;
