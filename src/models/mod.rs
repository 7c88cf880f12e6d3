//! Core data models for tournaments and pairings.

mod competitor;
mod ids;
mod pairing;
mod round;
mod standings;
mod tournament;

pub use competitor::*;
pub use ids::*;
pub use pairing::*;
pub use round::*;
pub use standings::*;
pub use tournament::*;
