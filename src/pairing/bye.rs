//! Bye selection for odd-sized pools.

use tracing::debug;

use super::history::PairingHistory;
use crate::models::Competitor;

/// Pick who sits out this round.
///
/// Even pools get no bye. Otherwise candidates are ordered by score, then
/// rating (unrated counts as 0), then id, all ascending, and the first one
/// without a previous bye is chosen. When everybody has already had a bye
/// the first candidate gets another one.
pub fn select_bye<'a>(pool: &'a [Competitor], history: &PairingHistory) -> Option<&'a Competitor> {
    if pool.len() % 2 == 0 {
        return None;
    }

    let mut order: Vec<&Competitor> = pool.iter().collect();
    order.sort_by(|a, b| {
        a.score_half_points()
            .cmp(&b.score_half_points())
            .then(a.rating_or_zero().cmp(&b.rating_or_zero()))
            .then(a.id.cmp(&b.id))
    });

    let chosen = order
        .iter()
        .find(|c| history.bye_count(&c.id) == 0)
        .or_else(|| order.first())
        .copied();

    if let Some(c) = chosen {
        if history.bye_count(&c.id) > 0 {
            debug!("Every competitor has had a bye; {} receives another", c.id);
        }
    }

    chosen
}
