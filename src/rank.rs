//! # Hotness Ranker
//! Pure scoring and ordering of candidates. No I/O.
//!
//! `hotness = log10(points + 1) - hours_since_published / 24`
//!
//! One order of magnitude of points is worth one day of age.

use crate::feed::CandidateItem;

pub const DEFAULT_TOP_N: usize = 10;

const SECS_PER_HOUR: f64 = 3600.0;
const DECAY_HOURS: f64 = 24.0;

/// Recency-decayed popularity. `now` and `published_at` are unix seconds.
pub fn hotness(points: u64, published_at: i64, now: i64) -> f64 {
    let hours = (now - published_at) as f64 / SECS_PER_HOUR;
    ((points as f64) + 1.0).log10() - hours / DECAY_HOURS
}

/// Sort by descending hotness and keep the first `n`.
/// The sort is stable, so equal scores keep feed order.
pub fn rank_top(mut items: Vec<CandidateItem>, n: usize) -> Vec<CandidateItem> {
    items.sort_by(|a, b| b.hotness().total_cmp(&a.hotness()));
    items.truncate(n);
    items
}
