// src/feed/mod.rs
pub mod hn_rss;
pub mod points;
pub mod types;

pub use hn_rss::{parse_feed, FeedParseOutcome, HnRssSource, RejectedEntry};
pub use types::{CandidateItem, FeedSource};
