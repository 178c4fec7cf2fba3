// src/feed/types.rs
use serde::Serialize;

use crate::error::BotResult;
use crate::rank::hotness;

/// A parsed front-page entry that may still be posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateItem {
    pub title: String,
    pub article_url: String,
    pub discussion_url: String,
    pub points: u64,
    pub published_at: i64, // unix seconds
    hotness: f64,
}

impl CandidateItem {
    /// Scores the item against `now` (unix seconds). The score is fixed for the
    /// lifetime of the value.
    pub fn new(
        title: impl Into<String>,
        article_url: impl Into<String>,
        discussion_url: impl Into<String>,
        points: u64,
        published_at: i64,
        now: i64,
    ) -> Self {
        Self {
            title: title.into(),
            article_url: article_url.into(),
            discussion_url: discussion_url.into(),
            points,
            published_at,
            hotness: hotness(points, published_at, now),
        }
    }

    pub fn hotness(&self) -> f64 {
        self.hotness
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the raw feed document.
    async fn fetch_raw(&self) -> BotResult<String>;
    fn name(&self) -> &'static str;
}
